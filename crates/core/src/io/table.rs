//! Delimited-text sample tables
//!
//! A sample table is one row per location: two coordinate columns, any
//! number of feature columns and an optional target column, all selected
//! by header name.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use ndarray::{Array1, Array2};

use crate::error::{Error, Result};
use crate::point::Coordinate;

/// Column selection for reading a sample table
#[derive(Debug, Clone)]
pub struct SampleLayout {
    /// Header of the first coordinate axis (default "x")
    pub x_column: String,
    /// Header of the second coordinate axis (default "y")
    pub y_column: String,
    /// Headers of regression features, in design-matrix order
    pub feature_columns: Vec<String>,
    /// Header of the observed target. `None` for query tables.
    pub target_column: Option<String>,
    /// Field delimiter (default b',')
    pub delimiter: u8,
}

impl Default for SampleLayout {
    fn default() -> Self {
        Self {
            x_column: "x".to_string(),
            y_column: "y".to_string(),
            feature_columns: Vec::new(),
            target_column: None,
            delimiter: b',',
        }
    }
}

/// Samples read from a delimited file, row-aligned across all fields.
#[derive(Debug, Clone)]
pub struct SampleTable {
    pub coordinates: Vec<Coordinate>,
    /// Shape (n_rows, n_features)
    pub features: Array2<f64>,
    pub targets: Option<Array1<f64>>,
}

impl SampleTable {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}

/// Read a sample table from a file.
pub fn read_samples<P: AsRef<Path>>(path: P, layout: &SampleLayout) -> Result<SampleTable> {
    let file = File::open(path.as_ref())?;
    read_samples_from_reader(file, layout)
}

/// Read a sample table from any reader (file, buffer, stdin).
pub fn read_samples_from_reader<R: Read>(reader: R, layout: &SampleLayout) -> Result<SampleTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(layout.delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::Csv(format!("column '{}' not found", name)))
    };

    let x_idx = column(&layout.x_column)?;
    let y_idx = column(&layout.y_column)?;
    let feature_idx = layout
        .feature_columns
        .iter()
        .map(|name| column(name))
        .collect::<Result<Vec<_>>>()?;
    let target_idx = layout.target_column.as_deref().map(column).transpose()?;

    let n_features = feature_idx.len();
    let mut coordinates = Vec::new();
    let mut feature_data = Vec::new();
    let mut targets = Vec::new();

    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        // Header is line 1
        let line = row + 2;
        let field = |idx: usize| -> Result<f64> {
            let raw = record.get(idx).unwrap_or("");
            raw.parse::<f64>().map_err(|_| {
                Error::Csv(format!(
                    "line {}: column '{}' is not a number: '{}'",
                    line, &headers[idx], raw
                ))
            })
        };

        coordinates.push(Coordinate::new(field(x_idx)?, field(y_idx)?));
        for &idx in &feature_idx {
            feature_data.push(field(idx)?);
        }
        if let Some(idx) = target_idx {
            targets.push(field(idx)?);
        }
    }

    if coordinates.is_empty() {
        return Err(Error::Csv("table has no data rows".into()));
    }

    let features = Array2::from_shape_vec((coordinates.len(), n_features), feature_data)
        .map_err(|e| Error::Other(e.to_string()))?;

    Ok(SampleTable {
        coordinates,
        features,
        targets: target_idx.map(|_| Array1::from(targets)),
    })
}

/// Write equal-length numeric columns as CSV with a header row.
pub fn write_columns<W: Write>(writer: W, headers: &[&str], columns: &[&[f64]]) -> Result<()> {
    if headers.len() != columns.len() {
        return Err(Error::DimensionMismatch {
            what: "column headers",
            expected: columns.len(),
            actual: headers.len(),
        });
    }
    let n_rows = columns.first().map_or(0, |c| c.len());
    if let Some(bad) = columns.iter().find(|c| c.len() != n_rows) {
        return Err(Error::DimensionMismatch {
            what: "column length",
            expected: n_rows,
            actual: bad.len(),
        });
    }

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(headers)?;
    for row in 0..n_rows {
        wtr.write_record(columns.iter().map(|c| c[row].to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}
