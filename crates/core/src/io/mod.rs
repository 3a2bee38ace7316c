//! I/O operations for reading and writing sample tables

mod table;

pub use table::{
    read_samples, read_samples_from_reader, write_columns, SampleLayout, SampleTable,
};
