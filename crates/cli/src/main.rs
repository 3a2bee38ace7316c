//! localkrige CLI - regression with local kriging of residuals

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use localkrige_algorithms::interpolation::{LocalRegressionKriging, LocalRegressionKrigingParams};
use localkrige_algorithms::regression::{LinearRegression, MeanRegressor, Regressor};
use localkrige_core::io::{read_samples, write_columns, SampleLayout, SampleTable};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "localkrige")]
#[command(author, version, about = "Regression with local kriging of residuals", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit on a training table and predict every row of a query table
    Predict {
        #[command(flatten)]
        model: ModelArgs,
        /// Query CSV (same coordinate and feature columns, no target needed)
        #[arg(short, long)]
        query: PathBuf,
        /// Output CSV (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Fit on a training table and write the regression residuals
    Residuals {
        #[command(flatten)]
        model: ModelArgs,
        /// Output CSV (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ModelArgs {
    /// Training CSV with coordinates, features and target
    #[arg(short, long)]
    train: PathBuf,
    /// X coordinate column
    #[arg(long, default_value = "x")]
    x_col: String,
    /// Y coordinate column
    #[arg(long, default_value = "y")]
    y_col: String,
    /// Target column
    #[arg(long, default_value = "z")]
    target_col: String,
    /// Feature columns, comma separated
    #[arg(short, long, value_delimiter = ',')]
    features: Vec<String>,
    /// Kriging method: ordinary, universal
    #[arg(short, long, default_value = "ordinary")]
    kriging: String,
    /// Variogram model: linear, spherical, exponential, gaussian, hole-effect
    #[arg(long, default_value = "linear")]
    variogram: String,
    /// Neighbors per local correction
    #[arg(short, long, default_value = "16")]
    num_points: usize,
    /// Base regression model
    #[arg(short, long, value_enum, default_value = "linear")]
    regressor: RegressorKind,
}

#[derive(Clone, Copy, ValueEnum)]
enum RegressorKind {
    /// Ordinary least squares on the feature columns
    Linear,
    /// Training mean, ignores features
    Mean,
}

type BoxedRegressor = Box<dyn Regressor + Send + Sync>;

impl RegressorKind {
    fn build(self) -> BoxedRegressor {
        match self {
            RegressorKind::Linear => Box::new(LinearRegression::new()),
            RegressorKind::Mean => Box::new(MeanRegressor::new()),
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn layout(args: &ModelArgs, with_target: bool) -> SampleLayout {
    SampleLayout {
        x_column: args.x_col.clone(),
        y_column: args.y_col.clone(),
        feature_columns: args.features.clone(),
        target_column: with_target.then(|| args.target_col.clone()),
        ..SampleLayout::default()
    }
}

fn read_table(path: &Path, layout: &SampleLayout) -> Result<SampleTable> {
    let pb = spinner("Reading samples...");
    let table = read_samples(path, layout)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    pb.finish_and_clear();
    info!(
        "Input: {} rows, {} features ({})",
        table.len(),
        table.features.ncols(),
        path.display()
    );
    Ok(table)
}

fn train(args: &ModelArgs) -> Result<(SampleTable, LocalRegressionKriging<BoxedRegressor>)> {
    let params =
        LocalRegressionKrigingParams::parse(&args.kriging, &args.variogram, args.num_points)
            .context("Invalid model parameters")?;
    let table = read_table(&args.train, &layout(args, true))?;
    let targets = table
        .targets
        .as_ref()
        .with_context(|| format!("Training table has no '{}' column", args.target_col))?;

    let mut model = LocalRegressionKriging::new(&table.coordinates, args.regressor.build(), params)
        .context("Failed to set up local regression kriging")?;

    let pb = spinner("Fitting regression...");
    model
        .fit(table.features.view(), targets.view())
        .context("Failed to fit model")?;
    pb.finish_and_clear();
    debug!("Trained on {} samples", table.len());

    Ok((table, model))
}

fn output_writer(output: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    })
}

fn done(name: &str, output: Option<&Path>, elapsed: std::time::Duration) {
    if let Some(path) = output {
        println!("{} saved to: {}", name, path.display());
        println!("  Processing time: {:.2?}", elapsed);
    } else {
        info!("{} processing time: {:.2?}", name, elapsed);
    }
}

fn split_coordinates(table: &SampleTable) -> (Vec<f64>, Vec<f64>) {
    table.coordinates.iter().map(|c| (c.x, c.y)).unzip()
}

// ─── Commands ───────────────────────────────────────────────────────────

fn run_predict(model_args: &ModelArgs, query: &Path, output: Option<&Path>) -> Result<()> {
    let start = Instant::now();
    let (_, model) = train(model_args)?;

    let query_table = read_table(query, &layout(model_args, false))?;

    let pb = spinner("Kriging residual corrections...");
    let predictions = model
        .predict_points(query_table.features.view(), &query_table.coordinates)
        .context("Prediction failed")?;
    pb.finish_and_clear();

    let (xs, ys) = split_coordinates(&query_table);
    let values = predictions.to_vec();
    write_columns(
        output_writer(output)?,
        &["x", "y", "prediction"],
        &[xs.as_slice(), ys.as_slice(), values.as_slice()],
    )
    .context("Failed to write predictions")?;

    done("Predictions", output, start.elapsed());
    Ok(())
}

fn run_residuals(model_args: &ModelArgs, output: Option<&Path>) -> Result<()> {
    let start = Instant::now();
    let (table, model) = train(model_args)?;

    let (xs, ys) = split_coordinates(&table);
    let targets = table
        .targets
        .as_ref()
        .map(|t| t.to_vec())
        .unwrap_or_default();
    write_columns(
        output_writer(output)?,
        &["x", "y", "target", "residual"],
        &[xs.as_slice(), ys.as_slice(), targets.as_slice(), model.residuals()],
    )
    .context("Failed to write residuals")?;

    done("Residuals", output, start.elapsed());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Predict {
            model,
            query,
            output,
        } => run_predict(&model, &query, output.as_deref()),
        Commands::Residuals { model, output } => run_residuals(&model, output.as_deref()),
    }
}
