//! `catreg`: register reconstructed catheter surfaces onto segmented ones.

mod phantom;
mod progress_bar;

use anyhow::{bail, Context, Result};
use catreg_core::{RigidTransform, Vector3};
use catreg_io::{
    read_catheter_folder, read_obj, read_transform_json, write_histogram_csv, write_report_json,
    write_transform_json,
};
use catreg_registration::{
    CatheterRegistration, CorrespondenceMetric, DistanceHistogramAnalyzer, IcpConfig, PipelineConfig,
    ProgressTracker,
};
use clap::{Args, Parser, Subcommand};
use phantom::PhantomConfig;
use progress_bar::BarProgress;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_BINS: usize = 100;
/// ICP iteration cap for `register`.
const DEFAULT_MAX_ITERATIONS: usize = 500;

#[derive(Parser)]
#[command(name = "catreg")]
#[command(about = "Catheter surface registration and distance analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a folder of reconstructed catheters onto a folder of segmented catheters
    Register(RegisterArgs),
    /// Distance histogram from one surface to another
    Analyze(AnalyzeArgs),
    /// Write a synthetic catheter phantom with a known misalignment
    Phantom(PhantomArgs),
}

#[derive(Args)]
struct RegisterArgs {
    /// Folder of reconstructed catheter OBJ files
    #[arg(long)]
    reconstructed: PathBuf,

    /// Folder of segmented catheter OBJ files
    #[arg(long)]
    segmented: PathBuf,

    /// Histogram bins (defaults to 100 when --histogram is given)
    #[arg(long)]
    bins: Option<usize>,

    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// Stop once the MSE improves by less than this
    #[arg(long, default_value_t = 1e-10)]
    threshold: f64,

    /// Wall-clock budget for the registration, in seconds
    #[arg(long)]
    time_budget: Option<f64>,

    /// Pair with the closest vertex instead of the closest surface point
    #[arg(long)]
    point_to_point: bool,

    /// Also estimate a uniform scale
    #[arg(long)]
    with_scale: bool,

    /// Starting transform (JSON)
    #[arg(long)]
    initial: Option<PathBuf>,

    /// Run single-threaded
    #[arg(long)]
    sequential: bool,

    /// Hide the progress bar
    #[arg(long)]
    quiet: bool,

    /// Write the distance histogram here (CSV)
    #[arg(long)]
    histogram: Option<PathBuf>,

    /// Write the fitted transform here (JSON)
    #[arg(long)]
    transform: Option<PathBuf>,

    /// Write the full run report here (JSON)
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Surface distances are measured to
    #[arg(long)]
    reference: PathBuf,

    /// Surface whose points are measured
    #[arg(long)]
    compare: PathBuf,

    /// Transform applied to the compare surface (JSON)
    #[arg(long)]
    transform: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_BINS)]
    bins: usize,

    /// Write the histogram here (CSV)
    #[arg(long)]
    histogram: Option<PathBuf>,
}

#[derive(Args)]
struct PhantomArgs {
    /// Output folder, receives segmented/, reconstructed/ and ground_truth.json
    #[arg(long)]
    output: PathBuf,

    #[arg(long, default_value_t = 3)]
    catheters: usize,

    /// Translation of the reconstructed side
    #[arg(
        long,
        num_args = 3,
        value_names = ["X", "Y", "Z"],
        allow_negative_numbers = true,
        default_values_t = [2.0, -1.0, 0.5]
    )]
    offset: Vec<f64>,

    /// Rotation of the reconstructed side about the vertical axis, in degrees
    #[arg(long, default_value_t = 3.0, allow_negative_numbers = true)]
    angle: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Register(args) => register(args)?,
        Commands::Analyze(args) => analyze(args)?,
        Commands::Phantom(args) => phantom(args)?,
    }

    Ok(())
}

fn time_budget(seconds: f64) -> Result<Duration> {
    if !seconds.is_finite() || seconds <= 0.0 {
        bail!("Time budget must be a positive number of seconds, got {}", seconds);
    }
    Duration::try_from_secs_f64(seconds)
        .with_context(|| format!("Time budget of {} seconds is out of range", seconds))
}

fn register(args: RegisterArgs) -> Result<()> {
    let reconstructed = read_catheter_folder(&args.reconstructed, "Reconstructed Catheter Models")?;
    let segmented = read_catheter_folder(&args.segmented, "Segmented Catheter Models")?;

    let metric = if args.point_to_point {
        CorrespondenceMetric::PointToPoint
    } else {
        CorrespondenceMetric::PointToSurface
    };
    let mut icp = IcpConfig::new()
        .with_max_iterations(args.max_iterations)
        .with_convergence_threshold(args.threshold)
        .with_metric(metric)
        .with_parallel(!args.sequential)
        .with_scale_estimation(args.with_scale);
    if let Some(seconds) = args.time_budget {
        icp = icp.with_max_duration(time_budget(seconds)?);
    }

    let mut config = PipelineConfig::new().with_icp(icp);
    if let Some(bins) = args.bins.or(args.histogram.as_ref().map(|_| DEFAULT_BINS)) {
        config = config.with_histogram_bins(bins);
    }
    if let Some(path) = &args.initial {
        config = config.with_initial_transform(read_transform_json(path)?);
    }

    let mut tracker = ProgressTracker::new();
    if !args.quiet {
        tracker.add_callback(Arc::new(BarProgress::new(args.max_iterations)?));
    }

    let report = CatheterRegistration::new(config)
        .with_progress(tracker)
        .run(&reconstructed, &segmented)
        .context("Catheter registration failed")?;

    for warning in &report.registration.warnings {
        warn!("{}", warning);
    }

    let transform = report.transform();
    println!("Catheters:          {}", report.catheter_count);
    println!("Iterations:         {}", report.registration.iterations);
    println!("Converged:          {}", report.registration.converged);
    println!("RMSE:               {:.6}", report.registration.rmse());
    println!("Registration error: {:.6}", report.registration_error);
    println!("Rotation (deg):     {:.4}", transform.rotation_angle().to_degrees());
    let t = transform.translation();
    println!("Translation:        [{:.4}, {:.4}, {:.4}]", t.x, t.y, t.z);
    if let Some(histogram) = &report.histogram {
        println!("Average Hausdorff:  {:.6}", histogram.average_hausdorff);
        println!("Maximum Hausdorff:  {:.6}", histogram.maximum_hausdorff);
    }

    if let (Some(path), Some(histogram)) = (&args.histogram, &report.histogram) {
        write_histogram_csv(path, histogram)?;
        info!("Histogram written to {}", path.display());
    }
    if let Some(path) = &args.transform {
        write_transform_json(path, transform)?;
        info!("Transform written to {}", path.display());
    }
    if let Some(path) = &args.report {
        write_report_json(path, &report)?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}

fn analyze(args: AnalyzeArgs) -> Result<()> {
    let reference = read_obj(&args.reference)?;
    let compare = read_obj(&args.compare)?;
    let transform = match &args.transform {
        Some(path) => read_transform_json(path)?,
        None => RigidTransform::identity(),
    };

    let histogram = DistanceHistogramAnalyzer::new(args.bins)
        .analyze(&reference, &compare, &transform)
        .context("Distance analysis failed")?;

    println!("Samples:            {}", histogram.sample_count);
    println!("Bins:               {}", histogram.num_bins());
    println!("Bin width:          {:.6}", histogram.bin_width());
    println!("Average Hausdorff:  {:.6}", histogram.average_hausdorff);
    println!("Maximum Hausdorff:  {:.6}", histogram.maximum_hausdorff);

    if let Some(path) = &args.histogram {
        write_histogram_csv(path, &histogram)?;
        info!("Histogram written to {}", path.display());
    }
    Ok(())
}

fn phantom(args: PhantomArgs) -> Result<()> {
    let &[x, y, z] = args.offset.as_slice() else {
        bail!("--offset takes exactly three values");
    };
    let config = PhantomConfig {
        catheters: args.catheters,
        offset: Vector3::new(x, y, z),
        angle_degrees: args.angle,
        ..PhantomConfig::default()
    };

    let phantom = phantom::write_phantom(&args.output, &config)?;
    let truth = &phantom.ground_truth;
    println!("Catheters:          {}", config.catheters);
    println!("Ground truth angle: {:.4} deg", truth.rotation_angle().to_degrees());
    println!(
        "Try: catreg register --reconstructed {0}/reconstructed --segmented {0}/segmented (raise --max-iterations if it stops before converging)",
        args.output.display()
    );
    Ok(())
}
