//! CLI Entry Point for adv-turbulence
//!
//! Provides command-line access to:
//! - Processing one ADV record from CSV tables (or a NetCDF export)
//! - Printing/writing the log-law profile of the flume
//! - Showing the effective configuration
//!
//! # Usage
//!
//! ```bash
//! adv-turbulence process --velocity vel.csv --bottom bottom.csv --output-dir out/
//! adv-turbulence netcdf run01.nc --json
//! adv-turbulence log-law --depth 0.15 --width 0.205 --slope 0.001
//! ```

use adv_turbulence::config::{AnalysisConfig, DEFAULT_CONFIG_PATH};
use adv_turbulence::data::log_law::{log_law_profile, ChannelGeometry};
use adv_turbulence::data::netcdf_loader::read_netcdf;
use adv_turbulence::data::pipeline::{process_file, FileResult, PipelineConfig};
use adv_turbulence::data::storage::{
    read_bottom_csv, read_velocity_csv, write_decomposition_csv, write_elevation_csv,
};
use adv_turbulence::measurement_types::{BottomFrame, Channel, VelocityFrame};
use adv_turbulence::tracing_setup;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "adv-turbulence")]
#[command(about = "Turbulence statistics and log-law profiles from ADV records", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one record given as CSV tables
    Process {
        /// Velocity table (time, u/v/w or VelocityX/VelocityY/VelocityZ1)
        #[arg(long)]
        velocity: PathBuf,

        /// Bottom-check table (time, BottomDistance)
        #[arg(long)]
        bottom: PathBuf,

        #[command(flatten)]
        opts: ProcessOpts,
    },

    /// Process one record from a Vectrino NetCDF file
    Netcdf {
        /// Path to .nc file
        file: PathBuf,

        #[command(flatten)]
        opts: ProcessOpts,
    },

    /// Print the log-law velocity profile of the flume
    LogLaw {
        /// Flow depth [m]
        #[arg(long)]
        depth: Option<f64>,

        /// Flume width [m]
        #[arg(long)]
        width: Option<f64>,

        /// Bed slope [-]
        #[arg(long)]
        slope: Option<f64>,

        /// Gravitational acceleration [m/s2]
        #[arg(long)]
        gravity: Option<f64>,

        /// Kinematic viscosity [m2/s]
        #[arg(long)]
        viscosity: Option<f64>,

        /// Number of profile points
        #[arg(long)]
        points: Option<usize>,

        /// Write the profile to this CSV file instead of stdout
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args)]
struct ProcessOpts {
    /// Probe offset [m], overrides the configuration
    #[arg(long)]
    probe_offset: Option<f64>,

    /// Outlier threshold in standard deviations, overrides the configuration
    #[arg(long)]
    z_threshold: Option<f64>,

    /// Skip outlier masking
    #[arg(long)]
    no_mask: bool,

    /// Directory for decomposition.csv and elevation.csv
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AnalysisConfig::load_from(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    config.validate()?;
    tracing_setup::init_from_config(&config).map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Process {
            velocity,
            bottom,
            opts,
        } => {
            let frame = read_velocity_csv(&velocity, &config.input.vertical_component)
                .with_context(|| format!("reading {}", velocity.display()))?;
            let bottom = read_bottom_csv(&bottom)
                .with_context(|| format!("reading {}", bottom.display()))?;
            run_pipeline(&config, &frame, &bottom, &opts)
        }
        Commands::Netcdf { file, opts } => {
            let record = read_netcdf(&file, &config.input.vertical_component)
                .with_context(|| format!("reading {}", file.display()))?;
            run_pipeline(&config, &record.velocity, &record.bottom, &opts)
        }
        Commands::LogLaw {
            depth,
            width,
            slope,
            gravity,
            viscosity,
            points,
            csv,
        } => {
            let mut flume = config.flume;
            flume.depth = depth.unwrap_or(flume.depth);
            flume.width = width.unwrap_or(flume.width);
            flume.slope = slope.unwrap_or(flume.slope);
            flume.gravity = gravity.unwrap_or(flume.gravity);
            flume.kinematic_viscosity = viscosity.unwrap_or(flume.kinematic_viscosity);
            flume.resolution = points.unwrap_or(flume.resolution);

            let geometry = ChannelGeometry::new(flume.width, flume.depth)?;
            let tau = geometry.bed_shear_stress(flume.water_density, flume.gravity, flume.slope)?;
            let profile = log_law_profile(&flume.log_law_params())?;

            println!("Area:              {:.5} m²", geometry.area());
            println!("Wetted perimeter:  {:.4} m", geometry.wetted_perimeter());
            println!("Hydraulic radius:  {:.5} m", profile.hydraulic_radius);
            println!("Bed shear stress:  {:.4} Pa", tau);
            println!("Shear velocity:    {:.5} m/s", profile.shear_velocity);

            match csv {
                Some(path) => {
                    let mut out = String::from("elevation,velocity\n");
                    for s in &profile.samples {
                        out.push_str(&format!("{},{}\n", s.elevation, s.velocity));
                    }
                    std::fs::write(&path, out)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(path = %path.display(), points = profile.samples.len(), "Profile written");
                }
                None => {
                    println!();
                    println!("{:>12} {:>12}", "y [m]", "u [m/s]");
                    for s in &profile.samples {
                        println!("{:>12.6} {:>12.5}", s.elevation, s.velocity);
                    }
                }
            }
            Ok(())
        }
        Commands::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

/// Pipeline parameters from the configuration with command-line overrides applied.
fn pipeline_config(config: &AnalysisConfig, opts: &ProcessOpts) -> PipelineConfig {
    let mut pipeline = config.pipeline_config();
    if let Some(offset) = opts.probe_offset {
        pipeline.probe_offset = offset;
    }
    if let Some(z) = opts.z_threshold {
        pipeline.z_threshold = z;
    }
    if opts.no_mask {
        pipeline.mask_outliers = false;
    }
    pipeline
}

fn process_record(
    config: &AnalysisConfig,
    velocity: &VelocityFrame,
    bottom: &BottomFrame,
    opts: &ProcessOpts,
) -> Result<FileResult> {
    let result = process_file(velocity, bottom, &pipeline_config(config, opts))?;
    if let Some(dir) = &opts.output_dir {
        write_outputs(dir, &result)?;
    }
    Ok(result)
}

fn run_pipeline(
    config: &AnalysisConfig,
    velocity: &VelocityFrame,
    bottom: &BottomFrame,
    opts: &ProcessOpts,
) -> Result<()> {
    let result = process_record(config, velocity, bottom, opts)?;
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&summary_json(config, &result)?)?);
    } else {
        print_summary(config, &result)?;
    }
    Ok(())
}

fn write_outputs(dir: &Path, result: &FileResult) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    write_decomposition_csv(&dir.join("decomposition.csv"), result)?;
    write_elevation_csv(&dir.join("elevation.csv"), &result.elevation)?;
    Ok(())
}

fn summary_json(config: &AnalysisConfig, result: &FileResult) -> Result<serde_json::Value> {
    let d = &result.decomposition;
    Ok(json!({
        "elevation": result.elevation_summary()?,
        "masked": result.masked,
        "mean": d.mean,
        "mean_stress": d.mean_stress()?,
        "reynolds_stress_pa": d.reynolds_stress(config.flume.water_density)?,
        "rms": d.rms()?,
        "turbulence_intensity": d.turbulence_intensity()?,
        "tke": d.tke,
    }))
}

fn print_summary(config: &AnalysisConfig, result: &FileResult) -> Result<()> {
    let d = &result.decomposition;
    let elevation = result.elevation_summary()?;
    let rms = d.rms()?;

    println!(
        "Sample elevation: {:.3} ± {} m  (min {:.3}, max {:.3}, n = {})",
        elevation.mean,
        format_std(elevation.std),
        elevation.min,
        elevation.max,
        elevation.count
    );
    println!();
    println!("{:>4} {:>10} {:>10} {:>8}", "", "mean", "rms", "masked");
    for c in Channel::ALL {
        println!(
            "{:>4} {:>10.4} {:>10.4} {:>8}",
            c.name(),
            d.mean[c],
            rms[c],
            result.masked[c]
        );
    }
    println!();

    let mean = d.mean_stress()?;
    let tau = d.reynolds_stress(config.flume.water_density)?;
    println!("{:>6} {:>12} {:>12}", "", "<ui'uj'>", "tau' [Pa]");
    for (name, (m, t)) in ["u'u'", "v'v'", "w'w'", "u'v'", "v'w'", "w'u'"]
        .iter()
        .zip(mean.entries().into_iter().zip(tau.entries()))
    {
        println!("{:>6} {:>12.3e} {:>12.3e}", name, m, t);
    }
    println!();
    println!("TKE: {:.3e} m²/s²", d.tke);
    Ok(())
}

/// Standard deviation for display; undefined for a single reading.
fn format_std(std: Option<f64>) -> String {
    match std {
        Some(std) => format!("{:.3}", std),
        None => "n/a".to_string(),
    }
}
