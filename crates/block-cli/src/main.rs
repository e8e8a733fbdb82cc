//! typeblock: turn SVG artwork into a printable letterpress type block.
//!
//! Usage:
//!   typeblock analyze <artwork.svg>
//!   typeblock build <artwork.svg> --out <dir> [--neck-height H] [--fillet]
//!                   [--skip-path N]... [--ascii] [--config job.json]

mod job;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use block_bridge::{analyze_artwork, BlockService, KernelFactory};
use block_ops::ParameterOverrides;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::job::JobConfig;

/// Build 3D-printable type blocks from SVG artwork
#[derive(Parser, Debug)]
#[command(name = "typeblock")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report path count, estimated size and scale tier
    Analyze {
        #[arg(value_name = "SVG")]
        input: PathBuf,

        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build the block and write `<id>.svg` and `<id>.stl`
    Build {
        #[arg(value_name = "SVG")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        out: PathBuf,

        /// Job file (JSON) with overrides, options and export settings
        #[arg(short, long, value_name = "JOB")]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: OverrideArgs,

        /// Round the outer edges
        #[arg(long)]
        fillet: bool,

        /// Leave path N out of the relief (repeatable)
        #[arg(long = "skip-path", value_name = "N")]
        skip_paths: Vec<usize>,

        /// Write ASCII STL instead of binary
        #[arg(long)]
        ascii: bool,
    },
}

#[derive(Args, Debug)]
struct OverrideArgs {
    /// Relief height in scaled units
    #[arg(long)]
    neck_height: Option<f64>,
    #[arg(long)]
    x_len_adj: Option<f64>,
    #[arg(long)]
    y_len_adj: Option<f64>,
    #[arg(long)]
    x_hollow_percentage: Option<f64>,
    #[arg(long)]
    y_hollow_percentage: Option<f64>,
    /// Fraction of the block depth cut out for the feet
    #[arg(long)]
    feet_cut_out_percentage: Option<f64>,
    #[arg(long)]
    fillet_amount: Option<f64>,
    /// Force a scale factor instead of the artwork's tier
    #[arg(long)]
    scale_by: Option<f64>,
}

impl From<OverrideArgs> for ParameterOverrides {
    fn from(a: OverrideArgs) -> Self {
        ParameterOverrides {
            neck_height: a.neck_height,
            x_len_adj: a.x_len_adj,
            y_len_adj: a.y_len_adj,
            x_hollow_percentage: a.x_hollow_percentage,
            y_hollow_percentage: a.y_hollow_percentage,
            feet_cut_out_percentage: a.feet_cut_out_percentage,
            fillet_amount: a.fillet_amount,
            scale_by: a.scale_by,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(filter).with_target(false).compact().init();

    match cli.command {
        Commands::Analyze { input, json } => cmd_analyze(&input, json),
        Commands::Build {
            input,
            out,
            config,
            overrides,
            fillet,
            skip_paths,
            ascii,
        } => {
            let mut job = match config {
                Some(path) => JobConfig::load(&path)?,
                None => JobConfig::default(),
            };
            job.apply_overrides(&overrides.into());
            job.options.fillet |= fillet;
            job.options.skip_paths.extend(skip_paths);
            if ascii {
                job.export.format = block_export::StlFormat::Ascii;
            }
            let mut service = BlockService::new(kernel_factory()?);
            cmd_build(&mut service, &input, &out, &job)
        }
    }
}

#[cfg(feature = "truck")]
fn kernel_factory() -> Result<KernelFactory> {
    Ok(Box::new(|| {
        Box::new(block_kernel::TruckKernel::new()) as Box<dyn block_kernel::KernelBundle>
    }))
}

/// The mock kernel only models bounding envelopes; its output is not a
/// printable block.
#[cfg(not(feature = "truck"))]
fn kernel_factory() -> Result<KernelFactory> {
    bail!("typeblock was built without a geometry kernel; rebuild with `--features truck` to build blocks")
}

fn read_svg(input: &Path) -> Result<String> {
    fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))
}

fn cmd_analyze(input: &Path, json: bool) -> Result<()> {
    let svg = read_svg(input)?;
    let analysis = analyze_artwork(&svg)
        .with_context(|| format!("failed to analyze {}", input.display()))?;

    if json {
        let value = serde_json::json!({
            "path_count": analysis.path_count,
            "estimated_width": analysis.bounds.width(),
            "estimated_height": analysis.bounds.height(),
            "scale_tier": analysis.scale_tier,
            "warnings": analysis.warnings,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("paths:      {}", analysis.path_count);
    println!(
        "size:       {:.3} x {:.3}",
        analysis.bounds.width(),
        analysis.bounds.height()
    );
    println!(
        "scale tier: {:?} (x{})",
        analysis.scale_tier,
        analysis.scale_tier.scale_by()
    );
    for warning in &analysis.warnings {
        println!("warning:    {warning}");
    }
    Ok(())
}

fn cmd_build(service: &mut BlockService, input: &Path, out: &Path, job: &JobConfig) -> Result<()> {
    let svg = read_svg(input)?;
    if out.exists() && !out.is_dir() {
        bail!("output path is not a directory: {}", out.display());
    }
    fs::create_dir_all(out).with_context(|| format!("failed to create {}", out.display()))?;

    let outcome = service
        .build(&svg, &job.overrides, job.options.clone(), &job.export)
        .with_context(|| format!("failed to build {}", input.display()))?;

    for id in [outcome.preview_id, outcome.mesh_id] {
        let artifact = service.release(id)?;
        let path = out.join(artifact.file_name());
        fs::write(&path, &artifact.bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "wrote artifact");
        println!("{}", path.display());
    }
    for warning in &outcome.report.warnings {
        println!("warning: {warning}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "truck"))]
    #[test]
    fn build_needs_a_geometry_kernel() {
        match kernel_factory() {
            Ok(_) => panic!("a kernel factory without the truck feature"),
            Err(e) => assert!(e.to_string().contains("--features truck")),
        }
    }

    #[test]
    fn analyze_runs_without_a_kernel() {
        let dir = std::env::temp_dir().join(format!("typeblock-analyze-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let input = dir.join("square.svg");
        fs::write(&input, r#"<svg><path d="M0 0 H50 V50 H0 Z"/></svg>"#).unwrap();
        cmd_analyze(&input, true).unwrap();
        fs::remove_dir_all(&dir).unwrap();
    }
}
