// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! dynmesh CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dynmesh::cli::Reporter;
use dynmesh::{analyze, csg, io, CsgConfig, DynamicMesh};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dynmesh")]
#[command(about = "Mesh topology store and boolean difference of STL solids", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Subtract solid B from solid A
    Difference {
        /// Minuend STL file
        a: PathBuf,

        /// Subtrahend STL file
        b: PathBuf,

        /// Output STL file
        #[arg(short, long)]
        output: PathBuf,

        /// Intersection tolerance (overrides the config)
        #[arg(short, long)]
        tolerance: Option<f64>,

        /// TOML config file (defaults to dynmesh.toml plus DYNMESH_* variables)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print statistics of an STL file
    Info {
        /// Input STL file
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Difference {
            a,
            b,
            output,
            tolerance,
            config,
        } => difference_command(a, b, output, *tolerance, config.as_deref()),
        Commands::Info { input } => info_command(input),
    };

    if let Err(e) = result {
        Reporter::report_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_operand(path: &Path, weld_tolerance: f64) -> Result<DynamicMesh> {
    let mesh = io::import_stl(path)?;
    let dynamic = DynamicMesh::from_mesh_welded(&mesh, weld_tolerance)
        .with_context(|| format!("Invalid mesh in {}", path.display()))?;
    if !dynamic.represents_volume() {
        Reporter::report_warning(&format!(
            "{} is not a closed orientable surface; the result may be incomplete",
            path.display()
        ));
    }
    Ok(dynamic)
}

fn difference_command(
    a: &Path,
    b: &Path,
    output: &Path,
    tolerance: Option<f64>,
    config: Option<&Path>,
) -> Result<()> {
    let mut config = match config {
        Some(path) => CsgConfig::from_file(path)?,
        None => CsgConfig::load()?,
    };
    if let Some(tolerance) = tolerance {
        config = config.with_tolerance(tolerance);
        config.validate()?;
    }

    let mesh_a = load_operand(a, config.weld_tolerance)?;
    let mesh_b = load_operand(b, config.weld_tolerance)?;

    let start = Instant::now();
    let (result, report) = csg::csg_difference_report(mesh_a, mesh_b, &config)
        .with_context(|| format!("Failed to subtract {} from {}", b.display(), a.display()))?;
    let duration = start.elapsed();

    let mesh = result.to_mesh();
    io::export_stl(&mesh, output)?;

    Reporter::report_difference(&output.display().to_string(), &report, &analyze(&mesh), duration);
    Reporter::success(&format!("Wrote {}", output.display()));
    Ok(())
}

fn info_command(input: &Path) -> Result<()> {
    let mesh = io::import_stl(input)?;
    let dynamic = DynamicMesh::from_mesh(&mesh)
        .with_context(|| format!("Invalid mesh in {}", input.display()))?;
    Reporter::report_stats(
        &input.display().to_string(),
        &analyze(&mesh),
        dynamic.separate_surfaces().len(),
    );
    Ok(())
}
