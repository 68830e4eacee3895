// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! patchx - intersect two surface patches from the command line.
//!
//! Patches are JSON files of the form `{"points": [[x, y, z], ..],
//! "faces": [[i, j, k, ..], ..]}`. Candidate face pairs are found with a
//! bounding-box search; intersection parameters come from `PATCHX_*`
//! environment variables (see [`config::Config::from_env`]).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use patchx_intersection::{candidate_pairs, PatchIntersection};
use patchx_mesh::SurfaceMesh;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "patchx")]
#[command(about = "Intersect a source and a target surface patch", long_about = None)]
struct Cli {
    /// Source patch (JSON)
    source: PathBuf,
    /// Target patch (JSON)
    target: PathBuf,
    /// Write the intersection mesh and correspondence tables to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,
    /// Orient faces like the target patch
    #[arg(long)]
    orient_to_target: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,patchx_intersection=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if cli.orient_to_target {
        config.intersection.orient_to_source = false;
    }

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads)
        .build_global()
        .context("Failed to initialize worker pool")?;

    let src = load_patch(&cli.source)?;
    let tgt = load_patch(&cli.target)?;

    let candidates = candidate_pairs(&src, &tgt, config.margin);
    tracing::info!(
        candidates = candidates.len(),
        margin = config.margin,
        worker_threads = config.worker_threads,
        "Starting patch intersection"
    );

    let result = PatchIntersection::new(&src, &tgt, &candidates, &config.intersection)
        .context("Intersection failed")?;

    let report = result.report(&src, &tgt);
    report.log();
    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report);
    }

    if let Some(path) = &cli.output {
        fs::write(path, result.to_json()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote intersection");
    }

    Ok(())
}

fn load_patch(path: &Path) -> Result<SurfaceMesh> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mesh: SurfaceMesh = serde_json::from_str(&json)
        .with_context(|| format!("Invalid patch in {}", path.display()))?;
    tracing::debug!(path = %path.display(), faces = mesh.faces().len(), "Loaded patch");
    Ok(mesh)
}
