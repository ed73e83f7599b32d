//! Replay scripted AR sessions

use anyhow::{Context, Result};
use colored::*;
use hitplace_core::sim::{run_scenario, Scenario, SimulationReport};
use hitplace_core::{ArtifactSink, DirectorySink, GltfModelProvider, HitplaceConfig};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Instant;

/// Replay `scenario` (or the demo session) and deliver any exports
pub async fn simulate(
    scenario: Option<PathBuf>,
    output: Option<PathBuf>,
    json: bool,
    config: &HitplaceConfig,
) -> Result<()> {
    let start = Instant::now();
    let scenario = match scenario.as_ref() {
        Some(path) => Scenario::load(path)
            .with_context(|| format!("failed to load scenario {}", path.display()))?,
        None => Scenario::demo(),
    };

    if !json {
        println!("{} Hitplace simulation", "→".blue().bold());
        println!(
            "  Scenario: {} ms, {} events, {} surfaces",
            scenario.duration_ms,
            scenario.events.len(),
            scenario.surfaces.len()
        );
    }

    let report = run_scenario(&scenario, config, &GltfModelProvider).await?;

    let output_dir = output
        .or_else(|| config.export.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let mut sink = DirectorySink::new(output_dir);
    for artifact in &report.artifacts {
        sink.deliver(artifact)
            .with_context(|| format!("failed to write {}", artifact.filename))?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print!("{}", summarize(&report));
    for notice in &report.notices {
        println!("{} {}", "!".yellow().bold(), notice);
    }
    for path in sink.written() {
        println!("{} Exported {}", "✓".green(), path.display());
    }
    println!(
        "{} Replayed {} ms of session time in {:.2?}",
        "✓".green().bold(),
        scenario.duration_ms,
        start.elapsed()
    );
    Ok(())
}

/// Human-readable report body
pub fn summarize(report: &SimulationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  Frames: {} ({} with reticle)", report.frames, report.reticle_frames);
    let _ = writeln!(out, "  Handshake: {}", report.final_state);
    let _ = writeln!(out, "  Selects: {}, placed: {}", report.selects, report.placed.len());
    for placed in &report.placed {
        let [x, y, z] = placed.position;
        let _ = writeln!(out, "    {} at ({:.2}, {:.2}, {:.2})", placed.name, x, y, z);
    }

    if report.samples.is_empty() {
        let _ = writeln!(out, "  Samples: none");
    } else {
        let fps: Vec<u32> = report.samples.iter().map(|s| s.fps).collect();
        let min = fps.iter().copied().min().unwrap_or_default();
        let max = fps.iter().copied().max().unwrap_or_default();
        let mean = fps.iter().map(|&f| f64::from(f)).sum::<f64>() / fps.len() as f64;
        let _ = writeln!(
            out,
            "  Samples: {} (min {} / mean {:.1} / max {} fps)",
            fps.len(),
            min,
            mean,
            max
        );
    }
    out
}
