// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::Context;
use std::env;
use std::time::Instant;
use the_stategraph::config::{load_and_validate_config, EngineConfig};
use the_stategraph::log_analysis::{load_logs, LogAnalysis};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOGS: &str = "configs/sample-logs.yaml";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "-h" || a == "--help") || args.len() > 3 {
        eprintln!("Usage: {} [logs.yaml] [engine.yaml]", args[0]);
        eprintln!("Example: {} {} configs/engine.yaml", args[0], DEFAULT_LOGS);
        std::process::exit(1);
    }

    let logs_file = args.get(1).map(String::as_str).unwrap_or(DEFAULT_LOGS);
    let config_file = args.get(2).map(String::as_str);

    if let Err(e) = run(logs_file, config_file).await {
        eprintln!("❌ Analysis failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(logs_file: &str, config_file: Option<&str>) -> anyhow::Result<()> {
    let start_time = Instant::now();

    let config = match config_file {
        Some(path) => load_and_validate_config(path)
            .with_context(|| format!("loading engine config {}", path))?,
        None => EngineConfig::default(),
    };
    let logs = load_logs(logs_file).with_context(|| format!("loading logs {}", logs_file))?;

    let options = config.engine_options();
    println!("🚀 State Graph Log Analysis");
    println!("═══════════════════════════");
    println!("📋 Logs: {} ({} records)", logs_file, logs.len());
    println!("⚙️  Max Concurrency: {}", options.max_concurrency);
    println!("🛡️  Merge Mode: {:?}", options.merge_mode);

    let analysis = LogAnalysis::build(config.engine()).context("building entry graph")?;

    println!("\n🔄 Graph '{}':", analysis.graph().name());
    for (i, level) in analysis.graph().topological_levels().iter().enumerate() {
        println!("  step {}: {}", i + 1, level.join(", "));
    }

    let execution_start = Instant::now();
    let report = analysis.analyze(&logs).await?;
    let execution_time = execution_start.elapsed();

    println!("\n📊 Results:");
    println!("⏱️  Execution Time: {:?}", execution_time);
    println!("🔍 Failure Summary: {}", report.fa_summary);
    println!("📝 Report: {}", report.report);
    println!("🔢 Processed Logs: {}", report.processed_logs.len());
    for entry in &report.processed_logs {
        println!("   • {}", entry);
    }

    println!("\n⏱️  Total Time (including load): {:?}", start_time.elapsed());
    Ok(())
}
