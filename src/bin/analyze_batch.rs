//! Analyze JSON batches and print their reports as JSON
//!
//! Usage: analyze_batch <batch.json> [more.json ...]
//!
//! Logs go to stderr (RUST_LOG, default info); set NUTRIENT_KNOWLEDGE to a
//! JSON override file to adjust aliases, standards or the missing-value policy.

use anyhow::Result;
use clap::Parser;
use nutrient_gap_rust::{load_batch, KnowledgeBase, NutrientAnalyzer};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "analyze_batch", about = "Analyze nutrient batches and print their reports as JSON")]
struct Args {
    /// JSON batch files (soil_samples, leaf_samples, findings)
    #[arg(value_name = "BATCH", required = true)]
    paths: Vec<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let knowledge = KnowledgeBase::from_env()?;
    tracing::info!("Knowledge version: {}", knowledge.version());

    let inputs = args
        .paths
        .iter()
        .map(|p| load_batch(p))
        .collect::<Result<Vec<_>>>()?;

    let start = Instant::now();
    let reports = NutrientAnalyzer::new(&knowledge).analyze_batches(&inputs);
    tracing::info!("Analyzed {} batches in {:.2?}", reports.len(), start.elapsed());

    if let [report] = reports.as_slice() {
        println!("{}", report.to_json_pretty()?);
    } else {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args() {
        Args::command().debug_assert();

        let args = Args::try_parse_from(["analyze_batch", "a.json", "b.json"]).unwrap();
        assert_eq!(args.paths, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);

        assert!(Args::try_parse_from(["analyze_batch"]).is_err());
    }
}
