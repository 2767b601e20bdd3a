//! Canonicalize and summarize a spreadsheet export of lab results
//!
//! Usage: summarize_csv <results.csv> <soil|leaf> [id_column]
//!
//! Prints one comparison row per parameter, then any column names that
//! could not be canonicalized.

use anyhow::Result;
use clap::Parser;
use nutrient_gap_rust::metrics::{aggregate_records, evaluate_statistics};
use nutrient_gap_rust::{comparison_rows, load_csv_records, Category, KnowledgeBase};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "summarize_csv", about = "Canonicalize and summarize a lab-results CSV export")]
struct Args {
    /// CSV export, one row per sample
    #[arg(value_name = "CSV")]
    path: PathBuf,

    /// Sample category of every row
    #[arg(value_name = "CATEGORY", value_parser = parse_category)]
    category: Category,

    /// Column holding the sample identifier
    #[arg(value_name = "ID_COLUMN", default_value = "sample_id")]
    id_column: String,
}

fn parse_category(value: &str) -> Result<Category, String> {
    value.parse::<Category>().map_err(|e| e.to_string())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "N.D.".to_string(), |v| format!("{:.*}", decimals, v))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let (path, category) = (&args.path, args.category);

    let knowledge = KnowledgeBase::from_env()?;
    let records = load_csv_records(path, &args.id_column)?;

    let outcome = aggregate_records(&records, category, &knowledge);
    let gaps = evaluate_statistics(&outcome.statistics, &knowledge.standards);
    let rows = comparison_rows(&outcome.statistics, &gaps);

    println!("\n{} samples: {} ({} rows)\n", category, path.display(), records.len());
    println!(
        "{:<24} {:>6} {:>6} {:>10} {:>12} {:>9}  {}",
        "Parameter", "n", "miss", "Average", "Optimal", "Gap %", "Status"
    );
    println!("{}", "-".repeat(84));

    for (row, stats) in rows.iter().zip(&outcome.statistics) {
        println!(
            "{:<24} {:>6} {:>6} {:>10} {:>12} {:>9}  {}",
            row.parameter_id,
            stats.count,
            stats.missing_count,
            fmt_opt(row.average, 3),
            row.optimal_range.as_deref().unwrap_or("-"),
            fmt_opt(row.percent_gap, 1),
            row.status
        );
    }

    if !outcome.unmapped.is_empty() {
        println!("\nUnmapped columns:");
        for u in &outcome.unmapped {
            println!("  {}", u.raw_name);
        }
    }
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args() {
        Args::command().debug_assert();

        let args = Args::try_parse_from(["summarize_csv", "results.csv", "leaf"]).unwrap();
        assert_eq!(args.path, PathBuf::from("results.csv"));
        assert_eq!(args.category, Category::Leaf);
        assert_eq!(args.id_column, "sample_id");

        let args = Args::try_parse_from(["summarize_csv", "results.csv", "Soil", "Lab No"]).unwrap();
        assert_eq!(args.category, Category::Soil);
        assert_eq!(args.id_column, "Lab No");

        assert!(Args::try_parse_from(["summarize_csv", "results.csv", "stem"]).is_err());
        assert!(Args::try_parse_from(["summarize_csv", "results.csv"]).is_err());
    }
}
