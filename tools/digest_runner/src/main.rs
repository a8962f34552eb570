use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use digest_core::config::DigestConfig;
use digest_core::digest::driver::reduce_with_config;
use digest_core::digest::export::render_digest_csv;
use digest_core::digest::fingerprint::fingerprint;
use digest_core::digest::lookup::VulnerabilityCatalog;
use digest_core::digest::project::ProjectDigest;
use digest_core::notification::parser::{parse_records, sort_chronologically};
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Reduce a batch of notification records to its net digest events.
#[derive(Parser, Debug)]
#[command(name = "digest_runner", version, about, long_about = None)]
struct Cli {
    /// Records file (JSON array or NDJSON)
    records: PathBuf,

    /// Digest configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Vulnerability display catalog (JSON), keyed by component-version URL
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Apply records in file order instead of sorting by timestamp
    #[arg(long)]
    no_sort: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Projects,
    Csv,
}

fn main() {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match run(&cli) {
        Ok(clean) => std::process::exit(if clean { 0 } else { 1 }),
        Err(e) => {
            eprintln!("digest_runner error: {:#}", e);
            std::process::exit(2);
        }
    }
}

/// Returns whether the batch reduced without per-record or lookup errors.
fn run(cli: &Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(p) => DigestConfig::load(p).with_context(|| format!("loading config {}", p.display()))?,
        None => DigestConfig::default(),
    };
    let catalog = match &cli.catalog {
        Some(p) => {
            VulnerabilityCatalog::load(p).with_context(|| format!("loading catalog {}", p.display()))?
        }
        None => VulnerabilityCatalog::default(),
    };

    let content = std::fs::read_to_string(&cli.records)
        .with_context(|| format!("reading records {}", cli.records.display()))?;
    let batch = parse_records(&content)?;
    let records = if cli.no_sort {
        batch.records
    } else {
        sort_chronologically(batch.records)
    };

    let outcome = reduce_with_config(&records, &catalog, &config)?;
    tracing::info!(
        events = outcome.events.len(),
        line_errors = batch.line_errors.len(),
        "reduced {}",
        cli.records.display()
    );

    match cli.format {
        Format::Csv => print!("{}", render_digest_csv(&outcome.events)?),
        Format::Json | Format::Projects => {
            let body = match cli.format {
                Format::Projects => serde_json::to_value(ProjectDigest::group(&outcome.events))?,
                _ => serde_json::to_value(&outcome.events)?,
            };
            let report = json!({
                "fingerprint": fingerprint(&outcome.events)?,
                "digest": body,
                "line_errors": batch.line_errors,
                "record_errors": outcome.record_errors,
                "lookup_failures": outcome.lookup_failures,
                "stats": outcome.stats,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    for e in &outcome.record_errors {
        eprintln!("RECORD_ERROR #{} {} {}", e.index, e.kind, e.reason);
    }
    for f in &outcome.lookup_failures {
        eprintln!("LOOKUP_FAILED {} {}", f.component_version_url, f.message);
    }

    Ok(batch.line_errors.is_empty()
        && outcome.record_errors.is_empty()
        && outcome.lookup_failures.is_empty())
}
