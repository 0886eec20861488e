//! filmarc - emotional-arc analysis over an exported corpus
//!
//! Loads a JSON corpus, runs one analysis and prints the report as JSON.
//!
//! ```text
//! filmarc --dataset corpus.json peaks --entity m1 --language en
//! filmarc --dataset corpus.json compare --entity m1 --languages en,fr,es
//! filmarc --dataset corpus.json correlate --x mean_compound --y outcome:rating
//! filmarc --dataset corpus.json similar --language en --target m1 --top-n 5
//! filmarc --dataset corpus.json evidence --entity m1 --language en --minutes 3,7
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use filmarc_common::Corpus;
use filmarc_engine::{AnalysisService, TomlConfig};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// Command-line arguments for filmarc
#[derive(Parser, Debug)]
#[command(name = "filmarc")]
#[command(about = "Emotional-arc analytics for multilingual film corpora")]
#[command(version)]
struct Args {
    /// JSON corpus export (entities, emotion_records, dialogue)
    #[arg(short, long, env = "FILMARC_DATASET")]
    dataset: PathBuf,

    /// TOML config file (falls back to FILMARC_CONFIG, then the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Top peaks and valleys of one track, with dialogue evidence
    Peaks {
        #[arg(long)]
        entity: String,
        #[arg(long, default_value = "en")]
        language: String,
    },

    /// Compare one entity's arc across language tracks
    Compare {
        #[arg(long)]
        entity: String,
        /// Comma-separated language codes; omit for every recorded language
        #[arg(long, value_delimiter = ',')]
        languages: Vec<String>,
    },

    /// Correlate two entity metrics across the corpus
    Correlate {
        /// e.g. mean_compound, emotion:joy, outcome:box_office
        #[arg(long)]
        x: String,
        #[arg(long)]
        y: String,
        #[arg(long, default_value = "en")]
        language: String,
    },

    /// Emotional similarity between entities
    Similar {
        #[arg(long, default_value = "en")]
        language: String,
        /// Rank the corpus around this entity
        #[arg(long)]
        target: Option<String>,
        #[arg(long, default_value = "5")]
        top_n: usize,
    },

    /// Dialogue excerpts for specific minutes
    Evidence {
        #[arg(long)]
        entity: String,
        #[arg(long, default_value = "en")]
        language: String,
        #[arg(long, value_delimiter = ',', required = true)]
        minutes: Vec<u32>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    let default_level = config.logging.tracing_level()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting filmarc v{}", env!("CARGO_PKG_VERSION"));

    let corpus = Corpus::load_json(&args.dataset)
        .with_context(|| format!("Failed to load corpus {}", args.dataset.display()))?;
    let service = AnalysisService::new(&corpus, &corpus, &config.analysis)?;

    match args.command {
        Command::Peaks { entity, language } => print_json(&service.peaks(&entity, &language)?),
        Command::Compare { entity, languages } => {
            print_json(&service.compare_languages(&entity, &languages)?)
        }
        Command::Correlate { x, y, language } => {
            print_json(&service.correlate_metrics(&x, &y, &language)?)
        }
        Command::Similar {
            language,
            target,
            top_n,
        } => print_json(&service.similarity(&language, target.as_deref(), top_n)?),
        Command::Evidence {
            entity,
            language,
            minutes,
        } => print_json(&service.evidence(&entity, &language, &minutes)),
    }
}

fn print_json<T: Serialize>(report: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
