//! Churnscope: churn scoring CLI
//!
//! Loads the predictor once, then scores one profile (a JSON object) or a
//! batch (a JSON array) read from a file or stdin. Results are printed to
//! stdout as JSON; logs go to stderr or a file.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{json, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use churnscope::adapters::sanitize::SanitizingMakeWriter;
use churnscope::application::{BatchProgress, BatchScoringWorker};
use churnscope::config::{LogMode, ScorerConfig};
use churnscope::{ChurnScorer, RawCustomerProfile};

/// Score telecom customers for churn risk
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Profile JSON file (object or array); reads stdin when omitted
    input: Option<PathBuf>,

    /// Model directory or file (overrides CHURNSCOPE_MODEL_PATH)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Include the engineered feature vector in the output
    #[arg(short, long)]
    features: bool,

    /// Pretty-print JSON output
    #[arg(short, long)]
    pretty: bool,
}

fn init_logging(config: &ScorerConfig) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let (writer, guard) = match config.log_mode {
        LogMode::File => {
            if let Some(parent) = config.log_file.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.log_file)
                .with_context(|| format!("Failed to open log file {:?}", config.log_file))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogMode::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .init();

    Ok(guard)
}

fn read_input(path: Option<&PathBuf>) -> Result<Value> {
    let content = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {path:?}"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    serde_json::from_str(&content).context("Input is not valid JSON")
}

fn render(value: &Value, pretty: bool) -> Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}

fn strip_features(mut value: Value, keep: bool) -> Value {
    if !keep {
        if let Some(obj) = value.as_object_mut() {
            obj.remove("features");
        }
    }
    value
}

/// Batch input split into scoreable profiles and items that are not
/// profile objects at all.
struct ParsedBatch {
    profiles: Vec<RawCustomerProfile>,
    /// Input position of each entry in `profiles`
    positions: Vec<usize>,
    unreadable: Vec<(usize, String)>,
}

fn parse_batch(items: Vec<Value>) -> ParsedBatch {
    let mut batch = ParsedBatch {
        profiles: Vec::with_capacity(items.len()),
        positions: Vec::with_capacity(items.len()),
        unreadable: Vec::new(),
    };
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<RawCustomerProfile>(item) {
            Ok(profile) => {
                batch.profiles.push(profile);
                batch.positions.push(index);
            }
            Err(e) => {
                tracing::warn!("Batch item {} is not a customer profile: {}", index, e);
                batch
                    .unreadable
                    .push((index, format!("Not a customer profile: {e}")));
            }
        }
    }
    batch
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ScorerConfig::from_env();
    if let Some(model) = &args.model {
        config.model_path = model.clone();
    }
    let _guard = init_logging(&config)?;

    tracing::info!("Starting churnscope...");

    let scorer = Arc::new(ChurnScorer::new());
    scorer
        .initialize(&config.model_source())
        .with_context(|| format!("Failed to load model from {:?}", config.model_path))?;

    let input = read_input(args.input.as_ref())?;

    let output = match input {
        Value::Array(items) => {
            let batch = parse_batch(items);
            let mut results: Vec<(usize, Value)> = batch
                .unreadable
                .into_iter()
                .map(|(index, error)| (index, json!({ "index": index, "error": error })))
                .collect();

            let positions = batch.positions;
            for update in BatchScoringWorker::spawn(Arc::clone(&scorer), batch.profiles).wait() {
                match update {
                    BatchProgress::Scored { index, scored } => {
                        let index = positions[index];
                        let value = strip_features(serde_json::to_value(&scored)?, args.features);
                        results.push((index, json!({ "index": index, "result": value })));
                    }
                    BatchProgress::Rejected { index, error } => {
                        let index = positions[index];
                        results.push((index, json!({ "index": index, "error": error })));
                    }
                    BatchProgress::Aborted { index, error } => {
                        anyhow::bail!("Batch aborted at item {}: {error}", positions[index]);
                    }
                    BatchProgress::Started { .. } | BatchProgress::Finished { .. } => {}
                }
            }

            results.sort_by_key(|(index, _)| *index);
            Value::Array(results.into_iter().map(|(_, value)| value).collect())
        }
        single => {
            let raw: RawCustomerProfile =
                serde_json::from_value(single).context("Input is not a customer profile")?;
            let scored = scorer.score_raw(&raw)?;
            strip_features(serde_json::to_value(&scored)?, args.features)
        }
    };

    println!("{}", render(&output, args.pretty)?);

    tracing::info!("churnscope finished.");
    Ok(())
}
