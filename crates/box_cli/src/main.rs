//! Box Predictor CLI
//!
//! Loads the forest model once and serves `predict_boxes` calls, either one
//! shot from the command line or as a line-delimited JSON tool server.

use anyhow::{Context, Result};
use box_predictor_core::{
    invoke, tool::AGENT_INSTRUCTION, tool_definition, ForestModel, Predictor, PredictorConfig,
    Schema, ToolResponse, VERSION,
};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "box-predictor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Predicts packing box counts from category quantities", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Model artifact path (overrides config and environment)
    #[arg(short, long, global = true)]
    model: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Predict box counts for one request and print the tool response
    Predict {
        /// Category and quantity as CATEGORY=QTY (empty QTY means absent)
        #[arg(short, long = "item", value_parser = parse_item)]
        items: Vec<(String, Option<i64>)>,
    },
    /// Serve tool calls: one JSON argument object per stdin line
    Serve,
    /// Print the tool definition and feature/label order
    Schema,
    /// Print the BLAKE3 hash of the loaded model (format-independent, not b3sum of the file)
    ModelHash,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = resolve_config(&args)?;
    init_tracing(&config)?;

    match args.command {
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&schema_document())?);
        }
        Command::ModelHash => {
            let model = ForestModel::load_json(&config.model_path).with_context(|| {
                format!("failed to load model from {}", config.model_path.display())
            })?;
            println!("{}", model.hash_hex()?);
        }
        Command::Predict { items } => {
            let predictor = load_predictor(&config)?;
            let (categories, quantities): (Vec<String>, Vec<Option<i64>>) =
                items.into_iter().unzip();
            let response = predictor.predict_boxes(&categories, &quantities);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Serve => {
            let predictor = load_predictor(&config)?;
            info!(version = VERSION, "Serving predict_boxes on stdin");
            let stdin = io::stdin();
            let stdout = io::stdout();
            let served = serve(&predictor, stdin.lock(), stdout.lock())?;
            info!(requests = served, "stdin closed, shutting down");
        }
    }

    Ok(())
}

fn resolve_config(args: &Args) -> Result<PredictorConfig> {
    let mut config = match &args.config {
        Some(path) => PredictorConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => PredictorConfig::default(),
    };

    config.apply_env();

    if let Some(model) = &args.model {
        config.model_path = model.clone();
    }
    if args.verbose {
        config.log_level = "debug".to_string();
    }

    config.validate()?;
    Ok(config)
}

fn init_tracing(config: &PredictorConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);

    let installed = if config.log_json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {e}"))
}

/// Load the model once; a missing or incompatible artifact aborts startup.
fn load_predictor(config: &PredictorConfig) -> Result<Predictor> {
    Predictor::from_model_path(&config.model_path).with_context(|| {
        format!(
            "failed to load model from {}",
            config.model_path.display()
        )
    })
}

fn schema_document() -> Value {
    let schema = Schema::global();
    json!({
        "version": VERSION,
        "tool": tool_definition(),
        "instruction": AGENT_INSTRUCTION,
        "categories": schema.categories(),
        "features": schema.feature_names(),
        "labels": schema.labels(),
    })
}

/// Parse `CATEGORY=QTY`. The last `=` separates the quantity.
fn parse_item(s: &str) -> Result<(String, Option<i64>), String> {
    let (category, qty) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected CATEGORY=QTY, got '{s}'"))?;

    if category.is_empty() {
        return Err(format!("missing category in '{s}'"));
    }

    let qty = qty.trim();
    let quantity = if qty.is_empty() {
        None
    } else {
        Some(
            qty.parse::<i64>()
                .map_err(|e| format!("invalid quantity '{qty}': {e}"))?,
        )
    };

    Ok((category.to_string(), quantity))
}

/// Answer one tool call per input line until EOF. Returns the number served.
///
/// Lines that are not UTF-8 or not JSON get an error response; only read
/// and write failures end the loop.
fn serve<R: BufRead, W: Write>(predictor: &Predictor, input: R, mut output: W) -> Result<usize> {
    let mut served = 0;

    for line in input.split(b'\n') {
        let line = line.context("failed to read request line")?;
        let response = match std::str::from_utf8(&line) {
            Ok(text) if text.trim().is_empty() => continue,
            Ok(text) => match serde_json::from_str::<Value>(text) {
                Ok(args) => invoke(predictor, args),
                Err(e) => {
                    error!(error = %e, "malformed request line");
                    ToolResponse::error(format!("malformed request: {e}"))
                }
            },
            Err(e) => {
                error!(error = %e, "request line is not UTF-8");
                ToolResponse::error(format!("malformed request: {e}"))
            }
        };

        serde_json::to_writer(&mut output, &response)?;
        output.write_all(b"\n")?;
        output.flush()?;
        served += 1;
    }

    Ok(served)
}
