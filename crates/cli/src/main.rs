use anyhow::Context;
use answers::{AnswerType, DynamicValue};
use chrono::DateTime;
use clap::{Parser, Subcommand, ValueEnum};
use datatrack_core::constants::{CLIENT_DATA_KEY_ENV, DATE_LOCALE_ENV, TIME_ZONE_ENV};
use datatrack_core::{TrackingConfig, TrackingService};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracking::{LoggingKind, TrackedCatalog, TrackedItemsCollection};

#[derive(Parser)]
#[command(name = "datatrack")]
#[command(about = "Answer codec and tracked-item tools for stored research data")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a value as stored JSON for an answer type
    EncodeAnswer {
        /// Answer type descriptor (JSON)
        #[arg(long)]
        answer_type: String,
        /// Value to encode (JSON)
        #[arg(long)]
        value: String,
    },
    /// Decode stored JSON for an answer type
    DecodeAnswer {
        /// Answer type descriptor (JSON)
        #[arg(long)]
        answer_type: String,
        /// Stored JSON to decode
        #[arg(long)]
        json: String,
    },
    /// Reload a collection from stored client data for a new session
    Reconcile {
        /// File holding the stored client data
        #[arg(long)]
        client_data: PathBuf,
        /// Start of the new session (RFC 3339, default now)
        #[arg(long)]
        start_date: Option<String>,
        /// Kind of collection stored in the client data
        #[arg(long, value_enum, default_value_t = CollectionKind::Medication)]
        kind: CollectionKind,
        /// File holding the tracked item catalog (optional)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Finalize stored medication answers and print them in the current revision
    Finalize {
        /// File holding the stored medication collection
        #[arg(long)]
        client_data: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CollectionKind {
    Medication,
    Logging,
    Symptom,
    Trigger,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(log_filter()?)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = TrackingConfig::from_env_values(
        std::env::var(TIME_ZONE_ENV).ok(),
        std::env::var(DATE_LOCALE_ENV).ok(),
        std::env::var(CLIENT_DATA_KEY_ENV).ok(),
    )?;
    tracing::debug!(time_zone = %config.time_zone().identifier(), "resolved configuration");
    let service = TrackingService::new(config);

    match cli.command {
        Some(Commands::EncodeAnswer { answer_type, value }) => {
            let answer_type = parse_answer_type(&answer_type)?;
            let value: Value = serde_json::from_str(&value).context("value is not valid JSON")?;
            let value = DynamicValue::from_json(&value);
            let encoded = service.encode_answer(&answer_type, value.as_ref())?;
            print_json(&encoded)?;
        }
        Some(Commands::DecodeAnswer { answer_type, json }) => {
            let answer_type = parse_answer_type(&answer_type)?;
            let json: Value = serde_json::from_str(&json).context("stored value is not valid JSON")?;
            match service.decode_answer(&answer_type, &json)? {
                Some(value) => println!("{value:?}"),
                None => println!("no value"),
            }
        }
        Some(Commands::Reconcile {
            client_data,
            start_date,
            kind,
            catalog,
        }) => {
            let client_data = read_json(&client_data)?;
            let start_date = start_date
                .map(|raw| {
                    DateTime::parse_from_rfc3339(&raw)
                        .with_context(|| format!("invalid start date '{raw}'"))
                })
                .transpose()?;
            let catalog = match catalog {
                Some(path) => TrackedCatalog::parse(&read_json(&path)?)?.items,
                None => Vec::new(),
            };

            let reconciled = match kind {
                CollectionKind::Medication => service
                    .reconcile_medications(&client_data, start_date, &catalog)?
                    .client_data()?,
                CollectionKind::Logging => service
                    .reconcile_logging(&client_data, LoggingKind::Logging, start_date, &catalog)?
                    .client_data()?,
                CollectionKind::Symptom => service
                    .reconcile_logging(&client_data, LoggingKind::Symptom, start_date, &catalog)?
                    .client_data()?,
                CollectionKind::Trigger => service
                    .reconcile_logging(&client_data, LoggingKind::Trigger, start_date, &catalog)?
                    .client_data()?,
            };
            match reconciled {
                Some(json) => print_json(&json)?,
                None => println!("Collection does not persist client data."),
            }
        }
        Some(Commands::Finalize { client_data }) => {
            let stored = read_json(&client_data)?;
            print_json(&service.finalize_medications(&stored)?)?;
        }
        None => {
            println!("Use 'datatrack --help' for commands");
        }
    }

    Ok(())
}

/// `RUST_LOG` plus info-level logging for the binary and every workspace crate it drives.
fn log_filter() -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::from_default_env()
        .add_directive("datatrack=info".parse()?)
        .add_directive("datatrack_core=info".parse()?)
        .add_directive("answers=info".parse()?)
        .add_directive("tracking=info".parse()?))
}

fn parse_answer_type(raw: &str) -> anyhow::Result<AnswerType> {
    serde_json::from_str(raw).context("answer type is not a valid descriptor")
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
