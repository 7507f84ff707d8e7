//! Tally CLI
//!
//! Command-line client for a running Tally API server:
//! - Aggregate events into a dense series
//! - Send chat messages
//! - Ingest events from CSV
//! - Check status

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tally::api::dto::{AggregateRequest, EventDto, IngestRequest};
use tally::api::routes::events::MAX_BATCH_SIZE;
use tally::api::routes::messages::USER_NAME_HEADER;
use tally::storage::parse_timestamp;

#[derive(Parser)]
#[command(name = "tally-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Time-bucketed sums over timestamped events")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8090", global = true)]
    pub api_url: String,

    /// Output format (table, json, csv)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sum events per bucket over a range
    Aggregate {
        /// Range start, YYYY-MM-DDTHH:MM:SS
        #[arg(long)]
        from: String,
        /// Range end (inclusive), YYYY-MM-DDTHH:MM:SS
        #[arg(long)]
        upto: String,
        /// Bucket size (hour, day, month)
        #[arg(short, long, default_value = "day")]
        group: String,
    },

    /// Send a chat message and print the reply
    Message {
        /// Message text, e.g. /start or a JSON request
        text: String,
        /// Display name used in greetings
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Ingest events from a CSV file with `dt,value` columns
    Ingest {
        /// Path to CSV file
        path: PathBuf,
        /// Validate only, send nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// Show server status
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    dt: String,
    value: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Aggregate { from, upto, group } => {
            let body = AggregateRequest::new(from, upto, group);

            let response = client
                .post(format!("{}/api/v1/aggregate", cli.api_url))
                .json(&body)
                .send()
                .await
                .with_context(|| format!("Cannot connect to Tally API at {}", cli.api_url))?;

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                bail!("Aggregation failed ({}): {}", status, text);
            }

            let data: serde_json::Value = response.json().await?;

            match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&data)?),
                "csv" => print_csv(&data)?,
                _ => print_table(&data),
            }
        }

        Commands::Message { text, user } => {
            let mut request = client
                .post(format!("{}/api/v1/messages", cli.api_url))
                .body(text);

            if let Some(user) = user {
                request = request.header(USER_NAME_HEADER, user);
            }

            let response = request
                .send()
                .await
                .with_context(|| format!("Cannot connect to Tally API at {}", cli.api_url))?;

            let status = response.status();
            let reply = response.text().await?;
            if !status.is_success() {
                bail!("Message failed ({}): {}", status, reply);
            }

            println!("{}", reply);
        }

        Commands::Ingest { path, dry_run } => {
            let events = read_events(&path)?;
            println!("Read {} events from {:?}", events.len(), path);

            if dry_run {
                println!("(Dry run - no data was sent)");
                return Ok(());
            }

            let mut accepted = 0u64;
            for chunk in events.chunks(MAX_BATCH_SIZE) {
                let body = IngestRequest {
                    events: chunk.to_vec(),
                };

                let response = client
                    .post(format!("{}/api/v1/events", cli.api_url))
                    .json(&body)
                    .send()
                    .await
                    .with_context(|| format!("Cannot connect to Tally API at {}", cli.api_url))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    bail!(
                        "Ingest failed after {} events ({}): {}",
                        accepted,
                        status,
                        text
                    );
                }

                let result: serde_json::Value = response.json().await?;
                accepted += result["accepted"].as_u64().unwrap_or(0);
            }

            println!("Imported: {}", accepted);
        }

        Commands::Status => {
            let response = client
                .get(format!("{}/health", cli.api_url))
                .send()
                .await
                .with_context(|| {
                    format!(
                        "Cannot connect to Tally API at {}\n\nMake sure the server is running:\n  cargo run --bin tally",
                        cli.api_url
                    )
                })?;

            if !response.status().is_success() {
                bail!("API returned error: {}", response.status());
            }

            let health: serde_json::Value = response.json().await?;

            println!(
                "Tally v{}",
                health["version"].as_str().unwrap_or(env!("CARGO_PKG_VERSION"))
            );
            println!();
            println!(
                "API Status: {}",
                health["status"].as_str().unwrap_or("unknown")
            );
            println!(
                "Store: {} ({})",
                health["store"].as_str().unwrap_or("unknown"),
                health["store_backend"].as_str().unwrap_or("-")
            );

            if let Some(uptime) = health["uptime_seconds"].as_u64() {
                println!("Uptime: {}", format_duration(uptime));
            }
        }

        Commands::Config { output } => {
            let config = tally::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

/// Read and validate every row before anything is sent
fn read_events(path: &Path) -> anyhow::Result<Vec<EventDto>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("Cannot open {:?}", path))?;

    let mut events = Vec::new();
    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        let line = index + 2;
        let row = row.with_context(|| format!("Line {}: malformed row", line))?;

        parse_timestamp(&row.dt)
            .with_context(|| format!("Line {}: invalid timestamp {:?}", line, row.dt))?;
        if !row.value.is_finite() {
            bail!("Line {}: value must be a finite number", line);
        }

        events.push(EventDto {
            dt: row.dt,
            value: row.value,
        });
    }

    Ok(events)
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

fn series_rows(data: &serde_json::Value) -> Vec<(&str, String)> {
    let labels = data["labels"].as_array().map(Vec::as_slice).unwrap_or(&[]);
    let dataset = data["dataset"].as_array().map(Vec::as_slice).unwrap_or(&[]);

    labels
        .iter()
        .zip(dataset)
        .map(|(label, value)| (label.as_str().unwrap_or("-"), value.to_string()))
        .collect()
}

fn print_table(data: &serde_json::Value) {
    let rows = series_rows(data);
    if rows.is_empty() {
        println!("No buckets in the selected range");
        return;
    }

    println!("{:<21} | {}", "Bucket", "Sum");
    println!("{}", "-".repeat(36));

    for (label, value) in rows {
        println!("{:<21} | {}", label, value);
    }
}

fn print_csv(data: &serde_json::Value) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record(["bucket", "sum"])?;
    for (label, value) in series_rows(data) {
        writer.write_record([label, value.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}
