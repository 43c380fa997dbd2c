//! Sheet Store CLI
//!
//! Runs one record-store operation against a hosted spreadsheet and prints
//! the resulting envelope as JSON.
//!
//! Usage:
//!   sheet-store --spreadsheet-id ID --sheet Clientes read
//!   sheet-store read --column name --op contains --value an
//!   sheet-store insert --data '{"name":"Ana"}' --user maria --include-id
//!   sheet-store update --id 3 --values '{"email":"ana@x.com"}'
//!   sheet-store deactivate --id 3
//!   sheet-store delete --id 3
//!   sheet-store last-id
//!   sheet-store find --key email --value ana@x.com --one

use anyhow::{Context, Result};
use clap::Parser;
use ouroboros_sheet_store::{SheetConfig, SheetStore};
use ouroboros_sheets_client::{GoogleSheetsBackend, SheetsClientConfig, DEFAULT_BASE_URL};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::Command;

#[derive(Parser, Debug)]
#[command(name = "sheet-store")]
#[command(about = "Record store on top of a Google Sheets spreadsheet")]
#[command(version)]
struct Args {
    /// Spreadsheet id
    #[arg(long, env = "SHEETS_SPREADSHEET_ID")]
    spreadsheet_id: String,

    /// OAuth2 access token
    #[arg(long, env = "SHEETS_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,

    /// Sheet (tab) name
    #[arg(long, env = "SHEETS_SHEET_NAME")]
    sheet: String,

    /// 1-based row number of the header row
    #[arg(long, env = "SHEETS_ROW_HEAD", default_value = "1")]
    row_head: u32,

    /// Sheets API root
    #[arg(long, env = "SHEETS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Comma-separated fields required on insert
    #[arg(long, value_delimiter = ',')]
    required: Vec<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30", value_parser = parse_timeout)]
    timeout_secs: f64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: Level,

    /// Print compact JSON instead of pretty JSON
    #[arg(long)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

fn parse_timeout(raw: &str) -> std::result::Result<f64, String> {
    let secs: f64 = raw.parse().map_err(|e| format!("{}", e))?;
    if secs.is_finite() && secs > 0.0 {
        Ok(secs)
    } else {
        Err(format!("timeout must be a positive number of seconds, got {}", raw))
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays valid JSON.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let client_config = SheetsClientConfig::new(&args.spreadsheet_id, &args.access_token)
        .base_url(&args.base_url)
        .timeout_secs(args.timeout_secs);
    let backend = GoogleSheetsBackend::from_config(client_config)
        .context("building Sheets client")?;

    let config = SheetConfig::new(&args.sheet)
        .row_head(args.row_head)
        .required_fields(args.required.iter().map(|f| f.trim()).filter(|f| !f.is_empty()));
    let store = SheetStore::new(config, Arc::new(backend)).context("invalid sheet configuration")?;

    info!(sheet = %args.sheet, spreadsheet = %args.spreadsheet_id, "Running {:?}", args.command);
    let output = commands::run(&store, args.command).await?;

    let rendered = if args.compact {
        serde_json::to_string(&output.body)?
    } else {
        serde_json::to_string_pretty(&output.body)?
    };
    println!("{}", rendered);

    Ok(if output.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
