//! RCDevices inventory - Main entry point
//!
//! Lists the attached programmers and prints what the driver knows about
//! each of them, as console text or as JSON for other tools.

mod config;
mod output;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rcdevices_core::{format_mcu_id, DeviceHandle};
use rcdevices_driver::{read_database_info, read_mcu_id, read_serial, Provider};
use rcdevices_inventory::Inventory;
use serde_json::json;
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::{Backend, Config, OutputFormat};
use crate::output::{
    json_failure, json_success, DbInfoJson, DeviceJson, InventoryBody, ListBody, VersionBody,
};

#[derive(Parser, Debug)]
#[command(name = "rcdevices")]
#[command(about = "Inventory of attached RCDevices programmers")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "rcdevices.toml")]
    config: PathBuf,

    /// Device data source
    #[arg(short, long, value_enum)]
    backend: Option<Backend>,

    /// Device fixture for the scripted backend
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Query every attached device (default)
    All,
    /// List device handles
    List,
    /// Read the MCU id of one device
    #[command(name = "mcu_id", alias = "mcu-id")]
    McuId { handle: DeviceHandle },
    /// Read the serial number of one device
    Serial { handle: DeviceHandle },
    /// Read database test/calibration info of one device
    #[command(name = "db_info", alias = "db-info")]
    DbInfo { handle: DeviceHandle },
    /// Report the only attached device; fails with zero or several
    Single,
    /// Print version and architecture
    Version,
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to install logger: {}", e);
    }

    let config = match effective_config(&args) {
        Ok(config) => config,
        Err(e) => fail(args.format.unwrap_or_default(), e),
    };
    let format = config.output.format;

    if let Err(e) = run(&config, args.command.unwrap_or(Command::All), format) {
        fail(format, e);
    }
}

/// Config file with command-line overrides applied
fn effective_config(args: &Args) -> Result<Config> {
    let mut config = config::load_config(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    args.apply_overrides(&mut config);

    debug!(?config, "Effective configuration");
    Ok(config)
}

impl Args {
    /// Command-line flags take precedence over the config file
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(backend) = self.backend {
            config.driver.backend = backend;
        }
        if let Some(fixture) = &self.fixture {
            config.driver.fixture = Some(fixture.clone());
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
    }
}

/// Report the error in the requested format and exit
fn fail(format: OutputFormat, error: anyhow::Error) -> ! {
    let message = format!("{:#}", error);
    match (format, json_failure(&message)) {
        (OutputFormat::Json, Ok(body)) => println!("{}", body),
        _ => eprintln!("Error: {}", message),
    }
    std::process::exit(1);
}

fn open_inventory(config: &Config) -> Result<Inventory<Box<dyn Provider>>> {
    Ok(Inventory::new(config.open_provider()?))
}

fn run(config: &Config, command: Command, format: OutputFormat) -> Result<()> {
    match command {
        Command::Version => {
            let version = VersionBody::current();
            match format {
                OutputFormat::Json => println!("{}", json_success(version)?),
                OutputFormat::Text => {
                    println!("rcdevices v{} ({})", version.version, version.architecture)
                }
            }
        }
        Command::All => {
            let inventory = open_inventory(config)?;
            let scanned_at = Utc::now();
            let records = inventory.build_inventory()?;
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    json_success(InventoryBody::new(&records, scanned_at))?
                ),
                OutputFormat::Text => print!("{}", output::render_inventory_text(&records)),
            }
        }
        Command::List => {
            let handles = open_inventory(config)?.enumerate()?;
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    json_success(ListBody {
                        count: handles.len(),
                        devices: handles.iter().map(|h| h.raw()).collect(),
                    })?
                ),
                OutputFormat::Text => print!("{}", output::render_list_text(&handles)),
            }
        }
        Command::McuId { handle } => {
            let provider = config.open_provider()?;
            let id = read_mcu_id(&provider, handle)
                .with_context(|| format!("Error in GetDeviceMCUId() for {}", handle))?;
            match format {
                OutputFormat::Json => println!("{}", json_success(json!({ "mcu_id": id }))?),
                OutputFormat::Text => println!("MCU Id: {}", format_mcu_id(&id)),
            }
        }
        Command::Serial { handle } => {
            let provider = config.open_provider()?;
            let serial = read_serial(&provider, handle)
                .with_context(|| format!("Error in GetDeviceSerial() for {}", handle))?;
            match format {
                OutputFormat::Json => println!("{}", json_success(json!({ "serial": serial }))?),
                OutputFormat::Text => println!("Serial: {}", serial),
            }
        }
        Command::DbInfo { handle } => {
            let provider = config.open_provider()?;
            let database = read_database_info(&provider, handle);
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    json_success(json!({ "db_info": DbInfoJson::from(database.as_ref()) }))?
                ),
                OutputFormat::Text => println!("{}", output::database_block(database.as_ref())),
            }
        }
        Command::Single => {
            let record = open_inventory(config)?.single_device()?;
            match format {
                OutputFormat::Json => println!("{}", json_success(DeviceJson::from(&record))?),
                OutputFormat::Text => print!("{}", output::render_single_text(&record)),
            }
        }
    }

    Ok(())
}
