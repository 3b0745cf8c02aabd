//! Cuaderno CLI
//!
//! Keep key/value notes in emoji categories from the terminal. The local
//! document is always written first; a configured remote mirror is updated
//! in the background and flushed before exit.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cuaderno_core::{AccessGate, CuadernoConfig, DataService, OVERVIEW_LIMIT};

#[derive(Parser)]
#[command(name = "cuaderno", version, about = "Key/value notebook organized in emoji categories")]
struct Cli {
    /// Config file (default: <config dir>/cuaderno/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Access code, instead of prompting for it
    #[arg(long, global = true)]
    access_code: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Totals and the most recently touched items
    Overview {
        #[arg(long, default_value_t = OVERVIEW_LIMIT)]
        limit: usize,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List items newest first, optionally within one category
    List {
        #[arg(long)]
        category: Option<String>,
        /// Case-insensitive match on category name, key, value and note
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// List categories with their ids and item counts
    Categories,
    /// Create an empty category
    AddCategory {
        name: String,
        #[arg(long, default_value = "")]
        emoji: String,
    },
    /// Add an item to a category
    Add {
        category_id: String,
        key: String,
        value: String,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Edit an item; unspecified fields keep their current value
    Edit {
        category_id: String,
        item_id: String,
        #[arg(long)]
        key: Option<String>,
        #[arg(long)]
        value: Option<String>,
        #[arg(long)]
        note: Option<String>,
        /// Move the item to another category
        #[arg(long)]
        move_to: Option<String>,
    },
    /// Delete an item
    Delete {
        category_id: String,
        item_id: String,
        #[arg(long)]
        yes: bool,
    },
    /// Write the dataset as indented JSON (default: cuaderno_datos_<date>.json)
    Export { path: Option<PathBuf> },
    /// Replace the whole dataset with a JSON export
    Import {
        path: PathBuf,
        #[arg(long)]
        yes: bool,
    },
    /// Erase everything and start over with the default categories
    Wipe {
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = CuadernoConfig::load(cli.config.as_deref())?;

    let gate = AccessGate::new(config.access_code.clone());
    if !gate.is_open() {
        let input = match cli.access_code {
            Some(code) => code,
            None => commands::prompt("Access code: ")?,
        };
        gate.check(input.trim())?;
    }

    tracing::debug!("Using data dir {}", config.resolved_data_dir().display());
    let mut service = DataService::from_config(&config)?;
    service.load().await;

    let result = commands::dispatch(&mut service, cli.command);
    service.flush_remote().await;
    result
}
