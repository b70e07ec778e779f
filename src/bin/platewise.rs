// ABOUTME: Platewise CLI asking the diet assistant questions and reporting its status
// ABOUTME: Loads configuration from the environment, optional profile and meal fixtures, and prints JSON
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

//! Usage:
//! ```bash
//! # Ask a question
//! platewise ask --user alice "analyze nutrition in two eggs"
//!
//! # Use only built-in data, with a profile and a meal log
//! platewise --offline ask --user alice --profile profile.json --meals meals.json "show my weekly summary"
//!
//! # Review a day of eating from a JSON context ({"request_type": "daily_analysis", "food_log": [...]})
//! platewise ask --context day.json "how did I eat today"
//!
//! # Coordinator and handler health
//! platewise status
//!
//! # Handler capabilities and routing rules
//! platewise capabilities
//! ```

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use platewise::config::ServerConfig;
use platewise::coordinator::{Coordinator, Stores};
use platewise::logging::{self, LoggingConfig};
use platewise::stores::InMemoryStore;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "platewise",
    about = "Platewise multi-agent diet assistant",
    long_about = "Routes nutrition, recipe, and tracking questions to specialist agents and prints their combined answer as JSON."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Use only the built-in food table and recipe catalog, without text generation
    #[arg(long, global = true)]
    offline: bool,

    /// Log at the level from RUST_LOG (default info) instead of warnings only
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Ask the assistant a question
    Ask {
        /// User the request is made for
        #[arg(long, default_value = "cli-user")]
        user: String,

        /// JSON user profile to load first
        #[arg(long)]
        profile: Option<PathBuf>,

        /// JSON array of meal log entries to load first
        #[arg(long)]
        meals: Option<PathBuf>,

        /// JSON object merged into the request context
        #[arg(long)]
        context: Option<PathBuf>,

        /// Print only the answer text
        #[arg(long)]
        text: bool,

        /// The question
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Print coordinator and handler health
    Status,

    /// Print handler capabilities and routing rules
    Capabilities,
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        logging::init_from_env()?;
    } else {
        LoggingConfig::quiet().init()?;
    }

    let mut config = ServerConfig::from_env().context("Failed to load configuration")?;
    config.offline = cli.offline;
    config.log_summary();

    let store = Arc::new(InMemoryStore::new());
    let coordinator = Coordinator::from_config(&config, &Stores::shared(store.clone()))
        .context("Failed to build coordinator")?;

    match cli.command {
        Command::Ask {
            user,
            profile,
            meals,
            context,
            text,
            message,
        } => {
            if let Some(path) = profile {
                store
                    .load_profile_file(&user, &path)
                    .await
                    .with_context(|| format!("Failed to load profile {}", path.display()))?;
            }
            if let Some(path) = meals {
                let loaded = store
                    .load_meals_file(&user, &path)
                    .await
                    .with_context(|| format!("Failed to load meals {}", path.display()))?;
                info!(entries = loaded, "Meal log loaded");
            }

            let mut context = match context {
                Some(path) => {
                    let raw = fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read context {}", path.display()))?;
                    serde_json::from_str::<Map<String, Value>>(&raw).with_context(|| {
                        format!("Context {} is not a JSON object", path.display())
                    })?
                }
                None => Map::new(),
            };
            context
                .entry("session_id")
                .or_insert_with(|| Value::from(Uuid::new_v4().to_string()));
            let outcome = coordinator
                .process(&user, &message.join(" "), context)
                .await;
            if text {
                println!("{}", outcome.display_text());
            } else {
                print_json(&outcome)?;
            }
        }
        Command::Status => print_json(&coordinator.system_status().await)?,
        Command::Capabilities => print_json(&coordinator.capabilities())?,
    }
    Ok(())
}
