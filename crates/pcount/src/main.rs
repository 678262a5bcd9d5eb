// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! pcount - counts the people in lecture photos.
//!
//! Binary entry point: parses the command line, loads configuration, and
//! dispatches to the subcommand.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod doctor;
mod serve;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use pcount_config::{ConfigError, PcountConfig};

/// pcount - counts the people in lecture photos.
#[derive(Parser, Debug)]
#[command(name = "pcount", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Consume counting requests until SIGINT or SIGTERM.
    Serve,
    /// Check configuration, face model, and broker connectivity.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Validate configuration and print the effective settings as TOML.
    CheckConfig,
}

fn load(path: Option<&Path>) -> Result<PcountConfig, Vec<ConfigError>> {
    match path {
        Some(path) => pcount_config::load_and_validate_path(path),
        None => pcount_config::load_and_validate(),
    }
}

fn load_or_exit(path: Option<&Path>) -> PcountConfig {
    match load(path) {
        Ok(config) => config,
        Err(errors) => {
            pcount_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve => {
            let config = load_or_exit(config_path);
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Commands::Doctor { plain } => {
            let healthy = doctor::run_doctor(load(config_path), plain).await;
            if !healthy {
                std::process::exit(1);
            }
        }
        Commands::CheckConfig => {
            let config = load_or_exit(config_path);
            match toml::to_string_pretty(&config) {
                Ok(rendered) => print!("{rendered}"),
                Err(e) => {
                    eprintln!("error: cannot render configuration: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
