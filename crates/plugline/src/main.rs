// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugline - WhatsApp order-routing assistant for a food shop.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use plugline_config::{ConfigError, PluglineConfig};

/// Plugline - WhatsApp order-routing assistant for a food shop.
#[derive(Parser, Debug)]
#[command(name = "plugline", version, about, long_about = None)]
struct Cli {
    /// Explicit config file. Skips the XDG lookup; env overrides still apply.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook gateway and the routing loop.
    Serve,
    /// Load and validate the configuration, then exit.
    CheckConfig,
}

fn load(path: Option<&PathBuf>) -> Result<PluglineConfig, Vec<ConfigError>> {
    match path {
        Some(path) => plugline_config::load_and_validate_path(path),
        None => plugline_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            plugline_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::CheckConfig) => {
            println!(
                "plugline: config ok (agent.name={}, operators={}, hours={:02}:00-{:02}:00 UTC{:+})",
                config.agent.name,
                config.admin.operators.len(),
                config.shop.open_hour,
                config.shop.close_hour,
                config.shop.utc_offset_hours,
            );
        }
        None => {
            println!("plugline: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_check_config_with_explicit_file() {
        let cli = Cli::try_parse_from(["plugline", "check-config", "--config", "shop.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
        assert_eq!(cli.config, Some(PathBuf::from("shop.toml")));
    }

    #[test]
    fn empty_config_is_valid() {
        let config = plugline_config::load_and_validate_str("").expect("defaults should validate");
        assert_eq!(config.agent.name, "Shawarma Plug");
    }
}
