// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Promptlab - prompt test execution and quality scoring.
//!
//! This is the binary entry point.

mod commands;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use promptlab_config::PromptlabConfig;

/// Promptlab - run prompts against hosted models and score their engineering quality.
#[derive(Parser, Debug)]
#[command(name = "promptlab", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway.
    Serve,
    /// Score a prompt file (or `-` for stdin) with the technique engine.
    Analyze {
        /// Path to the prompt text, or `-` to read stdin.
        input: String,
        /// Print the full analysis as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List supported models and their rates.
    Models {
        #[arg(long)]
        json: bool,
    },
    /// Validate and print the effective configuration with secrets redacted.
    Config,
}

fn load_config(path: Option<&PathBuf>) -> PromptlabConfig {
    let loaded = match path {
        Some(path) => promptlab_config::load_and_validate_path(path),
        None => promptlab_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            promptlab_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let outcome = match cli.command {
        Some(Commands::Serve) => serve::run_serve(load_config(cli.config.as_ref())).await,
        Some(Commands::Analyze { input, json }) => {
            commands::read_prompt(&input).and_then(|text| commands::analyze_report(&text, json))
                .map(|report| println!("{report}"))
        }
        Some(Commands::Models { json }) => {
            commands::models_report(json).map(|report| println!("{report}"))
        }
        Some(Commands::Config) => commands::redacted_config(&load_config(cli.config.as_ref()))
            .map(|report| println!("{report}")),
        None => {
            println!("promptlab: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = outcome {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_loads_config_defaults() {
        let config = promptlab_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.server.port, 8420);
    }

    #[test]
    fn cli_parses_analyze_flags() {
        let cli = Cli::try_parse_from(["promptlab", "analyze", "-", "--json"]).unwrap();
        match cli.command {
            Some(Commands::Analyze { input, json }) => {
                assert_eq!(input, "-");
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["promptlab", "config", "--config", "/tmp/p.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/p.toml")));
    }
}
