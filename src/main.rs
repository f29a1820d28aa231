// src/main.rs

//! The main entry point for the tallyd server application.

use anyhow::Result;
use std::env;
use std::path::Path;
use tallyd::config::Config;
use tallyd::server;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    run_app().await
}

async fn run_app() -> Result<()> {
    // Define version information.
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    // Collect command-line arguments.
    let args: Vec<String> = env::args().collect();

    // Handle the --version flag.
    if args.contains(&"--version".to_string()) {
        println!("tallyd version {VERSION}");
        return Ok(());
    }

    // Determine the configuration path.
    // It can be provided via a --config flag; otherwise, it defaults to "config.toml".
    let config_arg = args
        .iter()
        .position(|arg| arg == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());
    let config_path = config_arg.unwrap_or("config.toml");

    // Load the server configuration. Every key has a default, so a missing
    // default file just means built-in defaults; an explicitly given path
    // that fails to load is fatal, as the operator clearly expected it.
    let used_defaults = config_arg.is_none() && !Path::new(config_path).exists();
    let mut config = if used_defaults {
        Config::default()
    } else {
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Failed to load configuration from \"{config_path}\": {e}");
                std::process::exit(1);
            }
        }
    };

    // Override port if provided as a command-line argument
    if let Some(port_index) = args.iter().position(|arg| arg == "--port") {
        if let Some(port_str) = args.get(port_index + 1) {
            match port_str.parse::<u16>() {
                Ok(port) => config.port = port,
                Err(_) => {
                    eprintln!("Invalid port number: {port_str}");
                    std::process::exit(1);
                }
            }
        } else {
            eprintln!("--port flag requires a value");
            std::process::exit(1);
        }
    }

    // Validate the effective configuration, overrides included, so a bad
    // --port value fails as loudly as a bad file.
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    // Setup logging. Get the log level from the env var or config.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .compact() // Use the compact, single-line format.
        .with_ansi(true) // Enable ANSI color codes for log levels.
        .init();

    if used_defaults {
        info!("No config file at \"{config_path}\", using built-in defaults.");
    }

    if let Err(e) = server::run(config).await {
        error!("Server runtime error: {}", e);
        return Err(e);
    }

    Ok(())
}
