//! Config validation CLI tool
//!
//! Validates a curfew configuration file and reports any errors.

use curfew_config::{ConfigError, PolicyConfiguration};
use curfew_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a curfew configuration file (JSON, or TOML for .toml files).");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            eprintln!("  validate-config config.example.json");
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match curfew_config::load_config(&config_path) {
        Ok(config) => {
            print_summary(&config);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                ConfigError::EncodingError(utf8_err) => {
                    eprintln!("File is not valid UTF-8: {}", utf8_err);
                }
                ConfigError::ParseError(parse_err) => {
                    eprintln!("JSON parse error:");
                    eprintln!("  {}", parse_err);
                }
                ConfigError::TomlError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                ConfigError::FetchError(fetch_err) => {
                    eprintln!("Fetch error: {}", fetch_err);
                }
            }
            ExitCode::from(1)
        }
    }
}

fn print_summary(config: &PolicyConfiguration) {
    println!("✓ Configuration is valid");
    println!();
    println!("Summary:");
    println!("  Enabled: {}", config.enabled);
    println!("  Unrestricted windows: {}", config.unrestricted_times.len());
    println!("  Rules: {}", config.policy.len());

    if !config.unrestricted_times.is_empty() {
        println!();
        println!("Unrestricted windows:");
        for span in config.unrestricted_times.spans() {
            println!("  - {}", span);
        }
    }

    if !config.policy.is_empty() {
        println!();
        println!("Rules (first match wins):");
        for (index, rule) in config.policy.rules().iter().enumerate() {
            println!(
                "  {}. process={} title={} -> {}",
                index + 1,
                rule.process().as_str().unwrap_or("*"),
                rule.title().as_str().unwrap_or("*"),
                rule.action()
            );
        }
    }

    if !config.skipped_rules.is_empty() {
        println!();
        println!("Skipped rules:");
        for skipped in &config.skipped_rules {
            println!("  - rules[{}]: {}", skipped.index, skipped.reason);
        }
    }
}
