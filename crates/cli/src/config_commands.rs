use std::path::Path;

use {anyhow::Result, clap::Subcommand};

use krypta_config::{KryptaConfig, Severity, ValidationResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors/warnings.
    Check,
    /// Print the effective configuration (secrets redacted).
    Show,
    /// Print where the config and database live.
    Paths,
}

pub fn handle_config(action: ConfigAction, explicit: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Check => check(explicit),
        ConfigAction::Show => {
            let config = crate::load_config(explicit)?;
            println!("{}", render(&config)?);
            Ok(())
        },
        ConfigAction::Paths => {
            let config = crate::load_config(explicit)?;
            let file = explicit
                .map(Path::to_path_buf)
                .or_else(krypta_config::find_config_file);
            match file {
                Some(path) => println!("config:   {}", path.display()),
                None => println!("config:   (none, using defaults)"),
            }
            println!(
                "database: {}",
                krypta_config::database_path(&config).display()
            );
            Ok(())
        },
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(explicit: Option<&Path>) -> Result<()> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(krypta_config::find_config_file);
    let result = match &path {
        Some(path) => krypta_config::validate_file(path),
        None => krypta_config::validate(&KryptaConfig::default()),
    };

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults.\n");
    }

    print_diagnostics(&result);

    if result.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_diagnostics(result: &ValidationResult) {
    for d in &result.diagnostics {
        let color = match d.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
        };
        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{}{RESET} {}", d.severity, d.message);
        } else {
            eprintln!("  {BOLD}{color}{}{RESET} {}: {}", d.severity, d.path, d.message);
        }
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if !result.diagnostics.is_empty() {
        eprintln!();
    }
    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }
}

fn render(config: &KryptaConfig) -> Result<String> {
    let mut redacted = config.clone();
    if redacted.auth.password.is_some() {
        redacted.auth.password = Some(secrecy::Secret::new("********".to_string()));
    }
    Ok(toml::to_string_pretty(&redacted)?)
}
