#![forbid(unsafe_code)]

mod cli;
mod color;
mod constants;
mod container;
mod engine;
mod error;
mod live_config;
mod theme_config;

use std::io::{self, IsTerminal};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::{Confirm, console::Term};
use tracing::{Level as TraceLevel, error};
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Command};
use container::ThemeFormat;
use engine::PreviewMode;
use error::ThemeError;

fn init_logging() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    // stdout is reserved for command output
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to install log subscriber")
}

/// Ask before replacing an existing export; non-interactive runs never overwrite
fn confirm_overwrite(name: &str, format: ThemeFormat) -> Result<bool> {
    if !io::stdin().is_terminal() {
        return Ok(false);
    }
    let confirmed = Confirm::new()
        .with_prompt(overwrite_prompt(name, format))
        .default(false)
        .interact_on(&Term::stderr())
        .context("Failed to read overwrite confirmation")?;
    Ok(confirmed)
}

fn overwrite_prompt(name: &str, format: ThemeFormat) -> String {
    let kind = match format {
        ThemeFormat::Directory => "directory",
        ThemeFormat::Archive => "archive",
    };
    format!("Theme '{name}' already exists ({kind}). Overwrite?")
}

fn run_export(root: &Path, name: &str, format: ThemeFormat, force: bool) -> Result<()> {
    let overwrite = force || (engine::exists(root, name, format)? && confirm_overwrite(name, format)?);
    let dest = engine::export(root, name, format, overwrite).map_err(|e| {
        let hint = if matches!(e, ThemeError::Conflict { .. }) { " (use --force to overwrite)" } else { "" };
        anyhow::Error::new(e).context(format!("Failed to export theme '{name}'{hint}"))
    })?;
    println!("{}", dest.display());
    Ok(())
}

fn run(cli: Cli) -> Result<ExitCode> {
    let root = cli.config_root()?;

    match cli.command {
        Command::List { search } => {
            let names = engine::discover(&root).context("Failed to list themes")?;
            for name in container::filter_themes(&names, &search) {
                println!("{name}");
            }
        }
        Command::Import { theme } => {
            let report = engine::import(&root, &theme).with_context(|| format!("Failed to import theme '{theme}'"))?;
            println!(
                "Applied '{}': {} color field(s), assets: {}",
                report.theme,
                report.patched_fields,
                if report.assets.is_empty() { "none".to_string() } else { report.assets.join(", ") }
            );
        }
        Command::Export { name, format, force } => run_export(&root, &name, format, force)?,
        Command::Exists { name, format } => {
            let found = engine::exists(&root, &name, format)?;
            println!("{found}");
            if !found {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Preview { theme, json } => {
            let (mode, label) = match &theme {
                Some(name) => (PreviewMode::Import, name.as_str()),
                None => (PreviewMode::Export, "live config"),
            };
            let preview = engine::preview(&root, mode, theme.as_deref())
                .with_context(|| format!("Failed to preview {label}"))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&preview)?);
            } else {
                println!("{label}");
                println!("  primary:    {} ({})", preview.primary, preview.primary_color);
                println!("  background: {} ({})", preview.background, preview.background_color);
                match (&preview.image_path, preview.image_size) {
                    (Some(path), Some((w, h))) => println!("  image:      {} ({w}x{h})", path.display()),
                    (Some(path), None) => println!("  image:      {}", path.display()),
                    (None, Some((w, h))) => println!("  image:      inside archive ({w}x{h})"),
                    (None, None) => println!("  image:      none"),
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging() {
        eprintln!("{e:#}");
    }

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
