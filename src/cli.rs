//! Command-line interface

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::constants::paths;
use crate::container::ThemeFormat;

#[derive(Debug, Parser)]
#[command(name = "bbs-theme-tool", version, about = "Import and export BBS themes")]
pub struct Cli {
    /// BBS config directory (the one containing settings/bbs.json)
    #[arg(long, short, global = true, env = "BBS_CONFIG_ROOT")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List portable themes under <root>/theme
    List {
        /// Only show themes whose name contains this text (case-insensitive)
        #[arg(long, short, default_value = "")]
        search: String,
    },

    /// Apply a portable theme to the live config
    Import {
        /// Theme directory name or archive file name, as shown by `list`
        theme: String,
    },

    /// Save the live colors and textures as a portable theme
    Export {
        name: String,

        #[arg(long, short, value_enum, default_value_t = ThemeFormat::Directory)]
        format: ThemeFormat,

        /// Overwrite an existing theme without asking
        #[arg(long)]
        force: bool,
    },

    /// Exit with status 0 if the export target already exists, 1 otherwise
    Exists {
        name: String,

        #[arg(long, short, value_enum, default_value_t = ThemeFormat::Directory)]
        format: ThemeFormat,
    },

    /// Show colors of a portable theme, or of the live config when no theme is given
    Preview {
        theme: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Config root from the command line, env, or the default install location
    pub fn config_root(&self) -> Result<PathBuf> {
        let root = match &self.root {
            Some(root) => root.clone(),
            None => {
                let root = default_config_root().context("Could not determine the default BBS config directory, pass --root")?;
                info!(path = %root.display(), "Using default config root");
                root
            }
        };

        let looks_like_bbs = root
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.to_lowercase().contains(paths::BBS_DIR_HINT));
        if !looks_like_bbs {
            warn!(path = %root.display(), "Config root does not look like a config/bbs directory");
        }
        Ok(root)
    }
}

/// `<game dir>/config/bbs` for the platform's default Minecraft install
pub fn default_config_root() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let base = dirs::config_dir();
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let base = dirs::home_dir();

    let mut path = base?;
    path.push(paths::GAME_DIR);
    for part in paths::BBS_CONFIG {
        path.push(part);
    }
    Some(path)
}
