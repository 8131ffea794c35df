//! Live BBS configuration: `settings/bbs.json` and the textures folder
//!
//! Only `appearance.primary_color` and `background.color` are ever touched.
//! The rest of the document round-trips untouched, key order included.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::color;
use crate::constants::{assets, live};
use crate::error::{IoContext, Result, ThemeError};

/// A BBS installation directory (the one holding `settings/bbs.json`)
#[derive(Debug, Clone)]
pub struct ConfigRoot {
    path: PathBuf,
}

impl ConfigRoot {
    /// Admit `path` as a config root if it contains `settings/bbs.json`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let root = Self { path: path.into() };
        let settings = root.settings_file();
        if !settings.is_file() {
            return Err(ThemeError::not_found("settings file", settings));
        }
        Ok(root)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.path.join(live::SETTINGS_DIR).join(live::SETTINGS_FILE)
    }

    pub fn textures_dir(&self) -> PathBuf {
        live::TEXTURES_DIR.iter().fold(self.path.clone(), |p, part| p.join(part))
    }

    pub fn theme_dir(&self) -> PathBuf {
        self.path.join(crate::constants::theme::THEME_DIR)
    }
}

/// Parsed `bbs.json`
#[derive(Debug, Clone)]
pub struct LiveConfig {
    path: PathBuf,
    document: Map<String, Value>,
}

impl LiveConfig {
    /// Read and parse `settings/bbs.json`
    pub fn load(root: &ConfigRoot) -> Result<Self> {
        let path = root.settings_file();
        if !path.is_file() {
            return Err(ThemeError::not_found("settings file", path));
        }

        let contents = fs::read_to_string(&path).io_context("Failed to read settings", &path)?;
        let value: Value = serde_json::from_str(&contents)
            .map_err(|e| ThemeError::format(&path, format!("invalid JSON: {e}")))?;
        let Value::Object(document) = value else {
            return Err(ThemeError::format(&path, "top-level value is not an object"));
        };

        debug!(path = %path.display(), keys = document.len(), "Loaded live config");
        Ok(Self { path, document })
    }

    /// Current `(primary_color, background_color)`, `0` for absent fields
    pub fn read_live_colors(&self) -> Result<(i32, i32)> {
        let primary = self.read_color(live::APPEARANCE_KEY, live::PRIMARY_COLOR_KEY)?;
        let background = self.read_color(live::BACKGROUND_KEY, live::BACKGROUND_COLOR_KEY)?;
        Ok((primary.unwrap_or(0), background.unwrap_or(0)))
    }

    /// Set the two colors where both a value was supplied and the parent
    /// object already exists. Returns the number of fields changed.
    pub fn patch_colors(&mut self, primary_color: Option<i32>, background_color: Option<i32>) -> usize {
        let mut patched = 0;
        let targets = [
            (live::APPEARANCE_KEY, live::PRIMARY_COLOR_KEY, primary_color),
            (live::BACKGROUND_KEY, live::BACKGROUND_COLOR_KEY, background_color),
        ];

        for (parent, field, value) in targets {
            let Some(value) = value else { continue };
            match self.document.get_mut(parent) {
                Some(Value::Object(section)) => {
                    section.insert(field.to_string(), Value::from(value));
                    patched += 1;
                }
                Some(_) => warn!(key = parent, "Live config section is not an object, leaving it alone"),
                None => debug!(key = parent, "Live config has no section, skipping"),
            }
        }
        patched
    }

    /// Write the document back with 4-space indentation
    ///
    /// Goes through a temporary file in the settings directory so an
    /// interrupted write leaves the previous file intact.
    pub fn save(&self) -> Result<()> {
        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(live::JSON_INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.document
            .serialize(&mut serializer)
            .map_err(|e| ThemeError::format(&self.path, format!("failed to serialize: {e}")))?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).io_context("Failed to create temporary settings file", dir)?;
        tmp.write_all(&buffer).io_context("Failed to write settings", tmp.path())?;
        // NamedTempFile is created 0600; keep the original file's mode
        if let Ok(metadata) = fs::metadata(&self.path) {
            fs::set_permissions(tmp.path(), metadata.permissions())
                .io_context("Failed to copy settings permissions", tmp.path())?;
        }
        tmp.persist(&self.path).io_context("Failed to replace settings", &self.path)?;

        info!(path = %self.path.display(), "Saved live config");
        Ok(())
    }

    fn read_color(&self, parent: &str, field: &str) -> Result<Option<i32>> {
        let Some(value) = self.document.get(parent).and_then(|section| section.get(field)) else {
            return Ok(None);
        };
        color::color_from_json(value).map(Some).ok_or_else(|| {
            ThemeError::format(&self.path, format!("{parent}.{field} is not a 32-bit integer: {value}"))
        })
    }
}

/// Copy theme assets from `source_dir` into the live textures folder
///
/// Missing source assets are skipped. Returns the names that were copied.
pub fn copy_assets_in(textures: &Path, source_dir: &Path) -> Result<Vec<&'static str>> {
    copy_assets(source_dir, textures)
}

/// Copy live textures into a theme payload directory
pub fn copy_assets_out(textures: &Path, dest_dir: &Path) -> Result<Vec<&'static str>> {
    copy_assets(textures, dest_dir)
}

fn copy_assets(from: &Path, to: &Path) -> Result<Vec<&'static str>> {
    let mut copied = Vec::new();
    for name in assets::ALL {
        let source = from.join(name);
        if !source.is_file() {
            debug!(path = %source.display(), "Asset not present, skipping");
            continue;
        }
        fs::create_dir_all(to).io_context("Failed to create asset directory", to)?;
        let dest = to.join(name);
        fs::copy(&source, &dest).io_context("Failed to copy asset", &source)?;
        info!(from = %source.display(), to = %dest.display(), "Copied asset");
        copied.push(name);
    }
    Ok(copied)
}
