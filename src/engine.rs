//! Theme import/export workflows
//!
//! Every call takes the config root and theme name explicitly; nothing is
//! remembered between calls. Each workflow validates the config root, stages
//! the theme in a directory, commits, and always cleans up scratch state.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::color::{self, DecodedColor};
use crate::constants::{assets, scratch, theme};
use crate::container::{self, StagedTheme, ThemeFormat};
use crate::error::{IoContext, Result, ThemeError};
use crate::live_config::{self, ConfigRoot, LiveConfig};
use crate::theme_config;

/// Which side of the conversion a preview looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewMode {
    /// A portable theme, as it would be imported
    Import,
    /// The live config, as it would be exported
    Export,
}

/// Outcome of a successful import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub theme: String,
    /// Number of color fields written to `bbs.json`
    pub patched_fields: usize,
    pub assets: Vec<&'static str>,
}

/// Read-only view of a theme's colors and background image
#[derive(Debug, Clone, Serialize)]
pub struct ThemePreview {
    pub primary_color: i32,
    pub background_color: i32,
    pub primary: DecodedColor,
    pub background: DecodedColor,
    /// Background image on disk; `None` when absent or only present inside
    /// an archive (the extraction is gone once the preview returns)
    pub image_path: Option<PathBuf>,
    /// Pixel dimensions of the background image, when it could be read
    pub image_size: Option<(u32, u32)>,
}

/// Names of all portable themes under `<root>/theme`
pub fn discover(root: &Path) -> Result<Vec<String>> {
    let root = ConfigRoot::open(root)?;
    container::discover(&root.theme_dir())
}

/// Whether exporting `name` in `format` would overwrite something
pub fn exists(root: &Path, name: &str, format: ThemeFormat) -> Result<bool> {
    let root = ConfigRoot::open(root)?;
    validate_export_name(name)?;
    Ok(container::exists(&root.theme_dir(), name, format))
}

/// Apply a portable theme (directory or archive) to the live config
///
/// The JSON patch is saved before assets are copied. If the asset copy fails
/// the patch stays in place and the error is returned.
pub fn import(root: &Path, name: &str) -> Result<ImportReport> {
    let root = ConfigRoot::open(root)?;
    let theme_root = root.theme_dir();
    let container = container::resolve(&theme_root, name)?;
    info!(theme = %name, format = ?container.format(), path = %container.path().display(), "Importing theme");

    let staged = container.open_for_read(&theme_root, scratch::IMPORT)?;
    let outcome = commit_import(&root, name, &staged);
    let report = close_staged(staged, outcome)?;
    info!(theme = %name, patched = report.patched_fields, assets = ?report.assets, "Theme imported");
    Ok(report)
}

fn commit_import(root: &ConfigRoot, name: &str, staged: &StagedTheme) -> Result<ImportReport> {
    let fields = theme_config::read(&staged.config_file())?;
    if fields.is_empty() {
        warn!(theme = %name, "Theme config has no recognized colors, leaving live colors unchanged");
    }

    let mut config = LiveConfig::load(root)?;
    let patched_fields = config.patch_colors(fields.primary_color(), fields.background_color());
    if patched_fields > 0 {
        config.save()?;
    }

    let assets = live_config::copy_assets_in(&root.textures_dir(), staged.dir()).inspect_err(|e| {
        error!(theme = %name, error = %e, "Asset copy failed after settings were saved; live colors and textures are out of sync");
    })?;

    Ok(ImportReport { theme: name.to_string(), patched_fields, assets })
}

/// Package the live colors and textures as a portable theme
///
/// Fails with [`ThemeError::Conflict`] if the target exists and `overwrite`
/// is false. Returns the path of the written directory or archive.
pub fn export(root: &Path, name: &str, format: ThemeFormat, overwrite: bool) -> Result<PathBuf> {
    let root = ConfigRoot::open(root)?;
    validate_export_name(name)?;

    let theme_root = root.theme_dir();
    if let Some(path) = container::conflicting_path(&theme_root, name, format) {
        if !overwrite {
            return Err(ThemeError::Conflict { name: name.to_string(), path });
        }
        info!(theme = %name, path = %path.display(), "Overwriting existing theme");
    }

    let (primary_color, background_color) = LiveConfig::load(&root)?.read_live_colors()?;
    let textures = root.textures_dir();
    let populate = |dir: &Path| -> Result<()> {
        let config_file = dir.join(theme::CONFIG_FILE);
        fs::write(&config_file, theme_config::serialize(primary_color, background_color))
            .io_context("Failed to write theme config", &config_file)?;
        let copied = live_config::copy_assets_out(&textures, dir)?;
        if copied.is_empty() {
            warn!(path = %textures.display(), "No live textures found, exporting colors only");
        }
        Ok(())
    };

    let dest = match format {
        ThemeFormat::Directory => container::write_as_directory(&theme_root, name, populate)?,
        ThemeFormat::Archive => container::write_as_archive(&theme_root, name, populate)?,
    };
    info!(theme = %name, path = %dest.display(), primary_color, background_color, "Theme exported");
    Ok(dest)
}

/// Colors and background image for display, without changing anything
///
/// `name` is required in [`PreviewMode::Import`] and ignored otherwise.
pub fn preview(root: &Path, mode: PreviewMode, name: Option<&str>) -> Result<ThemePreview> {
    let root = ConfigRoot::open(root)?;

    match mode {
        PreviewMode::Export => {
            let (primary, background) = LiveConfig::load(&root)?.read_live_colors()?;
            let image = root.textures_dir().join(assets::BACKGROUND);
            Ok(build_preview(primary, background, &image, true))
        }
        PreviewMode::Import => {
            let name = name.ok_or(ThemeError::InvalidName {
                name: String::new(),
                reason: "a theme name is required to preview an import",
            })?;
            let theme_root = root.theme_dir();
            let staged = container::resolve(&theme_root, name)?.open_for_read(&theme_root, scratch::PREVIEW)?;

            let outcome = theme_config::read(&staged.config_file()).map(|fields| {
                let image = staged.dir().join(assets::BACKGROUND);
                build_preview(
                    fields.primary_color().unwrap_or(0),
                    fields.background_color().unwrap_or(0),
                    &image,
                    !staged.is_scratch(),
                )
            });
            close_staged(staged, outcome)
        }
    }
}

/// Remove the staged extraction, then return the workflow outcome
///
/// A workflow error wins over a cleanup error; the latter is still logged.
fn close_staged<T>(staged: StagedTheme, outcome: Result<T>) -> Result<T> {
    let cleanup = staged.close();
    if let (Err(_), Err(e)) = (&outcome, &cleanup) {
        warn!(error = %e, "Failed to remove scratch directory");
    }
    let value = outcome?;
    cleanup?;
    Ok(value)
}

fn build_preview(primary_color: i32, background_color: i32, image: &Path, keep_path: bool) -> ThemePreview {
    let present = image.is_file();
    ThemePreview {
        primary_color,
        background_color,
        primary: color::decode(primary_color),
        background: color::decode(background_color),
        image_path: (present && keep_path).then(|| image.to_path_buf()),
        image_size: if present { png_dimensions(image) } else { None },
    }
}

fn png_dimensions(path: &Path) -> Option<(u32, u32)> {
    let file = File::open(path)
        .inspect_err(|e| warn!(path = %path.display(), error = %e, "Failed to open background image"))
        .ok()?;
    match png::Decoder::new(BufReader::new(file)).read_info() {
        Ok(reader) => {
            let info = reader.info();
            Some((info.width, info.height))
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Background image is not a readable PNG");
            None
        }
    }
}

fn validate_export_name(name: &str) -> Result<()> {
    let invalid = |reason| Err(ThemeError::InvalidName { name: name.to_string(), reason });

    if name.trim().is_empty() {
        return invalid("name is empty");
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return invalid("name must not contain path separators");
    }
    if container::is_scratch_name(name) {
        return invalid("name is reserved for scratch directories");
    }
    if name.to_lowercase().ends_with(theme::ARCHIVE_SUFFIX) {
        return invalid("leave off the archive suffix; pick the format instead");
    }
    Ok(())
}
