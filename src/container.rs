//! Portable theme containers
//!
//! A portable theme lives under `<root>/theme/` either as a plain directory
//! or as a `.zip` archive. Callers go through [`ThemeContainer`] and never
//! care which one they got: archives are extracted into a scratch directory
//! that [`StagedTheme`] removes when it goes out of scope.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use tempfile::TempDir;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::constants::{scratch, theme};
use crate::error::{IoContext, Result, ThemeError};

/// Physical form of a portable theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeFormat {
    /// `theme/<name>/`
    #[value(alias = "dir")]
    Directory,
    /// `theme/<name>.zip`
    #[value(alias = "zip")]
    Archive,
}

impl ThemeFormat {
    /// Location of the artifact this format produces for `name`
    pub fn artifact_path(self, theme_root: &Path, name: &str) -> PathBuf {
        match self {
            ThemeFormat::Directory => theme_root.join(name),
            ThemeFormat::Archive => theme_root.join(format!("{name}{}", theme::ARCHIVE_SUFFIX)),
        }
    }
}

/// A discovered portable theme
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeContainer {
    Directory(PathBuf),
    Archive(PathBuf),
}

impl ThemeContainer {
    /// Classify an existing path under the theme root
    pub fn from_path(path: PathBuf) -> Option<Self> {
        if path.is_dir() {
            Some(ThemeContainer::Directory(path))
        } else if path.is_file() && has_archive_suffix(&path) {
            Some(ThemeContainer::Archive(path))
        } else {
            None
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ThemeContainer::Directory(path) | ThemeContainer::Archive(path) => path,
        }
    }

    pub fn format(&self) -> ThemeFormat {
        match self {
            ThemeContainer::Directory(_) => ThemeFormat::Directory,
            ThemeContainer::Archive(_) => ThemeFormat::Archive,
        }
    }

    /// Materialize the theme as a directory containing `config.txt`
    ///
    /// `scratch_prefix` names the extraction directory for archives so that
    /// different operations never share one.
    pub fn open_for_read(&self, theme_root: &Path, scratch_prefix: &str) -> Result<StagedTheme> {
        match self {
            ThemeContainer::Directory(path) => {
                let config = path.join(theme::CONFIG_FILE);
                if !config.is_file() {
                    return Err(ThemeError::not_found("theme config file", config));
                }
                Ok(StagedTheme { dir: path.clone(), scratch: None })
            }
            ThemeContainer::Archive(path) => {
                let scratch = new_scratch_dir(theme_root, scratch_prefix)?;
                extract_archive(path, scratch.path())?;

                let Some(config) = find_config_file(scratch.path())? else {
                    // scratch drops here and removes the extraction
                    return Err(ThemeError::not_found(
                        "theme config file",
                        path.join(theme::CONFIG_FILE),
                    ));
                };
                let dir = config
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| scratch.path().to_path_buf());

                debug!(archive = %path.display(), dir = %dir.display(), "Extracted theme archive");
                Ok(StagedTheme { dir, scratch: Some(scratch) })
            }
        }
    }
}

/// A theme directory ready for reading
///
/// Owns the scratch extraction (if any) and deletes it on drop.
#[derive(Debug)]
pub struct StagedTheme {
    dir: PathBuf,
    scratch: Option<TempDir>,
}

impl StagedTheme {
    /// Directory that contains `config.txt` and the theme's assets
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.dir.join(theme::CONFIG_FILE)
    }

    /// True when the directory is a scratch extraction that will be deleted
    pub fn is_scratch(&self) -> bool {
        self.scratch.is_some()
    }

    /// Remove the scratch extraction, reporting failures instead of ignoring them
    pub fn close(mut self) -> Result<()> {
        if let Some(scratch) = self.scratch.take() {
            let path = scratch.path().to_path_buf();
            scratch.close().io_context("Failed to remove scratch directory", &path)?;
        }
        Ok(())
    }
}

/// List portable themes: subdirectories and `.zip` files, sorted by name
pub fn discover(theme_root: &Path) -> Result<Vec<String>> {
    if !theme_root.is_dir() {
        debug!(path = %theme_root.display(), "Theme root not found, no themes");
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(theme_root).io_context("Failed to list themes", theme_root)? {
        let entry = entry.io_context("Failed to list themes", theme_root)?;
        let Ok(name) = entry.file_name().into_string() else {
            warn!(path = %entry.path().display(), "Skipping theme with non UTF-8 name");
            continue;
        };
        if is_scratch_name(&name) {
            continue;
        }
        if ThemeContainer::from_path(entry.path()).is_some() {
            names.push(name);
        }
    }

    names.sort();
    info!(path = %theme_root.display(), count = names.len(), "Discovered themes");
    Ok(names)
}

/// Case-insensitive substring filter over discovered names
pub fn filter_themes(names: &[String], search: &str) -> Vec<String> {
    let needle = search.to_lowercase();
    names
        .iter()
        .filter(|name| name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Resolve an identifier returned by [`discover`]
pub fn resolve(theme_root: &Path, identifier: &str) -> Result<ThemeContainer> {
    let path = theme_root.join(identifier);
    if !discover(theme_root)?.iter().any(|name| name == identifier) {
        return Err(ThemeError::not_found(format!("theme '{identifier}'"), path));
    }
    ThemeContainer::from_path(path.clone())
        .ok_or_else(|| ThemeError::not_found(format!("theme '{identifier}'"), path))
}

/// Existing artifact that exporting `name` in `format` would replace
///
/// An archive export also replaces a directory of the same name.
pub fn conflicting_path(theme_root: &Path, name: &str, format: ThemeFormat) -> Option<PathBuf> {
    let dir = ThemeFormat::Directory.artifact_path(theme_root, name);
    let archive = ThemeFormat::Archive.artifact_path(theme_root, name);
    match format {
        ThemeFormat::Directory => dir.is_dir().then_some(dir),
        ThemeFormat::Archive if archive.is_file() => Some(archive),
        ThemeFormat::Archive => dir.is_dir().then_some(dir),
    }
}

pub fn exists(theme_root: &Path, name: &str, format: ThemeFormat) -> bool {
    conflicting_path(theme_root, name, format).is_some()
}

/// True for the scratch directories this crate creates under the theme root
pub fn is_scratch_name(name: &str) -> bool {
    scratch::ALL.iter().any(|prefix| name.starts_with(prefix))
}

/// Delete the artifact for `name` in the given format, if present
pub fn remove(theme_root: &Path, name: &str, format: ThemeFormat) -> Result<()> {
    let path = format.artifact_path(theme_root, name);
    match format {
        ThemeFormat::Directory if path.is_dir() => {
            fs::remove_dir_all(&path).io_context("Failed to remove theme directory", &path)?;
        }
        ThemeFormat::Archive if path.is_file() => {
            fs::remove_file(&path).io_context("Failed to remove theme archive", &path)?;
        }
        _ => return Ok(()),
    }
    info!(path = %path.display(), "Removed existing theme");
    Ok(())
}

/// Write `theme/<name>/`, replacing any existing directory of that name
///
/// `populate` fills the fresh directory. If it fails, the partial directory
/// is removed before the error is returned.
pub fn write_as_directory<F>(theme_root: &Path, name: &str, populate: F) -> Result<PathBuf>
where
    F: FnOnce(&Path) -> Result<()>,
{
    remove(theme_root, name, ThemeFormat::Directory)?;

    let dest = ThemeFormat::Directory.artifact_path(theme_root, name);
    fs::create_dir_all(&dest).io_context("Failed to create theme directory", &dest)?;

    if let Err(e) = populate(&dest) {
        if let Err(cleanup) = fs::remove_dir_all(&dest) {
            warn!(path = %dest.display(), error = %cleanup, "Failed to remove partial theme directory");
        }
        return Err(e);
    }

    info!(path = %dest.display(), "Wrote theme directory");
    Ok(dest)
}

/// Write `theme/<name>.zip`, replacing any existing archive or directory of
/// that name
///
/// The payload is staged in a scratch directory that is deleted afterwards,
/// so the archive is the only thing left behind.
pub fn write_as_archive<F>(theme_root: &Path, name: &str, populate: F) -> Result<PathBuf>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let staging = new_scratch_dir(theme_root, scratch::EXPORT)?;
    populate(staging.path())?;

    remove(theme_root, name, ThemeFormat::Archive)?;
    remove(theme_root, name, ThemeFormat::Directory)?;
    let dest = ThemeFormat::Archive.artifact_path(theme_root, name);
    if let Err(e) = pack_directory(staging.path(), &dest) {
        if dest.exists() {
            if let Err(cleanup) = fs::remove_file(&dest) {
                warn!(path = %dest.display(), error = %cleanup, "Failed to remove partial archive");
            }
        }
        return Err(e);
    }

    let staging_path = staging.path().to_path_buf();
    staging.close().io_context("Failed to remove staging directory", &staging_path)?;

    info!(path = %dest.display(), "Wrote theme archive");
    Ok(dest)
}

fn has_archive_suffix(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.to_lowercase().ends_with(theme::ARCHIVE_SUFFIX))
}

fn new_scratch_dir(theme_root: &Path, prefix: &str) -> Result<TempDir> {
    fs::create_dir_all(theme_root).io_context("Failed to create theme directory", theme_root)?;
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir_in(theme_root)
        .io_context("Failed to create scratch directory", theme_root)
}

fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive).io_context("Failed to open theme archive", archive)?;
    let mut zip = ZipArchive::new(file).io_context("Failed to read theme archive", archive)?;
    zip.extract(dest).io_context("Failed to extract theme archive", archive)?;
    Ok(())
}

/// First `config.txt` in a depth-first walk with entries in name order
fn find_config_file(root: &Path) -> Result<Option<PathBuf>> {
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.io_context("Failed to search extracted theme", root)?;
        if entry.file_type().is_file() && entry.file_name() == theme::CONFIG_FILE {
            return Ok(Some(entry.into_path()));
        }
    }
    Ok(None)
}

/// Zip every file under `source` into `dest`, with paths relative to `source`
fn pack_directory(source: &Path, dest: &Path) -> Result<()> {
    let file = File::create(dest).io_context("Failed to create theme archive", dest)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry.io_context("Failed to walk theme payload", source)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| ThemeError::io("Invalid payload path", entry.path(), io::Error::other(e)))?;
        let entry_name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        zip.start_file(entry_name, options)
            .io_context("Failed to add archive entry", entry.path())?;
        let mut input = File::open(entry.path()).io_context("Failed to read payload file", entry.path())?;
        io::copy(&mut input, &mut zip).io_context("Failed to write archive entry", entry.path())?;
    }

    let mut writer = zip.finish().io_context("Failed to finish theme archive", dest)?;
    writer.flush().io_context("Failed to flush theme archive", dest)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, data) in entries {
            zip.start_file(name.to_string(), SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    fn scratch_dirs(theme_root: &Path) -> Vec<String> {
        fs::read_dir(theme_root)
            .unwrap()
            .filter_map(|e| e.unwrap().file_name().into_string().ok())
            .filter(|n| is_scratch_name(n))
            .collect()
    }

    #[test]
    fn test_discover_lists_directories_and_archives_sorted() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("zeta")).unwrap();
        fs::create_dir(root.join("alpha")).unwrap();
        fs::write(root.join("Bundle.ZIP"), b"").unwrap();
        fs::write(root.join("notes.txt"), b"").unwrap();
        fs::create_dir(root.join(format!("{}leftover", scratch::IMPORT))).unwrap();
        fs::create_dir(root.join(format!("{}stale", scratch::PREVIEW))).unwrap();

        let names = discover(root).unwrap();
        assert_eq!(names, vec!["Bundle.ZIP", "alpha", "zeta"]);
    }

    #[test]
    fn test_discover_keeps_user_theme_sharing_scratch_stem() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".bbs-theme-custom")).unwrap();

        assert!(!is_scratch_name(".bbs-theme-custom"));
        assert_eq!(discover(dir.path()).unwrap(), vec![".bbs-theme-custom"]);
    }

    #[test]
    fn test_discover_missing_root_is_empty() {
        let dir = tempdir().unwrap();
        assert!(discover(&dir.path().join("theme")).unwrap().is_empty());
    }

    #[test]
    fn test_filter_themes_case_insensitive() {
        let names = vec!["Ocean".to_string(), "forest.zip".to_string(), "OCEANIC".to_string()];
        assert_eq!(filter_themes(&names, "ocean"), vec!["Ocean", "OCEANIC"]);
        assert_eq!(filter_themes(&names, "ZIP"), vec!["forest.zip"]);
        assert_eq!(filter_themes(&names, ""), names);
    }

    #[test]
    fn test_resolve_unknown_theme() {
        let dir = tempdir().unwrap();
        let err = resolve(dir.path(), "missing").unwrap_err();
        assert!(matches!(err, ThemeError::NotFound { .. }));
    }

    #[test]
    fn test_open_directory_is_in_place() {
        let dir = tempdir().unwrap();
        let theme_dir = dir.path().join("plain");
        fs::create_dir(&theme_dir).unwrap();
        fs::write(theme_dir.join(theme::CONFIG_FILE), "{}").unwrap();

        let container = resolve(dir.path(), "plain").unwrap();
        let staged = container.open_for_read(dir.path(), scratch::IMPORT).unwrap();
        assert_eq!(staged.dir(), theme_dir);
        assert!(!staged.is_scratch());
        staged.close().unwrap();
        assert!(theme_dir.exists());
    }

    #[test]
    fn test_open_directory_without_config_fails() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();
        let container = resolve(dir.path(), "empty").unwrap();
        let err = container.open_for_read(dir.path(), scratch::IMPORT).unwrap_err();
        assert!(matches!(err, ThemeError::NotFound { .. }));
    }

    #[test]
    fn test_open_archive_finds_nested_config_and_cleans_up() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("nested.zip");
        write_zip(
            &archive,
            &[
                ("b/config.txt", b"\"primary_color\": 2"),
                ("a/inner/config.txt", b"\"primary_color\": 1"),
                ("a/inner/icons.png", b"icons"),
            ],
        );

        let container = resolve(dir.path(), "nested.zip").unwrap();
        assert_eq!(container.format(), ThemeFormat::Archive);
        let staged = container.open_for_read(dir.path(), scratch::PREVIEW).unwrap();
        assert!(staged.is_scratch());
        assert!(staged.dir().ends_with("a/inner"));
        assert_eq!(fs::read_to_string(staged.config_file()).unwrap(), "\"primary_color\": 1");
        assert_eq!(scratch_dirs(dir.path()).len(), 1);

        staged.close().unwrap();
        assert!(scratch_dirs(dir.path()).is_empty());
    }

    #[test]
    fn test_open_archive_without_config_cleans_up() {
        let dir = tempdir().unwrap();
        write_zip(&dir.path().join("broken.zip"), &[("background.png", b"bg")]);

        let container = resolve(dir.path(), "broken.zip").unwrap();
        let err = container.open_for_read(dir.path(), scratch::IMPORT).unwrap_err();
        assert!(matches!(err, ThemeError::NotFound { .. }));
        assert!(scratch_dirs(dir.path()).is_empty());
    }

    #[test]
    fn test_open_corrupt_archive_cleans_up() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("corrupt.zip"), b"not a zip file").unwrap();

        let container = resolve(dir.path(), "corrupt.zip").unwrap();
        let err = container.open_for_read(dir.path(), scratch::IMPORT).unwrap_err();
        assert!(matches!(err, ThemeError::Io { .. }));
        assert!(scratch_dirs(dir.path()).is_empty());
    }

    #[test]
    fn test_write_as_directory_replaces_previous_contents() {
        let dir = tempdir().unwrap();
        write_as_directory(dir.path(), "t", |d| {
            fs::write(d.join("old.png"), b"old").io_context("write", d)
        })
        .unwrap();
        let dest = write_as_directory(dir.path(), "t", |d| {
            fs::write(d.join(theme::CONFIG_FILE), b"{}").io_context("write", d)
        })
        .unwrap();

        assert!(dest.join(theme::CONFIG_FILE).exists());
        assert!(!dest.join("old.png").exists());
    }

    #[test]
    fn test_write_as_directory_failure_removes_partial() {
        let dir = tempdir().unwrap();
        let err = write_as_directory(dir.path(), "t", |d| {
            fs::write(d.join("partial"), b"x").io_context("write", d)?;
            Err(ThemeError::format(d, "boom"))
        })
        .unwrap_err();

        assert!(matches!(err, ThemeError::Format { .. }));
        assert!(!dir.path().join("t").exists());
    }

    #[test]
    fn test_write_as_archive_leaves_only_archive() {
        let dir = tempdir().unwrap();
        let dest = write_as_archive(dir.path(), "packed", |d| {
            fs::write(d.join(theme::CONFIG_FILE), b"{}").io_context("write", d)?;
            fs::write(d.join("icons.png"), b"icons").io_context("write", d)
        })
        .unwrap();

        assert_eq!(dest, dir.path().join("packed.zip"));
        assert!(exists(dir.path(), "packed", ThemeFormat::Archive));
        assert!(!exists(dir.path(), "packed", ThemeFormat::Directory));
        assert!(scratch_dirs(dir.path()).is_empty());

        let mut zip = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let mut names: Vec<_> = zip.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["config.txt", "icons.png"]);
        assert!(zip.by_name("icons.png").is_ok());
    }

    #[test]
    fn test_write_as_archive_replaces_same_named_directory() {
        let dir = tempdir().unwrap();
        write_as_directory(dir.path(), "swap", |d| {
            fs::write(d.join(theme::CONFIG_FILE), b"{}").io_context("write", d)
        })
        .unwrap();
        assert!(exists(dir.path(), "swap", ThemeFormat::Archive));
        assert_eq!(
            conflicting_path(dir.path(), "swap", ThemeFormat::Archive),
            Some(dir.path().join("swap"))
        );

        write_as_archive(dir.path(), "swap", |d| {
            fs::write(d.join(theme::CONFIG_FILE), b"{}").io_context("write", d)
        })
        .unwrap();

        assert_eq!(discover(dir.path()).unwrap(), vec!["swap.zip"]);
        assert_eq!(
            conflicting_path(dir.path(), "swap", ThemeFormat::Archive),
            Some(dir.path().join("swap.zip"))
        );
    }

    #[test]
    fn test_write_as_archive_failure_keeps_previous_archive() {
        let dir = tempdir().unwrap();
        write_zip(&dir.path().join("keep.zip"), &[("config.txt", b"{}")]);

        let err = write_as_archive(dir.path(), "keep", |d| Err(ThemeError::format(d, "boom"))).unwrap_err();
        assert!(matches!(err, ThemeError::Format { .. }));
        assert!(exists(dir.path(), "keep", ThemeFormat::Archive));
        assert!(scratch_dirs(dir.path()).is_empty());
    }

    #[test]
    fn test_remove_is_noop_when_missing() {
        let dir = tempdir().unwrap();
        remove(dir.path(), "ghost", ThemeFormat::Directory).unwrap();
        remove(dir.path(), "ghost", ThemeFormat::Archive).unwrap();
    }
}
