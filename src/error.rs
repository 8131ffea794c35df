//! Error types for the theme engine

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThemeError {
    /// Config root marker, theme, theme config file or JSON file missing
    #[error("{what} not found: {}", path.display())]
    NotFound { what: String, path: PathBuf },

    /// Malformed JSON or theme config line
    #[error("invalid format in {}: {message}", path.display())]
    Format { path: PathBuf, message: String },

    /// Export target already exists and overwrite was not confirmed
    #[error("theme '{name}' already exists at {}", path.display())]
    Conflict { name: String, path: PathBuf },

    #[error("invalid theme name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("{context} ({}): {source}", path.display())]
    Io {
        context: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ThemeError {
    pub fn not_found(what: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::NotFound { what: what.into(), path: path.into() }
    }

    pub fn format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Format { path: path.into(), message: message.into() }
    }

    pub fn io(context: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, ThemeError>;

/// Attach filesystem context to `std::io` results
pub(crate) trait IoContext<T> {
    fn io_context(self, context: &str, path: &Path) -> Result<T>;
}

impl<T, E> IoContext<T> for std::result::Result<T, E>
where
    E: Into<std::io::Error>,
{
    fn io_context(self, context: &str, path: &Path) -> Result<T> {
        self.map_err(|e| ThemeError::io(context, path, e.into()))
    }
}
