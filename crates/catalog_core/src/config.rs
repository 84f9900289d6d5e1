//! Process configuration loaded from environment variables.
//!
//! # Responsibility
//! - Collect database, storage, logging and message settings in one typed
//!   value handed to startup code.
//! - Keep user-facing text configurable instead of hardcoded at call sites.
//!
//! # Invariants
//! - The extension allow-list is never empty and holds lowercase entries
//!   without dots or path separators.
//! - Unset variables fall back to the documented defaults; set-but-invalid
//!   variables are errors, not silently ignored.

use crate::logging::{default_log_level, normalize_level};
use crate::validate::{ValidationError, DEFAULT_ALLOWED_EXTENSIONS};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "CATALOG_DB_PATH";
pub const ENV_UPLOAD_DIR: &str = "CATALOG_UPLOAD_DIR";
pub const ENV_ALLOWED_EXTENSIONS: &str = "CATALOG_ALLOWED_EXTENSIONS";
pub const ENV_LOG_LEVEL: &str = "CATALOG_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CATALOG_LOG_DIR";
pub const ENV_MSG_EMPTY_TITLE: &str = "CATALOG_MSG_EMPTY_TITLE";
pub const ENV_MSG_NO_FILE: &str = "CATALOG_MSG_NO_FILE";
pub const ENV_MSG_INVALID_PRICE: &str = "CATALOG_MSG_INVALID_PRICE";
pub const ENV_MSG_INVALID_FILE_PREFIX: &str = "CATALOG_MSG_INVALID_FILE_PREFIX";
pub const ENV_MSG_CONFIRM_DELETE: &str = "CATALOG_MSG_CONFIRM_DELETE";

const DEFAULT_DB_PATH: &str = "catalog.sqlite3";
const DEFAULT_UPLOAD_DIR: &str = "static/uploads";
const IN_MEMORY_DB: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Variable is set but blank.
    Empty(&'static str),
    InvalidLogLevel(String),
    /// Allow-list entry that cannot be a bare extension.
    InvalidExtension(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(var) => write!(f, "`{var}` is set but empty"),
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
            Self::InvalidExtension(value) => write!(
                f,
                "invalid entry `{value}` in {ENV_ALLOWED_EXTENSIONS}; expected bare extensions like `png`"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Where the catalog database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    Memory,
}

/// User-facing text rendered by the boundary layer.
///
/// Defaults are the catalog's Spanish wording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Messages {
    pub empty_title: String,
    pub no_file_selected: String,
    pub invalid_price: String,
    /// Followed by the comma-separated allow-list when rendered.
    pub invalid_file_prefix: String,
    pub confirm_delete: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            empty_title: "ingrese un nombre para el articulo".to_string(),
            no_file_selected: "No se seleccionó ningún archivo".to_string(),
            invalid_price: "Debes ingresar un precio válido".to_string(),
            invalid_file_prefix:
                "Archivo no válido. Se permiten solo archivos con las siguientes extensiones:"
                    .to_string(),
            confirm_delete: "¿Estás seguro que deseas eliminar este artículo?".to_string(),
        }
    }
}

impl Messages {
    /// Renders the message shown for one validation failure.
    pub fn for_validation<S: AsRef<str>>(&self, err: ValidationError, allowed: &[S]) -> String {
        match err {
            ValidationError::EmptyTitle => self.empty_title.clone(),
            ValidationError::NoFileSelected => self.no_file_selected.clone(),
            ValidationError::InvalidPrice => self.invalid_price.clone(),
            ValidationError::DisallowedExtension => {
                let list = allowed
                    .iter()
                    .map(|ext| ext.as_ref())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{} {list}", self.invalid_file_prefix)
            }
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub db: DbLocation,
    pub upload_dir: PathBuf,
    pub allowed_extensions: Vec<String>,
    pub log_level: &'static str,
    /// Logging stays off when unset.
    pub log_dir: Option<String>,
    pub messages: Messages,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            db: DbLocation::File(PathBuf::from(DEFAULT_DB_PATH)),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| (*ext).to_string())
                .collect(),
            log_level: default_log_level(),
            log_dir: None,
            messages: Messages::default(),
        }
    }
}

impl CatalogConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Tests pass a map-backed closure instead of mutating the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = non_empty(&lookup, ENV_DB_PATH)? {
            config.db = if value == IN_MEMORY_DB {
                DbLocation::Memory
            } else {
                DbLocation::File(PathBuf::from(value))
            };
        }

        if let Some(value) = non_empty(&lookup, ENV_UPLOAD_DIR)? {
            config.upload_dir = PathBuf::from(value);
        }

        if let Some(value) = non_empty(&lookup, ENV_ALLOWED_EXTENSIONS)? {
            config.allowed_extensions = parse_extensions(&value)?;
        }

        if let Some(value) = non_empty(&lookup, ENV_LOG_LEVEL)? {
            config.log_level = normalize_level(&value).map_err(ConfigError::InvalidLogLevel)?;
        }

        config.log_dir = non_empty(&lookup, ENV_LOG_DIR)?;

        let messages = &mut config.messages;
        for (key, slot) in [
            (ENV_MSG_EMPTY_TITLE, &mut messages.empty_title),
            (ENV_MSG_NO_FILE, &mut messages.no_file_selected),
            (ENV_MSG_INVALID_PRICE, &mut messages.invalid_price),
            (ENV_MSG_INVALID_FILE_PREFIX, &mut messages.invalid_file_prefix),
            (ENV_MSG_CONFIRM_DELETE, &mut messages.confirm_delete),
        ] {
            if let Some(value) = non_empty(&lookup, key)? {
                *slot = value;
            }
        }

        Ok(config)
    }
}

fn non_empty<F>(lookup: &F, key: &'static str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Err(ConfigError::Empty(key)),
        Some(value) => Ok(Some(value.trim().to_string())),
    }
}

fn parse_extensions(raw: &str) -> Result<Vec<String>, ConfigError> {
    let mut extensions: Vec<String> = Vec::new();
    for entry in raw.split(',') {
        let normalized = entry.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            continue;
        }
        if normalized.contains(['.', '/', '\\']) || normalized.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidExtension(entry.trim().to_string()));
        }
        if !extensions.contains(&normalized) {
            extensions.push(normalized);
        }
    }

    if extensions.is_empty() {
        return Err(ConfigError::Empty(ENV_ALLOWED_EXTENSIONS));
    }
    Ok(extensions)
}
