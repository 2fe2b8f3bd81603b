use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

const JWT_SECRET_FILE: &str = "/run/secrets/JWT_SECRET";

#[derive(Debug)]
pub enum ConfigError {
    InvalidDbUrl { raw: String },
    MissingJwtSecret,
    Io(std::io::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ConfigError::MissingJwtSecret => write!(
                f,
                "JWT secret is not configured (set JWT_SECRET or {JWT_SECRET_FILE})"
            ),
            ConfigError::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

/// Turn a bare or relative path into an absolute `sqlite://` URL.
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:"
        || trimmed.starts_with("sqlite://")
        || trimmed.starts_with("sqlite:file:")
    {
        return trimmed.to_owned();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file and its parent directory when missing.
///
/// # Errors
///
/// Returns `ConfigError` for a URL without a path or if the file cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), ConfigError> {
    if db_url == "sqlite::memory:" || db_url.starts_with("sqlite:file:") {
        return Ok(());
    }

    let invalid = || ConfigError::InvalidDbUrl {
        raw: db_url.to_owned(),
    };
    let path = db_url.strip_prefix("sqlite://").ok_or_else(invalid)?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(invalid());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
        info!(path = %path.display(), "created database file");
    }
    Ok(())
}

/// Pick the token secret from the flag/env value, else from the secret file.
///
/// # Errors
///
/// Returns `ConfigError::MissingJwtSecret` when neither source has a value.
pub fn resolve_jwt_secret(configured: Option<&str>) -> Result<String, ConfigError> {
    resolve_jwt_secret_from(configured, Path::new(JWT_SECRET_FILE))
}

fn resolve_jwt_secret_from(
    configured: Option<&str>,
    secret_file: &Path,
) -> Result<String, ConfigError> {
    if let Some(secret) = configured.map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(secret.to_owned());
    }
    match fs::read_to_string(secret_file) {
        Ok(contents) if !contents.trim().is_empty() => Ok(contents.trim().to_owned()),
        Ok(_) => Err(ConfigError::MissingJwtSecret),
        Err(err) => {
            warn!(path = %secret_file.display(), "failed to read JWT secret: {err}");
            Err(ConfigError::MissingJwtSecret)
        }
    }
}
