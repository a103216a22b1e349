use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8001";
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(2500);
pub const SETTINGS_FILE_NAME: &str = "tryon.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid backend url '{url}': {reason}")]
    InvalidBackendUrl { url: String, reason: String },
    #[error("failed to read settings file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings file '{}': {source}", path.display())]
    InvalidFile {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Client-side knobs. The backend URL is always normalized: `http` or
/// `https`, no trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    backend_url: String,
    pub request_timeout: Option<Duration>,
    pub progress_interval: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl ClientSettings {
    pub fn with_backend_url(mut self, raw: &str) -> Result<Self, SettingsError> {
        self.backend_url = normalize_backend_url(raw)?;
        Ok(self)
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.backend_url, path)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    backend_url: Option<String>,
    request_timeout_seconds: Option<u64>,
    progress_interval_ms: Option<u64>,
}

pub fn normalize_backend_url(raw: &str) -> Result<String, SettingsError> {
    let raw = raw.trim();
    let parsed = Url::parse(raw).map_err(|err| SettingsError::InvalidBackendUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SettingsError::InvalidBackendUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

/// Defaults, then the first settings file found, then the environment.
pub fn load_settings() -> Result<ClientSettings, SettingsError> {
    let file = settings_file_candidates()
        .into_iter()
        .find(|path| path.is_file())
        .map(|path| read_settings_file(&path).map(|raw| (path, raw)))
        .transpose()?;

    let (path, raw) = match file {
        Some((path, raw)) => (Some(path), Some(raw)),
        None => (None, None),
    };
    if let Some(path) = &path {
        debug!(path = %path.display(), "settings: loaded file");
    }

    resolve_settings(raw.as_deref(), path.as_deref(), |name| std::env::var(name).ok())
}

pub fn resolve_settings(
    file_contents: Option<&str>,
    file_path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientSettings, SettingsError> {
    let mut settings = ClientSettings::default();

    if let Some(raw) = file_contents {
        let file_cfg: FileSettings =
            toml::from_str(raw).map_err(|source| SettingsError::InvalidFile {
                path: file_path
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE_NAME)),
                source,
            })?;
        if let Some(url) = file_cfg.backend_url {
            settings = settings.with_backend_url(&url)?;
        }
        if let Some(seconds) = file_cfg.request_timeout_seconds {
            settings.request_timeout = timeout_from_seconds(seconds);
        }
        if let Some(ms) = file_cfg.progress_interval_ms {
            settings.progress_interval = Duration::from_millis(ms.max(100));
        }
    }

    if let Some(url) = non_empty(env("BACKEND_URL")) {
        settings = settings.with_backend_url(&url)?;
    }
    if let Some(url) = non_empty(env("APP__BACKEND_URL")) {
        settings = settings.with_backend_url(&url)?;
    }

    if let Some(raw) = non_empty(env("APP__REQUEST_TIMEOUT_SECONDS")) {
        match raw.trim().parse::<u64>() {
            Ok(seconds) => settings.request_timeout = timeout_from_seconds(seconds),
            Err(err) => warn!("ignoring APP__REQUEST_TIMEOUT_SECONDS='{raw}': {err}"),
        }
    }

    Ok(settings)
}

// Zero means "no timeout".
fn timeout_from_seconds(seconds: u64) -> Option<Duration> {
    (seconds > 0).then(|| Duration::from_secs(seconds))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn read_settings_file(path: &Path) -> Result<String, SettingsError> {
    fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn settings_file_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(SETTINGS_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("tryon").join(SETTINGS_FILE_NAME));
    }
    candidates
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
