use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::error::{ClientError, Result};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
pub const SETTINGS_FILE: &str = "sandtable.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Overrides the server url when `server_url` is non-empty.
    pub fn with_server_url(mut self, server_url: Option<&str>) -> Self {
        if let Some(url) = server_url.map(str::trim).filter(|url| !url.is_empty()) {
            self.server_url = url.to_string();
        }
        self
    }

    fn apply_file(&mut self, raw: &str) -> Result<()> {
        let file_cfg: FileSettings =
            toml::from_str(raw).map_err(|err| ClientError::Settings(err.to_string()))?;
        if let Some(v) = file_cfg.server_url {
            self.server_url = v;
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            self.request_timeout_secs = Some(v);
        }
        Ok(())
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("SANDTABLE_SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = var("APP__SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
            match v.trim().parse::<u64>() {
                Ok(parsed) => self.request_timeout_secs = Some(parsed),
                Err(err) => {
                    tracing::warn!(value = %v, "ignoring APP__REQUEST_TIMEOUT_SECS: {err}")
                }
            }
        }
    }
}

/// Defaults, then `sandtable.toml` in the working directory, then environment.
pub fn load_settings() -> Result<ClientSettings> {
    load_settings_from(Path::new(SETTINGS_FILE))
}

pub fn load_settings_from(path: &Path) -> Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        settings.apply_file(&raw)?;
    }
    settings.apply_env(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()));

    Ok(settings)
}
