use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};

const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Yandex,
    LocalMock,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "yandex" => Ok(Self::Yandex),
            "local_mock" => Ok(Self::LocalMock),
            other => bail!("unknown cloud provider: '{other}'. Available: 'yandex', 'local_mock'"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MirrorConfig {
    pub local_folder: PathBuf,
    pub cloud_folder: String,
    pub access_token: String,
    pub sync_interval: Duration,
    pub log_path: Option<PathBuf>,
    pub provider: ProviderKind,
}

impl MirrorConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an injectable variable lookup, so tests
    /// do not have to mutate the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let local_folder = PathBuf::from(require(&lookup, "LOCAL_FOLDER_PATH")?);
        let cloud_folder = require(&lookup, "CLOUD_FOLDER_NAME")?;
        let access_token = require(&lookup, "ACCESS_TOKEN")?;
        let sync_interval = match lookup("SYNC_INTERVAL") {
            Some(value) => {
                let seconds = value.trim().parse::<u64>().with_context(|| {
                    format!("'SYNC_INTERVAL' must be a whole number of seconds, got '{value}'")
                })?;
                Duration::from_secs(seconds)
            }
            None => Duration::from_secs(DEFAULT_SYNC_INTERVAL_SECS),
        };
        let log_path = lookup("LOG_PATH").filter(|v| !v.is_empty()).map(PathBuf::from);
        let provider = match lookup("CLOUD_PROVIDER") {
            Some(value) => value.parse()?,
            None => ProviderKind::Yandex,
        };

        if !local_folder.is_dir() {
            bail!("local folder '{}' does not exist", local_folder.display());
        }

        Ok(Self {
            local_folder,
            cloud_folder,
            access_token,
            sync_interval,
            log_path,
            provider,
        })
    }
}

fn require(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> anyhow::Result<String> {
    match lookup(name).filter(|value| !value.is_empty()) {
        Some(value) => Ok(value),
        None => bail!("parameter '{name}' is not set"),
    }
}
