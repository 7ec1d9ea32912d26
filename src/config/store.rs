//! File-backed configuration store.
//!
//! Each value lives in its own file under the config directory:
//!
//! ```text
//! ~/.config/git-commit-ai/
//!   config     API key
//!   model
//!   base_url
//!   provider
//! ```
//!
//! The directory is created with mode 0700 and each file is written
//! atomically with mode 0600 on unix.

use std::env;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::provider::{ProviderConfig, ProviderKind};
use crate::error::ConfigError;

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV_VAR: &str = "CMAI_CONFIG_DIR";

const API_KEY_FILE: &str = "config";
const MODEL_FILE: &str = "model";
const BASE_URL_FILE: &str = "base_url";
const PROVIDER_FILE: &str = "provider";

/// Persisted provider settings.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    /// Open the store at `$CMAI_CONFIG_DIR`, or `~/.config/git-commit-ai`.
    pub fn open() -> Result<Self, ConfigError> {
        Self::at(default_config_dir()?)
    }

    /// Open the store at an explicit directory, creating it if needed.
    pub fn at(dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| ConfigError::CreateDir {
            path: dir.display().to_string(),
            source,
        })?;
        restrict_permissions(&dir, 0o700).map_err(|source| ConfigError::CreateDir {
            path: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the provider config, falling back to per-provider defaults.
    pub fn load(&self) -> Result<ProviderConfig, ConfigError> {
        let provider = match self.get(PROVIDER_FILE)? {
            Some(id) => id.parse::<ProviderKind>()?,
            None => ProviderKind::OpenRouter,
        };
        let base_url = match self.get(BASE_URL_FILE)? {
            Some(url) => url,
            None => provider
                .default_base_url()
                .map(str::to_string)
                .unwrap_or_default(),
        };
        let model = self
            .get(MODEL_FILE)?
            .unwrap_or_else(|| provider.default_model().to_string());
        let api_key = self.get(API_KEY_FILE)?;

        debug!(provider = provider.id(), %base_url, %model, "Loaded provider config");

        Ok(ProviderConfig {
            provider,
            base_url,
            model,
            api_key,
        })
    }

    /// Persist provider, base URL and model. The API key is stored separately.
    pub fn save(&self, config: &ProviderConfig) -> Result<(), ConfigError> {
        self.set(PROVIDER_FILE, config.provider.id())?;
        self.set(BASE_URL_FILE, &config.base_url)?;
        self.set(MODEL_FILE, &config.model)?;
        Ok(())
    }

    /// Store an API key, keeping only the first whitespace-separated token.
    ///
    /// Returns the cleaned key.
    pub fn save_api_key(&self, raw: &str) -> Result<String, ConfigError> {
        let key = clean_api_key(raw);
        self.set(API_KEY_FILE, &key)?;
        Ok(key)
    }

    pub fn save_model(&self, model: &str) -> Result<(), ConfigError> {
        self.set(MODEL_FILE, model)
    }

    pub fn save_base_url(&self, base_url: &str) -> Result<(), ConfigError> {
        self.set(BASE_URL_FILE, base_url)
    }

    fn get(&self, key: &'static str) -> Result<Option<String>, ConfigError> {
        match fs::read_to_string(self.dir.join(key)) {
            Ok(value) => {
                let value = value.trim();
                Ok((!value.is_empty()).then(|| value.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ConfigError::Read { key, source }),
        }
    }

    fn set(&self, key: &'static str, value: &str) -> Result<(), ConfigError> {
        let write = || -> std::io::Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
            tmp.write_all(value.as_bytes())?;
            restrict_permissions(tmp.path(), 0o600)?;
            tmp.persist(self.dir.join(key)).map_err(|e| e.error)?;
            Ok(())
        };
        write().map_err(|source| ConfigError::Write { key, source })
    }
}

fn default_config_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = env::var(CONFIG_DIR_ENV_VAR)
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    match env::var("HOME") {
        Ok(home) if !home.is_empty() => Ok(PathBuf::from(home).join(".config").join("git-commit-ai")),
        _ => Err(ConfigError::NoConfigDir),
    }
}

/// Keys are often pasted with quotes or trailing shell arguments.
fn clean_api_key(raw: &str) -> String {
    raw.split_whitespace()
        .next()
        .unwrap_or("")
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string()
}

#[cfg(unix)]
fn restrict_permissions(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}
