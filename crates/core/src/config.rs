//! YAML application configuration (`config.yaml`).
//!
//! Only the keys the web control plane reads or edits are typed; every other
//! key in the file is carried through [`AppConfig::extra`] so a save never
//! drops settings that belong to the command-line downloader.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use amdl_web_types::Quality;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Value shipped in the sample config; treated as "not configured".
pub const PLACEHOLDER_TOKEN: &str = "your-authorization-token";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AppConfig {
    pub media_user_token: String,
    pub authorization_token: String,
    pub storefront: String,
    pub alac_save_folder: String,
    pub atmos_save_folder: String,
    pub aac_save_folder: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            media_user_token: String::new(),
            authorization_token: PLACEHOLDER_TOKEN.to_string(),
            storefront: "us".to_string(),
            alac_save_folder: "AM-DL downloads".to_string(),
            atmos_save_folder: "AM-DL-Atmos downloads".to_string(),
            aac_save_folder: "AM-DL-AAC downloads".to_string(),
            extra: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    pub fn has_media_user_token(&self) -> bool {
        is_real_token(&self.media_user_token)
    }

    /// The statically configured authorization token, unless it is empty or
    /// still the placeholder.
    pub fn fallback_authorization_token(&self) -> Option<&str> {
        is_real_token(&self.authorization_token).then_some(self.authorization_token.as_str())
    }

    pub fn save_folder(&self, quality: Quality) -> &str {
        match quality {
            Quality::Alac => &self.alac_save_folder,
            Quality::Atmos => &self.atmos_save_folder,
            Quality::Aac => &self.aac_save_folder,
        }
    }

    fn apply(&mut self, update: ConfigUpdate) {
        let ConfigUpdate {
            media_user_token,
            authorization_token,
            storefront,
            alac_save_folder,
            atmos_save_folder,
            aac_save_folder,
        } = update;
        let fields = [
            (media_user_token, &mut self.media_user_token),
            (authorization_token, &mut self.authorization_token),
            (storefront, &mut self.storefront),
            (alac_save_folder, &mut self.alac_save_folder),
            (atmos_save_folder, &mut self.atmos_save_folder),
            (aac_save_folder, &mut self.aac_save_folder),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

fn is_real_token(token: &str) -> bool {
    !token.is_empty() && token != PLACEHOLDER_TOKEN
}

/// Partial update posted by the UI. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigUpdate {
    pub media_user_token: Option<String>,
    pub authorization_token: Option<String>,
    pub storefront: Option<String>,
    pub alac_save_folder: Option<String>,
    pub atmos_save_folder: Option<String>,
    pub aac_save_folder: Option<String>,
}

/// The loaded configuration document plus the file it persists to.
pub struct ConfigStore {
    path: PathBuf,
    current: RwLock<AppConfig>,
    /// Serializes file writes so the file always holds the latest update.
    save_lock: tokio::sync::Mutex<()>,
}

impl ConfigStore {
    /// Read `path`; a missing file yields defaults.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = match std::fs::read_to_string(&path) {
            Ok(text) => parse(&path, &text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No config file, using defaults");
                AppConfig::default()
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        Ok(Self::with_config(path, config))
    }

    pub fn with_config(path: impl Into<PathBuf>, config: AppConfig) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(config),
            save_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> AppConfig {
        self.read().clone()
    }

    /// Apply `update` in memory, then persist the resulting document.
    pub async fn update(&self, update: ConfigUpdate) -> Result<AppConfig, ConfigError> {
        let _saving = self.save_lock.lock().await;
        let updated = {
            let mut current = self.write();
            current.apply(update);
            current.clone()
        };

        let text = serde_yaml::to_string(&updated).map_err(ConfigError::Serialize)?;
        tokio::fs::write(&self.path, text)
            .await
            .map_err(|source| ConfigError::Write {
                path: self.path.clone(),
                source,
            })?;
        tracing::info!(path = %self.path.display(), "Config saved");
        Ok(updated)
    }

    fn read(&self) -> RwLockReadGuard<'_, AppConfig> {
        self.current.read().unwrap_or_else(|poisoned| {
            tracing::error!("Config lock poisoned (read)");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, AppConfig> {
        self.current.write().unwrap_or_else(|poisoned| {
            tracing::error!("Config lock poisoned (write)");
            poisoned.into_inner()
        })
    }
}

fn parse(path: &Path, text: &str) -> Result<AppConfig, ConfigError> {
    if text.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
