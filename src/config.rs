//! Application configuration management.
//!
//! Configuration is stored at `~/.config/moneymate/config.json`. The only
//! behavior it selects for the core is the backend base URL (overridable
//! via `MONEYMATE_API_URL`) and the resend-OTP path; `last_email` just
//! prefills the login prompt.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "moneymate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend used when neither the environment nor the config names one
const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Default resend-OTP endpoint. Kept configurable: the backend has also
/// accepted re-POSTing /auth/signup for the same purpose, and which one
/// is canonical is still an open question with the backend team.
const DEFAULT_RESEND_OTP_PATH: &str = "/auth/resend-otp";

/// Environment variable overriding the configured base URL
const API_URL_ENV: &str = "MONEYMATE_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub resend_otp_path: Option<String>,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Backend base URL: environment wins, then the config file, then the
    /// compiled-in default.
    pub fn api_base_url(&self) -> String {
        std::env::var(API_URL_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn resend_otp_path(&self) -> String {
        self.resend_otp_path
            .clone()
            .unwrap_or_else(|| DEFAULT_RESEND_OTP_PATH.to_string())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted session
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
