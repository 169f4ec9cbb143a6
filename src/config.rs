//! Configuration loaded from `smarttraffic.toml`.
//!
//! [`FlowConfig`] holds every tunable parameter. Values missing from the
//! file fall back to defaults. The `SMARTTRAFFIC_API_URL` environment
//! variable takes precedence over the file for the backend URL.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;

use crate::service::client::DEFAULT_BASE_URL;
use crate::workflow::validation::DEFAULT_MAX_UPLOAD_BYTES;

pub const CONFIG_FILE: &str = "smarttraffic.toml";
pub const API_URL_ENV: &str = "SMARTTRAFFIC_API_URL";

/// Top-level configuration loaded from `smarttraffic.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowConfig {
    /// Base URL of the upload/analysis backend.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Largest file accepted for upload, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// Directory exported reports are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Overall timeout for a single backend request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

// OCR plus analysis on a large PDF can take a while.
fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            max_upload_bytes: default_max_upload_bytes(),
            output_dir: default_output_dir(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl FlowConfig {
    /// Load `smarttraffic.toml` from the current directory, or defaults if absent.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<FlowConfig>(&contents)?
        } else {
            Self::default()
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.is_empty() {
                config.api_base_url = url;
            }
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
