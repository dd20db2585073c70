use crate::AppConstants;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct RawSettings {
    pub api: ApiSettings,
    pub logging: LoggingSettings,
    pub secrets: SecretSettings,
    pub storage: RawStorageSettings,
    pub constants: AppConstants,
    /// Create the admin/user1/user2 demo accounts on startup.
    #[serde(default)]
    pub seed_demo_users: bool,
}

/// Configuration for the API server.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub host: String,
    pub port: u32,
    pub allowed_origins: Vec<String>,
    pub public_url: String,
    /// Prefix every JSON route is mounted under. Empty mounts them at the root.
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

fn default_base_path() -> String {
    "/api".to_owned()
}

impl ApiSettings {
    /// `base_path` as `/segment[/segment]`, or empty when routes live at the root.
    #[must_use]
    pub fn route_prefix(&self) -> String {
        let trimmed = self.base_path.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }
}

/// Logging configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecretSettings {
    pub jwt: String,
    pub database_url: String,
}

/// Where reports live and where their images are written.
#[derive(Debug, Deserialize, Clone)]
pub struct RawStorageSettings {
    pub backend: StorageBackend,
    pub upload_folder: PathBuf,
    pub max_upload_bytes: usize,
    pub allowed_image_extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    /// Keeps everything in process memory, lost on restart.
    Memory,
}
