use crate::{
    ApiSettings, AppConstants, LoggingSettings, RawSettings, SecretSettings, StorageBackend,
};
use color_eyre::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf, absolute};

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub api: ApiSettings,
    pub logging: LoggingSettings,
    pub secrets: SecretSettings,
    pub storage: StorageSettings,
    pub constants: AppConstants,
    pub seed_demo_users: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Absolute path of the folder uploaded images are written to.
    pub upload_folder: PathBuf,
    pub max_upload_bytes: usize,
    /// Lowercase, without leading dot.
    pub allowed_image_extensions: Vec<String>,
}

impl TryFrom<RawSettings> for AppSettings {
    type Error = color_eyre::Report;

    fn try_from(raw: RawSettings) -> Result<Self> {
        let storage = StorageSettings {
            backend: raw.storage.backend,
            upload_folder: absolute(&raw.storage.upload_folder)?,
            max_upload_bytes: raw.storage.max_upload_bytes,
            allowed_image_extensions: raw
                .storage
                .allowed_image_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        };

        Ok(Self {
            api: raw.api,
            logging: raw.logging,
            secrets: raw.secrets,
            storage,
            constants: raw.constants,
            seed_demo_users: raw.seed_demo_users,
        })
    }
}

impl StorageSettings {
    #[must_use]
    pub fn is_allowed_extension(&self, extension: &str) -> bool {
        let extension = extension.to_lowercase();
        self.allowed_image_extensions.contains(&extension)
    }

    /// Path an uploaded image with this file name is stored at.
    #[must_use]
    pub fn upload_path(&self, file_name: &str) -> PathBuf {
        self.upload_folder.join(Path::new(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuthConstants, DatabaseConstants, RawStorageSettings, ReportConstants};

    fn raw(upload_folder: &str) -> RawSettings {
        RawSettings {
            api: ApiSettings {
                host: "127.0.0.1".into(),
                port: 5000,
                allowed_origins: vec![],
                public_url: "http://localhost:5000".into(),
                base_path: "/api".into(),
            },
            logging: LoggingSettings {
                level: "info".into(),
            },
            secrets: SecretSettings {
                jwt: "secret".into(),
                database_url: String::new(),
            },
            storage: RawStorageSettings {
                backend: StorageBackend::Memory,
                upload_folder: upload_folder.into(),
                max_upload_bytes: 1024,
                allowed_image_extensions: vec![".JPG".into(), "png".into()],
            },
            constants: AppConstants {
                database: DatabaseConstants {
                    max_connections: 5,
                    min_connection: 1,
                    max_lifetime: 60,
                    idle_timeout: 60,
                    acquire_timeout: 5,
                    report_id_length: 12,
                },
                auth: AuthConstants {
                    access_token_expiry_minutes: 60,
                },
                reports: ReportConstants::default(),
            },
            seed_demo_users: false,
        }
    }

    #[test]
    fn resolves_upload_folder_and_normalizes_extensions() {
        let settings = AppSettings::try_from(raw("uploads")).expect("valid settings");

        assert!(settings.storage.upload_folder.is_absolute());
        assert!(settings.storage.upload_folder.ends_with("uploads"));
        assert_eq!(settings.storage.allowed_image_extensions, vec!["jpg", "png"]);
        assert!(settings.storage.is_allowed_extension("JPG"));
        assert!(!settings.storage.is_allowed_extension("gif"));
    }

    #[test]
    fn upload_path_joins_file_name() {
        let settings = AppSettings::try_from(raw("/srv/uploads")).expect("valid settings");
        assert_eq!(
            settings.storage.upload_path("report-1.jpg"),
            PathBuf::from("/srv/uploads/report-1.jpg")
        );
    }

    #[test]
    fn route_prefix_normalizes_slashes() {
        let mut api = raw("uploads").api;
        assert_eq!(api.route_prefix(), "/api");
        api.base_path = "v1/".into();
        assert_eq!(api.route_prefix(), "/v1");
        api.base_path = "/".into();
        assert_eq!(api.route_prefix(), "");
    }
}
