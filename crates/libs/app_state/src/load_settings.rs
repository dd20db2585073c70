use crate::{AppSettings, RawSettings};
use color_eyre::eyre::Result;
use std::fs;
use std::path::Path;
use tracing::info;

/// Loads `config/settings.yaml`, layered with `APP__SECTION__KEY` environment overrides.
pub fn load_app_settings() -> Result<AppSettings> {
    load_app_settings_from(Path::new("config/settings.yaml"))
}

pub fn load_app_settings_from(config_path: &Path) -> Result<AppSettings> {
    // Need to load from dotenv to get it to overwrite values from env.
    dotenv::from_path(".env").ok();
    let config_path = config_path.canonicalize()?;

    let builder = config::Config::builder()
        .add_source(config::File::from(config_path))
        .add_source(
            config::Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        );

    let raw_settings = builder.build()?.try_deserialize::<RawSettings>()?;
    let settings = AppSettings::try_from(raw_settings)?;

    fs::create_dir_all(&settings.storage.upload_folder)?;
    info!(
        "Uploads directory: {}",
        settings.storage.upload_folder.display()
    );

    Ok(settings)
}
