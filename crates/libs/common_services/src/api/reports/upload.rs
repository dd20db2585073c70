use crate::api::reports::error::ReportError;
use crate::api::reports::interfaces::ImageUpload;
use app_state::StorageSettings;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Writes report images into the upload folder and removes them again.
#[derive(Debug, Clone)]
pub struct UploadStore {
    storage: StorageSettings,
}

impl UploadStore {
    #[must_use]
    pub const fn new(storage: StorageSettings) -> Self {
        Self { storage }
    }

    #[must_use]
    pub fn folder(&self) -> &Path {
        &self.storage.upload_folder
    }

    #[must_use]
    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.storage.upload_path(file_name)
    }

    /// Checks size and type of an upload and returns the extension it will be stored with.
    ///
    /// # Errors
    ///
    /// * `ReportError::TooLarge` if the file exceeds the configured size.
    /// * `ReportError::Validation` if it is not an image with an allowed extension.
    pub fn check_image(&self, image: &ImageUpload) -> Result<String, ReportError> {
        if image.bytes.is_empty() {
            return Err(ReportError::Validation("Please upload an image".to_owned()));
        }
        if image.bytes.len() > self.storage.max_upload_bytes {
            return Err(ReportError::TooLarge {
                max_bytes: self.storage.max_upload_bytes,
            });
        }

        let is_image = image
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("image/"));
        if !is_image {
            return Err(ReportError::Validation(
                "Only image files are allowed!".to_owned(),
            ));
        }

        let extension = image
            .file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .or_else(|| {
                image
                    .content_type
                    .as_deref()
                    .and_then(|ct| self.extension_for_mime(ct))
            })
            .ok_or_else(|| ReportError::Validation("Only image files are allowed!".to_owned()))?;

        if !self.storage.is_allowed_extension(&extension) {
            return Err(ReportError::Validation(format!(
                "Image type '.{extension}' is not allowed"
            )));
        }
        Ok(extension)
    }

    /// Picks the first extension registered for `content_type` that the whitelist accepts,
    /// falling back to the first registered one so the rejection can name it.
    fn extension_for_mime(&self, content_type: &str) -> Option<String> {
        let candidates = mime_guess::get_mime_extensions_str(content_type)?;
        candidates
            .iter()
            .find(|ext| self.storage.is_allowed_extension(ext))
            .or_else(|| candidates.first())
            .map(|ext| (*ext).to_owned())
    }

    /// Validates and writes the image under a fresh unique name, returning that name.
    ///
    /// # Errors
    ///
    /// * See [`UploadStore::check_image`].
    /// * `ReportError::Storage` if the file cannot be written.
    pub async fn persist(&self, image: &ImageUpload) -> Result<String, ReportError> {
        let extension = self.check_image(image)?;
        let file_name = format!(
            "report-{}-{}.{extension}",
            Utc::now().timestamp_millis(),
            rand::random_range(0..1_000_000_000_u32)
        );
        let path = self.path_of(&file_name);

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        if let Err(err) = file.write_all(&image.bytes).await {
            drop(file);
            self.discard(&file_name).await;
            return Err(err.into());
        }
        file.flush().await?;
        debug!("Stored upload {}", path.display());

        Ok(file_name)
    }

    /// Best-effort removal. A missing file is fine, other failures are logged.
    pub async fn discard(&self, file_name: &str) {
        let path = self.path_of(file_name);
        match fs::remove_file(&path).await {
            Ok(()) => debug!("Removed upload {}", path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!("Could not remove upload {}: {}", path.display(), err),
        }
    }
}
