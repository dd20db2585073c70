#![allow(dead_code)]

use api::api_state::ApiContext;
use api::build_app;
use app_state::{
    ApiSettings, AppConstants, AppSettings, AuthConstants, DatabaseConstants, LoggingSettings,
    ReportConstants, SecretSettings, StorageBackend, StorageSettings,
};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use color_eyre::Result;
use color_eyre::eyre::eyre;
use common_services::api::auth::service::seed_demo_users;
use common_services::database::ReportRepository;
use common_services::database::memory_store::MemoryStore;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "ecosnap-test-boundary";
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub settings: AppSettings,
    // Keeps the upload folder alive for the duration of the test.
    _upload_dir: TempDir,
}

pub fn test_settings(upload_folder: &Path) -> AppSettings {
    AppSettings {
        api: ApiSettings {
            host: "127.0.0.1".into(),
            port: 0,
            allowed_origins: vec!["http://localhost:5173".into()],
            public_url: "http://localhost:5000".into(),
            base_path: "/api".into(),
        },
        logging: LoggingSettings {
            level: "debug".into(),
        },
        secrets: SecretSettings {
            jwt: "integration-test-secret".into(),
            database_url: String::new(),
        },
        storage: StorageSettings {
            backend: StorageBackend::Memory,
            upload_folder: upload_folder.to_path_buf(),
            max_upload_bytes: 1024 * 1024,
            allowed_image_extensions: vec![
                "jpg".into(),
                "jpeg".into(),
                "png".into(),
                "gif".into(),
                "webp".into(),
            ],
        },
        constants: AppConstants {
            database: DatabaseConstants {
                max_connections: 1,
                min_connection: 1,
                max_lifetime: 60,
                idle_timeout: 60,
                acquire_timeout: 5,
                report_id_length: 16,
            },
            auth: AuthConstants {
                access_token_expiry_minutes: 60,
            },
            reports: ReportConstants::default(),
        },
        seed_demo_users: true,
    }
}

impl TestContext {
    pub async fn new() -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        Self::with_reports(store.clone(), store).await
    }

    /// Users live in `store`, reports in `reports`.
    pub async fn with_reports(
        store: Arc<MemoryStore>,
        reports: Arc<dyn ReportRepository>,
    ) -> Result<Self> {
        let upload_dir = tempfile::tempdir()?;
        let settings = test_settings(upload_dir.path());
        seed_demo_users(store.as_ref()).await?;
        let context = ApiContext::new(settings.clone(), store.clone(), reports);
        Ok(Self {
            app: build_app(context),
            store,
            settings,
            _upload_dir: upload_dir,
        })
    }

    pub fn upload_folder(&self) -> &Path {
        &self.settings.storage.upload_folder
    }

    pub fn uploaded_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = std::fs::read_dir(self.upload_folder())?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        files.sort();
        Ok(files)
    }

    pub async fn send_raw(&self, request: Request<Body>) -> Result<(StatusCode, Vec<u8>)> {
        let response = self.app.clone().oneshot(request).await?;
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, body.to_vec()))
    }

    pub async fn send(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let (status, body) = self.send_raw(request).await?;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body)?
        };
        Ok((status, value))
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(request(Method::GET, uri, token, Body::empty())?).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.send(request(Method::DELETE, uri, Some(token), Body::empty())?)
            .await
    }

    pub async fn send_json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: &Value,
    ) -> Result<(StatusCode, Value)> {
        let mut req = request(method, uri, token, Body::from(serde_json::to_vec(body)?))?;
        req.headers_mut().insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        self.send(req).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let (status, body) = self
            .send_json(
                Method::POST,
                "/api/auth/login",
                None,
                &json!({ "username": username, "password": password }),
            )
            .await?;
        if status != StatusCode::OK {
            return Err(eyre!("login as {username} failed with {status}: {body}"));
        }
        body["data"]["token"]
            .as_str()
            .map(ToOwned::to_owned)
            .ok_or_else(|| eyre!("login response without token: {body}"))
    }

    pub async fn admin_token(&self) -> Result<String> {
        self.login("admin", "admin123").await
    }

    pub async fn create_report(
        &self,
        token: &str,
        form: &MultipartForm,
    ) -> Result<(StatusCode, Value)> {
        let mut req = request(Method::POST, "/api/reports", Some(token), form.body())?;
        req.headers_mut().insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_str(&format!(
                "multipart/form-data; boundary={BOUNDARY}"
            ))?,
        );
        self.send(req).await
    }

    /// Creates a report at `(lat, lng)` and returns its id.
    pub async fn report_at(&self, token: &str, description: &str, lat: f64, lng: f64) -> Result<String> {
        let form = MultipartForm::new()
            .text("description", description)
            .text("coordinates", &json!({ "lat": lat, "lng": lng }).to_string())
            .png("photo.png");
        let (status, body) = self.create_report(token, &form).await?;
        if status != StatusCode::CREATED {
            return Err(eyre!("report creation failed with {status}: {body}"));
        }
        body["data"]["id"]
            .as_str()
            .map(ToOwned::to_owned)
            .ok_or_else(|| eyre!("report response without id: {body}"))
    }
}

pub fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Body,
) -> Result<Request<Body>> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    Ok(builder.body(body)?)
}

/// Hand-built `multipart/form-data` body.
#[derive(Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn png(self, file_name: &str) -> Self {
        self.file("image", file_name, "image/png", PNG_BYTES)
    }

    pub fn body(&self) -> Body {
        let mut body = self.body.clone();
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Body::from(body)
    }
}
