use app_state::{AppSettings, StorageBackend};
use axum::extract::FromRef;
use color_eyre::Result;
use common_services::api::auth::service::TokenConfig;
use common_services::api::reports::service::ReportService;
use common_services::api::reports::upload::UploadStore;
use common_services::database::memory_store::MemoryStore;
use common_services::database::report_store::PgReportStore;
use common_services::database::user_store::PgUserStore;
use common_services::database::{ReportRepository, UserRepository, get_db_pool};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct ApiContext {
    pub users: Arc<dyn UserRepository>,
    pub reports: ReportService,
    pub settings: AppSettings,
}

impl ApiContext {
    #[must_use]
    pub fn new(
        settings: AppSettings,
        users: Arc<dyn UserRepository>,
        reports: Arc<dyn ReportRepository>,
    ) -> Self {
        let service = ReportService::new(
            users.clone(),
            reports,
            UploadStore::new(settings.storage.clone()),
            settings.constants.reports.clone(),
            settings.constants.database.report_id_length,
        );
        Self {
            users,
            reports: service,
            settings,
        }
    }

    /// Builds the stores selected by `storage.backend`.
    pub async fn from_settings(settings: AppSettings) -> Result<Self> {
        match settings.storage.backend {
            StorageBackend::Postgres => {
                let pool = get_db_pool(&settings).await?;
                Ok(Self::new(
                    settings,
                    Arc::new(PgUserStore::new(pool.clone())),
                    Arc::new(PgReportStore::new(pool)),
                ))
            }
            StorageBackend::Memory => {
                info!("Using in-memory storage, data is lost on restart.");
                let store = Arc::new(MemoryStore::new());
                Ok(Self::new(settings, store.clone(), store))
            }
        }
    }

    #[must_use]
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            jwt_secret: self.settings.secrets.jwt.clone(),
            expiry_minutes: self.settings.constants.auth.access_token_expiry_minutes,
        }
    }
}

// These impls allow Axum to extract parts of the ApiContext directly.
impl FromRef<ApiContext> for ReportService {
    fn from_ref(state: &ApiContext) -> Self {
        state.reports.clone()
    }
}

impl FromRef<ApiContext> for AppSettings {
    fn from_ref(state: &ApiContext) -> Self {
        state.settings.clone()
    }
}
