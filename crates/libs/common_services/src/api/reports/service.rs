use crate::api::reports::error::ReportError;
use crate::api::reports::interfaces::{
    CreateReportForm, NearbyParams, NearbyReport, ReportResponse, UpdateReportRequest,
};
use crate::api::reports::lifecycle::ReportChanges;
use crate::api::reports::policy::{ReportAction, authorize, owner_scope};
use crate::api::reports::query::{ListReportsParams, Pagination, ReportListQuery, ReportStats};
use crate::api::reports::upload::UploadStore;
use crate::database::app_user::User;
use crate::database::report::{Coordinates, Report, ReportPriority, ReportStatus};
use crate::database::{ReportRepository, UserRepository};
use crate::utils::nice_id;
use app_state::ReportConstants;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

/// Report use cases: authorization, lifecycle, queries and image handling.
#[derive(Clone)]
pub struct ReportService {
    users: Arc<dyn UserRepository>,
    reports: Arc<dyn ReportRepository>,
    uploads: UploadStore,
    constants: ReportConstants,
    id_length: usize,
}

impl ReportService {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        reports: Arc<dyn ReportRepository>,
        uploads: UploadStore,
        constants: ReportConstants,
        id_length: usize,
    ) -> Self {
        Self {
            users,
            reports,
            uploads,
            constants,
            id_length,
        }
    }

    #[must_use]
    pub const fn uploads(&self) -> &UploadStore {
        &self.uploads
    }

    /// Checks the report store is reachable.
    pub async fn ping(&self) -> Result<(), ReportError> {
        Ok(self.reports.ping().await?)
    }

    /// Loads owners and resolvers of `reports` and shapes them into responses.
    async fn populate(&self, reports: Vec<Report>) -> Result<Vec<ReportResponse>, ReportError> {
        let ids: BTreeSet<i32> = reports
            .iter()
            .flat_map(|r| std::iter::once(r.user_id).chain(r.resolved_by))
            .collect();
        let ids: Vec<i32> = ids.into_iter().collect();
        let users: HashMap<i32, User> = self
            .users
            .find_users_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(reports
            .into_iter()
            .map(|r| ReportResponse::from_report(r, &users))
            .collect())
    }

    async fn populate_one(&self, report: Report) -> Result<ReportResponse, ReportError> {
        self.populate(vec![report])
            .await?
            .pop()
            .ok_or(ReportError::NotFound)
    }

    async fn find_existing(&self, report_id: &str) -> Result<Report, ReportError> {
        self.reports
            .find_report(report_id)
            .await?
            .ok_or(ReportError::NotFound)
    }

    /// Validates the form, stores the image, then the record. A failed insert removes the image.
    ///
    /// # Errors
    ///
    /// * `ReportError::Validation` / `ReportError::TooLarge` for bad input, nothing is written.
    /// * `ReportError::Storage` if the image cannot be written.
    /// * `ReportError::Database` if the record cannot be stored.
    pub async fn create_report(
        &self,
        caller: &User,
        form: CreateReportForm,
    ) -> Result<ReportResponse, ReportError> {
        let (input, image) = form.into_input()?;
        self.uploads.check_image(&image)?;

        let file_name = self.uploads.persist(&image).await?;
        let now = Utc::now();
        let report = Report {
            id: nice_id(self.id_length),
            user_id: caller.id,
            description: input.description,
            category: input.category,
            image: file_name.clone(),
            location: input.location,
            latitude: input.coordinates.map(|c| c.lat),
            longitude: input.coordinates.map(|c| c.lng),
            status: ReportStatus::default(),
            priority: ReportPriority::default(),
            admin_notes: None,
            resolved_at: None,
            resolved_by: None,
            created_at: now,
            updated_at: now,
        };

        let stored = match self.reports.insert_report(&report).await {
            Ok(stored) => stored,
            Err(err) => {
                warn!("Storing report failed, removing upload {}", file_name);
                self.uploads.discard(&file_name).await;
                return Err(err.into());
            }
        };
        info!("User {} created report {}", caller.id, stored.id);

        // The report is stored; a failed owner lookup must not turn that into an error.
        match self.populate(vec![stored.clone()]).await {
            Ok(mut populated) if populated.len() == 1 => Ok(populated.remove(0)),
            Ok(_) => Ok(Self::owned_by_caller(caller, stored)),
            Err(err) => {
                warn!("Report {} stored, but loading its owner failed: {err}", stored.id);
                Ok(Self::owned_by_caller(caller, stored))
            }
        }
    }

    fn owned_by_caller(caller: &User, report: Report) -> ReportResponse {
        ReportResponse::from_report(report, &HashMap::from([(caller.id, caller.clone())]))
    }

    /// Filtered, sorted page of reports. Non-admins only see their own.
    pub async fn list_reports(
        &self,
        caller: &User,
        params: &ListReportsParams,
    ) -> Result<(Vec<ReportResponse>, Pagination), ReportError> {
        let query = ReportListQuery::from_params(params, owner_scope(caller), &self.constants)?;
        let page = self.reports.list_reports(&query).await?;
        let pagination = Pagination::new(query.page, query.limit, page.total);
        Ok((self.populate(page.reports).await?, pagination))
    }

    /// # Errors
    ///
    /// * `ReportError::NotFound` if no such report exists.
    /// * `ReportError::Forbidden` if the caller neither owns it nor is an admin.
    pub async fn get_report(
        &self,
        caller: &User,
        report_id: &str,
    ) -> Result<ReportResponse, ReportError> {
        let report = self.find_existing(report_id).await?;
        authorize(caller, ReportAction::Read, &report)?;
        self.populate_one(report).await
    }

    /// Admin update of status, priority and notes.
    pub async fn update_report(
        &self,
        caller: &User,
        report_id: &str,
        mut request: UpdateReportRequest,
    ) -> Result<ReportResponse, ReportError> {
        let report = self.find_existing(report_id).await?;
        authorize(caller, ReportAction::Update, &report)?;

        request.admin_notes = request.admin_notes.map(|n| n.trim().to_owned());
        request.validate()?;

        let changes = ReportChanges {
            status: request.status,
            priority: request.priority,
            admin_notes: request.admin_notes,
        };
        let updated = self
            .reports
            .update_report(&report.id, &changes, caller.id, Utc::now())
            .await?
            .ok_or(ReportError::NotFound)?;
        info!(
            "Admin {} updated report {} to {}",
            caller.id, updated.id, updated.status
        );
        self.populate_one(updated).await
    }

    /// Admin delete. The record goes first, then its image.
    pub async fn delete_report(&self, caller: &User, report_id: &str) -> Result<(), ReportError> {
        let report = self.find_existing(report_id).await?;
        authorize(caller, ReportAction::Delete, &report)?;

        if !self.reports.delete_report(&report.id).await? {
            return Err(ReportError::NotFound);
        }
        self.uploads.discard(&report.image).await;
        info!("Admin {} deleted report {}", caller.id, report.id);
        Ok(())
    }

    /// Reports around a point, nearest first. Not scoped to the caller.
    pub async fn nearby_reports(
        &self,
        params: &NearbyParams,
    ) -> Result<Vec<NearbyReport>, ReportError> {
        let (center, radius) = parse_nearby(params, self.constants.nearby_default_radius_meters)?;
        let found = self
            .reports
            .find_within_radius(center, radius, self.constants.nearby_limit)
            .await?;
        Ok(found.into_iter().map(NearbyReport::from).collect())
    }

    pub async fn report_stats(&self, caller: &User) -> Result<ReportStats, ReportError> {
        Ok(self.reports.report_stats(owner_scope(caller)).await?)
    }
}

fn parse_nearby(
    params: &NearbyParams,
    default_radius: f64,
) -> Result<(Coordinates, f64), ReportError> {
    let non_empty = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
    };
    let (Some(lat), Some(lng)) = (non_empty(&params.lat), non_empty(&params.lng)) else {
        return Err(ReportError::Validation(
            "Please provide latitude and longitude".to_owned(),
        ));
    };

    let invalid = || ReportError::Validation("Invalid coordinates provided".to_owned());
    let lat: f64 = lat.parse().map_err(|_| invalid())?;
    let lng: f64 = lng.parse().map_err(|_| invalid())?;
    let center = Coordinates::new(lat, lng).ok_or_else(invalid)?;

    let radius = match non_empty(&params.radius) {
        None => default_radius,
        Some(raw) => match raw.parse::<f64>() {
            Ok(r) if r.is_finite() && r > 0.0 => r,
            _ => {
                return Err(ReportError::Validation(
                    "Radius must be a positive number of meters".to_owned(),
                ));
            }
        },
    };
    Ok((center, radius))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DbError;
    use crate::api::reports::interfaces::ImageUpload;
    use crate::database::app_user::{NewUser, UserRole, UserWithPassword};
    use crate::database::memory_store::MemoryStore;
    use app_state::{StorageBackend, StorageSettings};
    use async_trait::async_trait;
    use axum::body::Bytes;

    /// Users that can be created but never looked up in bulk.
    struct BrokenLookup(MemoryStore);

    #[async_trait]
    impl UserRepository for BrokenLookup {
        async fn create_user(&self, user: &NewUser) -> Result<User, DbError> {
            self.0.create_user(user).await
        }

        async fn find_user_by_id(&self, user_id: i32) -> Result<Option<User>, DbError> {
            self.0.find_user_by_id(user_id).await
        }

        async fn find_user_by_login_with_password(
            &self,
            login: &str,
        ) -> Result<Option<UserWithPassword>, DbError> {
            self.0.find_user_by_login_with_password(login).await
        }

        async fn find_users_by_ids(&self, _user_ids: &[i32]) -> Result<Vec<User>, DbError> {
            Err(DbError::Sqlx(sqlx::Error::PoolTimedOut))
        }

        async fn update_user_profile(
            &self,
            user_id: i32,
            name: Option<&str>,
            email: Option<&str>,
        ) -> Result<Option<User>, DbError> {
            self.0.update_user_profile(user_id, name, email).await
        }
    }

    #[tokio::test]
    async fn created_report_survives_failed_owner_lookup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let users = Arc::new(BrokenLookup(MemoryStore::new()));
        let reports = Arc::new(MemoryStore::new());
        let caller = users
            .create_user(&NewUser {
                username: "walker".to_owned(),
                email: "walker@example.com".to_owned(),
                name: "Walker".to_owned(),
                password_hash: "hash".to_owned(),
                role: UserRole::User,
            })
            .await
            .expect("created");
        let service = ReportService::new(
            users,
            reports.clone(),
            UploadStore::new(StorageSettings {
                backend: StorageBackend::Memory,
                upload_folder: dir.path().to_path_buf(),
                max_upload_bytes: 1024,
                allowed_image_extensions: vec!["png".into()],
            }),
            ReportConstants::default(),
            8,
        );
        let form = CreateReportForm {
            description: Some("Bags left by the bus stop".to_owned()),
            category: None,
            location: Some("Main St bus stop".to_owned()),
            coordinates: None,
            lat: None,
            lng: None,
            image: Some(ImageUpload {
                file_name: Some("bags.png".to_owned()),
                content_type: Some("image/png".to_owned()),
                bytes: Bytes::from_static(b"\x89PNG\r\n\x1a\n"),
            }),
        };

        let created = service.create_report(&caller, form).await.expect("created");

        assert_eq!(created.user.map(|u| u.id), Some(caller.id));
        let stored = reports.find_report(&created.id).await.expect("query");
        assert!(stored.is_some());
    }

    fn params(lat: Option<&str>, lng: Option<&str>, radius: Option<&str>) -> NearbyParams {
        NearbyParams {
            lat: lat.map(str::to_owned),
            lng: lng.map(str::to_owned),
            radius: radius.map(str::to_owned),
        }
    }

    #[test]
    fn nearby_defaults_radius() {
        let (center, radius) =
            parse_nearby(&params(Some("40.71"), Some("-74.00"), None), 5000.0).expect("valid");
        assert_eq!(center, Coordinates { lat: 40.71, lng: -74.00 });
        assert!((radius - 5000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn nearby_rejects_missing_or_malformed_input() {
        for bad in [
            params(None, Some("1"), None),
            params(Some("1"), Some(""), None),
            params(Some("abc"), Some("1"), None),
            params(Some("95"), Some("1"), None),
            params(Some("1"), Some("1"), Some("-5")),
            params(Some("1"), Some("1"), Some("0")),
            params(Some("1"), Some("1"), Some("inf")),
            params(Some("1"), Some("1"), Some("far")),
        ] {
            assert!(
                matches!(parse_nearby(&bad, 5000.0), Err(ReportError::Validation(_))),
                "{bad:?}"
            );
        }
    }
}
