use crate::api::reports::lifecycle::ReportChanges;
use crate::api::reports::query::{ReportListQuery, ReportPage, ReportStats};
use crate::database::DbError;
use crate::database::app_user::{NewUser, User, UserWithPassword};
use crate::database::report::{Coordinates, Report, ReportWithDistance};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Persistence for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with [`DbError::UniqueViolation`] when the username or email is taken.
    async fn create_user(&self, user: &NewUser) -> Result<User, DbError>;

    async fn find_user_by_id(&self, user_id: i32) -> Result<Option<User>, DbError>;

    /// Looks a user up by username or email, whichever matches.
    async fn find_user_by_login_with_password(
        &self,
        login: &str,
    ) -> Result<Option<UserWithPassword>, DbError>;

    async fn find_users_by_ids(&self, user_ids: &[i32]) -> Result<Vec<User>, DbError>;

    /// Pass `None` for fields that should remain unchanged.
    async fn update_user_profile(
        &self,
        user_id: i32,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, DbError>;
}

/// Persistence and querying for reports.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn ping(&self) -> Result<(), DbError>;

    async fn insert_report(&self, report: &Report) -> Result<Report, DbError>;

    async fn find_report(&self, report_id: &str) -> Result<Option<Report>, DbError>;

    async fn list_reports(&self, query: &ReportListQuery) -> Result<ReportPage, DbError>;

    /// Applies `changes` by admin `actor_id` to the stored row in one atomic step, so fields
    /// the changeset leaves out keep whatever a concurrent update wrote.
    /// Returns `None` when the row no longer exists.
    async fn update_report(
        &self,
        report_id: &str,
        changes: &ReportChanges,
        actor_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<Report>, DbError>;

    /// Returns whether a row was deleted.
    async fn delete_report(&self, report_id: &str) -> Result<bool, DbError>;

    /// Reports within `radius_meters` of `center`, nearest first, at most `limit`.
    async fn find_within_radius(
        &self,
        center: Coordinates,
        radius_meters: f64,
        limit: usize,
    ) -> Result<Vec<ReportWithDistance>, DbError>;

    /// Aggregate counts, restricted to one owner when `owner_id` is set.
    async fn report_stats(&self, owner_id: Option<i32>) -> Result<ReportStats, DbError>;
}
