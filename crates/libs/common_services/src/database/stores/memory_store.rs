use crate::api::reports::geo::haversine_meters;
use crate::api::reports::lifecycle::{ReportChanges, apply_changes};
use crate::api::reports::query::{
    CategoryCount, ReportListQuery, ReportPage, ReportSortField, ReportStats, SortDirection,
    StatusOverview,
};
use crate::database::DbError;
use crate::database::tables::app_user::{NewUser, User, UserWithPassword};
use crate::database::tables::report::{Coordinates, Report, ReportCategory, ReportWithDistance};
use crate::database::{ReportRepository, UserRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Default)]
struct UserTable {
    rows: BTreeMap<i32, UserWithPassword>,
    next_id: i32,
}

/// Users and reports kept in process memory. Used by tests and small single-node setups.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<UserTable>,
    reports: RwLock<HashMap<String, Report>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn compare_reports(a: &Report, b: &Report, query: &ReportListQuery) -> Ordering {
    let by_field = match query.sort_field {
        ReportSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        ReportSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        ReportSortField::Status => a.status.cmp(&b.status),
        ReportSortField::Priority => a.priority.cmp(&b.priority),
        ReportSortField::Category => a.category.cmp(&b.category),
    }
    .then_with(|| a.id.cmp(&b.id));

    match query.sort_direction {
        SortDirection::Asc => by_field,
        SortDirection::Desc => by_field.reverse(),
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, DbError> {
        let mut table = self.users.write().await;
        if table.rows.values().any(|u| u.username == user.username) {
            return Err(DbError::UniqueViolation("app_user_username_key".to_owned()));
        }
        if table
            .rows
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(DbError::UniqueViolation("app_user_email_key".to_owned()));
        }

        table.next_id += 1;
        let now = Utc::now();
        let row = UserWithPassword {
            id: table.next_id,
            username: user.username.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            created_at: now,
            updated_at: now,
            password: user.password_hash.clone(),
        };
        table.rows.insert(row.id, row.clone());
        Ok(row.into())
    }

    async fn find_user_by_id(&self, user_id: i32) -> Result<Option<User>, DbError> {
        let table = self.users.read().await;
        Ok(table.rows.get(&user_id).cloned().map(Into::into))
    }

    async fn find_user_by_login_with_password(
        &self,
        login: &str,
    ) -> Result<Option<UserWithPassword>, DbError> {
        let table = self.users.read().await;
        Ok(table
            .rows
            .values()
            .find(|u| u.username == login || u.email.eq_ignore_ascii_case(login))
            .cloned())
    }

    async fn find_users_by_ids(&self, user_ids: &[i32]) -> Result<Vec<User>, DbError> {
        let table = self.users.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| table.rows.get(id))
            .cloned()
            .map(Into::into)
            .collect())
    }

    async fn update_user_profile(
        &self,
        user_id: i32,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, DbError> {
        let mut table = self.users.write().await;
        if let Some(email) = email
            && table
                .rows
                .values()
                .any(|u| u.id != user_id && u.email.eq_ignore_ascii_case(email))
        {
            return Err(DbError::UniqueViolation("app_user_email_key".to_owned()));
        }

        let Some(row) = table.rows.get_mut(&user_id) else {
            return Ok(None);
        };
        if let Some(name) = name {
            name.clone_into(&mut row.name);
        }
        if let Some(email) = email {
            email.clone_into(&mut row.email);
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone().into()))
    }
}

#[async_trait]
impl ReportRepository for MemoryStore {
    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn insert_report(&self, report: &Report) -> Result<Report, DbError> {
        let mut reports = self.reports.write().await;
        if reports.contains_key(&report.id) {
            return Err(DbError::UniqueViolation("report_pkey".to_owned()));
        }
        reports.insert(report.id.clone(), report.clone());
        Ok(report.clone())
    }

    async fn find_report(&self, report_id: &str) -> Result<Option<Report>, DbError> {
        Ok(self.reports.read().await.get(report_id).cloned())
    }

    async fn list_reports(&self, query: &ReportListQuery) -> Result<ReportPage, DbError> {
        let reports = self.reports.read().await;
        let mut matching: Vec<&Report> = reports.values().filter(|r| query.matches(r)).collect();
        matching.sort_by(|a, b| compare_reports(a, b, query));

        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let page = matching
            .iter()
            .skip(offset)
            .take(query.limit as usize)
            .map(|r| (*r).clone())
            .collect();

        Ok(ReportPage {
            reports: page,
            total: matching.len() as i64,
        })
    }

    async fn update_report(
        &self,
        report_id: &str,
        changes: &ReportChanges,
        actor_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<Report>, DbError> {
        let mut reports = self.reports.write().await;
        let Some(stored) = reports.get_mut(report_id) else {
            return Ok(None);
        };
        apply_changes(stored, changes.clone(), actor_id, now);
        Ok(Some(stored.clone()))
    }

    async fn delete_report(&self, report_id: &str) -> Result<bool, DbError> {
        Ok(self.reports.write().await.remove(report_id).is_some())
    }

    async fn find_within_radius(
        &self,
        center: Coordinates,
        radius_meters: f64,
        limit: usize,
    ) -> Result<Vec<ReportWithDistance>, DbError> {
        let reports = self.reports.read().await;
        let mut found: Vec<ReportWithDistance> = reports
            .values()
            .filter_map(|report| {
                let distance = haversine_meters(center, report.coordinates()?);
                (distance <= radius_meters).then(|| ReportWithDistance {
                    report: report.clone(),
                    distance,
                })
            })
            .collect();
        found.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.report.id.cmp(&b.report.id))
        });
        found.truncate(limit);
        Ok(found)
    }

    async fn report_stats(&self, owner_id: Option<i32>) -> Result<ReportStats, DbError> {
        let reports = self.reports.read().await;
        let mut overview = StatusOverview::default();
        let mut per_category: BTreeMap<ReportCategory, i64> = BTreeMap::new();

        for report in reports
            .values()
            .filter(|r| owner_id.is_none_or(|owner| r.user_id == owner))
        {
            overview.record(report.status);
            *per_category.entry(report.category).or_default() += 1;
        }

        let mut by_category: Vec<CategoryCount> = per_category
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect();
        // Stable sort keeps declaration order for equal counts.
        by_category.sort_by(|a, b| b.count.cmp(&a.count));

        Ok(ReportStats {
            overview,
            by_category,
        })
    }
}
