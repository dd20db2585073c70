use crate::api::reports::geo::{BoundingBox, EARTH_RADIUS_METERS};
use crate::api::reports::lifecycle::ReportChanges;
use crate::api::reports::query::{
    CategoryCount, ReportListQuery, ReportPage, ReportStats, StatusOverview,
};
use crate::database::DbError;
use crate::database::ReportRepository;
use crate::database::tables::report::{Coordinates, Report, ReportWithDistance};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

const REPORT_COLUMNS: &str = "id, user_id, description, category, image, location, latitude, \
     longitude, status, priority, admin_notes, resolved_at, resolved_by, created_at, updated_at";

/// `report` table access.
#[derive(Clone)]
pub struct PgReportStore {
    pool: PgPool,
}

impl PgReportStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_list_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ReportListQuery) {
    builder.push(" WHERE TRUE");
    if let Some(owner_id) = query.owner_id {
        builder.push(" AND user_id = ").push_bind(owner_id);
    }
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(category) = query.category {
        builder.push(" AND category = ").push_bind(category);
    }
}

fn push_owner_filter(builder: &mut QueryBuilder<'_, Postgres>, owner_id: Option<i32>) {
    if let Some(owner_id) = owner_id {
        builder.push(" WHERE user_id = ").push_bind(owner_id);
    }
}

#[async_trait]
impl ReportRepository for PgReportStore {
    async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_report(&self, report: &Report) -> Result<Report, DbError> {
        let sql = format!(
            "INSERT INTO report ({REPORT_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {REPORT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Report>(&sql)
            .bind(&report.id)
            .bind(report.user_id)
            .bind(&report.description)
            .bind(report.category)
            .bind(&report.image)
            .bind(&report.location)
            .bind(report.latitude)
            .bind(report.longitude)
            .bind(report.status)
            .bind(report.priority)
            .bind(&report.admin_notes)
            .bind(report.resolved_at)
            .bind(report.resolved_by)
            .bind(report.created_at)
            .bind(report.updated_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_report(&self, report_id: &str) -> Result<Option<Report>, DbError> {
        let sql = format!("SELECT {REPORT_COLUMNS} FROM report WHERE id = $1");
        Ok(sqlx::query_as::<_, Report>(&sql)
            .bind(report_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_reports(&self, query: &ReportListQuery) -> Result<ReportPage, DbError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM report");
        push_list_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {REPORT_COLUMNS} FROM report"
        ));
        push_list_filters(&mut select, query);
        let direction = query.sort_direction.as_sql();
        select
            .push(format!(
                " ORDER BY {} {direction}, id {direction}",
                query.sort_field.column()
            ))
            .push(" LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(query.offset());
        let reports = select
            .build_query_as::<Report>()
            .fetch_all(&self.pool)
            .await?;

        Ok(ReportPage { reports, total })
    }

    async fn update_report(
        &self,
        report_id: &str,
        changes: &ReportChanges,
        actor_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<Report>, DbError> {
        // Every right-hand side sees the row as it was before this statement.
        let sql = format!(
            "UPDATE report
             SET resolved_by = CASE
                     WHEN $1 = 'Cleaned'::report_status AND status <> 'Cleaned' THEN $4
                     ELSE resolved_by
                 END,
                 resolved_at = CASE
                     WHEN $1 = 'Cleaned'::report_status AND status <> 'Cleaned'
                         THEN COALESCE(resolved_at, $5)
                     ELSE resolved_at
                 END,
                 status = COALESCE($1, status),
                 priority = COALESCE($2, priority),
                 admin_notes = CASE
                     WHEN $3::text IS NULL THEN admin_notes
                     ELSE NULLIF(btrim($3::text), '')
                 END,
                 updated_at = $5
             WHERE id = $6
             RETURNING {REPORT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Report>(&sql)
            .bind(changes.status)
            .bind(changes.priority)
            .bind(changes.admin_notes.as_deref())
            .bind(actor_id)
            .bind(now)
            .bind(report_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_report(&self, report_id: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM report WHERE id = $1")
            .bind(report_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_within_radius(
        &self,
        center: Coordinates,
        radius_meters: f64,
        limit: usize,
    ) -> Result<Vec<ReportWithDistance>, DbError> {
        let bbox = BoundingBox::around(center, radius_meters);

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT * FROM (SELECT {REPORT_COLUMNS}, 2 * {EARTH_RADIUS_METERS} * asin(least(1, sqrt("
        ));
        builder
            .push("power(sin(radians(latitude - ")
            .push_bind(center.lat)
            .push(") / 2), 2) + cos(radians(")
            .push_bind(center.lat)
            .push(")) * cos(radians(latitude)) * power(sin(radians(longitude - ")
            .push_bind(center.lng)
            .push(") / 2), 2)))) AS distance FROM report")
            .push(" WHERE latitude IS NOT NULL AND longitude IS NOT NULL")
            .push(" AND latitude BETWEEN ")
            .push_bind(bbox.min_lat)
            .push(" AND ")
            .push_bind(bbox.max_lat);
        if let Some((min_lng, max_lng)) = bbox.lng_range {
            builder
                .push(" AND longitude BETWEEN ")
                .push_bind(min_lng)
                .push(" AND ")
                .push_bind(max_lng);
        }
        builder
            .push(") AS nearby WHERE distance <= ")
            .push_bind(radius_meters)
            .push(" ORDER BY distance, id LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));

        Ok(builder
            .build_query_as::<ReportWithDistance>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn report_stats(&self, owner_id: Option<i32>) -> Result<ReportStats, DbError> {
        let mut overview = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE status = 'Pending') AS pending,
                    COUNT(*) FILTER (WHERE status = 'In Progress') AS in_progress,
                    COUNT(*) FILTER (WHERE status = 'Cleaned') AS cleaned,
                    COUNT(*) FILTER (WHERE status = 'Rejected') AS rejected
             FROM report",
        );
        push_owner_filter(&mut overview, owner_id);
        let overview = overview
            .build_query_as::<StatusOverview>()
            .fetch_one(&self.pool)
            .await?;

        let mut by_category =
            QueryBuilder::<Postgres>::new("SELECT category, COUNT(*) AS count FROM report");
        push_owner_filter(&mut by_category, owner_id);
        by_category.push(" GROUP BY category ORDER BY count DESC, category ASC");
        let by_category = by_category
            .build_query_as::<CategoryCount>()
            .fetch_all(&self.pool)
            .await?;

        Ok(ReportStats {
            overview,
            by_category,
        })
    }
}

/// These run against a real Postgres: `DATABASE_URL=... cargo test -- --ignored`.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::reports::query::{ReportSortField, SortDirection};
    use crate::database::UserRepository;
    use crate::database::app_user::{NewUser, User, UserRole};
    use crate::database::report::{ReportCategory, ReportPriority, ReportStatus};
    use crate::database::user_store::PgUserStore;
    use chrono::Duration;

    async fn user(pool: &PgPool, username: &str) -> User {
        PgUserStore::new(pool.clone())
            .create_user(&NewUser {
                username: username.into(),
                email: format!("{username}@example.com"),
                name: username.into(),
                password_hash: "hash".into(),
                role: UserRole::User,
            })
            .await
            .expect("user created")
    }

    fn report(id: &str, user_id: i32, minutes_ago: i64, lat_lng: Option<(f64, f64)>) -> Report {
        let created = Utc::now() - Duration::minutes(minutes_ago);
        Report {
            id: id.into(),
            user_id,
            description: format!("report {id}"),
            category: ReportCategory::Litter,
            image: format!("{id}.jpg"),
            location: lat_lng.is_none().then(|| "Somewhere".to_owned()),
            latitude: lat_lng.map(|(lat, _)| lat),
            longitude: lat_lng.map(|(_, lng)| lng),
            status: ReportStatus::Pending,
            priority: ReportPriority::Medium,
            admin_notes: None,
            resolved_at: None,
            resolved_by: None,
            created_at: created,
            updated_at: created,
        }
    }

    #[sqlx::test(migrations = "../../../migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn radius_search_is_nearest_first(pool: PgPool) {
        let store = PgReportStore::new(pool.clone());
        let owner = user(&pool, "walker").await;
        for (id, lat_lng) in [
            ("far", Some((40.7580, -73.9855))),
            ("near", Some((40.7130, -74.0062))),
            ("mid", Some((40.7306, -73.9866))),
            ("text-only", None),
            ("other-city", Some((51.5074, -0.1278))),
        ] {
            store
                .insert_report(&report(id, owner.id, 0, lat_lng))
                .await
                .expect("inserted");
        }

        let found = store
            .find_within_radius(Coordinates { lat: 40.7128, lng: -74.0060 }, 10_000.0, 10)
            .await
            .expect("query");

        let ids: Vec<&str> = found.iter().map(|r| r.report.id.as_str()).collect();
        assert_eq!(ids, ["near", "mid", "far"]);
        assert!(found.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert!(found[0].distance < 100.0);

        let limited = store
            .find_within_radius(Coordinates { lat: 40.7128, lng: -74.0060 }, 10_000.0, 1)
            .await
            .expect("query");
        assert_eq!(limited.len(), 1);
    }

    #[sqlx::test(migrations = "../../../migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn list_filters_sorts_and_pages(pool: PgPool) {
        let store = PgReportStore::new(pool.clone());
        let alice = user(&pool, "alice").await;
        let bob = user(&pool, "bob").await;
        let mut urgent = report("a-urgent", alice.id, 30, None);
        urgent.priority = ReportPriority::Critical;
        let mut calm = report("a-calm", alice.id, 20, None);
        calm.priority = ReportPriority::Low;
        for r in [urgent, calm, report("a-new", alice.id, 10, None), report("b", bob.id, 5, None)] {
            store.insert_report(&r).await.expect("inserted");
        }

        let by_priority = store
            .list_reports(&ReportListQuery {
                owner_id: Some(alice.id),
                status: None,
                category: None,
                sort_field: ReportSortField::Priority,
                sort_direction: SortDirection::Asc,
                page: 1,
                limit: 10,
            })
            .await
            .expect("query");
        assert_eq!(by_priority.total, 3);
        let ids: Vec<&str> = by_priority.reports.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a-calm", "a-new", "a-urgent"]);

        let second_page = store
            .list_reports(&ReportListQuery {
                owner_id: None,
                status: Some(ReportStatus::Pending),
                category: None,
                sort_field: ReportSortField::CreatedAt,
                sort_direction: SortDirection::Desc,
                page: 2,
                limit: 3,
            })
            .await
            .expect("query");
        assert_eq!(second_page.total, 4);
        assert_eq!(second_page.reports.len(), 1);
        assert_eq!(second_page.reports[0].id, "a-urgent");
    }

    #[sqlx::test(migrations = "../../../migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn stats_count_by_status_and_category(pool: PgPool) {
        let store = PgReportStore::new(pool.clone());
        let alice = user(&pool, "alice").await;
        let bob = user(&pool, "bob").await;
        let mut dumping = report("dump", alice.id, 3, None);
        dumping.category = ReportCategory::IllegalDumping;
        dumping.status = ReportStatus::InProgress;
        for r in [dumping, report("litter-1", alice.id, 2, None), report("litter-2", bob.id, 1, None)] {
            store.insert_report(&r).await.expect("inserted");
        }

        let all = store.report_stats(None).await.expect("query");
        assert_eq!(all.overview.total, 3);
        assert_eq!(all.overview.pending, 2);
        assert_eq!(all.overview.in_progress, 1);
        assert_eq!(all.by_category[0].category, ReportCategory::Litter);
        assert_eq!(all.by_category[0].count, 2);

        let mine = store.report_stats(Some(bob.id)).await.expect("query");
        assert_eq!(mine.overview.total, 1);
        assert_eq!(mine.by_category.len(), 1);
    }

    #[sqlx::test(migrations = "../../../migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn update_applies_only_the_changeset(pool: PgPool) {
        let store = PgReportStore::new(pool.clone());
        let owner = user(&pool, "walker").await;
        let admin = user(&pool, "inspector").await;
        store
            .insert_report(&report("r", owner.id, 5, None))
            .await
            .expect("inserted");

        let cleaned_at = Utc::now();
        let cleaned = store
            .update_report(
                "r",
                &ReportChanges {
                    status: Some(ReportStatus::Cleaned),
                    admin_notes: Some("  picked up  ".to_owned()),
                    ..ReportChanges::default()
                },
                admin.id,
                cleaned_at,
            )
            .await
            .expect("query")
            .expect("exists");
        assert_eq!(cleaned.resolved_by, Some(admin.id));
        assert_eq!(cleaned.admin_notes.as_deref(), Some("picked up"));
        let resolved_at = cleaned.resolved_at.expect("resolved");

        let reprioritized = store
            .update_report(
                "r",
                &ReportChanges {
                    priority: Some(ReportPriority::High),
                    ..ReportChanges::default()
                },
                owner.id,
                cleaned_at + Duration::minutes(5),
            )
            .await
            .expect("query")
            .expect("exists");
        assert_eq!(reprioritized.status, ReportStatus::Cleaned);
        assert_eq!(reprioritized.priority, ReportPriority::High);
        assert_eq!(reprioritized.resolved_by, Some(admin.id));
        assert_eq!(reprioritized.resolved_at, Some(resolved_at));
        assert_eq!(reprioritized.admin_notes.as_deref(), Some("picked up"));

        let cleared = store
            .update_report(
                "r",
                &ReportChanges {
                    admin_notes: Some(String::new()),
                    ..ReportChanges::default()
                },
                admin.id,
                Utc::now(),
            )
            .await
            .expect("query")
            .expect("exists");
        assert_eq!(cleared.admin_notes, None);

        let missing = store
            .update_report("gone", &ReportChanges::default(), admin.id, Utc::now())
            .await
            .expect("query");
        assert!(missing.is_none());
    }
}
