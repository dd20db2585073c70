use crate::database::DbError;
use crate::database::UserRepository;
use crate::database::tables::app_user::{NewUser, User, UserWithPassword};
use async_trait::async_trait;
use sqlx::PgPool;

const USER_COLUMNS: &str = "id, username, email, name, role, created_at, updated_at";

/// `app_user` table access.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, DbError> {
        let sql = format!(
            "INSERT INTO app_user (username, email, name, password, role)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_user_by_id(&self, user_id: i32) -> Result<Option<User>, DbError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM app_user WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_login_with_password(
        &self,
        login: &str,
    ) -> Result<Option<UserWithPassword>, DbError> {
        let sql = format!(
            "SELECT {USER_COLUMNS}, password FROM app_user
             WHERE username = $1 OR lower(email) = lower($1)
             LIMIT 1"
        );
        Ok(sqlx::query_as::<_, UserWithPassword>(&sql)
            .bind(login)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_users_by_ids(&self, user_ids: &[i32]) -> Result<Vec<User>, DbError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {USER_COLUMNS} FROM app_user WHERE id = ANY($1)");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_user_profile(
        &self,
        user_id: i32,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, DbError> {
        let sql = format!(
            "UPDATE app_user
             SET name = COALESCE($1, name),
                 email = COALESCE($2, email),
                 updated_at = now()
             WHERE id = $3
             RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(name)
            .bind(email)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }
}
