use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{NewUser, User, UserChanges};
use super::store::{StoreError, StoreResult, UserStore};

/// `UserStore` backed by the Postgres `users` table.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Unique-constraint violations become `Duplicate`, so concurrent writers
/// that both pass the read-then-write check still get a conflict.
fn map_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("users_username_key") => StoreError::Duplicate("username"),
                _ => StoreError::Duplicate("email"),
            };
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, full_name, hashed_password,
                   is_active, is_superuser, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, full_name, hashed_password,
                   is_active, is_superuser, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn get_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, full_name, hashed_password,
                   is_active, is_superuser, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn get_by_username_or_email(&self, identifier: &str) -> StoreResult<Option<User>> {
        // A username match wins if the identifier hits two different rows.
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, full_name, hashed_password,
                   is_active, is_superuser, created_at, updated_at
            FROM users
            WHERE username = $1 OR email = $1
            ORDER BY (username = $1) DESC
            LIMIT 1
            "#,
        )
        .bind(identifier)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn list(&self, offset: i64, limit: i64) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, full_name, hashed_password,
                   is_active, is_superuser, created_at, updated_at
            FROM users
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn count(&self) -> StoreResult<i64> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;
        Ok(total)
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, full_name, hashed_password, is_active, is_superuser)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, email, username, full_name, hashed_password,
                      is_active, is_superuser, created_at, updated_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(&user.hashed_password)
        .bind(user.is_active)
        .bind(user.is_superuser)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET email           = COALESCE($2, email),
                   username        = COALESCE($3, username),
                   full_name       = COALESCE($4, full_name),
                   hashed_password = COALESCE($5, hashed_password),
                   is_active       = COALESCE($6, is_active),
                   updated_at      = now()
             WHERE id = $1
            RETURNING id, email, username, full_name, hashed_password,
                      is_active, is_superuser, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&changes.email)
        .bind(&changes.username)
        .bind(&changes.full_name)
        .bind(&changes.hashed_password)
        .bind(changes.is_active)
        .fetch_optional(&self.db)
        .await
        .map_err(map_write_error)
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
