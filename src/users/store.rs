use async_trait::async_trait;
use thiserror::Error;

use super::repo_types::{NewUser, User, UserChanges};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique column (`email` or `username`) already holds the value.
    #[error("{0} already in use")]
    Duplicate(&'static str),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Data access for the `users` table.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: i64) -> StoreResult<Option<User>>;
    async fn get_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn get_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    /// Login lookup: matches either column.
    async fn get_by_username_or_email(&self, identifier: &str) -> StoreResult<Option<User>>;
    async fn list(&self, offset: i64, limit: i64) -> StoreResult<Vec<User>>;
    async fn count(&self) -> StoreResult<i64>;
    async fn create(&self, user: NewUser) -> StoreResult<User>;
    /// Returns `None` if no row has this id.
    async fn update(&self, id: i64, changes: UserChanges) -> StoreResult<Option<User>>;
    /// Returns `false` if no row has this id.
    async fn delete(&self, id: i64) -> StoreResult<bool>;
}
