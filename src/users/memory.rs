use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::repo_types::{NewUser, User, UserChanges};
use super::store::{StoreError, StoreResult, UserStore};

#[derive(Default)]
struct MemoryInner {
    next_id: i64,
    users: Vec<User>,
}

/// Process-local store with the same uniqueness rules as the `users` table.
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: RwLock<MemoryInner>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_unique(users: &[User], id: Option<i64>, email: &str, username: &str) -> StoreResult<()> {
    let others = users.iter().filter(|u| Some(u.id) != id);
    for u in others {
        if u.email == email {
            return Err(StoreError::Duplicate("email"));
        }
        if u.username == username {
            return Err(StoreError::Duplicate("username"));
        }
    }
    Ok(())
}

fn apply(changes: &UserChanges, user: &mut User) {
    if let Some(email) = &changes.email {
        user.email = email.clone();
    }
    if let Some(username) = &changes.username {
        user.username = username.clone();
    }
    if let Some(full_name) = &changes.full_name {
        user.full_name = Some(full_name.clone());
    }
    if let Some(hash) = &changes.hashed_password {
        user.hashed_password = hash.clone();
    }
    if let Some(active) = changes.is_active {
        user.is_active = active;
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get(&self, id: i64) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn get_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    async fn get_by_username_or_email(&self, identifier: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        let by_username = inner.users.iter().find(|u| u.username == identifier);
        Ok(by_username
            .or_else(|| inner.users.iter().find(|u| u.email == identifier))
            .cloned())
    }

    async fn list(&self, offset: i64, limit: i64) -> StoreResult<Vec<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> StoreResult<i64> {
        Ok(self.inner.read().await.users.len() as i64)
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.write().await;
        check_unique(&inner.users, None, &user.email, &user.username)?;

        inner.next_id += 1;
        let now = OffsetDateTime::now_utc();
        let row = User {
            id: inner.next_id,
            email: user.email,
            username: user.username,
            full_name: user.full_name,
            hashed_password: user.hashed_password,
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> StoreResult<Option<User>> {
        let mut inner = self.inner.write().await;
        let Some(pos) = inner.users.iter().position(|u| u.id == id) else {
            return Ok(None);
        };

        let mut updated = inner.users[pos].clone();
        apply(&changes, &mut updated);
        check_unique(&inner.users, Some(id), &updated.email, &updated.username)?;
        updated.updated_at = OffsetDateTime::now_utc();

        inner.users[pos] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.users.len();
        inner.users.retain(|u| u.id != id);
        Ok(inner.users.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, username: &str) -> NewUser {
        NewUser {
            email: email.into(),
            username: username.into(),
            full_name: None,
            hashed_password: "digest".into(),
            is_active: true,
            is_superuser: false,
        }
    }

    #[tokio::test]
    async fn create_assigns_ids_and_lookups_find_rows() {
        let store = InMemoryUserStore::new();
        let a = store.create(new_user("a@x.com", "a")).await.unwrap();
        let b = store.create(new_user("b@x.com", "b")).await.unwrap();
        assert_ne!(a.id, b.id);

        assert_eq!(store.get(a.id).await.unwrap().unwrap().username, "a");
        assert_eq!(store.get_by_email("b@x.com").await.unwrap().unwrap().id, b.id);
        assert_eq!(store.get_by_username("a").await.unwrap().unwrap().id, a.id);
        assert_eq!(
            store.get_by_username_or_email("b@x.com").await.unwrap().unwrap().id,
            b.id
        );
        assert!(store.get(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_rejects_duplicates() {
        let store = InMemoryUserStore::new();
        store.create(new_user("a@x.com", "a")).await.unwrap();

        let err = store.create(new_user("a@x.com", "other")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("email")));
        let err = store.create(new_user("other@x.com", "a")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("username")));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_applies_changes_and_keeps_uniqueness() {
        let store = InMemoryUserStore::new();
        let a = store.create(new_user("a@x.com", "a")).await.unwrap();
        store.create(new_user("b@x.com", "b")).await.unwrap();

        let changes = UserChanges {
            full_name: Some("Alice".into()),
            is_active: Some(false),
            ..Default::default()
        };
        let updated = store.update(a.id, changes).await.unwrap().unwrap();
        assert_eq!(updated.full_name.as_deref(), Some("Alice"));
        assert!(!updated.is_active);
        assert!(updated.updated_at >= a.updated_at);

        let clash = UserChanges {
            username: Some("b".into()),
            ..Default::default()
        };
        assert!(store.update(a.id, clash).await.is_err());
        assert!(store.update(404, UserChanges::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_pages_and_delete_removes() {
        let store = InMemoryUserStore::new();
        for i in 0..5 {
            store
                .create(new_user(&format!("u{i}@x.com"), &format!("u{i}")))
                .await
                .unwrap();
        }
        let page = store.list(2, 2).await.unwrap();
        assert_eq!(
            page.iter().map(|u| u.username.as_str()).collect::<Vec<_>>(),
            vec!["u2", "u3"]
        );

        assert!(store.delete(1).await.unwrap());
        assert!(!store.delete(1).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 4);
    }
}
