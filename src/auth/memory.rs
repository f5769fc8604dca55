use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::{StoreError, UserStore};
use crate::auth::repo_types::{NewUser, User};

/// Process-local [`UserStore`]; rows are kept in insertion order.
#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the active flag; returns false for an unknown id.
    pub fn set_active(&self, id: Uuid, active: bool) -> bool {
        let mut rows = self.lock();
        match rows.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.is_active = active;
                user.updated_at = OffsetDateTime::now_utc();
                true
            }
            None => false,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<User>> {
        // a panic while holding the lock cannot leave a half-written row
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut rows = self.lock();
        if rows.iter().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let row = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock().iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.lock().iter().find(|u| u.id == id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<User>, StoreError> {
        // insertion order is creation order, so reversing gives newest first
        Ok(self
            .lock()
            .iter()
            .rev()
            .filter(|u| u.is_active)
            .cloned()
            .collect())
    }
}
