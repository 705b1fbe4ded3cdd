//! In-memory stores used by the service and router tests

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{TokenStore, UserStore};
use crate::models::{NewUser, TokenRecord, User};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.lock().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.lock().await;
        Ok(users
            .values()
            .find(|u| u.username.as_deref() == Some(username))
            .cloned())
    }

    async fn find_by_email_or_username(&self, identifier: &str) -> Result<Option<User>> {
        let email = identifier.to_lowercase();
        let users = self.users.lock().await;
        Ok(users
            .values()
            .find(|u| u.email == email || u.username.as_deref() == Some(identifier))
            .cloned())
    }

    async fn create(&self, new_user: &NewUser) -> Result<Option<User>> {
        let mut users = self.users.lock().await;
        let conflict = users.values().any(|u| {
            u.email == new_user.email
                || (u.username.is_some() && u.username == new_user.username)
        });
        if conflict {
            return Ok(None);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email.clone(),
            username: new_user.username.clone(),
            password_hash: new_user.password_hash.clone(),
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            avatar_url: new_user.avatar_url.clone(),
            role: new_user.role,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(Some(user))
    }
}

/// Token store whose writes can be made to go unacknowledged
#[derive(Default)]
pub struct MemoryTokenStore {
    records: Mutex<HashMap<Uuid, TokenRecord>>,
    refuse_writes: std::sync::atomic::AtomicBool,
}

impl MemoryTokenStore {
    pub fn refuse_writes(&self, refuse: bool) {
        self.refuse_writes
            .store(refuse, std::sync::atomic::Ordering::SeqCst);
    }

    pub async fn lock(&self, user_id: Uuid) {
        if let Some(record) = self.records.lock().await.get_mut(&user_id) {
            record.locked = true;
        }
    }

    fn refusing(&self) -> bool {
        self.refuse_writes.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<TokenRecord>> {
        Ok(self.records.lock().await.get(&user_id).cloned())
    }

    async fn store_refresh_token(&self, user_id: Uuid, token_hash: &str) -> Result<bool> {
        if self.refusing() {
            return Ok(false);
        }
        let now = Utc::now();
        let mut records = self.records.lock().await;
        let record = records.entry(user_id).or_insert_with(|| TokenRecord {
            user_id,
            refresh_token: None,
            locked: false,
            created_at: now,
            updated_at: now,
        });
        record.refresh_token = Some(token_hash.to_string());
        record.updated_at = now;
        Ok(true)
    }

    async fn invalidate_refresh_token(&self, user_id: Uuid) -> Result<bool> {
        if self.refusing() {
            return Ok(false);
        }
        match self.records.lock().await.get_mut(&user_id) {
            Some(record) => {
                record.refresh_token = None;
                record.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
