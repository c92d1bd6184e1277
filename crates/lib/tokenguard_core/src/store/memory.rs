//! In-memory credential store.
//!
//! Writes made inside a [`MemoryUnitOfWork`] are buffered and applied on
//! commit, all or nothing, after re-checking every guard under the lock.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{CredentialStore, StoreError, UnitOfWork};
use crate::models::credential::Principal;

type Principals = Arc<Mutex<HashMap<String, Principal>>>;

/// [`CredentialStore`] held in process memory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    principals: Principals,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a principal record.
    pub async fn get(&self, guid: &str) -> Option<Principal> {
        self.principals.lock().await.get(guid).cloned()
    }

    /// Number of enrolled principals.
    pub async fn len(&self) -> usize {
        self.principals.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[derive(Debug)]
struct PendingReplace {
    guid: String,
    expected: Option<String>,
    new_hash: String,
}

/// Buffered writes against a [`MemoryCredentialStore`].
#[derive(Debug)]
pub struct MemoryUnitOfWork {
    principals: Principals,
    pending: Vec<PendingReplace>,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self) -> Result<(), StoreError> {
        let mut principals = self.principals.lock().await;

        for write in &self.pending {
            match principals.get(&write.guid) {
                None => return Err(StoreError::NotEnrolled(write.guid.clone())),
                Some(p) => {
                    if let Some(expected) = &write.expected
                        && &p.refresh_hash != expected
                    {
                        return Err(StoreError::Conflict(write.guid.clone()));
                    }
                }
            }
        }

        for write in self.pending {
            if let Some(p) = principals.get_mut(&write.guid) {
                p.refresh_hash = write.new_hash;
            }
        }
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    type Tx = MemoryUnitOfWork;

    async fn lookup_email(&self, guid: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .principals
            .lock()
            .await
            .get(guid)
            .map(|p| p.email.clone()))
    }

    async fn lookup_guid_by_hash(&self, hash: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .principals
            .lock()
            .await
            .values()
            .find(|p| p.refresh_hash == hash)
            .map(|p| p.guid.clone()))
    }

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        Ok(MemoryUnitOfWork {
            principals: Arc::clone(&self.principals),
            pending: Vec::new(),
        })
    }

    async fn replace_hash(
        &self,
        tx: &mut Self::Tx,
        guid: &str,
        expected: Option<&str>,
        new_hash: &str,
    ) -> Result<(), StoreError> {
        {
            let principals = self.principals.lock().await;
            match (principals.get(guid), expected) {
                (None, Some(_)) => return Err(StoreError::Conflict(guid.to_string())),
                (None, None) => return Err(StoreError::NotEnrolled(guid.to_string())),
                (Some(p), Some(expected)) if p.refresh_hash != expected => {
                    return Err(StoreError::Conflict(guid.to_string()));
                }
                (Some(_), _) => {}
            }
        }
        tx.pending.push(PendingReplace {
            guid: guid.to_string(),
            expected: expected.map(str::to_string),
            new_hash: new_hash.to_string(),
        });
        Ok(())
    }

    async fn insert_principal(
        &self,
        guid: &str,
        email: &str,
        hash: &str,
    ) -> Result<(), StoreError> {
        let mut principals = self.principals.lock().await;
        if principals.contains_key(guid) {
            return Err(StoreError::Duplicate(guid.to_string()));
        }
        principals.insert(
            guid.to_string(),
            Principal {
                guid: guid.to_string(),
                email: email.to_string(),
                refresh_hash: hash.to_string(),
            },
        );
        Ok(())
    }
}
