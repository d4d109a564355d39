//! In-process place store
//!
//! Enforces the same identity-key uniqueness as the database. Failures can be
//! injected per key to exercise the writer's skip paths.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use super::PlaceStore;
use crate::error::{IngestionError, Result};
use crate::schemas::{IdentityKey, NewPlace, PlaceRecord};

/// A persisted place
#[derive(Debug, Clone)]
pub struct StoredPlace {
    pub id: Uuid,
    pub slug: String,
    pub record: PlaceRecord,
    pub collected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Failure returned by the next write touching a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    /// Behaves as if another writer inserted the key first
    Conflict,
    /// Generic storage failure
    Storage,
}

#[derive(Default)]
pub struct MemoryPlaceStore {
    places: RwLock<HashMap<IdentityKey, StoredPlace>>,
    failures: RwLock<HashMap<IdentityKey, InjectedFailure>>,
    existence_queries: AtomicUsize,
}

impl MemoryPlaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next insert or update of `key` fail once
    pub fn inject_failure(&self, key: IdentityKey, failure: InjectedFailure) {
        self.failures.write().insert(key, failure);
    }

    pub fn get(&self, key: &IdentityKey) -> Option<StoredPlace> {
        self.places.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.places.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.read().is_empty()
    }

    /// Number of `existing_keys` calls served
    pub fn existence_queries(&self) -> usize {
        self.existence_queries.load(Ordering::Relaxed)
    }

    fn take_failure(&self, key: &IdentityKey) -> Result<()> {
        match self.failures.write().remove(key) {
            Some(InjectedFailure::Conflict) => Err(IngestionError::DuplicateKey {
                source_api: key.source_api.to_string(),
                external_id: key.external_id.clone(),
            }),
            Some(InjectedFailure::Storage) => {
                Err(IngestionError::StorageError(format!("injected failure for {key}")))
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PlaceStore for MemoryPlaceStore {
    async fn existing_keys(&self, keys: &[IdentityKey]) -> Result<HashSet<IdentityKey>> {
        self.existence_queries.fetch_add(1, Ordering::Relaxed);
        let places = self.places.read();
        Ok(keys
            .iter()
            .filter(|key| places.contains_key(key))
            .cloned()
            .collect())
    }

    async fn insert_place(&self, place: &NewPlace) -> Result<()> {
        let key = place.record.identity_key();
        self.take_failure(&key)?;

        let mut places = self.places.write();
        if places.contains_key(&key) {
            return Err(IngestionError::DuplicateKey {
                source_api: key.source_api.to_string(),
                external_id: key.external_id,
            });
        }

        places.insert(
            key,
            StoredPlace {
                id: place.id,
                slug: place.slug.clone(),
                record: place.record.clone(),
                collected_at: place.collected_at,
                updated_at: place.collected_at,
            },
        );
        Ok(())
    }

    async fn update_place(&self, record: &PlaceRecord, updated_at: DateTime<Utc>) -> Result<bool> {
        let key = record.identity_key();
        self.take_failure(&key)?;

        let mut places = self.places.write();
        match places.get_mut(&key) {
            Some(stored) => {
                // Description is only written on insert
                let description = stored.record.description.take();
                stored.record = record.clone();
                stored.record.description = description;
                stored.updated_at = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.places.read().len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::SourceApi;
    use serde_json::json;

    fn new_place(id: &str, name: &str) -> NewPlace {
        NewPlace {
            id: Uuid::new_v4(),
            slug: format!("{name}-{id}"),
            record: PlaceRecord::new(SourceApi::DataGoKr, id, json!({"id": id})).with_name(name),
            collected_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_identity_key_is_unique() {
        let store = MemoryPlaceStore::new();
        store.insert_place(&new_place("1", "a")).await.unwrap();

        let err = store.insert_place(&new_place("1", "b")).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_keeps_id_and_description() {
        let store = MemoryPlaceStore::new();
        let mut place = new_place("1", "old");
        place.record.description = Some("설명".to_string());
        store.insert_place(&place).await.unwrap();

        let changed = PlaceRecord::new(SourceApi::DataGoKr, "1", json!({"v": 2})).with_name("new");
        assert!(store.update_place(&changed, Utc::now()).await.unwrap());

        let stored = store.get(&changed.identity_key()).unwrap();
        assert_eq!(stored.id, place.id);
        assert_eq!(stored.record.name, "new");
        assert_eq!(stored.record.description.as_deref(), Some("설명"));

        let missing = PlaceRecord::new(SourceApi::DataGoKr, "2", json!({}));
        assert!(!store.update_place(&missing, Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_injected_failure_fires_once() {
        let store = MemoryPlaceStore::new();
        let place = new_place("1", "a");
        store.inject_failure(place.record.identity_key(), InjectedFailure::Storage);

        let err = store.insert_place(&place).await.unwrap_err();
        assert!(!err.is_conflict());
        store.insert_place(&place).await.unwrap();
    }
}
