//! In-process entity store. Backs tests and `--memory` runs; nothing survives
//! a restart.

use async_trait::async_trait;
use chrono::Utc;
use prosper_core::store::{merge_patch, record_id, stamp_new_record, EntityStore, Query};
use prosper_core::{EntityKind, StoreError};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<EntityKind, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records of `kind` currently held.
    pub async fn count(&self, kind: EntityKind) -> usize {
        self.records
            .read()
            .await
            .get(&kind)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn list(&self, kind: EntityKind) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .get(&kind)
            .cloned()
            .unwrap_or_default())
    }

    async fn filter(&self, kind: EntityKind, query: &Query) -> Result<Vec<Value>, StoreError> {
        query.validate()?;
        let records = self.records.read().await;
        let all = records.get(&kind).cloned().unwrap_or_default();
        Ok(query.apply(all))
    }

    async fn create(&self, kind: EntityKind, data: Value) -> Result<Value, StoreError> {
        let record = stamp_new_record(kind, data, Utc::now())?;
        self.records
            .write()
            .await
            .entry(kind)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(&self, kind: EntityKind, id: &str, patch: Value) -> Result<Value, StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&kind)
            .and_then(|rs| rs.iter_mut().find(|r| record_id(r) == Some(id)))
            .ok_or_else(|| StoreError::NotFound {
                kind,
                id: id.to_string(),
            })?;
        merge_patch(kind, record, patch)?;
        Ok(record.clone())
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let list = records.entry(kind).or_default();
        let before = list.len();
        list.retain(|r| record_id(r) != Some(id));
        if list.len() == before {
            return Err(StoreError::NotFound {
                kind,
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
