//! In-memory record store for testing and ephemeral use.
//!
//! [`InMemoryRecordStore`] keeps every row in insertion-ordered maps behind
//! a `RwLock`. The same [`Tables`] type backs the JSON file store.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::record::{HostRecord, PrefixRecord, SubnetRecord};
use crate::traits::RecordStore;

type SubnetId = (String, String);
type HostId = (String, String, String);

/// Flat serialized form of every table, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub prefixes: Vec<PrefixRecord>,
    #[serde(default)]
    pub subnets: Vec<SubnetRecord>,
    #[serde(default)]
    pub hosts: Vec<HostRecord>,
}

/// The three tables, indexed by key path.
#[derive(Clone, Debug, Default)]
pub(crate) struct Tables {
    prefixes: IndexMap<String, PrefixRecord>,
    subnets: IndexMap<SubnetId, SubnetRecord>,
    hosts: IndexMap<HostId, HostRecord>,
}

impl Tables {
    pub(crate) fn from_document(doc: StoreDocument) -> Self {
        Self {
            prefixes: doc.prefixes.into_iter().map(|r| (r.key.clone(), r)).collect(),
            subnets: doc.subnets.into_iter().map(|r| (r.id(), r)).collect(),
            hosts: doc.hosts.into_iter().map(|r| (r.id(), r)).collect(),
        }
    }

    pub(crate) fn to_document(&self) -> StoreDocument {
        StoreDocument {
            prefixes: self.prefixes.values().cloned().collect(),
            subnets: self.subnets.values().cloned().collect(),
            hosts: self.hosts.values().cloned().collect(),
        }
    }

    pub(crate) fn prefixes(&self) -> Vec<PrefixRecord> {
        self.prefixes.values().cloned().collect()
    }

    pub(crate) fn subnets(&self, prefix: &str) -> Vec<SubnetRecord> {
        self.subnets
            .values()
            .filter(|r| r.prefix == prefix)
            .cloned()
            .collect()
    }

    pub(crate) fn hosts(&self, prefix: &str, subnet: &str) -> Vec<HostRecord> {
        self.hosts
            .values()
            .filter(|r| r.prefix == prefix && r.subnet == subnet)
            .cloned()
            .collect()
    }

    pub(crate) fn insert_prefix(&mut self, record: &PrefixRecord) -> StoreResult<()> {
        if self.prefixes.contains_key(&record.key) {
            return Err(StoreError::AlreadyExists(record.to_string()));
        }
        self.prefixes.insert(record.key.clone(), record.clone());
        Ok(())
    }

    pub(crate) fn update_prefix(&mut self, record: &PrefixRecord) -> StoreResult<()> {
        let slot = self
            .prefixes
            .get_mut(&record.key)
            .ok_or_else(|| StoreError::NotFound(record.to_string()))?;
        *slot = record.clone();
        Ok(())
    }

    pub(crate) fn delete_prefix(&mut self, key: &str) -> bool {
        if self.prefixes.shift_remove(key).is_none() {
            return false;
        }
        self.subnets.retain(|(p, _), _| p != key);
        self.hosts.retain(|(p, _, _), _| p != key);
        true
    }

    pub(crate) fn insert_subnet(&mut self, record: &SubnetRecord) -> StoreResult<()> {
        let id = record.id();
        if self.subnets.contains_key(&id) {
            return Err(StoreError::AlreadyExists(record.to_string()));
        }
        self.subnets.insert(id, record.clone());
        Ok(())
    }

    pub(crate) fn update_subnet(&mut self, record: &SubnetRecord) -> StoreResult<()> {
        let slot = self
            .subnets
            .get_mut(&record.id())
            .ok_or_else(|| StoreError::NotFound(record.to_string()))?;
        *slot = record.clone();
        Ok(())
    }

    pub(crate) fn delete_subnet(&mut self, prefix: &str, key: &str) -> bool {
        let id = (prefix.to_string(), key.to_string());
        if self.subnets.shift_remove(&id).is_none() {
            return false;
        }
        self.hosts.retain(|(p, s, _), _| !(p == prefix && s == key));
        true
    }

    pub(crate) fn insert_host(&mut self, record: &HostRecord) -> StoreResult<()> {
        let id = record.id();
        if self.hosts.contains_key(&id) {
            return Err(StoreError::AlreadyExists(record.to_string()));
        }
        self.hosts.insert(id, record.clone());
        Ok(())
    }

    pub(crate) fn update_host(&mut self, record: &HostRecord) -> StoreResult<()> {
        let slot = self
            .hosts
            .get_mut(&record.id())
            .ok_or_else(|| StoreError::NotFound(record.to_string()))?;
        *slot = record.clone();
        Ok(())
    }

    pub(crate) fn delete_host(&mut self, prefix: &str, subnet: &str, key: &str) -> bool {
        let id = (prefix.to_string(), subnet.to_string(), key.to_string());
        self.hosts.shift_remove(&id).is_some()
    }
}

/// An in-memory implementation of [`RecordStore`].
///
/// Data is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    tables: RwLock<Tables>,
}

impl InMemoryRecordStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated from a document.
    pub fn from_document(doc: StoreDocument) -> Self {
        Self {
            tables: RwLock::new(Tables::from_document(doc)),
        }
    }

    /// Snapshot every table.
    pub fn document(&self) -> StoreDocument {
        self.read(Tables::to_document)
    }

    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        f(&tables)
    }

    fn write<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut tables)
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn prefixes(&self) -> StoreResult<Vec<PrefixRecord>> {
        Ok(self.read(Tables::prefixes))
    }

    async fn subnets(&self, prefix: &str) -> StoreResult<Vec<SubnetRecord>> {
        Ok(self.read(|t| t.subnets(prefix)))
    }

    async fn hosts(&self, prefix: &str, subnet: &str) -> StoreResult<Vec<HostRecord>> {
        Ok(self.read(|t| t.hosts(prefix, subnet)))
    }

    async fn insert_prefix(&self, record: &PrefixRecord) -> StoreResult<()> {
        self.write(|t| t.insert_prefix(record))
    }

    async fn update_prefix(&self, record: &PrefixRecord) -> StoreResult<()> {
        self.write(|t| t.update_prefix(record))
    }

    async fn delete_prefix(&self, key: &str) -> StoreResult<bool> {
        Ok(self.write(|t| t.delete_prefix(key)))
    }

    async fn insert_subnet(&self, record: &SubnetRecord) -> StoreResult<()> {
        self.write(|t| t.insert_subnet(record))
    }

    async fn update_subnet(&self, record: &SubnetRecord) -> StoreResult<()> {
        self.write(|t| t.update_subnet(record))
    }

    async fn delete_subnet(&self, prefix: &str, key: &str) -> StoreResult<bool> {
        Ok(self.write(|t| t.delete_subnet(prefix, key)))
    }

    async fn insert_host(&self, record: &HostRecord) -> StoreResult<()> {
        self.write(|t| t.insert_host(record))
    }

    async fn update_host(&self, record: &HostRecord) -> StoreResult<()> {
        self.write(|t| t.update_host(record))
    }

    async fn delete_host(&self, prefix: &str, subnet: &str, key: &str) -> StoreResult<bool> {
        Ok(self.write(|t| t.delete_host(prefix, subnet, key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> InMemoryRecordStore {
        let store = InMemoryRecordStore::new();
        store
            .insert_prefix(&PrefixRecord::new("p1", "10.0.0.0/16", ""))
            .await
            .unwrap();
        store
            .insert_subnet(&SubnetRecord::new("p1", "s1", "10.0.1.0/24", ""))
            .await
            .unwrap();
        store
            .insert_subnet(&SubnetRecord::new("p1", "s2", "10.0.2.0/24", ""))
            .await
            .unwrap();
        store
            .insert_host(&HostRecord::new("p1", "s1", "h1", "10.0.1.5", ""))
            .await
            .unwrap();
        store
            .insert_host(&HostRecord::new("p1", "s2", "h1", "10.0.2.5", ""))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn reads_are_scoped_by_parent() {
        let store = seeded().await;
        assert_eq!(store.prefixes().await.unwrap().len(), 1);
        let subnets = store.subnets("p1").await.unwrap();
        let keys: Vec<&str> = subnets.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["s1", "s2"]);
        let hosts = store.hosts("p1", "s2").await.unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].address, "10.0.2.5");
        assert!(store.subnets("ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insert_duplicate_fails() {
        let store = seeded().await;
        let err = store
            .insert_subnet(&SubnetRecord::new("p1", "s1", "10.0.9.0/24", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(path) if path == "p1/s1"));
    }

    #[tokio::test]
    async fn update_missing_fails() {
        let store = seeded().await;
        let err = store
            .update_host(&HostRecord::new("p1", "s1", "ghost", "10.0.1.9", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_overwrites_in_place() {
        let store = seeded().await;
        store
            .update_prefix(&PrefixRecord::new("p1", "10.0.0.0/15", "wider"))
            .await
            .unwrap();
        let prefixes = store.prefixes().await.unwrap();
        assert_eq!(prefixes[0].cidr, "10.0.0.0/15");
        assert_eq!(prefixes[0].description, "wider");
    }

    #[tokio::test]
    async fn delete_subnet_cascades_to_hosts() {
        let store = seeded().await;
        assert!(store.delete_subnet("p1", "s1").await.unwrap());
        assert!(store.hosts("p1", "s1").await.unwrap().is_empty());
        assert_eq!(store.hosts("p1", "s2").await.unwrap().len(), 1);
        assert!(!store.delete_subnet("p1", "s1").await.unwrap());
    }

    #[tokio::test]
    async fn delete_prefix_cascades() {
        let store = seeded().await;
        assert!(store.delete_prefix("p1").await.unwrap());
        assert_eq!(store.document(), StoreDocument::default());
        assert!(!store.delete_prefix("p1").await.unwrap());
    }

    #[tokio::test]
    async fn document_round_trip_keeps_order() {
        let store = seeded().await;
        let doc = store.document();
        let copy = InMemoryRecordStore::from_document(doc.clone());
        assert_eq!(copy.document(), doc);
    }
}
