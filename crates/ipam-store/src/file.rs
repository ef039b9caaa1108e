//! JSON file record store.
//!
//! The whole store is one JSON document. Every mutation rewrites it through
//! a temporary sibling file and a rename, so a crash never leaves a
//! truncated document behind. [`RecordStore::refresh`] re-reads the file,
//! which picks up edits made outside the process.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::StoreResult;
use crate::memory::{StoreDocument, Tables};
use crate::record::{HostRecord, PrefixRecord, SubnetRecord};
use crate::traits::RecordStore;

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    tables: Mutex<Tables>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store; the file
    /// is created on the first write.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let tables = read_tables(&path).await?;
        info!(path = %path.display(), "opened json record store");
        Ok(Self {
            path,
            tables: Mutex::new(tables),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `f` to a copy of the tables, persist the copy, and only then
    /// make it current. A failed write leaves both file and memory as they
    /// were.
    async fn mutate<R>(&self, f: impl FnOnce(&mut Tables) -> StoreResult<R>) -> StoreResult<R> {
        let mut tables = self.tables.lock().await;
        let mut next = tables.clone();
        let out = f(&mut next)?;
        write_document(&self.path, &next.to_document()).await?;
        *tables = next;
        Ok(out)
    }
}

async fn read_tables(path: &Path) -> StoreResult<Tables> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let doc: StoreDocument = serde_json::from_slice(&bytes)?;
            Ok(Tables::from_document(doc))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Tables::default()),
        Err(e) => Err(e.into()),
    }
}

async fn write_document(path: &Path, doc: &StoreDocument) -> StoreResult<()> {
    let bytes = serde_json::to_vec_pretty(doc)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote record store");
    Ok(())
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn refresh(&self) -> StoreResult<()> {
        let fresh = read_tables(&self.path).await?;
        *self.tables.lock().await = fresh;
        debug!(path = %self.path.display(), "refreshed record store");
        Ok(())
    }

    async fn prefixes(&self) -> StoreResult<Vec<PrefixRecord>> {
        Ok(self.tables.lock().await.prefixes())
    }

    async fn subnets(&self, prefix: &str) -> StoreResult<Vec<SubnetRecord>> {
        Ok(self.tables.lock().await.subnets(prefix))
    }

    async fn hosts(&self, prefix: &str, subnet: &str) -> StoreResult<Vec<HostRecord>> {
        Ok(self.tables.lock().await.hosts(prefix, subnet))
    }

    async fn insert_prefix(&self, record: &PrefixRecord) -> StoreResult<()> {
        self.mutate(|t| t.insert_prefix(record)).await
    }

    async fn update_prefix(&self, record: &PrefixRecord) -> StoreResult<()> {
        self.mutate(|t| t.update_prefix(record)).await
    }

    async fn delete_prefix(&self, key: &str) -> StoreResult<bool> {
        self.mutate(|t| Ok(t.delete_prefix(key))).await
    }

    async fn insert_subnet(&self, record: &SubnetRecord) -> StoreResult<()> {
        self.mutate(|t| t.insert_subnet(record)).await
    }

    async fn update_subnet(&self, record: &SubnetRecord) -> StoreResult<()> {
        self.mutate(|t| t.update_subnet(record)).await
    }

    async fn delete_subnet(&self, prefix: &str, key: &str) -> StoreResult<bool> {
        self.mutate(|t| Ok(t.delete_subnet(prefix, key))).await
    }

    async fn insert_host(&self, record: &HostRecord) -> StoreResult<()> {
        self.mutate(|t| t.insert_host(record)).await
    }

    async fn update_host(&self, record: &HostRecord) -> StoreResult<()> {
        self.mutate(|t| t.update_host(record)).await
    }

    async fn delete_host(&self, prefix: &str, subnet: &str, key: &str) -> StoreResult<bool> {
        self.mutate(|t| Ok(t.delete_host(prefix, subnet, key))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[tokio::test]
    async fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("ipam.json")).await.unwrap();
        assert!(store.prefixes().await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipam.json");
        {
            let store = JsonFileStore::open(&path).await.unwrap();
            store
                .insert_prefix(&PrefixRecord::new("p1", "10.0.0.0/16", "campus"))
                .await
                .unwrap();
            store
                .insert_subnet(&SubnetRecord::new("p1", "s1", "10.0.1.0/24", ""))
                .await
                .unwrap();
            store
                .insert_host(&HostRecord::new("p1", "s1", "h1", "10.0.1.5", "printer"))
                .await
                .unwrap();
        }

        let store = JsonFileStore::open(&path).await.unwrap();
        let prefixes = store.prefixes().await.unwrap();
        assert_eq!(prefixes, vec![PrefixRecord::new("p1", "10.0.0.0/16", "campus")]);
        let hosts = store.hosts("p1", "s1").await.unwrap();
        assert_eq!(hosts[0].description, "printer");
    }

    #[tokio::test]
    async fn failed_mutation_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipam.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        let err = store
            .update_prefix(&PrefixRecord::new("ghost", "10.0.0.0/16", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn refresh_picks_up_external_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipam.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        store
            .insert_prefix(&PrefixRecord::new("p1", "10.0.0.0/16", ""))
            .await
            .unwrap();

        let edited = StoreDocument {
            prefixes: vec![PrefixRecord::new("p2", "192.168.0.0/16", "lab")],
            ..StoreDocument::default()
        };
        std::fs::write(&path, serde_json::to_vec(&edited).unwrap()).unwrap();

        assert_eq!(store.prefixes().await.unwrap()[0].key, "p1");
        store.refresh().await.unwrap();
        assert_eq!(store.prefixes().await.unwrap(), edited.prefixes);
    }

    #[tokio::test]
    async fn corrupt_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipam.json");
        std::fs::write(&path, b"{not json").unwrap();
        let err = JsonFileStore::open(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[tokio::test]
    async fn cascade_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipam.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        store
            .insert_prefix(&PrefixRecord::new("p1", "10.0.0.0/16", ""))
            .await
            .unwrap();
        store
            .insert_subnet(&SubnetRecord::new("p1", "s1", "10.0.1.0/24", ""))
            .await
            .unwrap();
        assert!(store.delete_prefix("p1").await.unwrap());

        let reopened = JsonFileStore::open(&path).await.unwrap();
        assert!(reopened.prefixes().await.unwrap().is_empty());
        assert!(reopened.subnets("p1").await.unwrap().is_empty());
    }
}
