//! The [`RecordStore`] trait: the persistence contract of the address space.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::record::{HostRecord, PrefixRecord, SubnetRecord};

/// Durable storage for prefixes, subnets, and hosts.
///
/// Implementations must satisfy these rules:
/// - Rows are addressed by key path: a subnet by `(prefix, key)`, a host by
///   `(prefix, subnet, key)`.
/// - Reads return rows in insertion order, so a reload reproduces the
///   sibling order of the tree that wrote them.
/// - Deleting a prefix or subnet deletes its descendant rows.
/// - The store performs no address validation; the address space does that
///   before anything is written.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Re-read the backing medium before a full load. No-op by default.
    async fn refresh(&self) -> StoreResult<()> {
        Ok(())
    }

    /// All prefixes.
    async fn prefixes(&self) -> StoreResult<Vec<PrefixRecord>>;

    /// All subnets of one prefix.
    async fn subnets(&self, prefix: &str) -> StoreResult<Vec<SubnetRecord>>;

    /// All hosts of one subnet.
    async fn hosts(&self, prefix: &str, subnet: &str) -> StoreResult<Vec<HostRecord>>;

    /// Insert a new prefix. Fails with `AlreadyExists` on a taken key.
    async fn insert_prefix(&self, record: &PrefixRecord) -> StoreResult<()>;

    /// Overwrite an existing prefix. Fails with `NotFound` if absent.
    async fn update_prefix(&self, record: &PrefixRecord) -> StoreResult<()>;

    /// Delete a prefix and its descendants. Returns `true` if it existed.
    async fn delete_prefix(&self, key: &str) -> StoreResult<bool>;

    async fn insert_subnet(&self, record: &SubnetRecord) -> StoreResult<()>;

    async fn update_subnet(&self, record: &SubnetRecord) -> StoreResult<()>;

    async fn delete_subnet(&self, prefix: &str, key: &str) -> StoreResult<bool>;

    async fn insert_host(&self, record: &HostRecord) -> StoreResult<()>;

    async fn update_host(&self, record: &HostRecord) -> StoreResult<()>;

    async fn delete_host(&self, prefix: &str, subnet: &str, key: &str) -> StoreResult<bool>;
}
