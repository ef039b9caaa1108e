//! Mutation service: the dual write between the in-memory tree and the
//! record store.
//!
//! Every create, modify, delete, and reload runs behind one async write
//! gate, so a reload never discards a write that raced it. Reads go
//! straight to the [`Registry`] and never wait on the gate.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use ipam_core::{
    AddressSpace, HostView, MaskPolicy, PrefixView, Registry, SpaceStats, SubnetView,
};
use ipam_store::{load_space, HostRecord, PrefixRecord, RecordStore, SubnetRecord};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::ServerResult;

/// Outcome of the most recent reloads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadStatus {
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    /// Error of the last attempt, cleared by the next success.
    pub last_error: Option<String>,
    pub reloads: u64,
    pub failures: u64,
    /// Counts loaded by the last successful reload.
    pub loaded: SpaceStats,
}

pub struct IpamService {
    registry: Registry,
    store: Arc<dyn RecordStore>,
    gate: Mutex<()>,
    status: RwLock<ReloadStatus>,
}

impl IpamService {
    /// Create a service over an empty tree. Call [`IpamService::reload`] to
    /// fill it from the store.
    pub fn new(store: Arc<dyn RecordStore>, policy: MaskPolicy) -> Self {
        Self {
            registry: Registry::empty(policy),
            store,
            gate: Mutex::new(()),
            status: RwLock::new(ReloadStatus::default()),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn stats(&self) -> SpaceStats {
        self.registry.stats()
    }

    pub fn reload_status(&self) -> ReloadStatus {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rebuild the tree from the store and swap it in.
    ///
    /// On failure the current tree stays in place.
    pub async fn reload(&self) -> ServerResult<SpaceStats> {
        let _gate = self.gate.lock().await;
        let started = Utc::now();
        let policy = self.registry.policy();
        let result = load_space(self.store.as_ref(), policy).await;

        let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
        status.last_attempt = Some(started);
        match result {
            Ok(space) => {
                let stats = space.stats();
                self.registry.replace(space);
                status.last_success = Some(started);
                status.last_error = None;
                status.reloads += 1;
                status.loaded = stats;
                Ok(stats)
            }
            Err(e) => {
                warn!(error = %e, "reload failed, keeping current address space");
                status.last_error = Some(e.to_string());
                status.failures += 1;
                Err(e.into())
            }
        }
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    pub fn list_prefixes(&self) -> Vec<PrefixView> {
        self.registry
            .read(|s| s.prefixes().map(PrefixView::from).collect())
    }

    pub fn get_prefix(&self, prefix: &str) -> ServerResult<PrefixView> {
        Ok(self
            .registry
            .read(|s| s.find_prefix(prefix).map(PrefixView::from))?)
    }

    pub fn list_subnets(&self, prefix: &str) -> ServerResult<Vec<SubnetView>> {
        Ok(self.registry.read(|s| {
            s.find_prefix(prefix)
                .map(|p| p.subnets().map(SubnetView::from).collect())
        })?)
    }

    pub fn get_subnet(&self, prefix: &str, subnet: &str) -> ServerResult<SubnetView> {
        Ok(self
            .registry
            .read(|s| s.find_subnet(prefix, subnet).map(SubnetView::from))?)
    }

    pub fn list_hosts(&self, prefix: &str, subnet: &str) -> ServerResult<Vec<HostView>> {
        Ok(self.registry.read(|s| {
            s.find_subnet(prefix, subnet)
                .map(|sn| sn.hosts().map(HostView::from).collect())
        })?)
    }

    pub fn get_host(&self, prefix: &str, subnet: &str, host: &str) -> ServerResult<HostView> {
        Ok(self
            .registry
            .read(|s| s.find_host(prefix, subnet, host).map(HostView::from))?)
    }

    // ---------------------------------------------------------------
    // Prefixes
    // ---------------------------------------------------------------

    pub async fn create_prefix(
        &self,
        key: &str,
        cidr: &str,
        description: &str,
    ) -> ServerResult<PrefixView> {
        let _gate = self.gate.lock().await;
        let view = self
            .registry
            .write(|s| s.create_prefix(key, cidr, description).map(PrefixView::from))?;

        if let Err(e) = self.store.insert_prefix(&PrefixRecord::from(&view)).await {
            self.compensate(key, |s| s.delete_prefix(key).map(drop));
            return Err(e.into());
        }
        debug!(prefix = key, cidr = %view.cidr, "prefix stored");
        Ok(view)
    }

    pub async fn modify_prefix(
        &self,
        key: &str,
        cidr: &str,
        description: &str,
    ) -> ServerResult<PrefixView> {
        let _gate = self.gate.lock().await;
        let previous = self.get_prefix(key)?;
        let view = self.registry.write(|s| {
            s.modify_prefix(key, cidr, description)?;
            s.find_prefix(key).map(PrefixView::from)
        })?;

        if let Err(e) = self.store.update_prefix(&PrefixRecord::from(&view)).await {
            self.compensate(key, |s| {
                s.modify_prefix(key, &previous.cidr, &previous.description)
            });
            return Err(e.into());
        }
        debug!(prefix = key, cidr = %view.cidr, "prefix updated");
        Ok(view)
    }

    /// Delete a prefix with all its subnets and hosts.
    pub async fn delete_prefix(&self, key: &str) -> ServerResult<()> {
        let _gate = self.gate.lock().await;
        self.get_prefix(key)?;
        if !self.store.delete_prefix(key).await? {
            warn!(prefix = key, "prefix missing from store during delete");
        }
        self.registry.write(|s| s.delete_prefix(key))?;
        debug!(prefix = key, "prefix deleted");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Subnets
    // ---------------------------------------------------------------

    pub async fn create_subnet(
        &self,
        prefix: &str,
        key: &str,
        cidr: &str,
        description: &str,
    ) -> ServerResult<SubnetView> {
        let _gate = self.gate.lock().await;
        let view = self.registry.write(|s| {
            s.create_subnet(prefix, key, cidr, description)
                .map(SubnetView::from)
        })?;

        if let Err(e) = self.store.insert_subnet(&SubnetRecord::from(&view)).await {
            self.compensate(key, |s| s.delete_subnet(prefix, key).map(drop));
            return Err(e.into());
        }
        debug!(prefix, subnet = key, cidr = %view.cidr, "subnet stored");
        Ok(view)
    }

    pub async fn modify_subnet(
        &self,
        prefix: &str,
        key: &str,
        cidr: &str,
        description: &str,
    ) -> ServerResult<SubnetView> {
        let _gate = self.gate.lock().await;
        let previous = self.get_subnet(prefix, key)?;
        let view = self.registry.write(|s| {
            s.modify_subnet(prefix, key, cidr, description)?;
            s.find_subnet(prefix, key).map(SubnetView::from)
        })?;

        if let Err(e) = self.store.update_subnet(&SubnetRecord::from(&view)).await {
            self.compensate(key, |s| {
                s.modify_subnet(prefix, key, &previous.cidr, &previous.description)
            });
            return Err(e.into());
        }
        debug!(prefix, subnet = key, cidr = %view.cidr, "subnet updated");
        Ok(view)
    }

    pub async fn delete_subnet(&self, prefix: &str, key: &str) -> ServerResult<()> {
        let _gate = self.gate.lock().await;
        self.get_subnet(prefix, key)?;
        if !self.store.delete_subnet(prefix, key).await? {
            warn!(prefix, subnet = key, "subnet missing from store during delete");
        }
        self.registry.write(|s| s.delete_subnet(prefix, key))?;
        debug!(prefix, subnet = key, "subnet deleted");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Hosts
    // ---------------------------------------------------------------

    pub async fn create_host(
        &self,
        prefix: &str,
        subnet: &str,
        key: &str,
        address: &str,
        description: &str,
    ) -> ServerResult<HostView> {
        let _gate = self.gate.lock().await;
        let view = self.registry.write(|s| {
            s.create_host(prefix, subnet, key, address, description)
                .map(HostView::from)
        })?;

        if let Err(e) = self.store.insert_host(&HostRecord::from(&view)).await {
            self.compensate(key, |s| s.delete_host(prefix, subnet, key).map(drop));
            return Err(e.into());
        }
        debug!(prefix, subnet, host = key, address = %view.address, "host stored");
        Ok(view)
    }

    pub async fn modify_host(
        &self,
        prefix: &str,
        subnet: &str,
        key: &str,
        address: &str,
        description: &str,
    ) -> ServerResult<HostView> {
        let _gate = self.gate.lock().await;
        let previous = self.get_host(prefix, subnet, key)?;
        let view = self.registry.write(|s| {
            s.modify_host(prefix, subnet, key, address, description)?;
            s.find_host(prefix, subnet, key).map(HostView::from)
        })?;

        if let Err(e) = self.store.update_host(&HostRecord::from(&view)).await {
            self.compensate(key, |s| {
                s.modify_host(prefix, subnet, key, &previous.address, &previous.description)
            });
            return Err(e.into());
        }
        debug!(prefix, subnet, host = key, address = %view.address, "host updated");
        Ok(view)
    }

    pub async fn delete_host(&self, prefix: &str, subnet: &str, key: &str) -> ServerResult<()> {
        let _gate = self.gate.lock().await;
        self.get_host(prefix, subnet, key)?;
        if !self.store.delete_host(prefix, subnet, key).await? {
            warn!(prefix, subnet, host = key, "host missing from store during delete");
        }
        self.registry.write(|s| s.delete_host(prefix, subnet, key))?;
        debug!(prefix, subnet, host = key, "host deleted");
        Ok(())
    }

    /// Undo an in-memory change after the store refused it.
    fn compensate(&self, key: &str, undo: impl FnOnce(&mut AddressSpace) -> ipam_core::IpamResult<()>) {
        match self.registry.write(undo) {
            Ok(()) => info!(key, "store write failed, in-memory change reverted"),
            Err(e) => error!(key, error = %e, "store write failed and revert failed"),
        }
    }
}

impl std::fmt::Debug for IpamService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpamService")
            .field("registry", &self.registry)
            .field("status", &self.reload_status())
            .finish_non_exhaustive()
    }
}
