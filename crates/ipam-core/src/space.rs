//! The address space: root container of every prefix.
//!
//! Ownership flows strictly downward (space → prefix → subnet → host).
//! Children refer to their parents by key, never by pointer, so every
//! operation below a prefix is addressed by its key path.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EntityKind, IpamError, IpamResult};
use crate::host::Host;
use crate::policy::MaskPolicy;
use crate::prefix::Prefix;
use crate::subnet::Subnet;

/// Entity counts across the whole tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceStats {
    pub prefixes: usize,
    pub subnets: usize,
    pub hosts: usize,
}

/// Root of the prefix → subnet → host tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressSpace {
    pub(crate) policy: MaskPolicy,
    pub(crate) prefixes: IndexMap<String, Prefix>,
}

impl AddressSpace {
    /// Create an empty address space enforcing the given mask floors.
    pub fn new(policy: MaskPolicy) -> Self {
        Self {
            policy,
            prefixes: IndexMap::new(),
        }
    }

    pub fn policy(&self) -> MaskPolicy {
        self.policy
    }

    pub fn prefix_count(&self) -> usize {
        self.prefixes.len()
    }

    /// Returns `true` if the space holds no prefixes.
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Count every entity in the tree.
    pub fn stats(&self) -> SpaceStats {
        let mut stats = SpaceStats {
            prefixes: self.prefixes.len(),
            ..SpaceStats::default()
        };
        for prefix in self.prefixes.values() {
            stats.subnets += prefix.subnets.len();
            stats.hosts += prefix.subnets.values().map(Subnet::host_count).sum::<usize>();
        }
        stats
    }

    /// Delete every prefix (cascading to subnets and hosts), then start
    /// over with empty indices.
    ///
    /// The first failing delete aborts and is returned; prefixes deleted
    /// before it stay deleted.
    pub fn reset(&mut self) -> IpamResult<()> {
        let keys: Vec<String> = self.prefixes.keys().cloned().collect();
        for key in keys {
            self.delete_prefix(&key)?;
        }
        self.prefixes = IndexMap::new();
        debug!("address space reset");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Lookups by key path
    // ---------------------------------------------------------------

    /// Look up a prefix, failing with [`IpamError::NotFound`].
    pub fn find_prefix(&self, prefix: &str) -> IpamResult<&Prefix> {
        self.prefixes
            .get(prefix)
            .ok_or_else(|| IpamError::not_found(EntityKind::Prefix, prefix))
    }

    /// Look up a subnet under a prefix.
    pub fn find_subnet(&self, prefix: &str, subnet: &str) -> IpamResult<&Subnet> {
        self.parent_prefix(prefix)?
            .subnet(subnet)
            .ok_or_else(|| IpamError::not_found(EntityKind::Subnet, subnet))
    }

    /// Look up a host under a subnet.
    pub fn find_host(&self, prefix: &str, subnet: &str, host: &str) -> IpamResult<&Host> {
        let parent = self
            .parent_prefix(prefix)?
            .subnet(subnet)
            .ok_or_else(|| IpamError::missing_parent(EntityKind::Subnet, subnet))?;
        parent
            .host(host)
            .ok_or_else(|| IpamError::not_found(EntityKind::Host, host))
    }

    /// Mutable access to a subnet, for host operations.
    pub fn subnet_mut(&mut self, prefix: &str, subnet: &str) -> Option<&mut Subnet> {
        self.prefixes.get_mut(prefix)?.subnet_mut(subnet)
    }

    // ---------------------------------------------------------------
    // Subnet operations
    // ---------------------------------------------------------------

    /// Create a subnet under `prefix`, enforcing the subnet mask floor.
    pub fn create_subnet(
        &mut self,
        prefix: &str,
        key: &str,
        cidr: &str,
        description: &str,
    ) -> IpamResult<&Subnet> {
        let max_len = self.policy.subnet_max_len;
        self.parent_prefix_mut(prefix)?
            .create_subnet(key, cidr, description, max_len)
    }

    pub fn modify_subnet(
        &mut self,
        prefix: &str,
        key: &str,
        cidr: &str,
        description: &str,
    ) -> IpamResult<()> {
        let max_len = self.policy.subnet_max_len;
        self.parent_prefix_mut(prefix)?
            .modify_subnet(key, cidr, description, max_len)
    }

    pub fn delete_subnet(&mut self, prefix: &str, key: &str) -> IpamResult<Subnet> {
        self.parent_prefix_mut(prefix)?.delete_subnet(key)
    }

    // ---------------------------------------------------------------
    // Host operations
    // ---------------------------------------------------------------

    pub fn create_host(
        &mut self,
        prefix: &str,
        subnet: &str,
        key: &str,
        address: &str,
        description: &str,
    ) -> IpamResult<&Host> {
        self.parent_subnet_mut(prefix, subnet)?
            .create_host(key, address, description)
    }

    pub fn modify_host(
        &mut self,
        prefix: &str,
        subnet: &str,
        key: &str,
        address: &str,
        description: &str,
    ) -> IpamResult<()> {
        self.parent_subnet_mut(prefix, subnet)?
            .modify_host(key, address, description)
    }

    pub fn delete_host(&mut self, prefix: &str, subnet: &str, key: &str) -> IpamResult<Host> {
        self.parent_subnet_mut(prefix, subnet)?.delete_host(key)
    }

    fn parent_prefix(&self, prefix: &str) -> IpamResult<&Prefix> {
        self.prefixes
            .get(prefix)
            .ok_or_else(|| IpamError::missing_parent(EntityKind::Prefix, prefix))
    }

    fn parent_prefix_mut(&mut self, prefix: &str) -> IpamResult<&mut Prefix> {
        self.prefix_mut(prefix)
            .ok_or_else(|| IpamError::missing_parent(EntityKind::Prefix, prefix))
    }

    fn parent_subnet_mut(&mut self, prefix: &str, subnet: &str) -> IpamResult<&mut Subnet> {
        self.parent_prefix_mut(prefix)?
            .subnet_mut(subnet)
            .ok_or_else(|| IpamError::missing_parent(EntityKind::Subnet, subnet))
    }
}
