//! Prefixes: top-level CIDR blocks of the address space.

use indexmap::IndexMap;
use ipnet::IpNet;
use tracing::debug;

use crate::addr;
use crate::error::{EntityKind, IpamError, IpamResult};
use crate::key::validate_key;
use crate::space::AddressSpace;
use crate::subnet::Subnet;

/// A top-level CIDR block owning a set of subnets.
///
/// Unlike subnets and hosts, a prefix has no private-address flag of its
/// own; [`Prefix::is_private`] derives it on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prefix {
    pub(crate) key: String,
    pub(crate) network: IpNet,
    pub(crate) description: String,
    pub(crate) subnets: IndexMap<String, Subnet>,
}

impl Prefix {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The prefix block, host bits cleared.
    pub fn network(&self) -> IpNet {
        self.network
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_private(&self) -> bool {
        addr::is_private(&self.network.network())
    }
}

impl AddressSpace {
    /// Look up a prefix by key.
    pub fn prefix(&self, key: &str) -> Option<&Prefix> {
        self.prefixes.get(key)
    }

    /// Mutable access to a prefix, for subnet operations.
    pub(crate) fn prefix_mut(&mut self, key: &str) -> Option<&mut Prefix> {
        self.prefixes.get_mut(key)
    }

    /// Iterate over prefixes in insertion order.
    pub fn prefixes(&self) -> impl Iterator<Item = &Prefix> {
        self.prefixes.values()
    }

    /// Create a prefix and link it into the address space.
    ///
    /// Checks, in order: key validity, key uniqueness, CIDR syntax, the
    /// prefix mask floor, and overlap with every other prefix.
    pub fn create_prefix(&mut self, key: &str, cidr: &str, description: &str) -> IpamResult<&Prefix> {
        validate_key(key)?;
        if self.prefixes.contains_key(key) {
            return Err(IpamError::duplicate_key(EntityKind::Prefix, key));
        }
        let (_, network) = addr::parse_cidr(cidr)?;
        self.check_prefix_block(cidr, &network, None)?;

        let prefix = Prefix {
            key: key.to_string(),
            network,
            description: description.to_string(),
            subnets: IndexMap::new(),
        };
        debug!(prefix = key, %network, "prefix created");
        let entry = self.prefixes.entry(key.to_string()).or_insert(prefix);
        Ok(&*entry)
    }

    /// Replace a prefix's block and description.
    ///
    /// Changing the block of a prefix that still owns subnets fails with
    /// [`IpamError::NotEmpty`]. The overlap scan skips the prefix being
    /// modified and nothing else.
    pub fn modify_prefix(&mut self, key: &str, cidr: &str, description: &str) -> IpamResult<()> {
        let current = self
            .prefixes
            .get(key)
            .ok_or_else(|| IpamError::not_found(EntityKind::Prefix, key))?;
        let (_, network) = addr::parse_cidr(cidr)?;
        if network != current.network {
            if !current.subnets.is_empty() {
                return Err(IpamError::NotEmpty {
                    kind: EntityKind::Prefix,
                    key: key.to_string(),
                });
            }
            self.check_prefix_block(cidr, &network, Some(key))?;
        }

        let prefix = self
            .prefixes
            .get_mut(key)
            .ok_or_else(|| IpamError::not_found(EntityKind::Prefix, key))?;
        prefix.network = network;
        prefix.description = description.to_string();
        debug!(prefix = key, %network, "prefix modified");
        Ok(())
    }

    /// Delete a prefix and, first, every subnet (and host) it owns.
    pub fn delete_prefix(&mut self, key: &str) -> IpamResult<Prefix> {
        let prefix = self
            .prefixes
            .get_mut(key)
            .ok_or_else(|| IpamError::not_found(EntityKind::Prefix, key))?;
        prefix.delete_all_subnets()?;
        let prefix = self
            .prefixes
            .shift_remove(key)
            .ok_or_else(|| IpamError::not_found(EntityKind::Prefix, key))?;
        debug!(prefix = key, "prefix deleted");
        Ok(prefix)
    }

    fn check_prefix_block(&self, cidr: &str, network: &IpNet, exclude: Option<&str>) -> IpamResult<()> {
        let len = addr::mask_length(network);
        let max = self.policy.prefix_max_len;
        if len > max {
            return Err(IpamError::MaskTooNarrow {
                kind: EntityKind::Prefix,
                cidr: cidr.to_string(),
                len,
                max,
            });
        }
        let clash = self
            .prefixes
            .values()
            .filter(|p| Some(p.key.as_str()) != exclude)
            .find(|p| addr::overlaps(&p.network, network));
        if let Some(existing) = clash {
            return Err(IpamError::OverlappingBlock {
                kind: EntityKind::Prefix,
                cidr: cidr.to_string(),
                key: existing.key.clone(),
            });
        }
        Ok(())
    }
}
