//! Hosts: single addresses assigned inside a subnet.
//!
//! Hosts are created, edited, and removed through their owning [`Subnet`],
//! which holds the sibling index every check runs against.

use std::net::IpAddr;

use tracing::debug;

use crate::addr;
use crate::error::{EntityKind, IpamError, IpamResult};
use crate::key::validate_key;
use crate::subnet::Subnet;

/// A single IP address assigned within a subnet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Host {
    pub(crate) key: String,
    pub(crate) address: IpAddr,
    pub(crate) description: String,
    pub(crate) private: bool,
    pub(crate) prefix: String,
    pub(crate) subnet: String,
}

impl Host {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn address(&self) -> IpAddr {
        self.address
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the address is in a private range. Derived from the address.
    pub fn is_private(&self) -> bool {
        self.private
    }

    /// Key of the prefix that owns this host's subnet.
    pub fn prefix_key(&self) -> &str {
        &self.prefix
    }

    /// Key of the owning subnet.
    pub fn subnet_key(&self) -> &str {
        &self.subnet
    }
}

impl Subnet {
    /// Look up a host by key.
    pub fn host(&self, key: &str) -> Option<&Host> {
        self.hosts.get(key)
    }

    /// Iterate over hosts in insertion order.
    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.hosts.values()
    }

    /// Number of hosts in this subnet.
    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    /// Create a host and link it into this subnet.
    ///
    /// Checks, in order: key validity, key uniqueness, address syntax,
    /// containment in the subnet block, and address uniqueness among
    /// siblings. The subnet is untouched if any check fails.
    pub fn create_host(
        &mut self,
        key: &str,
        address: &str,
        description: &str,
    ) -> IpamResult<&Host> {
        validate_key(key)?;
        if self.hosts.contains_key(key) {
            return Err(IpamError::duplicate_key(EntityKind::Host, key));
        }
        let address = addr::parse_address(address)?;
        self.check_host_address(&address, None)?;

        let host = Host {
            key: key.to_string(),
            address,
            description: description.to_string(),
            private: addr::is_private(&address),
            prefix: self.prefix.clone(),
            subnet: self.key.clone(),
        };
        debug!(subnet = %self.key, host = key, %address, "host created");
        let entry = self.hosts.entry(key.to_string()).or_insert(host);
        Ok(&*entry)
    }

    /// Change a host's address and description in place.
    ///
    /// The new address must stay inside the subnet block and must not be
    /// used by any other host; the host itself is excluded by key.
    pub fn modify_host(&mut self, key: &str, address: &str, description: &str) -> IpamResult<()> {
        if !self.hosts.contains_key(key) {
            return Err(IpamError::not_found(EntityKind::Host, key));
        }
        let address = addr::parse_address(address)?;
        self.check_host_address(&address, Some(key))?;

        let host = self
            .hosts
            .get_mut(key)
            .ok_or_else(|| IpamError::not_found(EntityKind::Host, key))?;
        host.address = address;
        host.description = description.to_string();
        host.private = addr::is_private(&address);
        debug!(subnet = %self.key, host = key, %address, "host modified");
        Ok(())
    }

    /// Unlink a host from this subnet.
    pub fn delete_host(&mut self, key: &str) -> IpamResult<Host> {
        let host = self
            .hosts
            .shift_remove(key)
            .ok_or_else(|| IpamError::not_found(EntityKind::Host, key))?;
        debug!(subnet = %self.key, host = key, "host deleted");
        Ok(host)
    }

    /// Delete every host, stopping at the first failure.
    pub(crate) fn delete_all_hosts(&mut self) -> IpamResult<()> {
        let keys: Vec<String> = self.hosts.keys().cloned().collect();
        for key in keys {
            self.delete_host(&key)?;
        }
        Ok(())
    }

    fn check_host_address(&self, address: &IpAddr, exclude: Option<&str>) -> IpamResult<()> {
        if !addr::contains(&self.network, address) {
            return Err(IpamError::OutOfRange {
                child: address.to_string(),
                parent: self.network.to_string(),
            });
        }
        let clash = self
            .hosts
            .values()
            .find(|h| h.address == *address && Some(h.key.as_str()) != exclude);
        if let Some(existing) = clash {
            return Err(IpamError::DuplicateAddress {
                address: address.to_string(),
                key: existing.key.clone(),
            });
        }
        Ok(())
    }
}
