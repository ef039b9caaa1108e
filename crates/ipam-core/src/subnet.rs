//! Subnets: CIDR blocks carved from a prefix, each owning a set of hosts.

use indexmap::IndexMap;
use ipnet::IpNet;
use tracing::debug;

use crate::addr;
use crate::error::{EntityKind, IpamError, IpamResult};
use crate::host::Host;
use crate::key::validate_key;
use crate::prefix::Prefix;

/// A CIDR block inside a prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subnet {
    pub(crate) key: String,
    pub(crate) network: IpNet,
    pub(crate) description: String,
    pub(crate) private: bool,
    pub(crate) prefix: String,
    pub(crate) hosts: IndexMap<String, Host>,
}

impl Subnet {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The subnet block, host bits cleared.
    pub fn network(&self) -> IpNet {
        self.network
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the network address is in a private range.
    pub fn is_private(&self) -> bool {
        self.private
    }

    /// Key of the owning prefix.
    pub fn prefix_key(&self) -> &str {
        &self.prefix
    }
}

impl Prefix {
    /// Look up a subnet by key.
    pub fn subnet(&self, key: &str) -> Option<&Subnet> {
        self.subnets.get(key)
    }

    /// Mutable access to a subnet, for host operations.
    pub fn subnet_mut(&mut self, key: &str) -> Option<&mut Subnet> {
        self.subnets.get_mut(key)
    }

    /// Iterate over subnets in insertion order.
    pub fn subnets(&self) -> impl Iterator<Item = &Subnet> {
        self.subnets.values()
    }

    /// Number of subnets in this prefix.
    pub fn subnet_count(&self) -> usize {
        self.subnets.len()
    }

    /// Create a subnet and link it into this prefix.
    ///
    /// Checks, in order: key validity, key uniqueness, CIDR syntax, the
    /// subnet mask floor, containment in the prefix block, and overlap with
    /// sibling subnets. The prefix is untouched if any check fails.
    pub(crate) fn create_subnet(
        &mut self,
        key: &str,
        cidr: &str,
        description: &str,
        max_len: u8,
    ) -> IpamResult<&Subnet> {
        validate_key(key)?;
        if self.subnets.contains_key(key) {
            return Err(IpamError::duplicate_key(EntityKind::Subnet, key));
        }
        let (_, network) = addr::parse_cidr(cidr)?;
        self.check_subnet_block(cidr, &network, max_len, None)?;

        let subnet = Subnet {
            key: key.to_string(),
            network,
            description: description.to_string(),
            private: addr::is_private(&network.network()),
            prefix: self.key.clone(),
            hosts: IndexMap::new(),
        };
        debug!(prefix = %self.key, subnet = key, %network, "subnet created");
        let entry = self.subnets.entry(key.to_string()).or_insert(subnet);
        Ok(&*entry)
    }

    /// Replace a subnet's block and description.
    ///
    /// Changing the block of a subnet that still owns hosts fails with
    /// [`IpamError::NotEmpty`]; a description-only edit (same block) is
    /// always allowed.
    pub(crate) fn modify_subnet(
        &mut self,
        key: &str,
        cidr: &str,
        description: &str,
        max_len: u8,
    ) -> IpamResult<()> {
        let current = self
            .subnets
            .get(key)
            .ok_or_else(|| IpamError::not_found(EntityKind::Subnet, key))?;
        let (_, network) = addr::parse_cidr(cidr)?;
        if network != current.network {
            if !current.hosts.is_empty() {
                return Err(IpamError::NotEmpty {
                    kind: EntityKind::Subnet,
                    key: key.to_string(),
                });
            }
            self.check_subnet_block(cidr, &network, max_len, Some(key))?;
        }

        let subnet = self
            .subnets
            .get_mut(key)
            .ok_or_else(|| IpamError::not_found(EntityKind::Subnet, key))?;
        subnet.network = network;
        subnet.description = description.to_string();
        subnet.private = addr::is_private(&network.network());
        debug!(prefix = %self.key, subnet = key, %network, "subnet modified");
        Ok(())
    }

    /// Delete a subnet and, first, every host it owns.
    ///
    /// A failure while deleting hosts aborts the cascade; hosts removed
    /// before the failure stay removed.
    pub fn delete_subnet(&mut self, key: &str) -> IpamResult<Subnet> {
        let subnet = self
            .subnets
            .get_mut(key)
            .ok_or_else(|| IpamError::not_found(EntityKind::Subnet, key))?;
        subnet.delete_all_hosts()?;
        let subnet = self
            .subnets
            .shift_remove(key)
            .ok_or_else(|| IpamError::not_found(EntityKind::Subnet, key))?;
        debug!(prefix = %self.key, subnet = key, "subnet deleted");
        Ok(subnet)
    }

    pub(crate) fn delete_all_subnets(&mut self) -> IpamResult<()> {
        let keys: Vec<String> = self.subnets.keys().cloned().collect();
        for key in keys {
            self.delete_subnet(&key)?;
        }
        Ok(())
    }

    fn check_subnet_block(
        &self,
        cidr: &str,
        network: &IpNet,
        max_len: u8,
        exclude: Option<&str>,
    ) -> IpamResult<()> {
        let len = addr::mask_length(network);
        if len > max_len {
            return Err(IpamError::MaskTooNarrow {
                kind: EntityKind::Subnet,
                cidr: cidr.to_string(),
                len,
                max: max_len,
            });
        }
        if !addr::contains_block(&self.network, network) {
            return Err(IpamError::OutOfRange {
                child: network.to_string(),
                parent: self.network.to_string(),
            });
        }
        let clash = self
            .subnets
            .values()
            .filter(|s| Some(s.key.as_str()) != exclude)
            .find(|s| addr::overlaps(&s.network, network));
        if let Some(existing) = clash {
            return Err(IpamError::OverlappingBlock {
                kind: EntityKind::Subnet,
                cidr: cidr.to_string(),
                key: existing.key.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::DEFAULT_SUBNET_MAX_LEN as MAX;
    use crate::space::AddressSpace;

    fn space() -> AddressSpace {
        let mut space = AddressSpace::default();
        space.create_prefix("p1", "10.0.0.0/16", "site a").unwrap();
        space
    }

    fn prefix(space: &mut AddressSpace) -> &mut Prefix {
        space.prefix_mut("p1").unwrap()
    }

    #[test]
    fn create_links_subnet() {
        let mut space = space();
        let p = prefix(&mut space);
        let s = p.create_subnet("s1", "10.0.1.0/24", "office", MAX).unwrap();
        assert_eq!(s.key(), "s1");
        assert_eq!(s.network().to_string(), "10.0.1.0/24");
        assert!(s.is_private());
        assert_eq!(s.prefix_key(), "p1");
        assert_eq!(p.subnet_count(), 1);
    }

    #[test]
    fn host_bits_are_cleared() {
        let mut space = space();
        let s = prefix(&mut space)
            .create_subnet("s1", "10.0.1.77/24", "", MAX)
            .unwrap();
        assert_eq!(s.network().to_string(), "10.0.1.0/24");
    }

    #[test]
    fn duplicate_key_rejected() {
        let mut space = space();
        let p = prefix(&mut space);
        p.create_subnet("s1", "10.0.1.0/24", "", MAX).unwrap();
        let err = p.create_subnet("s1", "10.0.2.0/24", "", MAX).unwrap_err();
        assert!(matches!(err, IpamError::DuplicateKey { kind: EntityKind::Subnet, .. }));
    }

    #[test]
    fn malformed_cidr_rejected() {
        let mut space = space();
        let err = prefix(&mut space)
            .create_subnet("s1", "10.0.1.0", "", MAX)
            .unwrap_err();
        assert!(matches!(err, IpamError::MalformedCidr { .. }));
    }

    #[test]
    fn mask_floor_enforced() {
        let mut space = space();
        let p = prefix(&mut space);
        let err = p.create_subnet("s1", "10.0.1.0/25", "", MAX).unwrap_err();
        assert!(matches!(
            err,
            IpamError::MaskTooNarrow { len: 25, max: 24, .. }
        ));
        p.create_subnet("s1", "10.0.2.0/23", "", MAX).unwrap();
    }

    #[test]
    fn out_of_range_rejected() {
        let mut space = space();
        let p = prefix(&mut space);
        let err = p.create_subnet("s1", "10.1.0.0/24", "", MAX).unwrap_err();
        assert!(matches!(err, IpamError::OutOfRange { .. }));
        // Network address inside the prefix but block wider than it.
        let err = p.create_subnet("s2", "10.0.0.0/15", "", MAX).unwrap_err();
        assert!(matches!(err, IpamError::OutOfRange { .. }));
    }

    #[test]
    fn overlap_rejected_both_ways() {
        let mut space = space();
        let p = prefix(&mut space);
        p.create_subnet("wide", "10.0.4.0/22", "", MAX).unwrap();
        let err = p.create_subnet("inner", "10.0.5.0/24", "", MAX).unwrap_err();
        assert!(matches!(err, IpamError::OverlappingBlock { .. }));

        p.create_subnet("narrow", "10.0.9.0/24", "", MAX).unwrap();
        let err = p.create_subnet("outer", "10.0.8.0/22", "", MAX).unwrap_err();
        assert_eq!(
            err,
            IpamError::OverlappingBlock {
                kind: EntityKind::Subnet,
                cidr: "10.0.8.0/22".into(),
                key: "narrow".into()
            }
        );
    }

    #[test]
    fn modify_requires_no_hosts() {
        let mut space = space();
        let p = prefix(&mut space);
        p.create_subnet("s1", "10.0.1.0/24", "", MAX).unwrap();
        p.subnet_mut("s1")
            .unwrap()
            .create_host("h1", "10.0.1.5", "")
            .unwrap();

        let err = p.modify_subnet("s1", "10.0.3.0/24", "", MAX).unwrap_err();
        assert!(matches!(err, IpamError::NotEmpty { .. }));

        p.subnet_mut("s1").unwrap().delete_host("h1").unwrap();
        p.modify_subnet("s1", "10.0.3.0/24", "moved", MAX).unwrap();
        let s = p.subnet("s1").unwrap();
        assert_eq!(s.network().to_string(), "10.0.3.0/24");
        assert_eq!(s.description(), "moved");
    }

    #[test]
    fn description_edit_allowed_with_hosts() {
        let mut space = space();
        let p = prefix(&mut space);
        p.create_subnet("s1", "10.0.1.0/24", "", MAX).unwrap();
        p.subnet_mut("s1")
            .unwrap()
            .create_host("h1", "10.0.1.5", "")
            .unwrap();
        p.modify_subnet("s1", "10.0.1.0/24", "renamed", MAX).unwrap();
        assert_eq!(p.subnet("s1").unwrap().description(), "renamed");
    }

    #[test]
    fn modify_excludes_self_from_overlap() {
        let mut space = space();
        let p = prefix(&mut space);
        p.create_subnet("s1", "10.0.0.0/23", "", MAX).unwrap();
        p.create_subnet("s2", "10.0.8.0/24", "", MAX).unwrap();
        p.modify_subnet("s1", "10.0.0.0/24", "", MAX).unwrap();
        let err = p.modify_subnet("s1", "10.0.8.0/24", "", MAX).unwrap_err();
        assert!(matches!(err, IpamError::OverlappingBlock { .. }));
    }

    #[test]
    fn modify_rechecks_floor_and_containment() {
        let mut space = space();
        let p = prefix(&mut space);
        p.create_subnet("s1", "10.0.1.0/24", "", MAX).unwrap();
        let err = p.modify_subnet("s1", "10.0.1.0/26", "", MAX).unwrap_err();
        assert!(matches!(err, IpamError::MaskTooNarrow { .. }));
        let err = p.modify_subnet("s1", "172.16.0.0/24", "", MAX).unwrap_err();
        assert!(matches!(err, IpamError::OutOfRange { .. }));
        assert_eq!(p.subnet("s1").unwrap().network().to_string(), "10.0.1.0/24");
    }

    #[test]
    fn delete_cascades_to_hosts() {
        let mut space = space();
        let p = prefix(&mut space);
        p.create_subnet("s1", "10.0.1.0/24", "", MAX).unwrap();
        let s = p.subnet_mut("s1").unwrap();
        s.create_host("h1", "10.0.1.5", "").unwrap();
        s.create_host("h2", "10.0.1.6", "").unwrap();

        let removed = p.delete_subnet("s1").unwrap();
        assert_eq!(removed.host_count(), 0);
        assert!(p.subnet("s1").is_none());
        assert_eq!(p.subnet_count(), 0);
    }

    #[test]
    fn delete_missing_subnet_is_not_found() {
        let mut space = space();
        let err = prefix(&mut space).delete_subnet("ghost").unwrap_err();
        assert!(matches!(err, IpamError::NotFound { kind: EntityKind::Subnet, .. }));
    }
}
