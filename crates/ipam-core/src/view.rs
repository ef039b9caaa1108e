//! Serializable representations of tree entities.
//!
//! Views are flat: a subnet names its prefix by key and a host names its
//! subnet (and that subnet's prefix) by key. No view embeds its parent or
//! its children, so every representation is acyclic and bounded in size.

use serde::{Deserialize, Serialize};

use crate::host::Host;
use crate::prefix::Prefix;
use crate::subnet::Subnet;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixView {
    pub key: String,
    pub cidr: String,
    pub description: String,
    pub private: bool,
    /// Number of subnets owned by the prefix.
    pub subnets: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetView {
    pub key: String,
    pub cidr: String,
    pub description: String,
    pub private: bool,
    /// Key of the owning prefix.
    pub prefix: String,
    /// Number of hosts owned by the subnet.
    pub hosts: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostView {
    pub key: String,
    pub address: String,
    pub description: String,
    pub private: bool,
    /// Key of the prefix owning the subnet.
    pub prefix: String,
    /// Key of the owning subnet.
    pub subnet: String,
}

impl From<&Prefix> for PrefixView {
    fn from(prefix: &Prefix) -> Self {
        Self {
            key: prefix.key.clone(),
            cidr: prefix.network.to_string(),
            description: prefix.description.clone(),
            private: prefix.is_private(),
            subnets: prefix.subnets.len(),
        }
    }
}

impl From<&Subnet> for SubnetView {
    fn from(subnet: &Subnet) -> Self {
        Self {
            key: subnet.key.clone(),
            cidr: subnet.network.to_string(),
            description: subnet.description.clone(),
            private: subnet.private,
            prefix: subnet.prefix.clone(),
            hosts: subnet.hosts.len(),
        }
    }
}

impl From<&Host> for HostView {
    fn from(host: &Host) -> Self {
        Self {
            key: host.key.clone(),
            address: host.address.to_string(),
            description: host.description.clone(),
            private: host.private,
            prefix: host.prefix.clone(),
            subnet: host.subnet.clone(),
        }
    }
}

macro_rules! impl_to_json {
    ($($view:ty),*) => {
        $(
            impl $view {
                /// Serialize this view to JSON bytes.
                pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
                    serde_json::to_vec(self)
                }
            }
        )*
    };
}

impl_to_json!(PrefixView, SubnetView, HostView);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addr::parse_address;
    use crate::space::AddressSpace;

    fn space() -> AddressSpace {
        let mut space = AddressSpace::default();
        space.create_prefix("p1", "10.0.0.0/16", "campus").unwrap();
        space.create_subnet("p1", "s1", "10.0.1.0/24", "office").unwrap();
        space.create_host("p1", "s1", "h1", "10.0.1.5", "printer").unwrap();
        space
    }

    #[test]
    fn host_view_references_parents_by_key() {
        let space = space();
        let view = HostView::from(space.find_host("p1", "s1", "h1").unwrap());
        let json: serde_json::Value = serde_json::from_slice(&view.to_json().unwrap()).unwrap();
        assert_eq!(json["key"], "h1");
        assert_eq!(json["address"], "10.0.1.5");
        assert_eq!(json["description"], "printer");
        assert_eq!(json["private"], true);
        assert_eq!(json["subnet"], "s1");
        assert_eq!(json["prefix"], "p1");
    }

    #[test]
    fn host_address_round_trips() {
        let space = space();
        let host = space.find_host("p1", "s1", "h1").unwrap();
        let view = HostView::from(host);
        assert_eq!(parse_address(&view.address).unwrap(), host.address());
    }

    #[test]
    fn subnet_and_prefix_views() {
        let space = space();
        let subnet = SubnetView::from(space.find_subnet("p1", "s1").unwrap());
        assert_eq!(subnet.cidr, "10.0.1.0/24");
        assert_eq!(subnet.prefix, "p1");
        assert_eq!(subnet.hosts, 1);
        assert!(subnet.private);

        let prefix = PrefixView::from(space.find_prefix("p1").unwrap());
        assert_eq!(prefix.cidr, "10.0.0.0/16");
        assert_eq!(prefix.subnets, 1);
    }
}
