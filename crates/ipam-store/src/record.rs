//! Persisted rows for each entity kind.
//!
//! Records carry only what the user chose: key path, block or address text,
//! and description. Private-address flags are derived on load and never
//! stored.

use std::fmt;

use ipam_core::{HostView, PrefixView, SubnetView};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixRecord {
    pub key: String,
    pub cidr: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetRecord {
    pub prefix: String,
    pub key: String,
    pub cidr: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub prefix: String,
    pub subnet: String,
    pub key: String,
    pub address: String,
    #[serde(default)]
    pub description: String,
}

impl PrefixRecord {
    pub fn new(key: impl Into<String>, cidr: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            cidr: cidr.into(),
            description: description.into(),
        }
    }
}

impl SubnetRecord {
    pub fn new(
        prefix: impl Into<String>,
        key: impl Into<String>,
        cidr: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            key: key.into(),
            cidr: cidr.into(),
            description: description.into(),
        }
    }

    pub(crate) fn id(&self) -> (String, String) {
        (self.prefix.clone(), self.key.clone())
    }
}

impl HostRecord {
    pub fn new(
        prefix: impl Into<String>,
        subnet: impl Into<String>,
        key: impl Into<String>,
        address: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            subnet: subnet.into(),
            key: key.into(),
            address: address.into(),
            description: description.into(),
        }
    }

    pub(crate) fn id(&self) -> (String, String, String) {
        (self.prefix.clone(), self.subnet.clone(), self.key.clone())
    }
}

impl fmt::Display for PrefixRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

impl fmt::Display for SubnetRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.prefix, self.key)
    }
}

impl fmt::Display for HostRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.prefix, self.subnet, self.key)
    }
}

impl From<&PrefixView> for PrefixRecord {
    fn from(view: &PrefixView) -> Self {
        Self::new(&view.key, &view.cidr, &view.description)
    }
}

impl From<&SubnetView> for SubnetRecord {
    fn from(view: &SubnetView) -> Self {
        Self::new(&view.prefix, &view.key, &view.cidr, &view.description)
    }
}

impl From<&HostView> for HostRecord {
    fn from(view: &HostView) -> Self {
        Self::new(
            &view.prefix,
            &view.subnet,
            &view.key,
            &view.address,
            &view.description,
        )
    }
}
