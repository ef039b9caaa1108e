//! In-memory model of an organization's IP address space.
//!
//! The address space is a strict four-level tree:
//!
//! - **AddressSpace** -- the root, one per process
//! - **Prefix** -- a top-level CIDR block (a site, a VLAN range)
//! - **Subnet** -- a CIDR block carved from a prefix
//! - **Host** -- a single address assigned within a subnet
//!
//! Every mutation validates before it links anything, so a failed call
//! leaves the tree exactly as it was. The rules enforced on every create
//! and modify:
//!
//! 1. Keys match `^[a-z0-9.-]+$`, are at most 50 characters, and are unique
//!    among siblings.
//! 2. A subnet block lies inside its prefix; a host address lies inside its
//!    subnet.
//! 3. Sibling blocks never overlap; sibling hosts never share an address.
//! 4. Prefix and subnet masks respect the [`MaskPolicy`] floors.
//! 5. A block cannot change while it still has children.
//! 6. Private-address flags are derived, never set.
//!
//! # Modules
//!
//! - [`addr`] -- CIDR parsing, containment, private-range classification
//! - [`key`] -- Key validation
//! - [`space`], [`prefix`], [`subnet`], [`host`] -- The tree and its operations
//! - [`registry`] -- Lock-guarded owner of the tree for concurrent use
//! - [`view`] -- Flat serializable representations

pub mod addr;
pub mod error;
pub mod host;
pub mod key;
pub mod policy;
pub mod prefix;
pub mod registry;
pub mod space;
pub mod subnet;
pub mod view;

pub use error::{EntityKind, IpamError, IpamResult};
pub use host::Host;
pub use key::{is_valid_key, validate_key};
pub use policy::MaskPolicy;
pub use prefix::Prefix;
pub use registry::Registry;
pub use space::{AddressSpace, SpaceStats};
pub use subnet::Subnet;
pub use view::{HostView, PrefixView, SubnetView};
