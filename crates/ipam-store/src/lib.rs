//! Record persistence for the IPAM address space.
//!
//! The address space lives in memory; this crate is the durable copy it is
//! written through to and reloaded from. Rows are flat records addressed by
//! key path (`prefix`, `prefix/subnet`, `prefix/subnet/host`).
//!
//! # Storage Backends
//!
//! All backends implement the [`RecordStore`] trait:
//!
//! - [`InMemoryRecordStore`] -- map-backed store for tests and ephemeral runs
//! - [`JsonFileStore`] -- a single JSON document, rewritten atomically
//!
//! # Loading
//!
//! [`load_space`] builds a complete [`ipam_core::AddressSpace`] from a store,
//! replaying every row through the same validation as a live create.

pub mod error;
pub mod file;
pub mod loader;
pub mod memory;
pub mod record;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use loader::{load_space, populate};
pub use memory::{InMemoryRecordStore, StoreDocument};
pub use record::{HostRecord, PrefixRecord, SubnetRecord};
pub use traits::RecordStore;
