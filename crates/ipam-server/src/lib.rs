//! HTTP server for IPAM.
//!
//! Serves the address space over a JSON REST API behind a bearer-token
//! gate, writes every mutation through to the record store, and reloads
//! the whole tree from the store on a fixed schedule.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod reload;
pub mod router;
pub mod server;
pub mod service;

pub use auth::{AllowAllAuth, AuthProvider, Credentials, Identity, TokenListAuth};
pub use config::{IpamConfig, StoreConfig};
pub use error::{ServerError, ServerResult};
pub use reload::ReloadScheduler;
pub use server::IpamServer;
pub use service::{IpamService, ReloadStatus};
