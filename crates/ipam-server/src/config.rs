use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ipam_core::MaskPolicy;
use ipam_store::{InMemoryRecordStore, JsonFileStore, RecordStore};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Widest prefix length of any supported address family.
const MAX_MASK_LEN: u8 = 128;

/// Longest accepted reload period: one week.
const MAX_RELOAD_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Server configuration, read from a TOML file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpamConfig {
    pub bind_addr: SocketAddr,
    /// Minutes between full reloads from the store.
    pub reload_interval_minutes: u64,
    /// Raise logging to DEBUG.
    pub debug: bool,
    /// Bearer tokens accepted on gated routes. Empty denies every request.
    pub authorized_tokens: Vec<String>,
    pub policy: MaskPolicy,
    pub store: StoreConfig,
}

impl Default for IpamConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            reload_interval_minutes: 5,
            debug: false,
            authorized_tokens: Vec::new(),
            policy: MaskPolicy::default(),
            store: StoreConfig::default(),
        }
    }
}

/// Which record store backs the address space.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    #[default]
    Memory,
    JsonFile { path: PathBuf },
}

impl IpamConfig {
    /// Read and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn validate(&self) -> ServerResult<()> {
        if self.reload_interval_minutes == 0 {
            return Err(ServerError::Config(
                "reload_interval_minutes must be greater than zero".into(),
            ));
        }
        if self.reload_interval_minutes > MAX_RELOAD_INTERVAL_MINUTES {
            return Err(ServerError::Config(format!(
                "reload_interval_minutes must be at most {MAX_RELOAD_INTERVAL_MINUTES}"
            )));
        }
        let MaskPolicy {
            prefix_max_len,
            subnet_max_len,
        } = self.policy;
        if prefix_max_len > MAX_MASK_LEN || subnet_max_len > MAX_MASK_LEN {
            return Err(ServerError::Config(format!(
                "mask lengths must be at most {MAX_MASK_LEN}"
            )));
        }
        if subnet_max_len < prefix_max_len {
            return Err(ServerError::Config(format!(
                "subnet_max_len ({subnet_max_len}) is shorter than prefix_max_len ({prefix_max_len})"
            )));
        }
        if let StoreConfig::JsonFile { path } = &self.store {
            if path.as_os_str().is_empty() {
                return Err(ServerError::Config("json_file store needs a path".into()));
            }
        }
        Ok(())
    }

    pub fn reload_interval(&self) -> Duration {
        Duration::from_secs(self.reload_interval_minutes.saturating_mul(60))
    }

    /// Open the configured record store.
    pub async fn open_store(&self) -> ServerResult<Arc<dyn RecordStore>> {
        let store: Arc<dyn RecordStore> = match &self.store {
            StoreConfig::Memory => Arc::new(InMemoryRecordStore::new()),
            StoreConfig::JsonFile { path } => Arc::new(JsonFileStore::open(path).await?),
        };
        Ok(store)
    }
}
