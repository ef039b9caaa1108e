use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::auth::{AuthProvider, TokenListAuth};
use crate::config::IpamConfig;
use crate::error::{ServerError, ServerResult};
use crate::reload::ReloadScheduler;
use crate::router::build_router;
use crate::service::IpamService;

/// IPAM HTTP server.
pub struct IpamServer {
    config: IpamConfig,
    service: Arc<IpamService>,
    auth: Arc<dyn AuthProvider>,
}

impl IpamServer {
    /// Open the configured store and build the service over it. The tree is
    /// empty until [`IpamServer::serve`] performs the initial load.
    pub async fn new(config: IpamConfig) -> ServerResult<Self> {
        config.validate()?;
        let store = config.open_store().await?;
        let service = Arc::new(IpamService::new(store, config.policy));
        let auth: Arc<dyn AuthProvider> =
            Arc::new(TokenListAuth::new(config.authorized_tokens.iter().cloned()));
        Ok(Self {
            config,
            service,
            auth,
        })
    }

    /// Replace the token gate.
    pub fn with_auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = auth;
        self
    }

    pub fn config(&self) -> &IpamConfig {
        &self.config
    }

    pub fn service(&self) -> &Arc<IpamService> {
        &self.service
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.service.clone(), self.auth.clone())
    }

    /// Load the store, start the reload scheduler, and serve until Ctrl-C.
    ///
    /// A failing initial load aborts startup.
    pub async fn serve(self) -> ServerResult<()> {
        let stats = self.service.reload().await?;
        info!(
            prefixes = stats.prefixes,
            subnets = stats.subnets,
            hosts = stats.hosts,
            "initial load complete"
        );
        if self.config.authorized_tokens.is_empty() {
            warn!("no authorized tokens configured, every gated request will be refused");
        }

        let scheduler = ReloadScheduler::spawn(self.service.clone(), self.config.reload_interval());
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!(addr = %self.config.bind_addr, "IPAM server listening");

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()));

        scheduler.shutdown().await;
        info!("IPAM server stopped");
        served
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "unable to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use ipam_store::{JsonFileStore, PrefixRecord, RecordStore};

    #[tokio::test]
    async fn server_construction() {
        let server = IpamServer::new(IpamConfig::default()).await.unwrap();
        assert_eq!(server.config().bind_addr.port(), 8080);
        assert_eq!(server.service().stats().prefixes, 0);
        let _router = server.router();
    }

    #[tokio::test]
    async fn invalid_config_refused() {
        let config = IpamConfig {
            reload_interval_minutes: 0,
            ..IpamConfig::default()
        };
        assert!(matches!(
            IpamServer::new(config).await.err(),
            Some(ServerError::Config(_))
        ));
    }

    #[tokio::test]
    async fn uses_configured_json_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipam.json");
        let seed = JsonFileStore::open(&path).await.unwrap();
        seed.insert_prefix(&PrefixRecord::new("p1", "10.0.0.0/16", ""))
            .await
            .unwrap();

        let config = IpamConfig {
            store: StoreConfig::JsonFile { path },
            ..IpamConfig::default()
        };
        let server = IpamServer::new(config).await.unwrap();
        server.service().reload().await.unwrap();
        assert!(server.service().get_prefix("p1").is_ok());
    }
}
