//! OCPI node wiring
//!
//! Owns the registry, authenticator, negotiator and resource stores of one
//! node and hands out the HTTP router and outbound clients built on them.
//!
//! ```text
//!        peer ──HTTP──► Router ──► Authenticator ──► Registry
//!                          │                            ▲
//!                          └──► ResourceStores          │
//!  OcpiClient ──► VersionNegotiator ──HTTP──► peer      │
//!       └──────────────────────────────────────────────┘
//! ```

use std::future::Future;
use std::io;
use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

use ocpi_core::resources::{Cdr, Location, Session, Tariff};
use ocpi_core::{
    AccessTokenAuthenticator, FileSink, FileSinkConfig, PartyIdentity, RegistryError,
    RemotePartyRegistry,
};

use crate::client::OcpiClient;
use crate::config::NodeConfig;
use crate::negotiator::{NegotiationError, VersionNegotiator};
use crate::server;
use crate::store::ResourceStore;

/// Failures while starting or running a node
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("HTTP client error: {0}")]
    Negotiation(#[from] NegotiationError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct NodeState {
    pub config: Arc<NodeConfig>,
    pub registry: Arc<RemotePartyRegistry>,
    pub authenticator: AccessTokenAuthenticator,
    pub negotiator: Arc<VersionNegotiator>,
    pub locations: Arc<ResourceStore<Location>>,
    pub sessions: Arc<ResourceStore<Session>>,
    pub tariffs: Arc<ResourceStore<Tariff>>,
    pub cdrs: Arc<ResourceStore<Cdr>>,
}

/// One OCPI federation node
pub struct OcpiNode {
    state: NodeState,
}

impl OcpiNode {
    /// Build a node; replays the registry log when one is configured
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        let registry = match &config.registry_log {
            Some(path) => {
                let sink = FileSink::open(FileSinkConfig {
                    path: path.clone(),
                    ..Default::default()
                })?;
                RemotePartyRegistry::open(sink)?
            }
            None => RemotePartyRegistry::in_memory(),
        };
        Self::with_registry(config, Arc::new(registry))
    }

    /// Build a node around an existing registry
    pub fn with_registry(
        config: NodeConfig,
        registry: Arc<RemotePartyRegistry>,
    ) -> Result<Self, NodeError> {
        let negotiator = VersionNegotiator::new(config.request_timeout)?;
        let authenticator =
            AccessTokenAuthenticator::new(registry.clone()).with_base64(config.base64_tokens);

        info!(
            "Node: {} with {} remote parties, versions {:?}",
            config.identity,
            registry.len(),
            config.versions.iter().map(|v| v.as_str()).collect::<Vec<_>>()
        );

        Ok(Self {
            state: NodeState {
                config: Arc::new(config),
                registry,
                authenticator,
                negotiator: Arc::new(negotiator),
                locations: Arc::new(ResourceStore::new()),
                sessions: Arc::new(ResourceStore::new()),
                tariffs: Arc::new(ResourceStore::new()),
                cdrs: Arc::new(ResourceStore::new()),
            },
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.state.config
    }

    pub fn registry(&self) -> &Arc<RemotePartyRegistry> {
        &self.state.registry
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    /// HTTP surface of this node
    pub fn router(&self) -> Router {
        server::router(self.state.clone())
    }

    /// Outbound client for one remote party
    pub fn client(&self, remote: PartyIdentity) -> OcpiClient {
        OcpiClient::new(self.state.clone(), remote)
    }

    /// Serve on `listener` until `shutdown` resolves
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), NodeError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("Node: Listening on {}", listener.local_addr()?);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("Node: Stopped");
        Ok(())
    }

    /// Bind the configured address and serve until Ctrl-C
    pub async fn run(&self) -> Result<(), NodeError> {
        let listener = TcpListener::bind(self.state.config.bind_addr).await?;
        self.serve(listener, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }
}
