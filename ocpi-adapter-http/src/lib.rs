//! # OCPI HTTP Adapter
//!
//! HTTP side of an OCPI federation node: the `/versions` and credentials
//! endpoints, receivers for pushed locations, sessions, tariffs and CDRs,
//! and the outbound client that negotiates versions and runs the
//! credentials handshake against other parties.
//!
//! ## Architecture
//!
//! ```text
//!  Remote party                     this node
//!  ─────────────                    ──────────────────────────────────
//!   POST /credentials ───────────►  server::credentials
//!                                      │ callback GET /versions
//!   /versions, /{version} ◄────────────┘ (VersionNegotiator)
//!                                      ▼
//!                                   RemotePartyRegistry (ocpi-core)
//!                                      ▲
//!   /{version}/credentials ◄─────── OcpiClient::register / unregister
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use ocpi_adapter_http::{NodeConfig, OcpiNode};
//! use ocpi_core::Role;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = NodeConfig::new("DE", "GEF", Role::Cpo, "GraphDefined CPO")
//!         .with_base_url("http://localhost:8080");
//!
//!     let node = OcpiNode::new(config)?;
//!     node.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod envelope;
pub mod headers;
pub mod negotiator;
pub mod node;
pub mod server;
pub mod store;

pub use client::{ClientResponse, OcpiClient};
pub use config::NodeConfig;
pub use envelope::{ApiError, OcpiResponse};
pub use headers::RequestIds;
pub use negotiator::{Negotiated, NegotiationError, VersionNegotiator};
pub use node::{NodeError, NodeState, OcpiNode};
pub use store::ResourceStore;
