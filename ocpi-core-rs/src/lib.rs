//! OCPI Core Library
//!
//! Control-plane building blocks for an OCPI federation node: the remote
//! party registry, access token authentication, and the JSON merge-patch
//! engine together with the resources it applies to. Transport lives in
//! `ocpi-adapter-http`.

#[macro_use]
mod macros;

pub mod types;
pub mod timestamp;
pub mod party;
pub mod storage;
pub mod registry;
pub mod auth;
pub mod patch;
pub mod resources;

pub use types::*;
pub use party::{AccessInfo, RemoteAccessInfo, RemoteParty};
pub use storage::{FileSink, FileSinkConfig, LogEntry, MemorySink, NullSink, PersistenceSink};
pub use registry::{RegistryError, RemotePartyRegistry};
pub use auth::{AccessTokenAuthenticator, AuthError, AuthOutcome, Authorized, RegistrationStateError};
pub use patch::{PatchError, PatchResult, Patchable};
