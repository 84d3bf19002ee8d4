//! Access token authentication
//!
//! Resolves the token of an inbound request to a remote party and decides
//! whether the call may proceed. Unknown and blocked tokens share one error
//! message so callers cannot probe registry membership.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;
use tracing::{debug, warn};

use crate::party::{AccessInfo, RemoteParty};
use crate::registry::RemotePartyRegistry;
use crate::types::AccessStatus;

/// Rejected token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid or blocked access token!")]
    Unknown,

    #[error("Invalid or blocked access token!")]
    Blocked,
}

/// Protected call by a peer that has not finished registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistrationStateError {
    #[error("You need to be registered before trying to invoke this protected method!")]
    NotYetRegistered,
}

/// Result of authenticating one token
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    Unknown,
    Blocked(Arc<RemoteParty>),
    Allowed(Authorized),
}

/// An accepted caller
#[derive(Debug, Clone)]
pub struct Authorized {
    pub party: Arc<RemoteParty>,
    pub access: AccessInfo,
}

impl Authorized {
    /// Guard for state-mutating and module calls
    pub fn require_registered(&self) -> Result<(), RegistrationStateError> {
        if self.access.registered {
            Ok(())
        } else {
            Err(RegistrationStateError::NotYetRegistered)
        }
    }
}

impl AuthOutcome {
    pub fn into_result(self) -> Result<Authorized, AuthError> {
        match self {
            AuthOutcome::Allowed(authorized) => Ok(authorized),
            AuthOutcome::Blocked(_) => Err(AuthError::Blocked),
            AuthOutcome::Unknown => Err(AuthError::Unknown),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, AuthOutcome::Allowed(_))
    }
}

/// Extract the token from an `Authorization: Token <token>` header value
pub fn parse_authorization(header: &str) -> Option<&str> {
    let header = header.trim();
    let (scheme, token) = header.split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("token") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Token lookup over the registry
#[derive(Clone)]
pub struct AccessTokenAuthenticator {
    registry: Arc<RemotePartyRegistry>,
    accept_base64: bool,
}

impl AccessTokenAuthenticator {
    pub fn new(registry: Arc<RemotePartyRegistry>) -> Self {
        Self {
            registry,
            accept_base64: true,
        }
    }

    /// Also try the base64-decoded token when the raw one is unknown
    pub fn with_base64(mut self, accept: bool) -> Self {
        self.accept_base64 = accept;
        self
    }

    pub fn authenticate(&self, token: &str) -> AuthOutcome {
        let Some((token, party, status)) = self.resolve(token) else {
            debug!("Auth: Unknown access token");
            return AuthOutcome::Unknown;
        };

        if status == AccessStatus::Blocked || !party.is_enabled() {
            warn!("Auth: Rejected blocked access token of {}", party.identity);
            return AuthOutcome::Blocked(party);
        }

        match party.access_info(&token).cloned() {
            Some(access) => AuthOutcome::Allowed(Authorized { party, access }),
            None => AuthOutcome::Unknown,
        }
    }

    /// Registry lookup by the raw token, then by its base64 decoding
    fn resolve(&self, token: &str) -> Option<(String, Arc<RemoteParty>, AccessStatus)> {
        if let Some((party, status)) = self.registry.lookup_by_token(token) {
            return Some((token.to_string(), party, status));
        }
        if !self.accept_base64 {
            return None;
        }

        let decoded = STANDARD.decode(token).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let decoded = decoded.trim().to_string();
        let (party, status) = self.registry.lookup_by_token(&decoded)?;
        Some((decoded, party, status))
    }

    /// Authenticate a raw `Authorization` header value
    pub fn authenticate_header(&self, header: Option<&str>) -> AuthOutcome {
        match header.and_then(parse_authorization) {
            Some(token) => self.authenticate(token),
            None => {
                debug!("Auth: Missing or malformed Authorization header");
                AuthOutcome::Unknown
            }
        }
    }
}
