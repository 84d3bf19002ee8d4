//! Configuration for an OCPI node
//!
//! One explicit struct with defaults and `with_*` helpers; the binary fills
//! it from command line arguments.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ocpi_core::{
    AccessToken, BusinessDetails, Credentials, ModuleId, PartyIdentity, Role, VersionId,
};

/// Complete node configuration
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Our own identity in the federation
    pub identity: PartyIdentity,

    /// Business details sent with our credentials
    pub business_details: BusinessDetails,

    /// Externally reachable base URL, without trailing slash
    pub base_url: String,

    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,

    /// OCPI versions we offer, in any order
    pub versions: Vec<VersionId>,

    /// Timeout for every outbound request
    pub request_timeout: Duration,

    /// Length of generated access tokens
    pub token_length: usize,

    /// Append-only registry log; in-memory registry when unset
    pub registry_log: Option<PathBuf>,

    /// Also accept base64-encoded tokens in `Authorization`
    pub base64_tokens: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            identity: PartyIdentity::new("DE", "GEF", Role::Cpo),
            business_details: BusinessDetails::new("OCPI Node"),
            base_url: "http://127.0.0.1:8080".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            versions: vec![VersionId::new("2.1.1"), VersionId::new("2.2.1")],
            request_timeout: Duration::from_secs(30),
            token_length: 64,
            registry_log: None,
            base64_tokens: true,
        }
    }
}

impl NodeConfig {
    /// Create config with basic parameters
    pub fn new(
        country_code: impl Into<String>,
        party_id: impl Into<String>,
        role: Role,
        name: impl Into<String>,
    ) -> Self {
        Self {
            identity: PartyIdentity::new(country_code, party_id, role),
            business_details: BusinessDetails::new(name),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_versions(mut self, versions: Vec<VersionId>) -> Self {
        self.versions = versions;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_token_length(mut self, length: usize) -> Self {
        self.token_length = length;
        self
    }

    pub fn with_registry_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.registry_log = Some(path.into());
        self
    }

    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.business_details = self.business_details.with_website(website);
        self
    }

    pub fn with_base64_tokens(mut self, accept: bool) -> Self {
        self.base64_tokens = accept;
        self
    }

    /// URL of our `/versions` endpoint
    pub fn versions_url(&self) -> String {
        format!("{}/versions", self.base_url)
    }

    /// URL of one version's detail endpoint
    pub fn version_url(&self, version: &VersionId) -> String {
        format!("{}/{}", self.base_url, version)
    }

    /// URL of a module under one version
    pub fn module_url(&self, version: &VersionId, module: &ModuleId) -> String {
        format!("{}/{}/{}", self.base_url, version, module)
    }

    pub fn supports(&self, version: &VersionId) -> bool {
        self.versions.contains(version)
    }

    /// Our credentials object carrying `token`
    pub fn credentials(&self, token: AccessToken) -> Credentials {
        Credentials {
            token,
            url: self.versions_url(),
            business_details: self.business_details.clone(),
            country_code: self.identity.country_code.clone(),
            party_id: self.identity.party_id.clone(),
        }
    }

    pub fn generate_token(&self) -> AccessToken {
        AccessToken::generate(self.token_length)
    }
}
