//! Version negotiation
//!
//! Fetches a peer's `/versions` list and version details, picks the highest
//! mutual version and resolves module URLs. Version details are cached per
//! `(versions URL, version)`; re-registration invalidates a peer's entries.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};

use ocpi_core::{
    highest_mutual_version, AccessToken, ModuleId, RemoteAccessInfo, Version, VersionDetail,
    VersionId,
};

use crate::envelope::OcpiResponse;
use crate::headers::{self, RequestIds};

/// Errors from talking to a peer's version endpoints
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationError {
    #[error("No versionId available!")]
    NoVersionSelected,

    #[error("No remote URL available!")]
    NoRemoteUrlAvailable,

    #[error("No mutual OCPI version found!")]
    NoMutualVersion,

    #[error("Request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} answered HTTP {http_status} (status code {status_code:?})")]
    Status {
        url: String,
        http_status: u16,
        status_code: Option<i32>,
    },

    #[error("Malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },
}

impl NegotiationError {
    /// Failures detected before any request was sent
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            NegotiationError::NoVersionSelected | NegotiationError::NoRemoteUrlAvailable
        )
    }

    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NegotiationError::Timeout {
                url: url.to_string(),
            }
        } else {
            NegotiationError::Transport {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

/// Outcome of a full negotiation with a peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated {
    /// Every version the peer advertised
    pub version_ids: Vec<VersionId>,
    pub selected: VersionId,
    pub detail: VersionDetail,
}

/// Version discovery and module URL resolution
pub struct VersionNegotiator {
    http: reqwest::Client,
    details: RwLock<HashMap<(String, VersionId), VersionDetail>>,
}

impl VersionNegotiator {
    pub fn new(timeout: Duration) -> Result<Self, NegotiationError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NegotiationError::Transport {
                url: String::new(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            details: RwLock::new(HashMap::new()),
        })
    }

    /// Shared HTTP client, configured with the outbound timeout
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Highest version both sides support
    pub fn select_version(
        ours: &[VersionId],
        theirs: &[VersionId],
    ) -> Result<VersionId, NegotiationError> {
        highest_mutual_version(ours, theirs)
            .cloned()
            .ok_or(NegotiationError::NoMutualVersion)
    }

    /// `GET versions_url`
    pub async fn fetch_versions(
        &self,
        versions_url: &str,
        token: &AccessToken,
    ) -> Result<Vec<Version>, NegotiationError> {
        let versions: Vec<Version> = self.get_data(versions_url, token).await?;
        debug!(
            "Negotiator: {} offers {} versions",
            versions_url,
            versions.len()
        );
        Ok(versions)
    }

    /// `GET version_url`
    pub async fn fetch_version_detail(
        &self,
        version_url: &str,
        token: &AccessToken,
    ) -> Result<VersionDetail, NegotiationError> {
        self.get_data(version_url, token).await
    }

    /// Detail of `version` at a peer, served from cache when possible
    pub async fn version_detail(
        &self,
        versions_url: &str,
        version: &VersionId,
        token: &AccessToken,
    ) -> Result<VersionDetail, NegotiationError> {
        let key = (versions_url.to_string(), version.clone());
        let cached = self.details.read().get(&key).cloned();
        if let Some(detail) = cached {
            return Ok(detail);
        }

        let versions = self.fetch_versions(versions_url, token).await?;
        let version_url = versions
            .iter()
            .find(|v| &v.version == version)
            .map(|v| v.url.clone())
            .ok_or(NegotiationError::NoRemoteUrlAvailable)?;

        let detail = self.fetch_version_detail(&version_url, token).await?;
        self.details.write().insert(key, detail.clone());
        Ok(detail)
    }

    /// Fetch versions, select the highest mutual one and resolve its detail.
    /// Drops anything cached for `versions_url` first.
    pub async fn negotiate(
        &self,
        versions_url: &str,
        token: &AccessToken,
        ours: &[VersionId],
    ) -> Result<Negotiated, NegotiationError> {
        self.invalidate(versions_url);

        let versions = self.fetch_versions(versions_url, token).await?;
        let version_ids: Vec<VersionId> = versions.iter().map(|v| v.version.clone()).collect();
        let selected = Self::select_version(ours, &version_ids)?;

        let version_url = versions
            .iter()
            .find(|v| v.version == selected)
            .map(|v| v.url.clone())
            .ok_or(NegotiationError::NoRemoteUrlAvailable)?;

        let detail = self.fetch_version_detail(&version_url, token).await?;
        if detail.version != selected {
            warn!(
                "Negotiator: {} describes version {} instead of {}",
                version_url, detail.version, selected
            );
        }

        self.details
            .write()
            .insert((versions_url.to_string(), selected.clone()), detail.clone());
        info!("Negotiator: Selected OCPI {} at {}", selected, versions_url);

        Ok(Negotiated {
            version_ids,
            selected,
            detail,
        })
    }

    /// URL of `module` under the selected version of `remote`.
    ///
    /// A missing selected version or module is a local failure; transport
    /// and status errors from fetching the version detail pass through.
    pub async fn resolve_module_url(
        &self,
        remote: &RemoteAccessInfo,
        module: &ModuleId,
    ) -> Result<String, NegotiationError> {
        let version = remote
            .selected_version
            .as_ref()
            .ok_or(NegotiationError::NoVersionSelected)?;

        let detail = match self
            .version_detail(&remote.versions_url, version, &remote.token)
            .await
        {
            Ok(detail) => detail,
            Err(e) => {
                warn!(
                    "Negotiator: Cannot resolve OCPI {} at {}: {}",
                    version, remote.versions_url, e
                );
                return Err(e);
            }
        };

        detail
            .module_url(module)
            .map(str::to_string)
            .ok_or(NegotiationError::NoRemoteUrlAvailable)
    }

    /// Forget cached details of one peer
    pub fn invalidate(&self, versions_url: &str) {
        self.details
            .write()
            .retain(|(url, _), _| url != versions_url);
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &AccessToken,
    ) -> Result<T, NegotiationError> {
        let ids = RequestIds::generate();
        debug!("Negotiator: GET {} (request {})", url, ids.request_id);

        let response = self
            .http
            .get(url)
            .header(headers::AUTHORIZATION, headers::authorization(token))
            .header(headers::X_REQUEST_ID, ids.request_id.as_str())
            .header(headers::X_CORRELATION_ID, ids.correlation_id.as_str())
            .send()
            .await
            .map_err(|e| NegotiationError::from_reqwest(url, e))?;

        let http_status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| NegotiationError::from_reqwest(url, e))?;

        if !http_status.is_success() {
            let status_code = serde_json::from_slice::<OcpiResponse<serde_json::Value>>(&body)
                .ok()
                .map(|envelope| envelope.status_code);
            return Err(NegotiationError::Status {
                url: url.to_string(),
                http_status: http_status.as_u16(),
                status_code,
            });
        }

        let envelope: OcpiResponse<T> =
            serde_json::from_slice(&body).map_err(|e| NegotiationError::Malformed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !envelope.is_success() {
            return Err(NegotiationError::Status {
                url: url.to_string(),
                http_status: http_status.as_u16(),
                status_code: Some(envelope.status_code),
            });
        }

        envelope.data.ok_or_else(|| NegotiationError::Malformed {
            url: url.to_string(),
            reason: "response carries no data".to_string(),
        })
    }
}
