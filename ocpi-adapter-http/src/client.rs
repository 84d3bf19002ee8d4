//! OCPI client bound to one remote party
//!
//! Drives the credentials exchange from our side. Every call returns a
//! `ClientResponse` and never panics or throws: local failures (nothing was
//! sent) carry no HTTP status and status code `-1`.
//!
//! Registration:
//! 1. negotiate the highest mutual version with the peer
//! 2. pre-register a fresh token so the peer can call us back
//! 3. `POST` our credentials, authorized with the peer's current token
//! 4. on success replace the peer record in one registry swap; on failure
//!    roll the pre-registered token back. A swap that fails after the peer
//!    accepted is reported as a local failure with the peer's HTTP status.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use ocpi_core::{
    AccessInfo, AccessToken, Credentials, ModuleId, PartyIdentity, RemoteAccessInfo, RemoteParty,
    Version, VersionDetail,
};

use crate::envelope::{status, OcpiResponse};
use crate::headers::{self, RequestIds};
use crate::negotiator::{NegotiationError, VersionNegotiator};
use crate::node::NodeState;

/// Result of one client call
#[derive(Debug, Clone, PartialEq)]
pub struct ClientResponse<T> {
    /// `None` when no request was sent or no response arrived
    pub http_status: Option<u16>,
    pub status_code: i32,
    pub status_message: String,
    pub data: Option<T>,
    pub request_id: String,
    pub correlation_id: String,
}

impl<T> ClientResponse<T> {
    /// Failure detected before anything was sent
    pub fn local_failure(message: impl Into<String>, ids: RequestIds) -> Self {
        Self {
            http_status: None,
            status_code: status::LOCAL_FAILURE,
            status_message: message.into(),
            data: None,
            request_id: ids.request_id,
            correlation_id: ids.correlation_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.http_status, Some(code) if (200..300).contains(&code))
            && self.status_code == status::SUCCESS
    }

    pub fn is_local_failure(&self) -> bool {
        self.http_status.is_none()
    }
}

/// Outbound OCPI calls to one remote party
pub struct OcpiClient {
    state: NodeState,
    remote: PartyIdentity,
}

impl OcpiClient {
    pub fn new(state: NodeState, remote: PartyIdentity) -> Self {
        Self { state, remote }
    }

    pub fn remote(&self) -> &PartyIdentity {
        &self.remote
    }

    fn negotiator(&self) -> &Arc<VersionNegotiator> {
        &self.state.negotiator
    }

    fn party(&self) -> Option<Arc<RemoteParty>> {
        self.state.registry.lookup_by_identity(&self.remote)
    }

    /// Current endpoint of the peer, or a local failure
    fn remote_access(&self, ids: &RequestIds) -> Result<RemoteAccessInfo, RequestIds> {
        match self.party().and_then(|party| party.remote_access().cloned()) {
            Some(remote) => Ok(remote),
            None => {
                debug!("Client: No remote access info for {}", self.remote);
                Err(ids.clone())
            }
        }
    }

    /// `GET` the peer's `/versions`
    pub async fn get_versions(&self) -> ClientResponse<Vec<Version>> {
        let ids = RequestIds::generate();
        let remote = match self.remote_access(&ids) {
            Ok(remote) => remote,
            Err(ids) => return no_remote_url(ids),
        };
        self.call::<(), _>(Method::GET, &remote.versions_url, &remote.token, None, ids)
            .await
    }

    /// `GET` the detail of the selected version
    pub async fn get_version_details(&self) -> ClientResponse<VersionDetail> {
        let ids = RequestIds::generate();
        let remote = match self.remote_access(&ids) {
            Ok(remote) => remote,
            Err(ids) => return no_remote_url(ids),
        };
        let Some(version) = remote.selected_version.clone() else {
            return ClientResponse::local_failure(NegotiationError::NoVersionSelected.to_string(), ids);
        };

        let version_url = match self
            .negotiator()
            .fetch_versions(&remote.versions_url, &remote.token)
            .await
        {
            Ok(versions) => versions.into_iter().find(|v| v.version == version).map(|v| v.url),
            Err(e) => {
                warn!("Client: Cannot list versions of {}: {}", self.remote, e);
                None
            }
        };
        let Some(version_url) = version_url else {
            return no_remote_url(ids);
        };

        self.call::<(), _>(Method::GET, &version_url, &remote.token, None, ids)
            .await
    }

    /// `GET` the peer's credentials
    pub async fn get_credentials(&self) -> ClientResponse<Credentials> {
        let ids = RequestIds::generate();
        let (remote, url) = match self.credentials_endpoint(&ids).await {
            Ok(endpoint) => endpoint,
            Err(response) => return response,
        };
        self.call::<(), _>(Method::GET, &url, &remote.token, None, ids)
            .await
    }

    /// Register with the peer (`POST`); repeated calls rotate tokens
    pub async fn register(&self) -> ClientResponse<Credentials> {
        self.exchange(Method::POST).await
    }

    /// Update our credentials at the peer (`PUT`); rotates tokens
    pub async fn put_credentials(&self) -> ClientResponse<Credentials> {
        self.exchange(Method::PUT).await
    }

    /// Unregister from the peer (`DELETE`)
    pub async fn unregister(&self) -> ClientResponse<()> {
        let ids = RequestIds::generate();
        let (remote, url) = match self.credentials_endpoint(&ids).await {
            Ok(endpoint) => endpoint,
            Err(response) => return response,
        };

        let response: ClientResponse<()> = self
            .call::<(), _>(Method::DELETE, &url, &remote.token, None, ids)
            .await;

        if response.is_success() {
            let result = self.state.registry.update(&self.remote, |party| {
                let kept = party
                    .access_infos
                    .iter()
                    .filter(|info| !info.registered)
                    .cloned()
                    .collect();
                party.with_access_infos(kept).with_remote_access_infos(Vec::new())
            });
            match result {
                Ok(_) => info!("Client: Unregistered from {}", self.remote),
                Err(e) => warn!("Client: Unregistered from {} but registry update failed: {}", self.remote, e),
            }
        }
        response
    }

    /// Resolve the peer's credentials URL under the selected version
    async fn credentials_endpoint<T>(
        &self,
        ids: &RequestIds,
    ) -> Result<(RemoteAccessInfo, String), ClientResponse<T>> {
        let remote = self
            .remote_access(ids)
            .map_err(no_remote_url)?;

        match self
            .negotiator()
            .resolve_module_url(&remote, &ModuleId::Credentials)
            .await
        {
            Ok(url) => Ok((remote, url)),
            Err(e) => {
                debug!("Client: Cannot resolve credentials of {}: {}", self.remote, e);
                Err(resolution_failure(e, ids.clone()))
            }
        }
    }

    async fn exchange(&self, method: Method) -> ClientResponse<Credentials> {
        let ids = RequestIds::generate();
        let remote = match self.remote_access(&ids) {
            Ok(remote) => remote,
            Err(ids) => return no_remote_url(ids),
        };

        let negotiated = match self
            .negotiator()
            .negotiate(&remote.versions_url, &remote.token, &self.state.config.versions)
            .await
        {
            Ok(negotiated) => negotiated,
            Err(e) => {
                warn!("Client: Version negotiation with {} failed: {}", self.remote, e);
                return ClientResponse::local_failure(e.to_string(), ids);
            }
        };
        let Some(url) = negotiated
            .detail
            .module_url(&ModuleId::Credentials)
            .map(str::to_string)
        else {
            return no_remote_url(ids);
        };

        let token = self.state.config.generate_token();
        if let Err(e) = self.state.registry.update(&self.remote, |party| {
            party.with_additional_access(AccessInfo::bootstrap(token.clone()))
        }) {
            warn!("Client: Cannot pre-register token for {}: {}", self.remote, e);
            return ClientResponse::local_failure(e.to_string(), ids);
        }

        let credentials = self.state.config.credentials(token.clone());
        info!(
            "Client: {} credentials to {} at {} (OCPI {})",
            method, self.remote, url, negotiated.selected
        );
        let response: ClientResponse<Credentials> = self
            .call(method, &url, &remote.token, Some(&credentials), ids)
            .await;

        let theirs = match (&response.data, response.is_success()) {
            (Some(theirs), true) => theirs.clone(),
            _ => {
                warn!(
                    "Client: Registration with {} failed: {} {}",
                    self.remote, response.status_code, response.status_message
                );
                self.roll_back(&token);
                return response;
            }
        };

        let replaced = self.state.registry.update(&self.remote, |party| {
            party
                .with_access_infos(vec![AccessInfo::registered(token.clone())])
                .with_remote_access_infos(vec![RemoteAccessInfo::new(
                    theirs.token.clone(),
                    theirs.url.clone(),
                )
                .with_versions(negotiated.version_ids.clone())
                .with_selected_version(negotiated.selected.clone())])
                .with_business_details(theirs.business_details.clone())
        });

        match replaced {
            Ok(_) => {
                info!(
                    "Client: Registered with {}, new remote token {}",
                    self.remote,
                    theirs.token.redacted()
                );
                response
            }
            Err(e) => {
                warn!("Client: Registered with {} but registry update failed: {}", self.remote, e);
                self.roll_back(&token);
                ClientResponse {
                    status_code: status::LOCAL_FAILURE,
                    status_message: e.to_string(),
                    data: None,
                    ..response
                }
            }
        }
    }

    fn roll_back(&self, token: &AccessToken) {
        let result = self
            .state
            .registry
            .update(&self.remote, |party| party.without_token(token.as_str()));
        if let Err(e) = result {
            warn!("Client: Cannot roll back token for {}: {}", self.remote, e);
        }
    }

    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        token: &AccessToken,
        body: Option<&B>,
        ids: RequestIds,
    ) -> ClientResponse<T> {
        debug!("Client: {} {} (request {})", method, url, ids.request_id);

        let mut request = self
            .negotiator()
            .http()
            .request(method, url)
            .header(headers::AUTHORIZATION, headers::authorization(token))
            .header(headers::X_REQUEST_ID, ids.request_id.as_str())
            .header(headers::X_CORRELATION_ID, ids.correlation_id.as_str());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = NegotiationError::from_reqwest(url, e);
                warn!("Client: {}", err);
                return ClientResponse::local_failure(err.to_string(), ids);
            }
        };

        let http_status = response.status().as_u16();
        let envelope = match response.bytes().await {
            Ok(body) => serde_json::from_slice::<OcpiResponse<T>>(&body).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match envelope {
            Ok(envelope) => ClientResponse {
                http_status: Some(http_status),
                status_code: envelope.status_code,
                status_message: envelope.status_message.unwrap_or_default(),
                data: envelope.data,
                request_id: ids.request_id,
                correlation_id: ids.correlation_id,
            },
            Err(reason) => ClientResponse {
                http_status: Some(http_status),
                status_code: status::LOCAL_FAILURE,
                status_message: format!("Malformed response: {}", reason),
                data: None,
                request_id: ids.request_id,
                correlation_id: ids.correlation_id,
            },
        }
    }
}

fn no_remote_url<T>(ids: RequestIds) -> ClientResponse<T> {
    ClientResponse::local_failure(NegotiationError::NoRemoteUrlAvailable.to_string(), ids)
}

/// Endpoint resolution failure; keeps the peer's status when it answered
fn resolution_failure<T>(err: NegotiationError, ids: RequestIds) -> ClientResponse<T> {
    match &err {
        NegotiationError::Status {
            http_status,
            status_code,
            ..
        } => ClientResponse {
            http_status: Some(*http_status),
            status_code: status_code.unwrap_or(status::LOCAL_FAILURE),
            status_message: err.to_string(),
            data: None,
            request_id: ids.request_id,
            correlation_id: ids.correlation_id,
        },
        _ => ClientResponse::local_failure(err.to_string(), ids),
    }
}
