//! Credentials exchange, server side
//!
//! `POST` registers the caller (or rotates its token when already
//! registered), `PUT` does the same but only for registered callers,
//! `DELETE` unregisters. Before touching the registry we call the caller
//! back with the token it posted; if that fails nothing changes.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use tracing::{info, warn};

use ocpi_core::{AccessInfo, Authorized, Credentials, RemoteAccessInfo};

use super::{authenticate, check_version, parse_body};
use crate::envelope::{ok, ApiError, OcpiResponse};
use crate::negotiator::NegotiationError;
use crate::node::NodeState;

/// Our credentials, carrying the token the caller used
pub(crate) async fn get_credentials(
    State(state): State<NodeState>,
    Path(version): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = authenticate(&state, &headers)?;
    check_version(&state, &version)?;

    Ok(ok(state.config.credentials(caller.access.token)))
}

pub(crate) async fn post_credentials(
    State(state): State<NodeState>,
    Path(version): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let caller = authenticate(&state, &headers)?;
    check_version(&state, &version)?;
    let credentials: Credentials = parse_body(&body, "credentials")?;

    Ok(ok(register_caller(&state, caller, credentials).await?))
}

pub(crate) async fn put_credentials(
    State(state): State<NodeState>,
    Path(version): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let caller = authenticate(&state, &headers)?;
    caller.require_registered()?;
    check_version(&state, &version)?;
    let credentials: Credentials = parse_body(&body, "credentials")?;

    Ok(ok(register_caller(&state, caller, credentials).await?))
}

pub(crate) async fn delete_credentials(
    State(state): State<NodeState>,
    Path(version): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = authenticate(&state, &headers)?;
    caller.require_registered()?;
    check_version(&state, &version)?;

    let token = caller.access.token;
    state
        .registry
        .update(&caller.party.identity, |party| {
            party
                .without_token(token.as_str())
                .with_remote_access_infos(Vec::new())
        })
        .map_err(ApiError::internal)?;

    info!("Server: Unregistered {}", caller.party.identity);
    Ok(axum::Json(OcpiResponse::<()>::empty()))
}

/// Call the caller back, then swap in fresh tokens on both sides
async fn register_caller(
    state: &NodeState,
    caller: Authorized,
    credentials: Credentials,
) -> Result<Credentials, ApiError> {
    let identity = &caller.party.identity;
    if !identity.matches(&credentials.country_code, &credentials.party_id) {
        warn!(
            "Server: {} posted credentials of {}*{}",
            identity, credentials.country_code, credentials.party_id
        );
        return Err(ApiError::bad_request(
            "The given credentials do not match the registered party!",
        ));
    }

    let negotiated = state
        .negotiator
        .negotiate(&credentials.url, &credentials.token, &state.config.versions)
        .await
        .map_err(|e| {
            warn!("Server: Callback to {} at {} failed: {}", identity, credentials.url, e);
            match e {
                NegotiationError::NoMutualVersion => ApiError::unsupported_version(),
                _ => ApiError::unable_to_use_client_api(),
            }
        })?;

    let token = state.config.generate_token();
    let remote = RemoteAccessInfo::new(credentials.token.clone(), credentials.url.clone())
        .with_versions(negotiated.version_ids)
        .with_selected_version(negotiated.selected.clone());

    state
        .registry
        .update(identity, |party| {
            party
                .with_access_infos(vec![AccessInfo::registered(token.clone())])
                .with_remote_access_infos(vec![remote])
                .with_business_details(credentials.business_details.clone())
        })
        .map_err(ApiError::internal)?;

    info!(
        "Server: Registered {} on OCPI {}, issued token {}",
        identity,
        negotiated.selected,
        token.redacted()
    );
    Ok(state.config.credentials(token))
}
