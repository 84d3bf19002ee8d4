//! HTTP server surface
//!
//! - `versions`: `/versions` and version details
//! - `credentials`: the credentials exchange, server side
//! - `receivers`: locations, sessions, tariffs and CDRs pushed to us
//!
//! Every request runs in a `tracing` span carrying its request and
//! correlation ids, which are echoed on the response.

mod credentials;
mod receivers;
mod versions;

use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde::de::DeserializeOwned;
use tracing::{info_span, Instrument};

use ocpi_core::{Authorized, CountryCode, PartyId, VersionId};

use crate::envelope::ApiError;
use crate::headers::{self, RequestIds};
use crate::node::NodeState;
use ocpi_core::resources::{Cdr, Location, Session, Tariff};

/// Router with every OCPI endpoint of this node
pub fn router(state: NodeState) -> Router {
    Router::new()
        .route("/versions", get(versions::get_versions))
        .route("/{version}", get(versions::get_version_details))
        .route(
            "/{version}/credentials",
            get(credentials::get_credentials)
                .post(credentials::post_credentials)
                .put(credentials::put_credentials)
                .delete(credentials::delete_credentials),
        )
        .route(
            "/{version}/locations/{country_code}/{party_id}/{location_id}",
            get(receivers::get_object::<Location>)
                .put(receivers::put_object::<Location>)
                .patch(receivers::patch_object::<Location>),
        )
        .route(
            "/{version}/locations/{country_code}/{party_id}/{location_id}/{evse_uid}",
            get(receivers::get_evse)
                .put(receivers::put_evse)
                .patch(receivers::patch_evse),
        )
        .route(
            "/{version}/locations/{country_code}/{party_id}/{location_id}/{evse_uid}/{connector_id}",
            get(receivers::get_connector)
                .put(receivers::put_connector)
                .patch(receivers::patch_connector),
        )
        .route(
            "/{version}/sessions/{country_code}/{party_id}/{session_id}",
            get(receivers::get_object::<Session>)
                .put(receivers::put_object::<Session>)
                .patch(receivers::patch_object::<Session>),
        )
        .route(
            "/{version}/tariffs/{country_code}/{party_id}/{tariff_id}",
            get(receivers::get_object::<Tariff>)
                .put(receivers::put_object::<Tariff>)
                .patch(receivers::patch_object::<Tariff>)
                .delete(receivers::delete_object::<Tariff>),
        )
        .route(
            "/{version}/cdrs/{country_code}/{party_id}/{cdr_id}",
            get(receivers::get_object::<Cdr>)
                .put(receivers::put_object::<Cdr>)
                .patch(receivers::patch_object::<Cdr>),
        )
        .layer(middleware::from_fn(request_context))
        .with_state(state)
}

/// Span per request; echoes (or assigns) request and correlation ids
async fn request_context(request: Request, next: Next) -> Response {
    let ids = RequestIds::from_headers(request.headers());
    let span = info_span!(
        "ocpi.request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %ids.request_id,
        correlation_id = %ids.correlation_id,
    );

    let mut response = next.run(request).instrument(span).await;

    let response_headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&ids.request_id) {
        response_headers.insert(headers::X_REQUEST_ID, value);
    }
    if let Ok(value) = HeaderValue::from_str(&ids.correlation_id) {
        response_headers.insert(headers::X_CORRELATION_ID, value);
    }
    response
}

// ============================================================================
// Guards shared by the handlers
// ============================================================================

/// Caller behind the `Authorization` header (403 when unknown or blocked)
pub(crate) fn authenticate(
    state: &NodeState,
    request_headers: &HeaderMap,
) -> Result<Authorized, ApiError> {
    let header = request_headers
        .get(headers::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    Ok(state.authenticator.authenticate_header(header).into_result()?)
}

/// Version from the path, if we offer it (404 otherwise)
pub(crate) fn check_version(state: &NodeState, version: &str) -> Result<VersionId, ApiError> {
    let version = VersionId::new(version);
    if state.config.supports(&version) {
        Ok(version)
    } else {
        Err(ApiError::unknown_version())
    }
}

/// Guard of module calls: authenticated, registered, known version, and the
/// path party must be the caller
pub(crate) fn authorize_module(
    state: &NodeState,
    request_headers: &HeaderMap,
    version: &str,
    country_code: &CountryCode,
    party_id: &PartyId,
) -> Result<Authorized, ApiError> {
    let authorized = authenticate(state, request_headers)?;
    authorized.require_registered()?;
    check_version(state, version)?;

    if !authorized.party.identity.matches(country_code, party_id) {
        tracing::warn!(
            "Server: {} tried to access objects of {}*{}",
            authorized.party.identity,
            country_code,
            party_id
        );
        return Err(ApiError::forbidden(
            "Access to objects of other parties is not allowed!",
        ));
    }
    Ok(authorized)
}

/// Parse a JSON body; 400/2001 on failure
pub(crate) fn parse_body<T: DeserializeOwned>(body: &[u8], what: &str) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Server: Cannot parse {}: {}", what, e);
        ApiError::bad_request(format!("Could not parse the given {} JSON!", what))
    })
}
