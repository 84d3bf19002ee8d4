//! Receiver endpoints for objects other parties push to us
//!
//! Locations, sessions, tariffs and CDRs share one set of generic handlers
//! keyed by `/{country_code}/{party_id}/{id}`. EVSEs and connectors live
//! inside their location and are updated through it.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;
use tracing::info;

use ocpi_core::resources::{
    Cdr, Connector, Evse, Location, PartyResource, ResourceKey, Session, Tariff,
};
use ocpi_core::{CountryCode, PartyId, Patchable};

use super::{authorize_module, parse_body};
use crate::envelope::{ok, stored, ApiError, OcpiResponse};
use crate::node::NodeState;
use crate::store::ResourceStore;

/// A party resource with a store on the node
pub(crate) trait Receiver: PartyResource + Send + Sync + 'static {
    fn store(state: &NodeState) -> &ResourceStore<Self>;
}

impl Receiver for Location {
    fn store(state: &NodeState) -> &ResourceStore<Self> {
        &state.locations
    }
}

impl Receiver for Session {
    fn store(state: &NodeState) -> &ResourceStore<Self> {
        &state.sessions
    }
}

impl Receiver for Tariff {
    fn store(state: &NodeState) -> &ResourceStore<Self> {
        &state.tariffs
    }
}

impl Receiver for Cdr {
    fn store(state: &NodeState) -> &ResourceStore<Self> {
        &state.cdrs
    }
}

type ObjectPath = Path<(String, String, String, String)>;

/// Guard the call and build the key of the addressed object
fn object_key(
    state: &NodeState,
    headers: &HeaderMap,
    version: &str,
    country_code: &str,
    party_id: &str,
    id: &str,
) -> Result<ResourceKey, ApiError> {
    let country_code = CountryCode::new(country_code);
    let party_id = PartyId::new(party_id);
    authorize_module(state, headers, version, &country_code, &party_id)?;
    Ok(ResourceKey::new(country_code, party_id, id))
}

fn unknown<T: PartyResource>() -> ApiError {
    ApiError::unknown_object(format!("Unknown {}!", T::KIND))
}

fn mismatch(kind: &str) -> ApiError {
    ApiError::bad_request(format!("The {} identification does not match the URL!", kind))
}

fn patch_body(body: &[u8], kind: &str) -> Result<Value, ApiError> {
    parse_body(body, &format!("{} patch", kind))
}

// ============================================================================
// Top-level objects
// ============================================================================

pub(crate) async fn get_object<T: Receiver>(
    State(state): State<NodeState>,
    Path((version, country_code, party_id, id)): ObjectPath,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let key = object_key(&state, &headers, &version, &country_code, &party_id, &id)?;
    let object = T::store(&state).get(&key).ok_or_else(unknown::<T>)?;
    Ok(ok(object))
}

pub(crate) async fn put_object<T: Receiver>(
    State(state): State<NodeState>,
    Path((version, country_code, party_id, id)): ObjectPath,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let key = object_key(&state, &headers, &version, &country_code, &party_id, &id)?;
    let object: T = parse_body(&body, T::KIND)?;
    if object.key() != key {
        return Err(mismatch(T::KIND));
    }

    let created = T::store(&state).put(object.clone());
    info!("Receiver: {} {} {}", if created { "Created" } else { "Updated" }, T::KIND, key);
    Ok(stored(object, created))
}

pub(crate) async fn patch_object<T: Receiver>(
    State(state): State<NodeState>,
    Path((version, country_code, party_id, id)): ObjectPath,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let key = object_key(&state, &headers, &version, &country_code, &party_id, &id)?;
    let patch = patch_body(&body, T::KIND)?;

    let patched = T::store(&state).modify(&key, |current| {
        let current = current.ok_or_else(unknown::<T>)?;
        let patched = current.try_patch(&patch).into_result()?;
        Ok::<_, ApiError>((patched.clone(), patched))
    })?;

    info!("Receiver: Patched {} {}", T::KIND, key);
    Ok(ok(patched))
}

pub(crate) async fn delete_object<T: Receiver>(
    State(state): State<NodeState>,
    Path((version, country_code, party_id, id)): ObjectPath,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let key = object_key(&state, &headers, &version, &country_code, &party_id, &id)?;
    T::store(&state).remove(&key).ok_or_else(unknown::<T>)?;

    info!("Receiver: Deleted {} {}", T::KIND, key);
    Ok(Json(OcpiResponse::<()>::empty()))
}

// ============================================================================
// EVSEs
// ============================================================================

type EvsePath = Path<(String, String, String, String, String)>;

const EVSE: &str = "EVSE";
const CONNECTOR: &str = "connector";

fn unknown_evse() -> ApiError {
    ApiError::unknown_object("Unknown EVSE!")
}

fn unknown_connector() -> ApiError {
    ApiError::unknown_object("Unknown connector!")
}

pub(crate) async fn get_evse(
    State(state): State<NodeState>,
    Path((version, country_code, party_id, location_id, evse_uid)): EvsePath,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let key = object_key(&state, &headers, &version, &country_code, &party_id, &location_id)?;
    let location = state.locations.get(&key).ok_or_else(unknown::<Location>)?;
    let evse = location.evse(&evse_uid).cloned().ok_or_else(unknown_evse)?;
    Ok(ok(evse))
}

pub(crate) async fn put_evse(
    State(state): State<NodeState>,
    Path((version, country_code, party_id, location_id, evse_uid)): EvsePath,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let key = object_key(&state, &headers, &version, &country_code, &party_id, &location_id)?;
    let evse: Evse = parse_body(&body, EVSE)?;
    if evse.uid != evse_uid {
        return Err(mismatch(EVSE));
    }

    let created = state.locations.modify(&key, |current| {
        let location = current.ok_or_else(unknown::<Location>)?;
        Ok::<_, ApiError>(location.with_evse(evse.clone()))
    })?;

    info!(
        "Receiver: {} EVSE {} of location {}",
        if created { "Created" } else { "Updated" },
        evse_uid,
        key
    );
    Ok(stored(evse, created))
}

pub(crate) async fn patch_evse(
    State(state): State<NodeState>,
    Path((version, country_code, party_id, location_id, evse_uid)): EvsePath,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let key = object_key(&state, &headers, &version, &country_code, &party_id, &location_id)?;
    let patch = patch_body(&body, EVSE)?;

    let patched = state.locations.modify(&key, |current| {
        let location = current.ok_or_else(unknown::<Location>)?;
        let evse = location.evse(&evse_uid).ok_or_else(unknown_evse)?;
        let patched = evse.try_patch(&patch).into_result()?;
        let (location, _) = location.with_evse(patched.clone());
        Ok::<_, ApiError>((location, patched))
    })?;

    info!("Receiver: Patched EVSE {} of location {}", evse_uid, key);
    Ok(ok(patched))
}

// ============================================================================
// Connectors
// ============================================================================

type ConnectorPath = Path<(String, String, String, String, String, String)>;

pub(crate) async fn get_connector(
    State(state): State<NodeState>,
    Path((version, country_code, party_id, location_id, evse_uid, connector_id)): ConnectorPath,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let key = object_key(&state, &headers, &version, &country_code, &party_id, &location_id)?;
    let location = state.locations.get(&key).ok_or_else(unknown::<Location>)?;
    let connector = location
        .evse(&evse_uid)
        .ok_or_else(unknown_evse)?
        .connector(&connector_id)
        .cloned()
        .ok_or_else(unknown_connector)?;
    Ok(ok(connector))
}

pub(crate) async fn put_connector(
    State(state): State<NodeState>,
    Path((version, country_code, party_id, location_id, evse_uid, connector_id)): ConnectorPath,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let key = object_key(&state, &headers, &version, &country_code, &party_id, &location_id)?;
    let connector: Connector = parse_body(&body, CONNECTOR)?;
    if connector.id != connector_id {
        return Err(mismatch(CONNECTOR));
    }

    let created = state.locations.modify(&key, |current| {
        let location = current.ok_or_else(unknown::<Location>)?;
        let evse = location.evse(&evse_uid).ok_or_else(unknown_evse)?;
        let (evse, created) = evse.with_connector(connector.clone());
        let (location, _) = location.with_evse(evse);
        Ok::<_, ApiError>((location, created))
    })?;

    info!(
        "Receiver: {} connector {} of EVSE {} at {}",
        if created { "Created" } else { "Updated" },
        connector_id,
        evse_uid,
        key
    );
    Ok(stored(connector, created))
}

pub(crate) async fn patch_connector(
    State(state): State<NodeState>,
    Path((version, country_code, party_id, location_id, evse_uid, connector_id)): ConnectorPath,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let key = object_key(&state, &headers, &version, &country_code, &party_id, &location_id)?;
    let patch = patch_body(&body, CONNECTOR)?;

    let patched = state.locations.modify(&key, |current| {
        let location = current.ok_or_else(unknown::<Location>)?;
        let evse = location.evse(&evse_uid).ok_or_else(unknown_evse)?;
        let connector = evse.connector(&connector_id).ok_or_else(unknown_connector)?;
        let patched = connector.try_patch(&patch).into_result()?;
        let (evse, _) = evse.with_connector(patched.clone());
        let (location, _) = location.with_evse(evse);
        Ok::<_, ApiError>((location, patched))
    })?;

    info!("Receiver: Patched connector {} of EVSE {} at {}", connector_id, evse_uid, key);
    Ok(ok(patched))
}
