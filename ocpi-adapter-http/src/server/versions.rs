//! `/versions` and version detail endpoints

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use tracing::debug;

use ocpi_core::{Endpoint, ModuleId, Version, VersionDetail};

use super::{authenticate, check_version};
use crate::envelope::{ok, ApiError};
use crate::node::NodeState;

/// Modules this node serves under every version
const MODULES: [ModuleId; 5] = [
    ModuleId::Credentials,
    ModuleId::Locations,
    ModuleId::Sessions,
    ModuleId::Tariffs,
    ModuleId::Cdrs,
];

pub(crate) async fn get_versions(
    State(state): State<NodeState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = authenticate(&state, &headers)?;
    debug!("Server: Versions requested by {}", caller.party.identity);

    let mut versions: Vec<Version> = state
        .config
        .versions
        .iter()
        .map(|version| Version {
            version: version.clone(),
            url: state.config.version_url(version),
        })
        .collect();
    versions.sort_by(|a, b| a.version.cmp(&b.version));

    Ok(ok(versions))
}

pub(crate) async fn get_version_details(
    State(state): State<NodeState>,
    Path(version): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    authenticate(&state, &headers)?;
    let version = check_version(&state, &version)?;

    let endpoints = MODULES
        .iter()
        .map(|module| Endpoint {
            identifier: module.clone(),
            url: state.config.module_url(&version, module),
        })
        .collect();

    Ok(ok(VersionDetail { version, endpoints }))
}
