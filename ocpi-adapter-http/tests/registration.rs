//! Two nodes on loopback running the full credentials handshake

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use ocpi_adapter_http::{NodeConfig, OcpiNode};
use ocpi_core::{
    AccessInfo, AccessStatus, AccessToken, BusinessDetails, PartyIdentity, PartyStatus,
    RemoteAccessInfo, RemotePartyRegistry, Role, VersionId,
};

const CPO_BOOTSTRAP: &str = "cpo-calls-emsp-with-this";
const EMSP_BOOTSTRAP: &str = "emsp-calls-cpo-with-this";

fn cpo() -> PartyIdentity {
    PartyIdentity::new("DE", "GEF", Role::Cpo)
}

fn emsp() -> PartyIdentity {
    PartyIdentity::new("DE", "EMP", Role::Emsp)
}

async fn bind() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

fn start(node: OcpiNode, listener: TcpListener) -> Arc<OcpiNode> {
    let node = Arc::new(node);
    let serving = node.clone();
    tokio::spawn(async move {
        let _ = serving.serve(listener, std::future::pending()).await;
    });
    node
}

/// CPO and EMSP nodes that know each other's `/versions` and a bootstrap token
async fn federation(cpo_config: impl FnOnce(NodeConfig) -> NodeConfig) -> (Arc<OcpiNode>, Arc<OcpiNode>) {
    let (cpo_listener, cpo_addr) = bind().await;
    let (emsp_listener, emsp_addr) = bind().await;

    let cpo_node = OcpiNode::new(cpo_config(
        NodeConfig::new("DE", "GEF", Role::Cpo, "GraphDefined CPO")
            .with_base_url(format!("http://{}", cpo_addr)),
    ))
    .unwrap();
    let emsp_node = OcpiNode::new(
        NodeConfig::new("DE", "EMP", Role::Emsp, "GraphDefined EMSP")
            .with_base_url(format!("http://{}", emsp_addr))
            .with_versions(vec![VersionId::new("2.2.1")]),
    )
    .unwrap();

    cpo_node
        .registry()
        .add_party(
            emsp(),
            BusinessDetails::new("EMSP"),
            vec![AccessInfo::bootstrap(AccessToken::new(EMSP_BOOTSTRAP))],
            vec![RemoteAccessInfo::new(
                AccessToken::new(CPO_BOOTSTRAP),
                emsp_node.config().versions_url(),
            )],
            PartyStatus::Enabled,
        )
        .unwrap();
    emsp_node
        .registry()
        .add_party(
            cpo(),
            BusinessDetails::new("CPO"),
            vec![AccessInfo::bootstrap(AccessToken::new(CPO_BOOTSTRAP))],
            vec![],
            PartyStatus::Enabled,
        )
        .unwrap();

    (start(cpo_node, cpo_listener), start(emsp_node, emsp_listener))
}

/// Token the peer uses to call the node owning `registry`
fn incoming_token(registry: &RemotePartyRegistry, peer: &PartyIdentity) -> AccessToken {
    let party = registry.lookup_by_identity(peer).unwrap();
    assert_eq!(party.access_infos.len(), 1);
    assert!(party.access_infos[0].registered);
    party.access_infos[0].token.clone()
}

/// Token the node owning `registry` uses to call the peer
fn outgoing_token(registry: &RemotePartyRegistry, peer: &PartyIdentity) -> AccessToken {
    let party = registry.lookup_by_identity(peer).unwrap();
    assert_eq!(party.remote_access_infos.len(), 1);
    party.remote_access_infos[0].token.clone()
}

#[tokio::test]
async fn test_register_and_rotate() {
    let (cpo_node, emsp_node) = federation(|config| config).await;
    let client = cpo_node.client(emsp());

    let response = client.register().await;
    assert!(response.is_success(), "{:?}", response);
    assert_eq!(response.http_status, Some(200));
    let theirs = response.data.unwrap();
    assert_eq!(theirs.country_code.as_str(), "DE");
    assert_eq!(theirs.party_id.as_str(), "EMP");
    assert_eq!(theirs.url, emsp_node.config().versions_url());

    // Both sides agree on the tokens and the bootstrap tokens are gone
    let emsp_calls_cpo = incoming_token(cpo_node.registry(), &emsp());
    let cpo_calls_emsp = outgoing_token(cpo_node.registry(), &emsp());
    assert_eq!(theirs.token, cpo_calls_emsp);
    assert_eq!(incoming_token(emsp_node.registry(), &cpo()), cpo_calls_emsp);
    assert_eq!(outgoing_token(emsp_node.registry(), &cpo()), emsp_calls_cpo);
    assert_ne!(emsp_calls_cpo.as_str(), EMSP_BOOTSTRAP);
    assert_ne!(cpo_calls_emsp.as_str(), CPO_BOOTSTRAP);

    let party = cpo_node.registry().lookup_by_identity(&emsp()).unwrap();
    assert_eq!(party.business_details.name, "GraphDefined EMSP");
    assert_eq!(
        party.remote_access_infos[0].selected_version,
        Some(VersionId::new("2.2.1"))
    );

    // Registering again rotates every token
    let response = client.register().await;
    assert!(response.is_success(), "{:?}", response);
    assert_ne!(incoming_token(cpo_node.registry(), &emsp()), emsp_calls_cpo);
    assert_ne!(outgoing_token(cpo_node.registry(), &emsp()), cpo_calls_emsp);
    assert_eq!(
        incoming_token(emsp_node.registry(), &cpo()),
        outgoing_token(cpo_node.registry(), &emsp())
    );

    // So does a credentials update
    let before = outgoing_token(cpo_node.registry(), &emsp());
    let response = client.put_credentials().await;
    assert!(response.is_success(), "{:?}", response);
    assert_ne!(outgoing_token(cpo_node.registry(), &emsp()), before);
}

#[tokio::test]
async fn test_get_credentials_after_register() {
    let (cpo_node, emsp_node) = federation(|config| config).await;
    assert!(cpo_node.client(emsp()).register().await.is_success());

    let response = cpo_node.client(emsp()).get_credentials().await;
    assert!(response.is_success(), "{:?}", response);
    let theirs = response.data.unwrap();
    assert_eq!(theirs.token, outgoing_token(cpo_node.registry(), &emsp()));
    assert_eq!(theirs.business_details.name, "GraphDefined EMSP");

    let response = emsp_node.client(cpo()).get_credentials().await;
    assert!(response.is_success(), "{:?}", response);
    assert_eq!(response.data.unwrap().party_id.as_str(), "GEF");
}

#[tokio::test]
async fn test_blocked_token_is_rejected() {
    let (cpo_node, emsp_node) = federation(|config| config).await;
    assert!(cpo_node.client(emsp()).register().await.is_success());

    let emsp_calls_cpo = incoming_token(cpo_node.registry(), &emsp());
    cpo_node
        .registry()
        .set_access_status(emsp_calls_cpo.as_str(), AccessStatus::Blocked)
        .unwrap();

    let response = emsp_node.client(cpo()).get_credentials().await;
    assert_eq!(response.http_status, Some(403));
    assert_eq!(response.status_code, 2000);
    assert!(!response.is_success());
    assert!(!response.is_local_failure());
}

#[tokio::test]
async fn test_unregister() {
    let (cpo_node, emsp_node) = federation(|config| config).await;
    let client = cpo_node.client(emsp());
    assert!(client.register().await.is_success());

    let response = client.unregister().await;
    assert!(response.is_success(), "{:?}", response);

    let on_emsp = emsp_node.registry().lookup_by_identity(&cpo()).unwrap();
    assert!(on_emsp.access_infos.is_empty());
    assert!(on_emsp.remote_access_infos.is_empty());

    let on_cpo = cpo_node.registry().lookup_by_identity(&emsp()).unwrap();
    assert!(on_cpo.access_infos.is_empty());
    assert!(on_cpo.remote_access_infos.is_empty());

    let response = client.put_credentials().await;
    assert!(response.is_local_failure());
    assert_eq!(response.status_message, "No remote URL available!");
}

#[tokio::test]
async fn test_no_mutual_version() {
    let (cpo_node, emsp_node) =
        federation(|config| config.with_versions(vec![VersionId::new("2.1.1")])).await;

    let response = cpo_node.client(emsp()).register().await;
    assert!(response.is_local_failure());
    assert_eq!(response.status_message, "No mutual OCPI version found!");

    let on_emsp = emsp_node.registry().lookup_by_identity(&cpo()).unwrap();
    assert_eq!(on_emsp.access_infos[0].token.as_str(), CPO_BOOTSTRAP);
    assert!(!on_emsp.access_infos[0].registered);
}

#[tokio::test]
async fn test_registry_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("registry.log");

    let (cpo_node, _emsp_node) = federation(|config| config.with_registry_log(&log)).await;
    assert!(cpo_node.client(emsp()).register().await.is_success());
    let emsp_calls_cpo = incoming_token(cpo_node.registry(), &emsp());
    let cpo_calls_emsp = outgoing_token(cpo_node.registry(), &emsp());

    let restarted = OcpiNode::new(
        NodeConfig::new("DE", "GEF", Role::Cpo, "GraphDefined CPO").with_registry_log(&log),
    )
    .unwrap();
    assert_eq!(incoming_token(restarted.registry(), &emsp()), emsp_calls_cpo);
    assert_eq!(outgoing_token(restarted.registry(), &emsp()), cpo_calls_emsp);
}
