//! OCPI Node - CLI for the OCPI federation adapter
//!
//! # Usage
//!
//! ```bash
//! # Seed the registry with a party we have a bootstrap token for
//! ocpi-node add-party --registry-log ./data/parties.log \
//!     --country-code DE --party-id EMP --role EMSP --name "EMSP" \
//!     --token their-bootstrap-token \
//!     --remote-token our-bootstrap-token \
//!     --remote-versions-url http://emsp.example/ocpi/versions
//!
//! # Serve, and register with DE*EMP once listening
//! ocpi-node serve --country-code DE --party-id GEF --role CPO \
//!     --base-url http://cpo.example/ocpi --bind 0.0.0.0:8080 \
//!     --registry-log ./data/parties.log --register DE*EMP
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use ocpi_adapter_http::{NodeConfig, OcpiNode};
use ocpi_core::{
    AccessInfo, AccessToken, BusinessDetails, CountryCode, FileSink, FileSinkConfig, PartyId,
    PartyIdentity, PartyStatus, RemoteAccessInfo, RemotePartyRegistry, Role, VersionId,
};

/// OCPI federation node
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the node's HTTP endpoints
    Serve(ServeArgs),
    /// Add a remote party to the registry log
    AddParty(AddPartyArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Our country code
    #[arg(long, default_value = "DE")]
    country_code: String,

    /// Our party id
    #[arg(long, default_value = "GEF")]
    party_id: String,

    /// Our role (CPO, EMSP)
    #[arg(long, default_value = "CPO")]
    role: Role,

    /// Business name sent in our credentials
    #[arg(long, default_value = "OCPI Node")]
    name: String,

    /// External base URL other parties reach us at
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    base_url: String,

    /// Listen address
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Supported OCPI versions (can be repeated)
    #[arg(long = "ocpi-version")]
    versions: Vec<String>,

    /// Registry log file; in-memory registry when omitted
    #[arg(long)]
    registry_log: Option<PathBuf>,

    /// Outbound request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Reject base64-encoded Authorization tokens
    #[arg(long)]
    no_base64: bool,

    /// Register with these parties once listening, as CC*PID (can be repeated)
    #[arg(long)]
    register: Vec<String>,
}

#[derive(Args, Debug)]
struct AddPartyArgs {
    /// Registry log file
    #[arg(long)]
    registry_log: PathBuf,

    #[arg(long)]
    country_code: String,

    #[arg(long)]
    party_id: String,

    /// Role of the party (CPO, EMSP)
    #[arg(long)]
    role: Role,

    /// Business name of the party
    #[arg(long)]
    name: String,

    /// Bootstrap token the party calls us with
    #[arg(long)]
    token: String,

    /// Token we call the party with
    #[arg(long, requires = "remote_versions_url")]
    remote_token: Option<String>,

    /// The party's /versions URL
    #[arg(long, requires = "remote_token")]
    remote_versions_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging
    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::AddParty(args) => add_party(args),
    }
}

async fn serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = NodeConfig::new(&args.country_code, &args.party_id, args.role, &args.name)
        .with_base_url(&args.base_url)
        .with_bind_addr(args.bind)
        .with_request_timeout(Duration::from_secs(args.timeout))
        .with_base64_tokens(!args.no_base64);
    if !args.versions.is_empty() {
        config = config.with_versions(args.versions.iter().map(VersionId::new).collect());
    }
    if let Some(path) = &args.registry_log {
        config = config.with_registry_log(path);
    }

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 OCPI Node - Federation Adapter               ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║  Party:    {:<50} ║", config.identity.to_string());
    println!("║  Base URL: {:<50} ║", truncate(&config.base_url, 50));
    println!("║  Bind:     {:<50} ║", config.bind_addr.to_string());
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let node = std::sync::Arc::new(OcpiNode::new(config)?);
    let listener = TcpListener::bind(args.bind).await?;

    let serving = node.clone();
    let server = tokio::spawn(async move {
        serving
            .serve(listener, async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
    });

    for target in &args.register {
        let Some(remote) = find_party(node.registry(), target) else {
            warn!("Unknown party {}, skipping registration", target);
            continue;
        };
        let response = node.client(remote.clone()).register().await;
        if response.is_success() {
            info!("Registered with {}", remote);
        } else {
            error!(
                "Registration with {} failed: {} {}",
                remote, response.status_code, response.status_message
            );
        }
    }

    server.await??;
    Ok(())
}

fn add_party(args: AddPartyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let sink = FileSink::open(FileSinkConfig {
        path: args.registry_log.clone(),
        ..Default::default()
    })?;
    let registry = RemotePartyRegistry::open(sink)?;

    let remote_access_infos = match (args.remote_token, args.remote_versions_url) {
        (Some(token), Some(url)) => vec![RemoteAccessInfo::new(AccessToken::new(token), url)],
        _ => vec![],
    };
    let identity = PartyIdentity::new(&args.country_code, &args.party_id, args.role);

    registry.add_party(
        identity.clone(),
        BusinessDetails::new(&args.name),
        vec![AccessInfo::bootstrap(AccessToken::new(args.token))],
        remote_access_infos,
        PartyStatus::Enabled,
    )?;

    info!("Added {} to {:?}", identity, args.registry_log);
    Ok(())
}

/// Party in `registry` matching `CC*PID`
fn find_party(registry: &RemotePartyRegistry, target: &str) -> Option<PartyIdentity> {
    let (country_code, party_id) = target.split_once('*')?;
    let country_code = CountryCode::new(country_code);
    let party_id = PartyId::new(party_id);
    registry
        .all()
        .into_iter()
        .map(|party| party.identity.clone())
        .find(|identity| identity.matches(&country_code, &party_id))
}

/// Truncate string with ellipsis
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
