//! Remote party registry
//!
//! Process-wide store of known federation peers, keyed by `PartyIdentity`
//! with a secondary index from access token to party.
//!
//! Records are held as `Arc<RemoteParty>` and every mutation swaps in a
//! complete new record under a short write lock, so readers never see a
//! half-updated party. Mutations are serialised by a separate writer lock;
//! the persistence sink is written while only that lock is held, then the
//! record is swapped in. A failed write leaves the registry unchanged.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::party::{AccessInfo, RemoteAccessInfo, RemoteParty};
use crate::storage::{LogEntry, MemorySink, PersistenceSink};
use crate::types::*;

/// Registry failures
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Remote party {0} already exists")]
    DuplicateIdentity(PartyIdentity),

    #[error("Access token {0:?} is already in use")]
    DuplicateToken(AccessToken),

    #[error("Remote party {0} not found")]
    NotFound(PartyIdentity),

    #[error("Unknown access token")]
    UnknownToken,

    #[error("The identity of remote party {0} cannot be changed")]
    IdentityChanged(PartyIdentity),

    #[error("Registry persistence failed: {0}")]
    Persistence(#[from] io::Error),
}

#[derive(Default)]
struct RegistryState {
    parties: HashMap<PartyIdentity, Arc<RemoteParty>>,
    tokens: HashMap<AccessToken, PartyIdentity>,
}

impl RegistryState {
    /// Tokens of `party` already owned by someone other than `owner`
    fn conflicting_token(&self, party: &RemoteParty) -> Option<AccessToken> {
        let mut seen = HashSet::new();
        for token in party.tokens() {
            if !seen.insert(token) {
                return Some(token.clone());
            }
            if let Some(existing) = self.tokens.get(token) {
                if existing != &party.identity {
                    return Some(token.clone());
                }
            }
        }
        None
    }

    fn insert(&mut self, party: Arc<RemoteParty>) {
        self.drop_tokens(&party.identity);
        for token in party.tokens() {
            self.tokens.insert(token.clone(), party.identity.clone());
        }
        self.parties.insert(party.identity.clone(), party);
    }

    fn remove(&mut self, identity: &PartyIdentity) -> Option<Arc<RemoteParty>> {
        self.drop_tokens(identity);
        self.parties.remove(identity)
    }

    fn drop_tokens(&mut self, identity: &PartyIdentity) {
        if let Some(existing) = self.parties.get(identity) {
            for token in existing.tokens() {
                self.tokens.remove(token);
            }
        }
    }
}

/// Concurrency-safe store of remote parties
pub struct RemotePartyRegistry {
    state: RwLock<RegistryState>,
    /// Held across validate, append and swap
    writer: Mutex<()>,
    sink: Box<dyn PersistenceSink>,
}

impl RemotePartyRegistry {
    /// Empty registry writing to `sink`; nothing is replayed
    pub fn new(sink: impl PersistenceSink + 'static) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            writer: Mutex::new(()),
            sink: Box::new(sink),
        }
    }

    /// Empty registry backed by memory only
    pub fn in_memory() -> Self {
        Self::new(MemorySink::new())
    }

    /// Registry rebuilt from everything `sink` recorded so far
    pub fn open(sink: impl PersistenceSink + 'static) -> Result<Self, RegistryError> {
        let entries = sink.load()?;
        let registry = Self::new(sink);

        {
            let mut state = registry.state.write();
            for entry in &entries {
                match entry {
                    LogEntry::Add { party } | LogEntry::Update { party } => {
                        if let Some(token) = state.conflicting_token(party) {
                            warn!(
                                "Registry: Skipping replayed {} with conflicting token {:?}",
                                party.identity, token
                            );
                            continue;
                        }
                        state.insert(Arc::new(party.clone()));
                    }
                    LogEntry::Remove { party } => {
                        state.remove(&party.identity);
                    }
                }
            }
            info!(
                "Registry: Replayed {} entries, {} remote parties",
                entries.len(),
                state.parties.len()
            );
        }

        Ok(registry)
    }

    /// Add a new remote party
    pub fn add_party(
        &self,
        identity: PartyIdentity,
        business_details: BusinessDetails,
        access_infos: Vec<AccessInfo>,
        remote_access_infos: Vec<RemoteAccessInfo>,
        status: PartyStatus,
    ) -> Result<Arc<RemoteParty>, RegistryError> {
        self.add(RemoteParty::new(
            identity,
            business_details,
            access_infos,
            remote_access_infos,
            status,
        ))
    }

    /// Add a complete record; fails without mutation if the identity or any
    /// of its tokens is already known
    pub fn add(&self, party: RemoteParty) -> Result<Arc<RemoteParty>, RegistryError> {
        let _writer = self.writer.lock();

        {
            let state = self.state.read();
            if state.parties.contains_key(&party.identity) {
                return Err(RegistryError::DuplicateIdentity(party.identity));
            }
            if let Some(token) = state.conflicting_token(&party) {
                return Err(RegistryError::DuplicateToken(token));
            }
        }

        self.sink.append(&LogEntry::Add {
            party: party.clone(),
        })?;

        let party = Arc::new(party);
        self.state.write().insert(party.clone());
        info!("Registry: Added remote party {}", party.identity);
        Ok(party)
    }

    /// Remove a remote party and all of its tokens
    pub fn remove(&self, identity: &PartyIdentity) -> Result<Arc<RemoteParty>, RegistryError> {
        let _writer = self.writer.lock();

        let existing = self
            .lookup_by_identity(identity)
            .ok_or_else(|| RegistryError::NotFound(identity.clone()))?;

        self.sink.append(&LogEntry::Remove {
            party: (*existing).clone(),
        })?;

        self.state.write().remove(identity);
        info!("Registry: Removed remote party {}", identity);
        Ok(existing)
    }

    /// Replace a party with the record computed by `f` from its current one.
    ///
    /// `f` runs while other mutations wait; keep it free of I/O.
    pub fn update<F>(&self, identity: &PartyIdentity, f: F) -> Result<Arc<RemoteParty>, RegistryError>
    where
        F: FnOnce(&RemoteParty) -> RemoteParty,
    {
        let _writer = self.writer.lock();

        let current = self
            .lookup_by_identity(identity)
            .ok_or_else(|| RegistryError::NotFound(identity.clone()))?;

        let replacement = f(&current);
        if &replacement.identity != identity {
            return Err(RegistryError::IdentityChanged(identity.clone()));
        }
        if let Some(token) = self.state.read().conflicting_token(&replacement) {
            return Err(RegistryError::DuplicateToken(token));
        }

        self.sink.append(&LogEntry::Update {
            party: replacement.clone(),
        })?;

        let replacement = Arc::new(replacement);
        self.state.write().insert(replacement.clone());
        debug!("Registry: Replaced remote party {}", identity);
        Ok(replacement)
    }

    /// Party owning `token` and the status of that token
    pub fn lookup_by_token(&self, token: &str) -> Option<(Arc<RemoteParty>, AccessStatus)> {
        let state = self.state.read();
        let identity = state.tokens.get(token)?;
        let party = state.parties.get(identity)?.clone();
        let status = party.access_info(token)?.status;
        Some((party, status))
    }

    pub fn lookup_by_identity(&self, identity: &PartyIdentity) -> Option<Arc<RemoteParty>> {
        self.state.read().parties.get(identity).cloned()
    }

    /// Snapshot of all parties, ordered by identity
    pub fn all(&self) -> Vec<Arc<RemoteParty>> {
        let mut parties: Vec<_> = self.state.read().parties.values().cloned().collect();
        parties.sort_by(|a, b| a.identity.cmp(&b.identity));
        parties
    }

    pub fn len(&self) -> usize {
        self.state.read().parties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().parties.is_empty()
    }

    /// Enable or disable a whole party
    pub fn set_party_status(
        &self,
        identity: &PartyIdentity,
        status: PartyStatus,
    ) -> Result<Arc<RemoteParty>, RegistryError> {
        info!("Registry: Setting {} to {}", identity, status);
        self.update(identity, |party| party.with_status(status))
    }

    /// Allow or block a single token
    pub fn set_access_status(
        &self,
        token: &str,
        status: AccessStatus,
    ) -> Result<Arc<RemoteParty>, RegistryError> {
        let (party, _) = self
            .lookup_by_token(token)
            .ok_or(RegistryError::UnknownToken)?;

        info!(
            "Registry: Setting token {:?} of {} to {}",
            AccessToken::new(token),
            party.identity,
            status
        );

        self.update(&party.identity, |party| {
            let access_infos = party
                .access_infos
                .iter()
                .map(|info| {
                    if info.token.as_str() == token {
                        AccessInfo {
                            status,
                            ..info.clone()
                        }
                    } else {
                        info.clone()
                    }
                })
                .collect();
            party.with_access_infos(access_infos)
        })
    }
}
