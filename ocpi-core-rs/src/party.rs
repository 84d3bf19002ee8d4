//! Remote party records
//!
//! A `RemoteParty` combines the identity of a peer with two token lists:
//! - `access_infos`: tokens the peer uses to call us
//! - `remote_access_infos`: tokens and endpoints we use to call the peer
//!
//! Records are immutable values. The registry replaces them wholesale; use
//! the `with_*` helpers to derive a modified copy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timestamp;
use crate::types::*;

/// Token a peer may present to us
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessInfo {
    pub token: AccessToken,
    pub status: AccessStatus,
    /// Set once a credentials exchange completed with this token
    #[serde(default)]
    pub registered: bool,
}

impl AccessInfo {
    /// Bootstrap token handed out of band ("token A")
    pub fn bootstrap(token: AccessToken) -> Self {
        Self {
            token,
            status: AccessStatus::Allowed,
            registered: false,
        }
    }

    /// Token issued by a completed credentials exchange
    pub fn registered(token: AccessToken) -> Self {
        Self {
            token,
            status: AccessStatus::Allowed,
            registered: true,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.status == AccessStatus::Allowed
    }
}

/// Token and endpoint we use to call a peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAccessInfo {
    pub token: AccessToken,
    pub versions_url: String,
    /// Versions the peer advertised on its `/versions` endpoint
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub version_ids: Vec<VersionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_version: Option<VersionId>,
    pub status: RemoteAccessStatus,
}

impl RemoteAccessInfo {
    pub fn new(token: AccessToken, versions_url: impl Into<String>) -> Self {
        Self {
            token,
            versions_url: versions_url.into(),
            version_ids: Vec::new(),
            selected_version: None,
            status: RemoteAccessStatus::Online,
        }
    }

    pub fn with_versions(mut self, mut version_ids: Vec<VersionId>) -> Self {
        version_ids.sort();
        version_ids.dedup();
        self.version_ids = version_ids;
        self
    }

    pub fn with_selected_version(mut self, version: VersionId) -> Self {
        self.selected_version = Some(version);
        self
    }
}

/// Federation peer as known to this node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteParty {
    pub identity: PartyIdentity,
    pub business_details: BusinessDetails,
    #[serde(default)]
    pub access_infos: Vec<AccessInfo>,
    #[serde(default)]
    pub remote_access_infos: Vec<RemoteAccessInfo>,
    pub status: PartyStatus,
    #[serde(with = "timestamp")]
    pub last_updated: DateTime<Utc>,
}

impl RemoteParty {
    pub fn new(
        identity: PartyIdentity,
        business_details: BusinessDetails,
        access_infos: Vec<AccessInfo>,
        remote_access_infos: Vec<RemoteAccessInfo>,
        status: PartyStatus,
    ) -> Self {
        Self {
            identity,
            business_details,
            access_infos,
            remote_access_infos,
            status,
            last_updated: timestamp::now(),
        }
    }

    /// Access info entry for one of our tokens
    pub fn access_info(&self, token: &str) -> Option<&AccessInfo> {
        self.access_infos.iter().find(|info| info.token.as_str() == token)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &AccessToken> {
        self.access_infos.iter().map(|info| &info.token)
    }

    /// First endpoint we can use to reach the peer
    pub fn remote_access(&self) -> Option<&RemoteAccessInfo> {
        self.remote_access_infos
            .iter()
            .find(|info| info.status == RemoteAccessStatus::Online)
    }

    /// Whether any token of this peer completed a credentials exchange
    pub fn is_registered(&self) -> bool {
        self.access_infos.iter().any(|info| info.registered)
    }

    pub fn is_enabled(&self) -> bool {
        self.status == PartyStatus::Enabled
    }

    /// Copy with a token list replaced
    pub fn with_access_infos(&self, access_infos: Vec<AccessInfo>) -> Self {
        Self {
            access_infos,
            last_updated: timestamp::now(),
            ..self.clone()
        }
    }

    /// Copy with the endpoint list replaced
    pub fn with_remote_access_infos(&self, remote_access_infos: Vec<RemoteAccessInfo>) -> Self {
        Self {
            remote_access_infos,
            last_updated: timestamp::now(),
            ..self.clone()
        }
    }

    /// Copy with one extra token appended
    pub fn with_additional_access(&self, access: AccessInfo) -> Self {
        let mut access_infos = self.access_infos.clone();
        access_infos.push(access);
        self.with_access_infos(access_infos)
    }

    /// Copy without the given token
    pub fn without_token(&self, token: &str) -> Self {
        let access_infos = self
            .access_infos
            .iter()
            .filter(|info| info.token.as_str() != token)
            .cloned()
            .collect();
        self.with_access_infos(access_infos)
    }

    pub fn with_status(&self, status: PartyStatus) -> Self {
        Self {
            status,
            last_updated: timestamp::now(),
            ..self.clone()
        }
    }

    pub fn with_business_details(&self, business_details: BusinessDetails) -> Self {
        Self {
            business_details,
            last_updated: timestamp::now(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn party() -> RemoteParty {
        RemoteParty::new(
            PartyIdentity::new("DE", "GEF", Role::Emsp),
            BusinessDetails::new("GraphDefined EMSP"),
            vec![AccessInfo::bootstrap(AccessToken::new("token-a"))],
            vec![RemoteAccessInfo::new(
                AccessToken::new("remote-a"),
                "http://emsp.example/versions",
            )],
            PartyStatus::Enabled,
        )
    }

    #[test]
    fn test_derived_copies_leave_original_untouched() {
        let original = party();
        let rotated = original
            .without_token("token-a")
            .with_additional_access(AccessInfo::registered(AccessToken::new("token-c")));

        assert!(original.access_info("token-a").is_some());
        assert!(!original.is_registered());

        assert!(rotated.access_info("token-a").is_none());
        assert!(rotated.access_info("token-c").is_some());
        assert!(rotated.is_registered());
        assert_eq!(rotated.identity, original.identity);
    }

    #[test]
    fn test_remote_access_skips_offline() {
        let mut offline = RemoteAccessInfo::new(AccessToken::new("x"), "http://down/versions");
        offline.status = RemoteAccessStatus::Offline;
        let online = RemoteAccessInfo::new(AccessToken::new("y"), "http://up/versions");

        let party = party().with_remote_access_infos(vec![offline, online]);
        assert_eq!(
            party.remote_access().map(|info| info.token.as_str()),
            Some("y")
        );
    }

    #[test]
    fn test_versions_are_sorted_and_deduplicated() {
        let info = RemoteAccessInfo::new(AccessToken::new("x"), "http://peer/versions").with_versions(
            vec![
                VersionId::new("2.2.1"),
                VersionId::new("2.1.1"),
                VersionId::new("2.2.1"),
            ],
        );
        assert_eq!(
            info.version_ids,
            vec![VersionId::new("2.1.1"), VersionId::new("2.2.1")]
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let original = party();
        let json = serde_json::to_string(&original).unwrap();
        let parsed: RemoteParty = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }
}
