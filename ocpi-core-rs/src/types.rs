//! Core types for the OCPI federation
//!
//! Party identities, access tokens, protocol versions and the credentials
//! object exchanged during registration.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Raised by `FromStr` on an OCPI enumeration for an unknown wire value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind} value '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

// ============================================================================
// Identity
// ============================================================================

/// ISO-3166 alpha-2 country code of a party
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for CountryCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Three-character party identifier (ISO-15118 operator id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PartyId(String);

impl PartyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for PartyId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

ocpi_enum! {
    /// Role a party plays in the federation
    pub enum Role {
        Cpo => "CPO",
        Emsp => "EMSP",
    }
}

/// Unique identity of a federation peer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartyIdentity {
    pub country_code: CountryCode,
    pub party_id: PartyId,
    pub role: Role,
}

impl PartyIdentity {
    pub fn new(country_code: impl Into<String>, party_id: impl Into<String>, role: Role) -> Self {
        Self {
            country_code: CountryCode::new(country_code),
            party_id: PartyId::new(party_id),
            role,
        }
    }

    /// Same country code and party id, role ignored
    pub fn matches(&self, country_code: &CountryCode, party_id: &PartyId) -> bool {
        &self.country_code == country_code && &self.party_id == party_id
    }
}

impl fmt::Display for PartyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}*{} ({})", self.country_code, self.party_id, self.role)
    }
}

// ============================================================================
// Tokens and status
// ============================================================================

/// Bearer token used in `Authorization: Token <token>` headers
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Fresh random alphanumeric token
    pub fn generate(length: usize) -> Self {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect();
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix safe for logs
    pub fn redacted(&self) -> String {
        let prefix: String = self.0.chars().take(4).collect();
        format!("{}…", prefix)
    }
}

impl Borrow<str> for AccessToken {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken({})", self.redacted())
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

ocpi_enum! {
    /// Whether a token a peer uses to call us is accepted
    pub enum AccessStatus {
        Allowed => "ALLOWED",
        Blocked => "BLOCKED",
    }
}

ocpi_enum! {
    /// Reachability of a peer endpoint we call
    pub enum RemoteAccessStatus {
        Online => "ONLINE",
        Offline => "OFFLINE",
    }
}

ocpi_enum! {
    /// Administrative status of a remote party
    pub enum PartyStatus {
        Enabled => "ENABLED",
        Disabled => "DISABLED",
    }
}

// ============================================================================
// Versions and modules
// ============================================================================

/// OCPI protocol version, ordered by its numeric components
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(String);

impl VersionId {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn components(&self) -> Vec<u64> {
        self.0
            .split('.')
            .map(|part| part.trim().parse::<u64>().unwrap_or(0))
            .collect()
    }
}

impl Ord for VersionId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components()
            .cmp(&other.components())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for VersionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Highest version present in both lists
pub fn highest_mutual_version<'a>(
    ours: &'a [VersionId],
    theirs: &[VersionId],
) -> Option<&'a VersionId> {
    ours.iter().filter(|v| theirs.contains(v)).max()
}

/// OCPI module identifier as advertised in version details
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleId {
    Credentials,
    Locations,
    Sessions,
    Tariffs,
    Cdrs,
    Tokens,
    Commands,
    /// Modules this node does not know about; kept for forward compatibility
    Custom(String),
}

impl ModuleId {
    pub fn as_str(&self) -> &str {
        match self {
            ModuleId::Credentials => "credentials",
            ModuleId::Locations => "locations",
            ModuleId::Sessions => "sessions",
            ModuleId::Tariffs => "tariffs",
            ModuleId::Cdrs => "cdrs",
            ModuleId::Tokens => "tokens",
            ModuleId::Commands => "commands",
            ModuleId::Custom(name) => name,
        }
    }

    pub fn parse(text: &str) -> Self {
        match text {
            "credentials" => ModuleId::Credentials,
            "locations" => ModuleId::Locations,
            "sessions" => ModuleId::Sessions,
            "tariffs" => ModuleId::Tariffs,
            "cdrs" => ModuleId::Cdrs,
            "tokens" => ModuleId::Tokens,
            "commands" => ModuleId::Commands,
            other => ModuleId::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ModuleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ModuleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(ModuleId::parse(&text))
    }
}

/// Entry of a `/versions` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub version: VersionId,
    pub url: String,
}

/// Module endpoint inside a version detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub identifier: ModuleId,
    pub url: String,
}

/// Resolved version endpoint: which modules live where
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDetail {
    pub version: VersionId,
    pub endpoints: Vec<Endpoint>,
}

impl VersionDetail {
    /// URL of a module, if the peer offers it
    pub fn module_url(&self, module: &ModuleId) -> Option<&str> {
        self.endpoints
            .iter()
            .find(|endpoint| &endpoint.identifier == module)
            .map(|endpoint| endpoint.url.as_str())
    }
}

// ============================================================================
// Business details and credentials
// ============================================================================

/// Image reference used for logos
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub category: String,
    #[serde(rename = "type")]
    pub image_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Name and contact of a party
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessDetails {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<Image>,
}

impl BusinessDetails {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            website: None,
            logo: None,
        }
    }

    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }
}

/// Wire object exchanged during the credentials handshake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: AccessToken,
    /// The sender's `/versions` URL
    pub url: String,
    pub business_details: BusinessDetails,
    pub country_code: CountryCode,
    pub party_id: PartyId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_ordering() {
        let mut versions = vec![
            VersionId::new("2.2.1"),
            VersionId::new("2.0"),
            VersionId::new("2.11"),
            VersionId::new("2.1.1"),
        ];
        versions.sort();

        let ordered: Vec<&str> = versions.iter().map(|v| v.as_str()).collect();
        assert_eq!(ordered, vec!["2.0", "2.1.1", "2.2.1", "2.11"]);
    }

    #[test]
    fn test_highest_mutual_version() {
        let ours = vec![VersionId::new("2.1.1"), VersionId::new("2.2.1")];
        let theirs = vec![VersionId::new("2.1.1"), VersionId::new("2.0")];
        assert_eq!(
            highest_mutual_version(&ours, &theirs),
            Some(&VersionId::new("2.1.1"))
        );

        let disjoint = vec![VersionId::new("3.0")];
        assert_eq!(highest_mutual_version(&ours, &disjoint), None);
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!(AccessStatus::try_parse("BLOCKED"), Some(AccessStatus::Blocked));
        assert_eq!(AccessStatus::try_parse("blocked"), None);
        assert!("NOPE".parse::<Role>().is_err());
        assert_eq!(serde_json::to_string(&Role::Emsp).unwrap(), "\"EMSP\"");
        assert!(serde_json::from_str::<Role>("\"HUB\"").is_err());
    }

    #[test]
    fn test_module_id_keeps_unknown_modules() {
        let endpoint: Endpoint =
            serde_json::from_str(r#"{"identifier":"chargingprofiles","url":"http://x"}"#).unwrap();
        assert_eq!(endpoint.identifier, ModuleId::Custom("chargingprofiles".to_string()));
        assert_eq!(
            serde_json::to_value(&endpoint).unwrap()["identifier"],
            "chargingprofiles"
        );
    }

    #[test]
    fn test_generated_tokens_differ() {
        let a = AccessToken::generate(64);
        let b = AccessToken::generate(64);
        assert_eq!(a.as_str().len(), 64);
        assert_ne!(a, b);
        assert!(!format!("{:?}", a).contains(a.as_str()));
    }

    #[test]
    fn test_identity_display() {
        let identity = PartyIdentity::new("de", "gef", Role::Cpo);
        assert_eq!(identity.to_string(), "DE*GEF (CPO)");
    }

    #[test]
    fn test_wire_identity_is_uppercased() {
        let country_code: CountryCode = serde_json::from_str("\"de\"").unwrap();
        assert_eq!(country_code, CountryCode::new("DE"));
        assert_eq!(country_code.as_str(), "DE");

        let credentials: Credentials = serde_json::from_value(serde_json::json!({
            "token": "abc",
            "url": "http://emsp.example/versions",
            "business_details": {"name": "EMSP"},
            "country_code": "nl",
            "party_id": "emp"
        }))
        .unwrap();
        assert_eq!(credentials.country_code.as_str(), "NL");
        assert_eq!(credentials.party_id, PartyId::new("EMP"));

        let identity = PartyIdentity::new("NL", "EMP", Role::Emsp);
        assert!(identity.matches(&credentials.country_code, &credentials.party_id));
        assert_eq!(serde_json::to_string(&credentials.party_id).unwrap(), "\"EMP\"");
    }
}
