//! Patchable OCPI resources
//!
//! - `location`: Location, EVSE and Connector
//! - `session`: charging sessions and the token/period types shared with CDRs
//! - `tariff`: tariffs and their price elements
//! - `cdr`: charge detail records
//!
//! Every resource implements `Patchable`; the top-level ones also implement
//! `PartyResource` so receivers can key them by owner.

pub mod location;
pub mod session;
pub mod tariff;
pub mod cdr;

pub use location::*;
pub use session::*;
pub use tariff::*;
pub use cdr::*;

use serde::{Deserialize, Serialize};

use crate::patch::Patchable;
use crate::types::{CountryCode, PartyId};

/// Resource owned by a party: `(country_code, party_id, id)` is unique
pub trait PartyResource: Patchable {
    /// Lower-case resource name used in messages ("location")
    const KIND: &'static str;

    fn country_code(&self) -> &CountryCode;
    fn party_id(&self) -> &PartyId;
    fn id(&self) -> &str;

    fn key(&self) -> ResourceKey {
        ResourceKey::new(self.country_code().clone(), self.party_id().clone(), self.id())
    }
}

/// Storage key of a party-owned resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub country_code: CountryCode,
    pub party_id: PartyId,
    pub id: String,
}

impl ResourceKey {
    pub fn new(country_code: CountryCode, party_id: PartyId, id: impl Into<String>) -> Self {
        Self {
            country_code,
            party_id,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}*{}*{}", self.country_code, self.party_id, self.id)
    }
}

// ============================================================================
// Shared value types
// ============================================================================

/// Localised text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayText {
    pub language: String,
    pub text: String,
}

impl DisplayText {
    pub fn new(language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            text: text.into(),
        }
    }
}

/// WGS84 coordinates as decimal strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: String,
    pub longitude: String,
}

impl GeoLocation {
    pub fn new(latitude: impl Into<String>, longitude: impl Into<String>) -> Self {
        Self {
            latitude: latitude.into(),
            longitude: longitude.into(),
        }
    }
}

/// Amount with and without VAT
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub excl_vat: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incl_vat: Option<f64>,
}

ocpi_enum! {
    /// Category of an energy source
    pub enum EnergySourceCategory {
        Nuclear => "NUCLEAR",
        GeneralFossil => "GENERAL_FOSSIL",
        Coal => "COAL",
        Gas => "GAS",
        GeneralGreen => "GENERAL_GREEN",
        Solar => "SOLAR",
        Wind => "WIND",
        Water => "WATER",
    }
}

ocpi_enum! {
    /// Category of an environmental impact
    pub enum EnvironmentalImpactCategory {
        NuclearWaste => "NUCLEAR_WASTE",
        CarbonDioxide => "CARBON_DIOXIDE",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergySource {
    pub source: EnergySourceCategory,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalImpact {
    pub category: EnvironmentalImpactCategory,
    /// g/kWh
    pub amount: f64,
}

/// Energy mix of a location or tariff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyMix {
    pub is_green_energy: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub energy_sources: Vec<EnergySource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environ_impact: Vec<EnvironmentalImpact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_product_name: Option<String>,
}
