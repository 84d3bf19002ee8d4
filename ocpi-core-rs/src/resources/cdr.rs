//! Charge detail records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::location::{ConnectorFormat, ConnectorType, PowerType};
use super::session::{AuthMethod, CdrToken, ChargingPeriod};
use super::tariff::Tariff;
use super::{GeoLocation, PartyResource, Price};
use crate::patch::{FieldRule, PatchSchema, Patchable, LAST_UPDATED};
use crate::timestamp;
use crate::types::{CountryCode, PartyId};

/// Where the charging happened, frozen at CDR creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdrLocation {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub address: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    pub country: String,
    pub coordinates: GeoLocation,
    pub evse_uid: String,
    pub evse_id: String,
    pub connector_id: String,
    pub connector_standard: ConnectorType,
    pub connector_format: ConnectorFormat,
    pub connector_power_type: PowerType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cdr {
    pub country_code: CountryCode,
    pub party_id: PartyId,
    pub id: String,
    #[serde(with = "timestamp")]
    pub start_date_time: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub end_date_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub cdr_token: CdrToken,
    pub auth_method: AuthMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_reference: Option<String>,
    pub cdr_location: CdrLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meter_id: Option<String>,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tariffs: Vec<Tariff>,
    pub charging_periods: Vec<ChargingPeriod>,
    pub total_cost: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_fixed_cost: Option<Price>,
    pub total_energy: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_energy_cost: Option<Price>,
    /// Hours
    pub total_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time_cost: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_parking_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_reference_id: Option<String>,
    #[serde(with = "timestamp")]
    pub last_updated: DateTime<Utc>,
}

impl Patchable for Cdr {
    const SCHEMA: PatchSchema = PatchSchema {
        noun: "a charge detail record",
        fields: &[
            ("country_code", FieldRule::Identity { label: "country code" }),
            ("party_id", FieldRule::Identity { label: "party identification" }),
            ("id", FieldRule::Identity { label: "identification" }),
            (
                "start_date_time",
                FieldRule::Timestamp {
                    label: "start timestamp",
                    nullable: false,
                },
            ),
            (
                "end_date_time",
                FieldRule::Timestamp {
                    label: "end timestamp",
                    nullable: false,
                },
            ),
            (
                "auth_method",
                FieldRule::Enum {
                    label: "authentication method",
                    is_valid: |s| AuthMethod::try_parse(s).is_some(),
                    nullable: false,
                },
            ),
            ("tariffs", FieldRule::Array),
            ("charging_periods", FieldRule::Array),
            (
                LAST_UPDATED,
                FieldRule::Timestamp {
                    label: "last updated",
                    nullable: false,
                },
            ),
        ],
    };

    fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

impl PartyResource for Cdr {
    const KIND: &'static str = "CDR";

    fn country_code(&self) -> &CountryCode {
        &self.country_code
    }

    fn party_id(&self) -> &PartyId {
        &self.party_id
    }

    fn id(&self) -> &str {
        &self.id
    }
}
