//! Charging sessions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PartyResource, Price};
use crate::patch::{FieldRule, PatchSchema, Patchable, LAST_UPDATED};
use crate::timestamp;
use crate::types::{CountryCode, PartyId};

ocpi_enum! {
    pub enum TokenType {
        AdHocUser => "AD_HOC_USER",
        AppUser => "APP_USER",
        Other => "OTHER",
        Rfid => "RFID",
    }
}

ocpi_enum! {
    /// How a session was authorized
    pub enum AuthMethod {
        AuthRequest => "AUTH_REQUEST",
        Command => "COMMAND",
        Whitelist => "WHITELIST",
    }
}

ocpi_enum! {
    pub enum SessionStatus {
        Active => "ACTIVE",
        Completed => "COMPLETED",
        Invalid => "INVALID",
        Pending => "PENDING",
        Reservation => "RESERVATION",
    }
}

ocpi_enum! {
    /// Measured quantity of a charging period
    pub enum CdrDimensionType {
        Current => "CURRENT",
        Energy => "ENERGY",
        EnergyExport => "ENERGY_EXPORT",
        EnergyImport => "ENERGY_IMPORT",
        MaxCurrent => "MAX_CURRENT",
        MinCurrent => "MIN_CURRENT",
        MaxPower => "MAX_POWER",
        MinPower => "MIN_POWER",
        ParkingTime => "PARKING_TIME",
        Power => "POWER",
        ReservationTime => "RESERVATION_TIME",
        StateOfCharge => "STATE_OF_CHARGE",
        Time => "TIME",
    }
}

/// Token used to start a session, as seen by the CPO
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdrToken {
    pub country_code: CountryCode,
    pub party_id: PartyId,
    pub uid: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub contract_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdrDimension {
    #[serde(rename = "type")]
    pub dimension_type: CdrDimensionType,
    pub volume: f64,
}

/// Measurements from `start_date_time` until the next period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargingPeriod {
    #[serde(with = "timestamp")]
    pub start_date_time: DateTime<Utc>,
    pub dimensions: Vec<CdrDimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tariff_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub country_code: CountryCode,
    pub party_id: PartyId,
    pub id: String,
    #[serde(with = "timestamp")]
    pub start_date_time: DateTime<Utc>,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub end_date_time: Option<DateTime<Utc>>,
    pub kwh: f64,
    pub cdr_token: CdrToken,
    pub auth_method: AuthMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_reference: Option<String>,
    pub location_id: String,
    pub evse_uid: String,
    pub connector_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meter_id: Option<String>,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub charging_periods: Vec<ChargingPeriod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<Price>,
    pub status: SessionStatus,
    #[serde(with = "timestamp")]
    pub last_updated: DateTime<Utc>,
}

impl Patchable for Session {
    const SCHEMA: PatchSchema = PatchSchema {
        noun: "a session",
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
                    nullable: true,
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
            (
                "status",
                FieldRule::Enum {
                    label: "session status",
                    is_valid: |s| SessionStatus::try_parse(s).is_some(),
                    nullable: false,
                },
            ),
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

impl PartyResource for Session {
    const KIND: &'static str = "session";

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
