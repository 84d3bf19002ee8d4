//! Tariffs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DisplayText, EnergyMix, PartyResource, Price};
use crate::patch::{FieldRule, PatchSchema, Patchable, LAST_UPDATED};
use crate::timestamp;
use crate::types::{CountryCode, PartyId};

ocpi_enum! {
    pub enum TariffType {
        AdHocPayment => "AD_HOC_PAYMENT",
        ProfileCheap => "PROFILE_CHEAP",
        ProfileFast => "PROFILE_FAST",
        ProfileGreen => "PROFILE_GREEN",
        Regular => "REGULAR",
    }
}

ocpi_enum! {
    /// What a price component is billed on
    pub enum TariffDimensionType {
        Energy => "ENERGY",
        Flat => "FLAT",
        ParkingTime => "PARKING_TIME",
        Time => "TIME",
    }
}

ocpi_enum! {
    pub enum DayOfWeek {
        Monday => "MONDAY",
        Tuesday => "TUESDAY",
        Wednesday => "WEDNESDAY",
        Thursday => "THURSDAY",
        Friday => "FRIDAY",
        Saturday => "SATURDAY",
        Sunday => "SUNDAY",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceComponent {
    #[serde(rename = "type")]
    pub component_type: TariffDimensionType,
    /// Price per unit excluding VAT
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat: Option<f64>,
    pub step_size: u32,
}

/// When a tariff element applies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TariffRestrictions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_kwh: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_kwh: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub day_of_week: Vec<DayOfWeek>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffElement {
    pub price_components: Vec<PriceComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<TariffRestrictions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tariff {
    pub country_code: CountryCode,
    pub party_id: PartyId,
    pub id: String,
    pub currency: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub tariff_type: Option<TariffType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tariff_alt_text: Vec<DisplayText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tariff_alt_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Price>,
    pub elements: Vec<TariffElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_mix: Option<EnergyMix>,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub start_date_time: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub end_date_time: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub last_updated: DateTime<Utc>,
}

impl Patchable for Tariff {
    const SCHEMA: PatchSchema = PatchSchema {
        noun: "a tariff",
        fields: &[
            ("country_code", FieldRule::Identity { label: "country code" }),
            ("party_id", FieldRule::Identity { label: "party identification" }),
            ("id", FieldRule::Identity { label: "identification" }),
            (
                "type",
                FieldRule::Enum {
                    label: "tariff type",
                    is_valid: |s| TariffType::try_parse(s).is_some(),
                    nullable: true,
                },
            ),
            ("tariff_alt_text", FieldRule::Array),
            ("elements", FieldRule::Array),
            (
                "start_date_time",
                FieldRule::Timestamp {
                    label: "start timestamp",
                    nullable: true,
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

impl PartyResource for Tariff {
    const KIND: &'static str = "tariff";

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
