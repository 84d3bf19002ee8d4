//! Locations, EVSEs and connectors
//!
//! A location owns its EVSEs, an EVSE owns its connectors. Replacing a
//! nested object yields a new parent whose `last_updated` is at least the
//! child's.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DisplayText, EnergyMix, GeoLocation, PartyResource};
use crate::patch::{FieldRule, PatchSchema, Patchable, LAST_UPDATED};
use crate::timestamp;
use crate::types::{BusinessDetails, CountryCode, Image, PartyId};

// ============================================================================
// Enumerations
// ============================================================================

ocpi_enum! {
    /// Plug or socket standard
    pub enum ConnectorType {
        Chademo => "CHADEMO",
        Chaoji => "CHAOJI",
        DomesticA => "DOMESTIC_A",
        DomesticB => "DOMESTIC_B",
        DomesticC => "DOMESTIC_C",
        DomesticD => "DOMESTIC_D",
        DomesticE => "DOMESTIC_E",
        DomesticF => "DOMESTIC_F",
        DomesticG => "DOMESTIC_G",
        DomesticH => "DOMESTIC_H",
        DomesticI => "DOMESTIC_I",
        DomesticJ => "DOMESTIC_J",
        DomesticK => "DOMESTIC_K",
        DomesticL => "DOMESTIC_L",
        GbtAc => "GBT_AC",
        GbtDc => "GBT_DC",
        Iec60309SingleSixteen => "IEC_60309_2_single_16",
        Iec60309ThreeSixteen => "IEC_60309_2_three_16",
        Iec60309ThreeThirtyTwo => "IEC_60309_2_three_32",
        Iec60309ThreeSixtyFour => "IEC_60309_2_three_64",
        Iec62196T1 => "IEC_62196_T1",
        Iec62196T1Combo => "IEC_62196_T1_COMBO",
        Iec62196T2 => "IEC_62196_T2",
        Iec62196T2Combo => "IEC_62196_T2_COMBO",
        Iec62196T3A => "IEC_62196_T3A",
        Iec62196T3C => "IEC_62196_T3C",
        Nema520 => "NEMA_5_20",
        Nema630 => "NEMA_6_30",
        Nema650 => "NEMA_6_50",
        Nema1030 => "NEMA_10_30",
        Nema1050 => "NEMA_10_50",
        Nema1430 => "NEMA_14_30",
        Nema1450 => "NEMA_14_50",
        PantographBottomUp => "PANTOGRAPH_BOTTOM_UP",
        PantographTopDown => "PANTOGRAPH_TOP_DOWN",
        TeslaR => "TESLA_R",
        TeslaS => "TESLA_S",
    }
}

ocpi_enum! {
    /// Socket on the station or cable attached
    pub enum ConnectorFormat {
        Socket => "SOCKET",
        Cable => "CABLE",
    }
}

ocpi_enum! {
    pub enum PowerType {
        Ac1Phase => "AC_1_PHASE",
        Ac2Phase => "AC_2_PHASE",
        Ac2PhaseSplit => "AC_2_PHASE_SPLIT",
        Ac3Phase => "AC_3_PHASE",
        Dc => "DC",
    }
}

ocpi_enum! {
    /// EVSE availability
    pub enum EvseStatus {
        Available => "AVAILABLE",
        Blocked => "BLOCKED",
        Charging => "CHARGING",
        Inoperative => "INOPERATIVE",
        OutOfOrder => "OUTOFORDER",
        Planned => "PLANNED",
        Removed => "REMOVED",
        Reserved => "RESERVED",
        Unknown => "UNKNOWN",
    }
}

ocpi_enum! {
    pub enum Capability {
        ChargingProfileCapable => "CHARGING_PROFILE_CAPABLE",
        ChargingPreferencesCapable => "CHARGING_PREFERENCES_CAPABLE",
        ChipCardSupport => "CHIP_CARD_SUPPORT",
        ContactlessCardSupport => "CONTACTLESS_CARD_SUPPORT",
        CreditCardPayable => "CREDIT_CARD_PAYABLE",
        DebitCardPayable => "DEBIT_CARD_PAYABLE",
        PedTerminal => "PED_TERMINAL",
        RemoteStartStopCapable => "REMOTE_START_STOP_CAPABLE",
        Reservable => "RESERVABLE",
        RfidReader => "RFID_READER",
        StartSessionConnectorRequired => "START_SESSION_CONNECTOR_REQUIRED",
        TokenGroupCapable => "TOKEN_GROUP_CAPABLE",
        UnlockCapable => "UNLOCK_CAPABLE",
    }
}

ocpi_enum! {
    pub enum ParkingRestriction {
        EvOnly => "EV_ONLY",
        Plugged => "PLUGGED",
        Disabled => "DISABLED",
        Customers => "CUSTOMERS",
        Motorcycles => "MOTORCYCLES",
    }
}

ocpi_enum! {
    pub enum ParkingType {
        AlongMotorway => "ALONG_MOTORWAY",
        ParkingGarage => "PARKING_GARAGE",
        ParkingLot => "PARKING_LOT",
        OnDriveway => "ON_DRIVEWAY",
        OnStreet => "ON_STREET",
        UndergroundGarage => "UNDERGROUND_GARAGE",
    }
}

ocpi_enum! {
    pub enum Facility {
        Hotel => "HOTEL",
        Restaurant => "RESTAURANT",
        Cafe => "CAFE",
        Mall => "MALL",
        Supermarket => "SUPERMARKET",
        Sport => "SPORT",
        RecreationArea => "RECREATION_AREA",
        Nature => "NATURE",
        Museum => "MUSEUM",
        BikeSharing => "BIKE_SHARING",
        BusStop => "BUS_STOP",
        TaxiStand => "TAXI_STAND",
        TramStop => "TRAM_STOP",
        MetroStation => "METRO_STATION",
        TrainStation => "TRAIN_STATION",
        Airport => "AIRPORT",
        ParkingLot => "PARKING_LOT",
        CarpoolParking => "CARPOOL_PARKING",
        FuelStation => "FUEL_STATION",
        Wifi => "WIFI",
    }
}

// ============================================================================
// Connector
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub id: String,
    pub standard: ConnectorType,
    pub format: ConnectorFormat,
    pub power_type: PowerType,
    pub max_voltage: u32,
    pub max_amperage: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_electric_power: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tariff_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_and_conditions: Option<String>,
    #[serde(with = "timestamp")]
    pub last_updated: DateTime<Utc>,
}

impl Patchable for Connector {
    const SCHEMA: PatchSchema = PatchSchema {
        noun: "a connector",
        fields: &[
            ("id", FieldRule::Identity { label: "identification" }),
            (
                "standard",
                FieldRule::Enum {
                    label: "connector standard",
                    is_valid: |s| ConnectorType::try_parse(s).is_some(),
                    nullable: false,
                },
            ),
            (
                "format",
                FieldRule::Enum {
                    label: "connector format",
                    is_valid: |s| ConnectorFormat::try_parse(s).is_some(),
                    nullable: false,
                },
            ),
            (
                "power_type",
                FieldRule::Enum {
                    label: "power type",
                    is_valid: |s| PowerType::try_parse(s).is_some(),
                    nullable: false,
                },
            ),
            ("tariff_ids", FieldRule::Array),
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

// ============================================================================
// EVSE
// ============================================================================

/// Planned status change of an EVSE
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSchedule {
    #[serde(with = "timestamp")]
    pub period_begin: DateTime<Utc>,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub period_end: Option<DateTime<Utc>>,
    pub status: EvseStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evse {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evse_id: Option<String>,
    pub status: EvseStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status_schedule: Vec<StatusSchedule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub connectors: Vec<Connector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GeoLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directions: Vec<DisplayText>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parking_restrictions: Vec<ParkingRestriction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Image>,
    #[serde(with = "timestamp")]
    pub last_updated: DateTime<Utc>,
}

impl Evse {
    pub fn connector(&self, id: &str) -> Option<&Connector> {
        self.connectors.iter().find(|c| c.id == id)
    }

    /// Copy with `connector` inserted or replaced; `true` if it was new
    pub fn with_connector(&self, connector: Connector) -> (Evse, bool) {
        let mut evse = self.clone();
        evse.last_updated = evse.last_updated.max(connector.last_updated);

        let created = match evse.connectors.iter_mut().find(|c| c.id == connector.id) {
            Some(existing) => {
                *existing = connector;
                false
            }
            None => {
                evse.connectors.push(connector);
                true
            }
        };
        (evse, created)
    }
}

impl Patchable for Evse {
    const SCHEMA: PatchSchema = PatchSchema {
        noun: "an EVSE",
        fields: &[
            ("uid", FieldRule::Identity { label: "unique identification" }),
            (
                "status",
                FieldRule::Enum {
                    label: "EVSE status",
                    is_valid: |s| EvseStatus::try_parse(s).is_some(),
                    nullable: false,
                },
            ),
            (
                "capabilities",
                FieldRule::EnumArray {
                    label: "capabilities",
                    is_valid: |s| Capability::try_parse(s).is_some(),
                },
            ),
            (
                "parking_restrictions",
                FieldRule::EnumArray {
                    label: "parking restrictions",
                    is_valid: |s| ParkingRestriction::try_parse(s).is_some(),
                },
            ),
            ("status_schedule", FieldRule::Array),
            ("connectors", FieldRule::Array),
            ("directions", FieldRule::Array),
            ("images", FieldRule::Array),
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

// ============================================================================
// Location
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub country_code: CountryCode,
    pub party_id: PartyId,
    pub id: String,
    pub publish: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub address: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub country: String,
    pub coordinates: GeoLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parking_type: Option<ParkingType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evses: Vec<Evse>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directions: Vec<DisplayText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<BusinessDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suboperator: Option<BusinessDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<BusinessDetails>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facilities: Vec<Facility>,
    pub time_zone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charging_when_closed: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Image>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_mix: Option<EnergyMix>,
    #[serde(with = "timestamp")]
    pub last_updated: DateTime<Utc>,
}

impl Location {
    pub fn evse(&self, uid: &str) -> Option<&Evse> {
        self.evses.iter().find(|e| e.uid == uid)
    }

    /// Copy with `evse` inserted or replaced; `true` if it was new
    pub fn with_evse(&self, evse: Evse) -> (Location, bool) {
        let mut location = self.clone();
        location.last_updated = location.last_updated.max(evse.last_updated);

        let created = match location.evses.iter_mut().find(|e| e.uid == evse.uid) {
            Some(existing) => {
                *existing = evse;
                false
            }
            None => {
                location.evses.push(evse);
                true
            }
        };
        (location, created)
    }
}

impl Patchable for Location {
    const SCHEMA: PatchSchema = PatchSchema {
        noun: "a location",
        fields: &[
            ("country_code", FieldRule::Identity { label: "country code" }),
            ("party_id", FieldRule::Identity { label: "party identification" }),
            ("id", FieldRule::Identity { label: "identification" }),
            (
                "parking_type",
                FieldRule::Enum {
                    label: "parking type",
                    is_valid: |s| ParkingType::try_parse(s).is_some(),
                    nullable: true,
                },
            ),
            (
                "facilities",
                FieldRule::EnumArray {
                    label: "facilities",
                    is_valid: |s| Facility::try_parse(s).is_some(),
                },
            ),
            ("evses", FieldRule::Array),
            ("directions", FieldRule::Array),
            ("images", FieldRule::Array),
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

impl PartyResource for Location {
    const KIND: &'static str = "location";

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{EnergySource, EnergySourceCategory};
    use chrono::Duration;
    use serde_json::json;

    fn ts(text: &str) -> DateTime<Utc> {
        timestamp::parse(text).unwrap()
    }

    fn connector(id: &str) -> Connector {
        Connector {
            id: id.to_string(),
            standard: ConnectorType::Iec62196T2,
            format: ConnectorFormat::Socket,
            power_type: PowerType::Ac3Phase,
            max_voltage: 400,
            max_amperage: 30,
            max_electric_power: Some(12000),
            tariff_ids: vec!["DE*GEF*T0042".to_string(), "DE*GEF*T0043".to_string()],
            terms_and_conditions: Some("https://open.charging.cloud/terms".to_string()),
            last_updated: ts("2020-09-21T00:00:00Z"),
        }
    }

    fn evse(uid: &str) -> Evse {
        Evse {
            uid: uid.to_string(),
            evse_id: Some("DE*GEF*E1234*1".to_string()),
            status: EvseStatus::Available,
            status_schedule: vec![StatusSchedule {
                period_begin: ts("2020-12-01T00:00:00Z"),
                period_end: Some(ts("2020-12-31T23:59:59Z")),
                status: EvseStatus::Inoperative,
            }],
            capabilities: vec![Capability::RfidReader, Capability::Reservable],
            connectors: vec![connector("1"), connector("2")],
            floor_level: Some("1. Stock".to_string()),
            coordinates: Some(GeoLocation::new("10.1", "20.2")),
            physical_reference: Some("Ladestation #1".to_string()),
            directions: vec![DisplayText::new("de", "Bitte klingeln!")],
            parking_restrictions: vec![ParkingRestriction::EvOnly],
            images: vec![],
            last_updated: ts("2020-09-22T00:00:00Z"),
        }
    }

    fn location() -> Location {
        Location {
            country_code: CountryCode::new("DE"),
            party_id: PartyId::new("GEF"),
            id: "LOC0001".to_string(),
            publish: true,
            name: Some("ADAC Ladestation".to_string()),
            address: "Biberweg 18".to_string(),
            city: "Jena".to_string(),
            postal_code: Some("07749".to_string()),
            state: None,
            country: "DEU".to_string(),
            coordinates: GeoLocation::new("50.927054", "11.5892372"),
            parking_type: Some(ParkingType::UndergroundGarage),
            evses: vec![evse("DE*GEF*E1234*1"), evse("DE*GEF*E1234*2")],
            directions: vec![DisplayText::new("de", "Hinter dem Supermarkt")],
            operator: Some(BusinessDetails::new("Open Charging Cloud Operator")),
            suboperator: None,
            owner: None,
            facilities: vec![Facility::Cafe],
            time_zone: "Europe/Berlin".to_string(),
            charging_when_closed: Some(true),
            images: vec![],
            energy_mix: Some(EnergyMix {
                is_green_energy: true,
                energy_sources: vec![EnergySource {
                    source: EnergySourceCategory::Solar,
                    percentage: 80.0,
                }],
                environ_impact: vec![],
                supplier_name: Some("Stadtwerke Jena".to_string()),
                energy_product_name: None,
            }),
            last_updated: ts("2020-09-23T00:00:00Z"),
        }
    }

    #[test]
    fn test_patch_connector_identification_fails() {
        let original = connector("1");
        let result = original.try_patch(&json!({"id": "2"}));

        assert!(result.is_failed());
        assert!(!result.is_success());
        assert_eq!(
            result.error_response().as_deref(),
            Some("Patching the 'identification' of a connector is not allowed!")
        );
        assert_eq!(result.patched_data.id, "1");
        assert_eq!(result.patched_data, original);
    }

    #[test]
    fn test_patch_connector_invalid_standard() {
        let result = connector("1").try_patch(&json!({"standard": "I-N-V-A-L-I-D!"}));

        assert!(result.is_failed());
        assert_eq!(
            result.error_response().as_deref(),
            Some("Invalid JSON merge patch of a connector: Invalid 'connector standard'!")
        );
        assert_eq!(result.patched_data.standard, ConnectorType::Iec62196T2);
    }

    #[test]
    fn test_patch_connector_standard_sets_now() {
        let before = Utc::now();
        let result = connector("1").try_patch(&json!({"standard": "TESLA_S"}));

        assert!(result.is_success());
        assert_eq!(result.error_response(), None);
        let patched = result.patched_data;
        assert_eq!(patched.standard, ConnectorType::TeslaS);
        assert!((patched.last_updated - before).abs() < Duration::seconds(5));
    }

    #[test]
    fn test_patch_connector_explicit_last_updated() {
        let result = connector("1")
            .try_patch(&json!({"format": "CABLE", "last_updated": "2020-10-15T00:00:00Z"}));

        assert!(result.is_success());
        assert_eq!(result.patched_data.format, ConnectorFormat::Cable);
        assert_eq!(
            timestamp::format(&result.patched_data.last_updated),
            "2020-10-15T00:00:00.000Z"
        );
    }

    #[test]
    fn test_patch_connector_tariff_ids() {
        let cleared = connector("1").try_patch(&json!({"tariff_ids": null}));
        assert!(cleared.is_success());
        assert!(cleared.patched_data.tariff_ids.is_empty());

        let replaced = connector("1").try_patch(&json!({"tariff_ids": ["DE*GEF*T0099"]}));
        assert!(replaced.is_success());
        assert_eq!(replaced.patched_data.tariff_ids, vec!["DE*GEF*T0099".to_string()]);

        let wrong = connector("1").try_patch(&json!({"tariff_ids": "DE*GEF*T0099"}));
        assert_eq!(
            wrong.error_response().as_deref(),
            Some("Invalid JSON merge patch for 'tariff_ids' array of a connector: JSON property 'tariff_ids' is not an array!")
        );
        assert_eq!(wrong.patched_data, connector("1"));
    }

    #[test]
    fn test_patch_connector_invalid_last_updated_is_all_or_nothing() {
        let original = connector("1");
        let result = original.try_patch(&json!({"format": "CABLE", "last_updated": "not a timestamp"}));

        assert!(result.is_failed());
        assert_eq!(
            result.error_response().as_deref(),
            Some("Invalid JSON merge patch of a connector: Invalid 'last updated'!")
        );
        assert_eq!(result.patched_data.format, ConnectorFormat::Socket);
        assert_eq!(result.patched_data, original);
    }

    #[test]
    fn test_patch_connector_optional_scalar() {
        let result = connector("1").try_patch(&json!({"max_electric_power": null, "max_voltage": 230}));
        assert!(result.is_success());
        assert_eq!(result.patched_data.max_electric_power, None);
        assert_eq!(result.patched_data.max_voltage, 230);
    }

    #[test]
    fn test_patch_evse() {
        let original = evse("E1");

        let err = original.try_patch(&json!({"uid": "E2"}));
        assert_eq!(
            err.error_response().as_deref(),
            Some("Patching the 'unique identification' of an EVSE is not allowed!")
        );

        let err = original.try_patch(&json!({"status": "BROKEN"}));
        assert_eq!(
            err.error_response().as_deref(),
            Some("Invalid JSON merge patch of an EVSE: Invalid 'EVSE status'!")
        );

        let err = original.try_patch(&json!({"capabilities": ["RFID_READER", "TELEPORT"]}));
        assert_eq!(
            err.error_response().as_deref(),
            Some("Invalid JSON merge patch of an EVSE: Invalid 'capabilities'!")
        );

        let ok = original
            .try_patch(&json!({"status": "CHARGING", "connectors": [serde_json::to_value(connector("9")).unwrap()]}))
            .into_result()
            .unwrap();
        assert_eq!(ok.status, EvseStatus::Charging);
        assert_eq!(ok.connectors.len(), 1);
        assert_eq!(ok.connectors[0].id, "9");
    }

    #[test]
    fn test_patch_location_identity_fields() {
        let original = location();

        let cases = [
            (json!({"country_code": "FR"}), "Patching the 'country code' of a location is not allowed!"),
            (json!({"party_id": "XXX"}), "Patching the 'party identification' of a location is not allowed!"),
            (json!({"id": "LOC0002"}), "Patching the 'identification' of a location is not allowed!"),
        ];

        for (patch, message) in cases {
            let result = original.try_patch(&patch);
            assert_eq!(result.error_response().as_deref(), Some(message));
            assert_eq!(result.patched_data, original);
        }
    }

    #[test]
    fn test_patch_location_fields() {
        let patched = location()
            .try_patch(&json!({
                "name": "Neuer Name",
                "parking_type": null,
                "energy_mix": {"supplier_name": null, "is_green_energy": false},
                "directions": [],
            }))
            .into_result()
            .unwrap();

        assert_eq!(patched.name.as_deref(), Some("Neuer Name"));
        assert_eq!(patched.parking_type, None);
        let mix = patched.energy_mix.unwrap();
        assert!(!mix.is_green_energy);
        assert_eq!(mix.supplier_name, None);
        assert_eq!(mix.energy_sources.len(), 1);
        assert!(patched.directions.is_empty());
        assert_eq!(patched.evses.len(), 2);
    }

    #[test]
    fn test_location_serialization_roundtrip() {
        let original = location();
        let json = serde_json::to_string(&original).unwrap();
        let parsed: Location = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, original);
        assert_eq!(parsed.evses[1].connectors[1], original.evses[1].connectors[1]);
        assert_eq!(parsed.directions, original.directions);
        assert_eq!(parsed.energy_mix, original.energy_mix);
    }

    #[test]
    fn test_with_evse_and_connector() {
        let original = location();

        let mut connector = connector("3");
        connector.last_updated = ts("2021-01-01T00:00:00Z");
        let (evse, created) = original.evses[0].with_connector(connector);
        assert!(created);
        assert_eq!(evse.connectors.len(), 3);
        assert_eq!(evse.last_updated, ts("2021-01-01T00:00:00Z"));

        let (location, created) = original.with_evse(evse);
        assert!(!created);
        assert_eq!(location.evses.len(), 2);
        assert_eq!(location.last_updated, ts("2021-01-01T00:00:00Z"));
        assert!(location.evse("DE*GEF*E1234*1").unwrap().connector("3").is_some());
    }
}
