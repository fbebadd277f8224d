use std::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One of the three components of a trip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Leg {
    Onward,
    Return,
    Hotel,
}

impl Leg {
    pub const ALL: [Leg; 3] = [Self::Onward, Self::Return, Self::Hotel];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Onward => "Onward",
            Self::Return => "Return",
            Self::Hotel => "Hotel",
        }
    }

    /// Prefix used by the backend for per-leg form fields (`onward_file`, `hotel_amount`).
    pub fn field_prefix(&self) -> &'static str {
        match self {
            Self::Onward => "onward",
            Self::Return => "return",
            Self::Hotel => "hotel",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "onward" => Some(Self::Onward),
            "return" => Some(Self::Return),
            "hotel" => Some(Self::Hotel),
            _ => None,
        }
    }
}

impl std::fmt::Display for Leg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportMode {
    Flight,
    Train,
    Hotel,
}

const CARRIER_KEYS: &[&str] = &["airline", "name", "train_name", "hotel_name"];
const CODE_KEYS: &[&str] = &["flight_code", "train_number", "route"];
const ORIGIN_KEYS: &[&str] = &["from", "origin"];
const DESTINATION_KEYS: &[&str] = &["to", "destination"];
const DEPARTURE_KEYS: &[&str] = &["departure", "departure_time", "time"];
const ARRIVAL_KEYS: &[&str] = &["arrival", "arrival_time"];
const CLASS_KEYS: &[&str] = &["class", "travel_class"];
const PRICE_KEYS: &[&str] = &["price", "fare", "cost"];
const NIGHTLY_RATE_KEYS: &[&str] = &["cost_per_night", "price", "rate"];
const RATING_KEYS: &[&str] = &["rating", "star_rating"];
const LOCATION_KEYS: &[&str] = &["location", "address", "city"];
const TRAIN_MARKERS: &[&str] = &["train_number", "train_name"];
const HOTEL_MARKERS: &[&str] = &["hotel_name", "cost_per_night", "cost_total", "star_rating", "stars"];

/// A backend-supplied candidate offer, normalized once at ingestion.
///
/// The backend sends loosely-typed maps whose field names vary by transport
/// mode. Every known alias is resolved here so callers never probe the raw
/// map. The raw map is preserved and is what gets serialized back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct TravelOption {
    raw: Map<String, Value>,
    pub mode: TransportMode,
    pub carrier: Option<String>,
    pub code: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub departure: Option<String>,
    pub arrival: Option<String>,
    pub duration_minutes: Option<u32>,
    pub travel_class: Option<String>,
    pub price: Option<Decimal>,
    pub nightly_rate: Option<Decimal>,
    pub total_cost: Option<Decimal>,
    pub rating: Option<String>,
    pub stars: Option<u8>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl TravelOption {
    pub fn from_raw(raw: Map<String, Value>) -> Self {
        let mode = if has_any(&raw, TRAIN_MARKERS) {
            TransportMode::Train
        } else if has_any(&raw, HOTEL_MARKERS) {
            TransportMode::Hotel
        } else {
            TransportMode::Flight
        };

        Self {
            mode,
            carrier: text_field(&raw, CARRIER_KEYS),
            code: text_field(&raw, CODE_KEYS),
            origin: text_field(&raw, ORIGIN_KEYS),
            destination: text_field(&raw, DESTINATION_KEYS),
            departure: text_field(&raw, DEPARTURE_KEYS),
            arrival: text_field(&raw, ARRIVAL_KEYS),
            duration_minutes: decimal_field(&raw, &["duration_minutes"])
                .and_then(|value| value.to_u32()),
            travel_class: text_field(&raw, CLASS_KEYS),
            price: decimal_field(&raw, PRICE_KEYS),
            nightly_rate: decimal_field(&raw, NIGHTLY_RATE_KEYS),
            total_cost: decimal_field(&raw, &["cost_total"]),
            rating: text_field(&raw, RATING_KEYS),
            stars: decimal_field(&raw, &["stars"]).and_then(|value| value.to_u8()),
            location: text_field(&raw, LOCATION_KEYS),
            notes: text_field(&raw, &["notes"]),
            raw,
        }
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    /// Carrier or hotel name, falling back to a positional label.
    pub fn display_name(&self, index: usize) -> String {
        match (&self.carrier, self.mode) {
            (Some(carrier), _) => carrier.clone(),
            (None, TransportMode::Hotel) => format!("Hotel {}", index + 1),
            (None, _) => format!("Option {}", index + 1),
        }
    }

    pub fn route_label(&self) -> Option<String> {
        if let Some(code) = &self.code {
            return Some(code.clone());
        }
        match (&self.origin, &self.destination) {
            (None, None) => None,
            (origin, destination) => Some(format!(
                "{} → {}",
                origin.as_deref().unwrap_or("?"),
                destination.as_deref().unwrap_or("?")
            )),
        }
    }

    pub fn duration_label(&self) -> Option<String> {
        self.duration_minutes.map(|minutes| format!("{}h {}m", minutes / 60, minutes % 60))
    }
}

impl From<Map<String, Value>> for TravelOption {
    fn from(raw: Map<String, Value>) -> Self {
        Self::from_raw(raw)
    }
}

impl From<TravelOption> for Map<String, Value> {
    fn from(option: TravelOption) -> Self {
        option.raw
    }
}

fn has_any(raw: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter().any(|key| raw.get(*key).is_some_and(|value| !value.is_null()))
}

fn text_field(raw: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match raw.get(*key) {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text.clone()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn decimal_field(raw: &Map<String, Value>, keys: &[&str]) -> Option<Decimal> {
    keys.iter().find_map(|key| match raw.get(*key) {
        Some(Value::Number(number)) => parse_decimal(&number.to_string())
            .or_else(|| number.as_f64().and_then(Decimal::from_f64)),
        Some(Value::String(text)) => parse_decimal(text.trim()),
        _ => None,
    })
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text).or_else(|_| Decimal::from_scientific(text)).ok()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::{json, Value};

    use super::{Leg, TransportMode, TravelOption};

    fn option(value: Value) -> TravelOption {
        serde_json::from_value(value).expect("option map")
    }

    #[test]
    fn flight_fields_resolve_through_aliases() {
        let flight = option(json!({
            "airline": "IndiGo",
            "flight_code": "6E-201",
            "origin": "SUR",
            "destination": "DEL",
            "departure": "2026-03-01T06:10:00Z",
            "arrival": "2026-03-01T08:05:00Z",
            "duration_minutes": 115,
            "class": "Economy",
            "fare": 4_250
        }));

        assert_eq!(flight.mode, TransportMode::Flight);
        assert_eq!(flight.carrier.as_deref(), Some("IndiGo"));
        assert_eq!(flight.route_label().as_deref(), Some("6E-201"));
        assert_eq!(flight.price, Some(Decimal::new(4_250, 0)));
        assert_eq!(flight.duration_label().as_deref(), Some("1h 55m"));
        assert_eq!(flight.travel_class.as_deref(), Some("Economy"));
    }

    #[test]
    fn train_is_detected_and_numeric_strings_are_accepted() {
        let train = option(json!({
            "train_name": "Rajdhani Express",
            "train_number": "12951",
            "from": "BCT",
            "to": "NDLS",
            "price": "1890.50",
            "travel_class": "3A"
        }));

        assert_eq!(train.mode, TransportMode::Train);
        assert_eq!(train.price, Some(Decimal::new(189_050, 2)));
        assert_eq!(train.code.as_deref(), Some("12951"));
        assert_eq!(train.display_name(0), "Rajdhani Express");
    }

    #[test]
    fn hotel_keeps_nightly_rate_and_total_separate() {
        let hotel = option(json!({
            "hotel_name": "Lakeside Inn",
            "city": "Udaipur",
            "cost_per_night": 3_000,
            "cost_total": 9_000,
            "star_rating": 4.5,
            "stars": 4
        }));

        assert_eq!(hotel.mode, TransportMode::Hotel);
        assert_eq!(hotel.nightly_rate, Some(Decimal::new(3_000, 0)));
        assert_eq!(hotel.total_cost, Some(Decimal::new(9_000, 0)));
        assert_eq!(hotel.rating.as_deref(), Some("4.5"));
        assert_eq!(hotel.stars, Some(4));
        assert_eq!(hotel.location.as_deref(), Some("Udaipur"));
    }

    #[test]
    fn missing_names_fall_back_to_positional_labels() {
        let bare = option(json!({ "origin": "BOM" }));
        assert_eq!(bare.display_name(2), "Option 3");
        assert_eq!(bare.route_label().as_deref(), Some("BOM → ?"));

        let hotel = option(json!({ "cost_total": 100 }));
        assert_eq!(hotel.display_name(0), "Hotel 1");
    }

    #[test]
    fn serialization_preserves_the_backend_record() {
        let raw = json!({ "airline": "Vistara", "price": 500, "extra": { "baggage": "15kg" } });
        let encoded = serde_json::to_value(option(raw.clone())).expect("encode option");
        assert_eq!(encoded, raw);
    }

    #[test]
    fn leg_parsing_is_case_insensitive() {
        assert_eq!(Leg::parse("ONWARD"), Some(Leg::Onward));
        assert_eq!(Leg::parse(" hotel "), Some(Leg::Hotel));
        assert_eq!(Leg::parse("layover"), None);
        assert_eq!(Leg::Return.field_prefix(), "return");
    }
}
