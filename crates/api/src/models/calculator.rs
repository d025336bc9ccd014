//! Event-budget calculator configuration.
//!
//! Stored as one JSON document in `system_config`. Only the fields the API
//! validates are typed; anything else the admin UI sends is kept verbatim.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `system_config` key holding the calculator document.
pub const CALCULATOR_CONFIG_KEY: &str = "advancedCalculatorConfig";

/// How much sound or lighting a part of an event needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceLevel {
    None,
    Basic,
    Intermediate,
    Professional,
    Premium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPart {
    pub id: String,
    pub name: String,
    /// Hours.
    #[serde(default)]
    pub default_duration: f64,
    pub sound_level: ServiceLevel,
    pub lighting_level: ServiceLevel,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventType {
    pub id: String,
    pub name: String,
    /// Scales the whole budget for this kind of event.
    pub multiplier: f64,
    #[serde(default)]
    pub parts: Vec<EventPart>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Price of each service level, in euros.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServicePrices {
    pub basic: f64,
    pub intermediate: f64,
    pub professional: f64,
    pub premium: f64,
}

impl ServicePrices {
    fn is_valid(&self) -> bool {
        [self.basic, self.intermediate, self.professional, self.premium]
            .iter()
            .all(|p| p.is_finite() && *p >= 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServicePriceTable {
    pub sound: ServicePrices,
    pub lighting: ServicePrices,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorConfig {
    pub event_types: Vec<EventType>,
    pub service_prices: ServicePriceTable,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CalculatorConfig {
    /// Check the document before it replaces the stored one.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.event_types.is_empty() {
            return Err("at least one event type is required".to_owned());
        }
        let mut seen = HashSet::new();
        for event in &self.event_types {
            if event.id.trim().is_empty() || event.name.trim().is_empty() {
                return Err("event types need an id and a name".to_owned());
            }
            if !seen.insert(event.id.as_str()) {
                return Err(format!("duplicate event type id '{}'", event.id));
            }
            if !event.multiplier.is_finite() || event.multiplier <= 0.0 {
                return Err(format!(
                    "event type '{}' has a non-positive multiplier",
                    event.id
                ));
            }
            if let Some(part) = event
                .parts
                .iter()
                .find(|p| !p.default_duration.is_finite() || p.default_duration < 0.0)
            {
                return Err(format!(
                    "part '{}' of '{}' has a negative duration",
                    part.id, event.id
                ));
            }
        }
        if !self.service_prices.sound.is_valid() || !self.service_prices.lighting.is_valid() {
            return Err("service prices must be non-negative".to_owned());
        }
        Ok(())
    }
}

fn part(id: &str, name: &str, hours: f64, sound: ServiceLevel, lighting: ServiceLevel) -> EventPart {
    EventPart {
        id: id.to_owned(),
        name: name.to_owned(),
        default_duration: hours,
        sound_level: sound,
        lighting_level: lighting,
        extra: Map::new(),
    }
}

fn event(id: &str, name: &str, multiplier: f64, parts: Vec<EventPart>) -> EventType {
    EventType {
        id: id.to_owned(),
        name: name.to_owned(),
        multiplier,
        parts,
        extra: Map::new(),
    }
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        use ServiceLevel::{Basic, Intermediate, None, Premium, Professional};

        Self {
            event_types: vec![
                event(
                    "boda",
                    "Boda",
                    1.5,
                    vec![
                        part("ceremony", "Ceremonia", 1.0, Professional, Basic),
                        part("cocktail", "Cóctel", 2.0, Intermediate, Intermediate),
                        part("banquet", "Banquete", 4.0, Professional, Professional),
                        part("disco", "Disco/Fiesta", 4.0, Premium, Premium),
                    ],
                ),
                event(
                    "conferencia",
                    "Conferencia",
                    1.2,
                    vec![
                        part("registration", "Registro", 1.0, None, Basic),
                        part("presentations", "Ponencias", 3.0, Professional, Professional),
                        part("coffee-break", "Coffee Break", 0.5, Basic, Basic),
                    ],
                ),
                event(
                    "concierto",
                    "Concierto",
                    1.8,
                    vec![
                        part("soundcheck", "Prueba de Sonido", 2.0, Premium, Professional),
                        part("concert", "Concierto", 3.0, Premium, Premium),
                    ],
                ),
                event(
                    "fiesta",
                    "Fiesta Privada",
                    1.0,
                    vec![
                        part("setup", "Montaje", 1.0, Intermediate, Intermediate),
                        part("party", "Fiesta", 4.0, Professional, Professional),
                    ],
                ),
                event(
                    "otro",
                    "Otro",
                    1.0,
                    vec![part("event", "Evento", 3.0, Intermediate, Intermediate)],
                ),
            ],
            service_prices: ServicePriceTable {
                sound: ServicePrices {
                    basic: 100.0,
                    intermediate: 200.0,
                    professional: 350.0,
                    premium: 600.0,
                },
                lighting: ServicePrices {
                    basic: 80.0,
                    intermediate: 150.0,
                    professional: 280.0,
                    premium: 500.0,
                },
            },
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(CalculatorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let json = serde_json::json!({
            "eventTypes": [{
                "id": "boda",
                "name": "Boda",
                "icon": "💒",
                "multiplier": 1.5,
                "parts": []
            }],
            "servicePrices": {
                "sound": { "basic": 1, "intermediate": 2, "professional": 3, "premium": 4 },
                "lighting": { "basic": 1, "intermediate": 2, "professional": 3, "premium": 4 }
            },
            "packRecommendations": { "boda": [1, 2] }
        });
        let config: CalculatorConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.event_types[0].extra["icon"], "💒");

        let back = serde_json::to_value(&config).unwrap();
        assert_eq!(back["packRecommendations"]["boda"][1], 2);
        assert_eq!(back["eventTypes"][0]["icon"], "💒");
    }

    #[test]
    fn test_validate_rejects_bad_documents() {
        let mut config = CalculatorConfig::default();
        config.event_types.clear();
        assert!(config.validate().is_err());

        let mut config = CalculatorConfig::default();
        let dup = config.event_types[0].clone();
        config.event_types.push(dup);
        assert!(config.validate().unwrap_err().contains("duplicate"));

        let mut config = CalculatorConfig::default();
        config.event_types[0].multiplier = 0.0;
        assert!(config.validate().is_err());

        let mut config = CalculatorConfig::default();
        config.service_prices.lighting.basic = -1.0;
        assert!(config.validate().is_err());
    }
}
