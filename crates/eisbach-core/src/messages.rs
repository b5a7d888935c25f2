//! Status message sets shown while data sources are loading.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Rotation interval for generic loading messages.
pub const LOADING_INTERVAL: Duration = Duration::from_millis(2500);

/// Rotation interval for the water-temperature messages.
pub const TEMPERATURE_INTERVAL: Duration = Duration::from_secs(3);

/// Display language of status messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => f.write_str("en"),
            Locale::Es => f.write_str("es"),
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "es" => Ok(Locale::Es),
            other => Err(format!("unsupported locale '{other}' (expected en or es)")),
        }
    }
}

/// Which data source a message set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageSet {
    WaterLevel,
    WaterHistory,
    WaterTemperature,
    Surfers,
    Prediction,
}

impl MessageSet {
    /// Messages for this source in `locale`.
    pub fn messages(self, locale: Locale) -> Vec<String> {
        let set: &[&str] = match (self, locale) {
            (MessageSet::WaterLevel, Locale::En) => &[
                "🌊 Checking the wave...",
                "📏 Measuring the Eisbach...",
                "💧 Asking the river how it feels...",
            ],
            (MessageSet::WaterLevel, Locale::Es) => &[
                "🌊 Revisando la ola...",
                "📏 Midiendo el Eisbach...",
                "💧 Preguntándole al río cómo está...",
            ],
            (MessageSet::WaterHistory, Locale::En) => &[
                "📜 Digging through the archives...",
                "📈 Plotting the ups and downs...",
                "🗓️ Remembering the last few days...",
            ],
            (MessageSet::WaterHistory, Locale::Es) => &[
                "📜 Buscando en los archivos...",
                "📈 Dibujando las subidas y bajadas...",
                "🗓️ Recordando los últimos días...",
            ],
            (MessageSet::WaterTemperature, Locale::En) => &[
                "🌐 Contacting the Bavarian Water Lords...",
                "📡 Negotiating cookie treaties...",
                "📬 Enqueueing top-secret data packet...",
                "🔄 Waiting for temperature to be deemed worthy...",
                "📦 Unzipping meteorological mysteries...",
                "📊 Decoding aquatic runes...",
                "🌡️ Extracting the sacred temperature...",
                "🧊 Counting water molecules...",
                "🐟 Interviewing local fish...",
            ],
            (MessageSet::WaterTemperature, Locale::Es) => &[
                "🌐 Contactando a los Señores del Agua de Baviera...",
                "📡 Negociando tratados de cookies...",
                "📬 Encolando un paquete de datos ultrasecreto...",
                "🔄 Esperando a que la temperatura sea digna...",
                "📦 Descomprimiendo misterios meteorológicos...",
                "📊 Descifrando runas acuáticas...",
                "🌡️ Extrayendo la temperatura sagrada...",
                "🧊 Contando moléculas de agua...",
                "🐟 Entrevistando a los peces locales...",
            ],
            (MessageSet::Surfers, Locale::En) => &[
                "🏄 Counting surfers...",
                "👀 Scanning the lineup...",
                "📋 Reading the logbook...",
            ],
            (MessageSet::Surfers, Locale::Es) => &[
                "🏄 Contando surfistas...",
                "👀 Mirando la fila...",
                "📋 Leyendo el registro...",
            ],
            (MessageSet::Prediction, Locale::En) => &[
                "🔮 Consulting the crystal wave...",
                "🤖 Crunching the numbers...",
                "☀️ Checking the weather...",
            ],
            (MessageSet::Prediction, Locale::Es) => &[
                "🔮 Consultando la ola de cristal...",
                "🤖 Haciendo cálculos...",
                "☀️ Mirando el tiempo...",
            ],
        };
        set.iter().map(|m| m.to_string()).collect()
    }

    /// Rotation interval for this source.
    pub fn interval(self) -> Duration {
        match self {
            MessageSet::WaterTemperature => TEMPERATURE_INTERVAL,
            _ => LOADING_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [MessageSet; 5] = [
        MessageSet::WaterLevel,
        MessageSet::WaterHistory,
        MessageSet::WaterTemperature,
        MessageSet::Surfers,
        MessageSet::Prediction,
    ];

    #[test]
    fn test_locales_have_matching_lengths() {
        for set in ALL {
            let en = set.messages(Locale::En);
            let es = set.messages(Locale::Es);
            assert!(!en.is_empty(), "{set:?}");
            assert_eq!(en.len(), es.len(), "{set:?}");
            assert_ne!(en, es, "{set:?}");
        }
    }

    #[test]
    fn test_temperature_messages() {
        let messages = MessageSet::WaterTemperature.messages(Locale::En);
        assert_eq!(messages.len(), 9);
        assert_eq!(messages[0], "🌐 Contacting the Bavarian Water Lords...");
        assert_eq!(MessageSet::WaterTemperature.interval(), Duration::from_secs(3));
        assert_eq!(MessageSet::Surfers.interval(), Duration::from_millis(2500));
    }

    #[test]
    fn test_locale_parse_and_display() {
        assert_eq!("ES".parse::<Locale>().unwrap(), Locale::Es);
        assert_eq!(" en ".parse::<Locale>().unwrap(), Locale::En);
        assert!("de".parse::<Locale>().is_err());
        assert_eq!(Locale::Es.to_string(), "es");
    }

    #[test]
    fn test_locale_serde() {
        let json = serde_json::to_string(&Locale::Es).unwrap();
        assert_eq!(json, "\"es\"");
        let locale: Locale = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(locale, Locale::En);
    }
}
