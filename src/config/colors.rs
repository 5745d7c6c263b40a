//! Colour configuration.
//!
//! Colours are indices into the terminal's 256-colour palette. The remap
//! table rewrites any index, both for feed colours and for the fixed
//! secondary/highlight colours.

use std::collections::HashMap;

use serde::{de, Deserialize, Deserializer};

pub const SECONDARY_TEXT: u8 = 7;
pub const HIGHLIGHT: u8 = 10;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    #[serde(deserialize_with = "deserialize_remap")]
    pub remap: HashMap<u8, u8>,
}

impl ColorConfig {
    pub fn map(&self, index: u8) -> u8 {
        self.remap.get(&index).copied().unwrap_or(index)
    }

    pub fn secondary_text(&self) -> u8 {
        self.map(SECONDARY_TEXT)
    }

    pub fn highlight(&self) -> u8 {
        self.map(HIGHLIGHT)
    }
}

/// TOML table keys are strings, so `{ "7" = 245 }` is read as string keys
/// and parsed here.
fn deserialize_remap<'de, D>(deserializer: D) -> Result<HashMap<u8, u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, u8>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, value)| {
            parse_color_index(&key)
                .map(|index| (index, value))
                .map_err(de::Error::custom)
        })
        .collect()
}

/// Parse a palette index in `0..=255`.
pub fn parse_color_index(s: &str) -> Result<u8, String> {
    s.trim()
        .parse::<u8>()
        .map_err(|_| format!("Invalid color index: {}", s))
}
