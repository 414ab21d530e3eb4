//! Lenient deserializers for fields the editor writes as strings.
//!
//! The route editor stores status codes and delays as whatever its form
//! controls produced (`"200"`, `200`, `"250"`), so these accept both shapes.

use serde::de::Error;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

/// `"404"` or `404` -> `"404"`. `null` becomes an empty string.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<StringOrNumber>::deserialize(deserializer)?;
    Ok(value.map(StringOrNumber::into_string).unwrap_or_default())
}

pub fn string_or_number_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<StringOrNumber>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .map(StringOrNumber::into_string)
        .collect())
}

/// Milliseconds as a number or numeric string. Blank and `null` mean zero.
pub fn millis<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<StringOrNumber>::deserialize(deserializer)? {
        None => Ok(0),
        Some(StringOrNumber::Number(n)) => n.as_u64().ok_or_else(|| {
            D::Error::custom(format!("delay must be a non-negative integer, got {n}"))
        }),
        Some(StringOrNumber::String(s)) if s.trim().is_empty() => Ok(0),
        Some(StringOrNumber::String(s)) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| {
                D::Error::custom(format!("delay must be a non-negative integer, got {s:?}"))
            }),
    }
}

/// Treats `""` (what the editor saves for a cleared input) as absent.
pub fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
