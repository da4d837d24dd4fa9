//! Lenient deserializers for records written by the catalog service.
//!
//! Records edited through older forms may carry numbers as strings (`"10"`) or an
//! empty string for an unset price, timestamps the service formatted itself, `null`
//! text fields, and units in any letter case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use super::Unit;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn parse_text<E: serde::de::Error>(text: &str) -> Result<Option<f64>, E> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| E::custom(format!("invalid number: {:?}", text)))
}

pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(text) => {
            parse_text(&text)?.ok_or_else(|| serde::de::Error::custom("empty number"))
        }
    }
}

pub fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(text)) => parse_text(&text),
    }
}

/// Unparseable timestamps are treated as missing; they only affect recency sorting.
pub fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|text| {
        DateTime::parse_from_rfc3339(&text)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }))
}

/// `null` reads as an empty string.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Units match case-insensitively; anything unrecognized reads as the default unit.
pub fn unit<'de, D>(deserializer: D) -> Result<Unit, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_unit(deserializer)?.unwrap_or_default())
}

pub fn optional_unit<'de, D>(deserializer: D) -> Result<Option<Unit>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|text| text.trim().parse::<Unit>().ok()))
}
