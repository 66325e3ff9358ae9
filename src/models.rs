// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::parser;

/// A loosely typed scalar: the listing API sends numbers both as JSON
/// numbers and as strings, and occasionally something else entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
    Other(Value),
}

impl Numeric {
    /// Float reading of the value; `None` when it cannot be read as a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Numeric::Number(n) if n.is_finite() => Some(*n),
            Numeric::Number(_) => None,
            Numeric::Text(s) => parser::parse_float(s),
            Numeric::Other(_) => None,
        }
    }

    /// Integer reading (truncated toward zero).
    pub fn as_int(&self) -> Option<f64> {
        match self {
            Numeric::Text(s) => parser::parse_int(s),
            other => other.as_f64().map(f64::trunc),
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Numeric::Number(ms) if ms.is_finite() => parser::timestamp_from_millis(*ms as i64),
            Numeric::Text(s) => parser::parse_timestamp(s),
            _ => None,
        }
    }
}

/// Scalars become their text form; null, arrays and objects become `None`.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

/// A token record as returned by the listing API. A field with an
/// unexpected type is read as absent instead of failing the whole page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub ticker: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    pub created_at: Option<Numeric>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub creator: Option<String>,

    pub volume24h: Option<Numeric>,
    pub volume: Option<Numeric>,

    #[serde(rename = "marketCapUSD")]
    pub market_cap_usd: Option<Numeric>,
    pub market_cap: Option<Numeric>,

    pub holders: Option<Numeric>,
    pub holder_count: Option<Numeric>,

    pub liquidity: Option<Numeric>,
    pub liquidity_percent: Option<Numeric>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub mint: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub contract_address: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub image: Option<String>,

    /// Every field not modelled above, kept for sorting by arbitrary keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `GET /api/tokens`.
#[derive(Debug, Default, Deserialize)]
pub struct TokenPage {
    #[serde(default)]
    pub tokens: Vec<Token>,
}

impl Token {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_ref().and_then(Numeric::as_timestamp)
    }

    /// Trailing 24h volume; `volume24h` wins over `volume` when present.
    /// Unreadable values count as 0.
    pub fn volume_value(&self) -> f64 {
        self.volume24h
            .as_ref()
            .or(self.volume.as_ref())
            .and_then(Numeric::as_f64)
            .unwrap_or(0.0)
    }

    pub fn market_cap_value(&self) -> f64 {
        self.market_cap_usd
            .as_ref()
            .or(self.market_cap.as_ref())
            .and_then(Numeric::as_f64)
            .unwrap_or(0.0)
    }

    pub fn holders_value(&self) -> f64 {
        self.holders
            .as_ref()
            .or(self.holder_count.as_ref())
            .and_then(Numeric::as_int)
            .unwrap_or(0.0)
    }

    /// Liquidity as a percentage of market cap: the explicit field when it
    /// reads as a number, otherwise `liquidity / marketCapUSD * 100` when the
    /// market cap is positive.
    pub fn liquidity_percent(&self) -> Option<f64> {
        if let Some(explicit) = &self.liquidity_percent {
            return explicit.as_f64();
        }

        let liquidity = self.liquidity.as_ref()?.as_f64()?;
        let market_cap = self.market_cap_usd.as_ref()?.as_f64()?;
        (market_cap > 0.0).then(|| liquidity / market_cap * 100.0)
    }

    /// On-chain address shown in the contract column.
    pub fn address(&self) -> &str {
        self.mint
            .as_deref()
            .or(self.contract_address.as_deref())
            .unwrap_or(&self.id)
    }
}
