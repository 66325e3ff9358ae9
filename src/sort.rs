// src/sort.rs
use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use crate::models::{Numeric, Token};
use crate::parser;

/// Synthetic key: explicit `liquidityPercent` or one derived from
/// `liquidity / marketCapUSD`.
pub const LIQUIDITY_PERCENT: &str = "liquidityPercent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn describe(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ascending",
            SortDirection::Desc => "descending",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// A value a token can be ordered by.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Number(f64),
    Text(String),
}

impl SortValue {
    /// Numeric strings such as `"200"` order as numbers.
    fn from_numeric(value: &Numeric) -> Option<Self> {
        match value {
            Numeric::Number(n) => Some(SortValue::Number(*n)),
            Numeric::Text(s) => Some(match parser::parse_float(s) {
                Some(n) => SortValue::Number(n),
                None => SortValue::Text(s.clone()),
            }),
            Numeric::Other(v) => Self::from_json(v),
        }
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(SortValue::Number),
            Value::String(s) => Some(SortValue::Text(s.clone())),
            Value::Bool(b) => Some(SortValue::Number(if *b { 1.0 } else { 0.0 })),
            _ => None,
        }
    }

    /// Ascending order. Strings compare case-insensitively first, and
    /// numbers order before strings.
    pub fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
            (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
        }
    }
}

impl Token {
    /// Value of the field named `key` as the API spells it, `None` when
    /// the field is missing or null.
    pub fn sort_value(&self, key: &str) -> Option<SortValue> {
        let text = |s: &Option<String>| s.as_ref().map(|s| SortValue::Text(s.clone()));
        let numeric = |n: &Option<Numeric>| n.as_ref().and_then(SortValue::from_numeric);

        match key {
            LIQUIDITY_PERCENT => self.liquidity_percent().map(SortValue::Number),
            "createdAt" => self
                .created_at()
                .map(|at| SortValue::Number(at.timestamp_millis() as f64)),
            "id" => Some(SortValue::Text(self.id.clone())),
            "name" => text(&self.name),
            "ticker" => text(&self.ticker),
            "status" => text(&self.status),
            "creator" => text(&self.creator),
            "mint" => text(&self.mint),
            "contractAddress" => text(&self.contract_address),
            "image" => text(&self.image),
            "volume24h" => numeric(&self.volume24h),
            "volume" => numeric(&self.volume),
            "marketCapUSD" => numeric(&self.market_cap_usd),
            "marketCap" => numeric(&self.market_cap),
            "holders" => numeric(&self.holders),
            "holderCount" => numeric(&self.holder_count),
            "liquidity" => numeric(&self.liquidity),
            other => self.extra.get(other).and_then(SortValue::from_json),
        }
    }
}

/// Order two optional keys. Missing keys lose in both directions.
pub fn compare_keys(
    a: Option<&SortValue>,
    b: Option<&SortValue>,
    direction: SortDirection,
) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ordering = a.compare(b);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
    }
}

/// Stable sort of `tokens` by `key`; the input is left untouched.
pub fn sort_tokens<'a>(tokens: &'a [Token], key: &str, direction: SortDirection) -> Vec<&'a Token> {
    let mut keyed: Vec<(Option<SortValue>, &Token)> =
        tokens.iter().map(|t| (t.sort_value(key), t)).collect();

    keyed.sort_by(|(a, _), (b, _)| compare_keys(a.as_ref(), b.as_ref(), direction));

    keyed.into_iter().map(|(_, t)| t).collect()
}

/// Active table column and direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub key: String,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Same key flips the direction, a new key starts descending.
    pub fn select(&mut self, key: &str) {
        if self.key == key {
            self.direction = self.direction.flipped();
        } else {
            self.key = key.to_string();
            self.direction = SortDirection::Desc;
        }
    }

    /// Header arrow for `key`: `▲`, `▼`, or nothing for inactive columns.
    pub fn indicator(&self, key: &str) -> &'static str {
        if self.key != key {
            return "";
        }
        match self.direction {
            SortDirection::Asc => " ▲",
            SortDirection::Desc => " ▼",
        }
    }

    pub fn apply<'a>(&self, tokens: &'a [Token]) -> Vec<&'a Token> {
        sort_tokens(tokens, &self.key, self.direction)
    }
}

impl fmt::Display for SortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.key, self.direction.describe())
    }
}
