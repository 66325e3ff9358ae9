// src/format.rs
use chrono::{DateTime, Utc};
use num_format::{Locale, ToFormattedString};

/// How a metric's values read on the axis and in tooltips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// Integer with thousands separators: `12,345`.
    Count,
    /// Dollar amount with K/M suffix: `$12K`.
    Currency,
    /// K/M suffix without currency: `12K`.
    Compact,
}

impl ValueFormat {
    pub fn format(self, value: f64) -> String {
        match self {
            ValueFormat::Count => format_count(value),
            ValueFormat::Currency => format!("${}", format_number(Some(value))),
            ValueFormat::Compact => format_number(Some(value)),
        }
    }
}

/// Half-up rounding (`-2.5` rounds to `-2`), matching what the listing UI shows.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// `1234567` -> `1,234,567`.
pub fn format_count(value: f64) -> String {
    (round_half_up(value) as i64).to_formatted_string(&Locale::en)
}

/// Compact K/M rendering used for volume, buyers and tooltips.
pub fn format_number(value: Option<f64>) -> String {
    match value {
        Some(n) if n.is_finite() => {
            if n > 1e6 {
                format!("{}M", round_half_up(n / 1e6))
            } else if n > 1e3 {
                format!("{}K", round_half_up(n / 1e3))
            } else {
                format_count(n)
            }
        }
        _ => "-".to_string(),
    }
}

/// Market cap column: whole K/M, plain integers below a thousand.
pub fn format_market_cap(value: Option<f64>) -> String {
    match value {
        Some(n) if n.is_finite() => {
            if n.abs() >= 1e6 {
                format!("{}M", round_half_up(n / 1e6))
            } else if n.abs() >= 1e3 {
                format!("{}K", round_half_up(n / 1e3))
            } else {
                (n.floor() as i64).to_formatted_string(&Locale::en)
            }
        }
        _ => "-".to_string(),
    }
}

/// Y-axis ticks: `1M`, `250k`, `42`.
pub fn format_chart_axis(value: f64) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    if value.abs() >= 1e6 {
        format!("{}M", round_half_up(value / 1e6))
    } else if value.abs() >= 1e3 {
        format!("{}k", round_half_up(value / 1e3))
    } else if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value:.2}")
    }
}

pub fn format_liquidity(percent: Option<f64>) -> String {
    match percent {
        Some(p) if p.is_finite() => format!("{}%", round_half_up(p)),
        _ => "-".to_string(),
    }
}

/// `1 token`, `3 tokens`.
pub fn pluralize(count_text: &str, value: f64, noun: &str) -> String {
    if value == 1.0 {
        format!("{count_text} {noun}")
    } else {
        format!("{count_text} {noun}s")
    }
}

fn unit(n: i64, name: &str) -> String {
    if n == 1 {
        format!("{n} {name} ago")
    } else {
        format!("{n} {name}s ago")
    }
}

/// Relative creation time: `3 hours ago`, `2 months ago`, `just now`.
pub fn time_ago(created: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(created) = created else {
        return "-".to_string();
    };
    let diff = now.signed_duration_since(created);
    let minutes = diff.num_minutes();
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 30 {
        unit(days / 30, "month")
    } else if days > 0 {
        unit(days, "day")
    } else if hours > 0 {
        unit(hours, "hour")
    } else if minutes > 0 {
        unit(minutes, "minute")
    } else {
        "just now".to_string()
    }
}
