// src/aggregator.rs
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::format::{self, ValueFormat};
use crate::models::Token;
use crate::timeline::{Timeline, BUCKETS};

/// Chart metric, one per dashboard tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Tokens,
    Creators,
    Volume,
    MarketCap,
    Buyers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Hourly,
    Cumulative,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Tokens,
        Metric::Creators,
        Metric::Volume,
        Metric::MarketCap,
        Metric::Buyers,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Tokens => "tokens",
            Metric::Creators => "creators",
            Metric::Volume => "volume",
            Metric::MarketCap => "marketcap",
            Metric::Buyers => "buyers",
        }
    }

    pub fn tab_label(self) -> &'static str {
        match self {
            Metric::Tokens => "Tokens Created",
            Metric::Creators => "Unique Creators",
            Metric::Volume => "Volume",
            Metric::MarketCap => "Market Cap",
            Metric::Buyers => "Buyers",
        }
    }

    pub fn value_format(self) -> ValueFormat {
        match self {
            Metric::Tokens | Metric::Creators => ValueFormat::Count,
            Metric::Volume | Metric::MarketCap => ValueFormat::Currency,
            Metric::Buyers => ValueFormat::Compact,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Metric::Volume | Metric::MarketCap => "Last 24 Hours (Hourly)",
            _ => "Last 24 Hours",
        }
    }

    /// One-line explanation shown under the chart.
    pub fn description(self) -> &'static str {
        match self {
            Metric::Tokens => {
                "Number of tokens created in each hour over the last 24 hours."
            }
            Metric::Creators => {
                "Number of unique creators who launched tokens in each hour over the last 24 hours."
            }
            Metric::Volume => {
                "Estimated trading volume per hour: 1/24th of the daily volume of tokens created in that hour."
            }
            Metric::MarketCap => "Combined market cap of the tokens created in each hour.",
            Metric::Buyers => {
                "Total buyers/holders across all tokens that existed at the start of each hour."
            }
        }
    }

    /// Whether cumulative mode replaces the series with its running total.
    /// Distinct-creator counts and market caps are not additive across hours.
    pub fn accumulates(self) -> bool {
        matches!(self, Metric::Tokens | Metric::Volume | Metric::Buyers)
    }

    /// Tooltip text for one data point.
    pub fn tooltip(self, value: f64) -> String {
        match self {
            Metric::Tokens => format::pluralize(&format::format_count(value), value, "token"),
            Metric::Creators => format::pluralize(&format::format_count(value), value, "creator"),
            Metric::Volume | Metric::MarketCap => ValueFormat::Currency.format(value),
            Metric::Buyers => {
                format::pluralize(&format::format_number(Some(value)), value, "buyer")
            }
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tokens" | "created" => Ok(Metric::Tokens),
            "creators" => Ok(Metric::Creators),
            "volume" => Ok(Metric::Volume),
            "marketcap" | "market-cap" => Ok(Metric::MarketCap),
            "buyers" | "holders" => Ok(Metric::Buyers),
            other => Err(format!("unknown chart metric: {other}")),
        }
    }
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Hourly => Mode::Cumulative,
            Mode::Cumulative => Mode::Hourly,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Hourly => f.write_str("hourly"),
            Mode::Cumulative => f.write_str("cumulative"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hourly" => Ok(Mode::Hourly),
            "cumulative" => Ok(Mode::Cumulative),
            other => Err(format!("unknown chart mode: {other}")),
        }
    }
}

/// 24 labelled values ready for charting.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub metric: Metric,
    pub mode: Mode,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl Series {
    pub fn value_format(&self) -> ValueFormat {
        self.metric.value_format()
    }

    pub fn title(&self) -> &'static str {
        self.metric.title()
    }

    pub fn format_value(&self, value: f64) -> String {
        self.value_format().format(value)
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}

/// Map `tokens` onto the 24 buckets of `timeline` for one metric and mode.
pub fn aggregate(tokens: &[Token], metric: Metric, mode: Mode, timeline: &Timeline) -> Series {
    let hourly = match metric {
        Metric::Tokens => sum_by_creation(tokens, timeline, |_| 1.0),
        Metric::Creators => unique_creators(tokens, timeline),
        Metric::Volume => sum_by_creation(tokens, timeline, |t| t.volume_value() / 24.0),
        Metric::MarketCap => sum_by_creation(tokens, timeline, Token::market_cap_value),
        Metric::Buyers => holders_existing_by_start(tokens, timeline),
    };

    let values = if mode == Mode::Cumulative && metric.accumulates() {
        running_total(&hourly)
    } else {
        hourly
    };

    debug!(
        "Aggregated {} ({}) over {} tokens",
        metric,
        mode,
        tokens.len()
    );

    Series {
        metric,
        mode,
        labels: timeline.labels().to_vec(),
        values,
    }
}

/// Running prefix sum: `out[i] = out[i - 1] + raw[i]`.
pub fn running_total(raw: &[f64]) -> Vec<f64> {
    raw.iter()
        .scan(0.0, |acc, v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

/// Sum `value(token)` into the bucket each token was created in.
fn sum_by_creation<F>(tokens: &[Token], timeline: &Timeline, value: F) -> Vec<f64>
where
    F: Fn(&Token) -> f64,
{
    let mut buckets = vec![0.0; BUCKETS];
    for token in tokens {
        let Some(idx) = token.created_at().and_then(|at| timeline.bucket_of(at)) else {
            continue;
        };
        let v = value(token);
        if v.is_finite() {
            buckets[idx] += v;
        }
    }
    buckets
}

fn unique_creators(tokens: &[Token], timeline: &Timeline) -> Vec<f64> {
    let mut creators: Vec<HashSet<&str>> = vec![HashSet::new(); BUCKETS];
    for token in tokens {
        let Some(creator) = token.creator.as_deref() else {
            continue;
        };
        if let Some(idx) = token.created_at().and_then(|at| timeline.bucket_of(at)) {
            creators[idx].insert(creator);
        }
    }
    creators.iter().map(|set| set.len() as f64).collect()
}

/// Bucket `i` holds the holders of every token created at or before the
/// bucket's start, whether or not it falls inside the window.
fn holders_existing_by_start(tokens: &[Token], timeline: &Timeline) -> Vec<f64> {
    let created: Vec<(_, f64)> = tokens
        .iter()
        .filter_map(|t| t.created_at().map(|at| (at, t.holders_value())))
        .collect();

    timeline
        .boundaries()
        .iter()
        .map(|start| {
            created
                .iter()
                .filter(|(at, _)| at <= start)
                .map(|(_, holders)| holders)
                .sum::<f64>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 14, 30, 0).unwrap()
    }

    fn token(value: serde_json::Value) -> Token {
        serde_json::from_value(value).unwrap()
    }

    fn created(id: &str, ago: Duration) -> serde_json::Value {
        json!({ "id": id, "status": "active", "createdAt": (now() - ago).to_rfc3339() })
    }

    fn with(mut base: serde_json::Value, extra: serde_json::Value) -> Token {
        if let (Some(b), Some(e)) = (base.as_object_mut(), extra.as_object()) {
            for (k, v) in e {
                b.insert(k.clone(), v.clone());
            }
        }
        token(base)
    }

    #[test]
    fn volume_is_spread_over_the_day() {
        let timeline = Timeline::new(now());
        let tokens = vec![with(created("a", Duration::hours(1)), json!({ "volume24h": 240 }))];
        let series = aggregate(&tokens, Metric::Volume, Mode::Hourly, &timeline);

        let idx = timeline.bucket_of(now() - Duration::hours(1)).unwrap();
        for (i, v) in series.values.iter().enumerate() {
            if i == idx {
                assert_eq!(*v, 10.0);
            } else {
                assert_eq!(*v, 0.0);
            }
        }
    }

    #[test]
    fn creators_are_counted_once_per_bucket() {
        let timeline = Timeline::new(now());
        let tokens = vec![
            with(created("a", Duration::minutes(100)), json!({ "creator": "X" })),
            with(created("b", Duration::minutes(110)), json!({ "creator": "X" })),
        ];
        let idx = timeline.bucket_of(now() - Duration::minutes(100)).unwrap();
        assert_eq!(idx, timeline.bucket_of(now() - Duration::minutes(110)).unwrap());

        let creators = aggregate(&tokens, Metric::Creators, Mode::Hourly, &timeline);
        let count = aggregate(&tokens, Metric::Tokens, Mode::Hourly, &timeline);
        assert_eq!(creators.values[idx], 1.0);
        assert_eq!(count.values[idx], 2.0);
    }

    #[test]
    fn tokens_without_creator_add_no_creators() {
        let timeline = Timeline::new(now());
        let tokens = vec![token(created("a", Duration::minutes(5)))];
        let series = aggregate(&tokens, Metric::Creators, Mode::Hourly, &timeline);
        assert_eq!(series.total(), 0.0);
    }

    #[test]
    fn empty_input_is_all_zero() {
        let timeline = Timeline::new(now());
        for metric in Metric::ALL {
            for mode in [Mode::Hourly, Mode::Cumulative] {
                let series = aggregate(&[], metric, mode, &timeline);
                assert_eq!(series.values, vec![0.0; BUCKETS]);
                assert_eq!(series.labels.len(), BUCKETS);
            }
        }
    }

    #[test]
    fn tokens_outside_the_window_are_ignored() {
        let timeline = Timeline::new(now());
        let tokens = vec![
            with(created("old", Duration::hours(30)), json!({ "volume": 2400 })),
            with(created("future", Duration::minutes(-5)), json!({ "volume": 2400 })),
            token(json!({ "id": "undated", "status": "active", "volume": 2400 })),
        ];
        for metric in [Metric::Tokens, Metric::Volume, Metric::MarketCap] {
            let series = aggregate(&tokens, metric, Mode::Hourly, &timeline);
            assert_eq!(series.total(), 0.0, "{metric}");
        }
    }

    #[test]
    fn every_token_in_window_lands_in_one_bucket() {
        let timeline = Timeline::new(now());
        let tokens: Vec<Token> = (0..=24 * 60)
            .step_by(13)
            .map(|m| token(created(&format!("t{m}"), Duration::minutes(m))))
            .collect();
        let series = aggregate(&tokens, Metric::Tokens, Mode::Hourly, &timeline);
        assert_eq!(series.total(), tokens.len() as f64);
    }

    #[test]
    fn market_cap_sums_by_creation_hour() {
        let timeline = Timeline::new(now());
        let tokens = vec![
            with(created("a", Duration::minutes(10)), json!({ "marketCapUSD": 1000 })),
            with(created("b", Duration::minutes(20)), json!({ "marketCap": "500" })),
            with(created("c", Duration::minutes(30)), json!({ "marketCapUSD": "n/a" })),
        ];
        let series = aggregate(&tokens, Metric::MarketCap, Mode::Hourly, &timeline);
        assert_eq!(series.values[BUCKETS - 1], 1500.0);
        assert_eq!(series.total(), 1500.0);
    }

    #[test]
    fn market_cap_ignores_cumulative_mode() {
        let timeline = Timeline::new(now());
        let tokens = vec![
            with(created("a", Duration::hours(5)), json!({ "marketCapUSD": 100 })),
            with(created("b", Duration::minutes(10)), json!({ "marketCapUSD": 100 })),
        ];
        let hourly = aggregate(&tokens, Metric::MarketCap, Mode::Hourly, &timeline);
        let cumulative = aggregate(&tokens, Metric::MarketCap, Mode::Cumulative, &timeline);
        assert_eq!(hourly.values, cumulative.values);
    }

    #[test]
    fn buyers_count_tokens_existing_at_bucket_start() {
        let timeline = Timeline::new(now());
        let tokens = vec![
            with(created("old", Duration::hours(48)), json!({ "holders": 7 })),
            with(created("mid", Duration::hours(12)), json!({ "holderCount": "5" })),
            with(created("new", Duration::minutes(10)), json!({ "holders": 100 })),
            token(json!({ "id": "undated", "holders": 1000 })),
        ];
        let series = aggregate(&tokens, Metric::Buyers, Mode::Hourly, &timeline);

        assert_eq!(series.values[0], 7.0);
        // bucket 12 starts exactly 12h ago, so "mid" already exists
        assert_eq!(series.values[11], 7.0);
        assert_eq!(series.values[12], 12.0);
        assert_eq!(series.values[BUCKETS - 1], 12.0);
    }

    #[test]
    fn cumulative_is_prefix_sum_of_hourly() {
        let timeline = Timeline::new(now());
        let tokens: Vec<Token> = [3, 3, 7, 15, 15, 15, 22]
            .iter()
            .map(|h| with(created("t", Duration::hours(*h)), json!({ "volume24h": 48, "holders": 2 })))
            .collect();

        for metric in [Metric::Tokens, Metric::Volume, Metric::Buyers] {
            let hourly = aggregate(&tokens, metric, Mode::Hourly, &timeline);
            let cumulative = aggregate(&tokens, metric, Mode::Cumulative, &timeline);

            let mut acc = 0.0;
            for i in 0..BUCKETS {
                acc += hourly.values[i];
                assert_eq!(cumulative.values[i], acc, "{metric} bucket {i}");
                if i > 0 {
                    assert!(cumulative.values[i] >= cumulative.values[i - 1]);
                }
            }
        }
    }

    #[test]
    fn running_total_basic() {
        assert_eq!(running_total(&[1.0, 0.0, 2.0, 3.0]), vec![1.0, 1.0, 3.0, 6.0]);
        assert!(running_total(&[]).is_empty());
    }

    #[test]
    fn metric_names_round_trip_through_config_strings() {
        for metric in Metric::ALL {
            assert_eq!(metric.as_str().parse::<Metric>(), Ok(metric));
        }
        assert!("tvl".parse::<Metric>().is_err());
        assert_eq!("Cumulative".parse::<Mode>(), Ok(Mode::Cumulative));
    }

    #[test]
    fn tooltips() {
        assert_eq!(Metric::Tokens.tooltip(1.0), "1 token");
        assert_eq!(Metric::Creators.tooltip(2.0), "2 creators");
        assert_eq!(Metric::Volume.tooltip(10.0), "$10");
        assert_eq!(Metric::Buyers.tooltip(2500.0), "3K buyers");
    }
}
