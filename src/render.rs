// src/render.rs
use chrono::{DateTime, TimeZone, Utc};
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Columns, Alignment, Modify, Style},
};

use crate::aggregator::{Metric, Series};
use crate::dashboard::Dashboard;
use crate::format;
use crate::models::{Numeric, Token};
use crate::sort::{SortState, LIQUIDITY_PERCENT};

const CHART_HEIGHT: usize = 8;
const COLUMN_WIDTH: usize = 4;
const AXIS_WIDTH: usize = 6;

/// Sortable table columns: (header, sort key).
pub const COLUMNS: [(&str, &str); 7] = [
    ("Token", "name"),
    ("Ticker", "ticker"),
    ("Volume", "volume24h"),
    ("Market Cap", "marketCapUSD"),
    ("Buyers", "holderCount"),
    ("Liquidity %", LIQUIDITY_PERCENT),
    ("Created", "createdAt"),
];

pub const COMMAND_HELP: &str =
    "commands: s <field> sort · m <tokens|creators|volume|marketcap|buyers> chart · c hourly/cumulative · r refresh · q quit";

/// Full screen: header, tabs, chart, status and table.
pub fn render_dashboard<Tz: TimeZone>(dashboard: &Dashboard, now: DateTime<Tz>, max_rows: usize) -> String {
    let now_utc = now.with_timezone(&Utc);
    let mut out = String::new();

    out.push_str(&format!("{}\n\n", "auto.fun".green().bold()));
    out.push_str(&render_tabs(dashboard.metric()));
    out.push('\n');

    let series = dashboard.series(now);
    out.push_str(&format!(
        "{} ({})\n",
        series.title().green().bold(),
        series.mode
    ));
    out.push_str(&render_chart(&series).green().to_string());
    out.push_str(&format!("{}\n", render_summary(&series)));
    out.push_str(&format!("{}\n\n", series.metric.description().dimmed()));

    out.push_str(&format!(
        "Listing all active tokens_  {}\n",
        dashboard.status_line()
    ));

    if let Some(err) = dashboard.error() {
        out.push_str(&format!("{}\n", err.red()));
        return out;
    }
    if dashboard.is_loading() {
        out.push_str("Loading tokens...\n");
        return out;
    }

    let rows = dashboard.rows();
    let shown = &rows[..rows.len().min(max_rows)];
    out.push_str(&render_table(shown, dashboard.sort(), now_utc));
    out.push('\n');
    if rows.len() > shown.len() {
        out.push_str(&format!("… {} more\n", rows.len() - shown.len()));
    }
    out
}

pub fn render_tabs(active: Metric) -> String {
    Metric::ALL
        .iter()
        .map(|m| {
            if *m == active {
                format!("[{}]", m.tab_label()).green().bold().to_string()
            } else {
                format!(" {} ", m.tab_label())
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Line chart of a 24-point series: one point per bucket, joined by
/// vertical strokes, with a y-axis on the left and hour labels below.
pub fn render_chart(series: &Series) -> String {
    let max = series.max();
    let levels: Vec<usize> = series
        .values
        .iter()
        .map(|v| {
            if max <= 0.0 || !v.is_finite() || *v <= 0.0 {
                0
            } else {
                ((v / max) * (CHART_HEIGHT - 1) as f64).round() as usize
            }
        })
        .collect();

    let mut out = String::new();
    for row in (0..CHART_HEIGHT).rev() {
        let axis = if row == CHART_HEIGHT - 1 {
            format::format_chart_axis(max)
        } else if row == 0 {
            format::format_chart_axis(0.0)
        } else {
            String::new()
        };
        out.push_str(&format!("{axis:>w$} │", w = AXIS_WIDTH));

        for (i, level) in levels.iter().enumerate() {
            let cell = if *level == row {
                "●"
            } else {
                let prev = if i == 0 { *level } else { levels[i - 1] };
                let (lo, hi) = if prev < *level { (prev, *level) } else { (*level, prev) };
                if row > lo && row < hi {
                    "│"
                } else {
                    " "
                }
            };
            out.push_str(&format!("{cell:^w$}", w = COLUMN_WIDTH));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "{:>w$} └{}\n",
        "",
        "─".repeat(series.values.len() * COLUMN_WIDTH),
        w = AXIS_WIDTH
    ));

    // every other hour, like the web chart's tick limit
    out.push_str(&format!("{:>w$}  ", "", w = AXIS_WIDTH));
    for (i, label) in series.labels.iter().enumerate() {
        if i % 2 == 0 {
            out.push_str(&format!("{label:<w$}", w = COLUMN_WIDTH * 2));
        }
    }
    out.push('\n');
    out
}

/// Peak bucket and the series total, in the metric's own units.
pub fn render_summary(series: &Series) -> String {
    let peak = series
        .values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, v)| match best {
            Some((_, b)) if b >= *v => best,
            _ => Some((i, *v)),
        });

    match peak {
        Some((i, v)) if v > 0.0 => format!(
            "Peak {} at {} · Sum {}",
            series.metric.tooltip(v),
            series.labels[i],
            series.format_value(series.total())
        ),
        _ => "No activity in the last 24 hours".to_string(),
    }
}

fn column_value(field: &Option<Numeric>) -> Option<f64> {
    field.as_ref().and_then(Numeric::as_f64)
}

/// One table row, already formatted.
pub fn token_row(token: &Token, now: DateTime<Utc>) -> Vec<String> {
    let volume = column_value(&token.volume24h);
    let market_cap = column_value(&token.market_cap_usd);
    let buyers = column_value(&token.holder_count);

    vec![
        token.name.clone().unwrap_or_default(),
        token.ticker.clone().unwrap_or_default(),
        match volume {
            Some(v) => format!("${}", format::format_number(Some(v))),
            None => "-".to_string(),
        },
        match market_cap {
            Some(v) => format!("${}", format::format_market_cap(Some(v))),
            None => "-".to_string(),
        },
        format::format_number(buyers),
        format::format_liquidity(token.liquidity_percent()),
        format::time_ago(token.created_at(), now),
        token.address().to_string(),
    ]
}

pub fn render_table(rows: &[&Token], sort: &SortState, now: DateTime<Utc>) -> String {
    let mut builder = Builder::default();

    let mut header: Vec<String> = COLUMNS
        .iter()
        .map(|(title, key)| format!("{title}{}", sort.indicator(key)))
        .collect();
    header.push("Contract".to_string());
    builder.push_record(header);

    if rows.is_empty() {
        let mut empty = vec![String::new(); COLUMNS.len() + 1];
        empty[0] = "No tokens match the current filters.".to_string();
        builder.push_record(empty);
    }
    for token in rows {
        builder.push_record(token_row(token, now));
    }

    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..=5)).with(Alignment::right()));
    table.to_string()
}
