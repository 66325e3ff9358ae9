use std::io::{self, BufRead};
use std::thread;

use chrono::{DateTime, Local, TimeZone};
use eyre::Result;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, Interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::aggregator::{self, Metric, Mode, Series};
use crate::config::Config;
use crate::fetch::{TokenApi, TokenQuery, TokenSource};
use crate::filter;
use crate::models::Token;
use crate::render;
use crate::sort::SortState;
use crate::timeline::Timeline;

/// Application state: the current token list plus every user selection.
/// Charts and table rows are derived from it on demand. A new dashboard is
/// loading until its first fetch completes.
#[derive(Debug, Clone)]
pub struct Dashboard {
    tokens: Vec<Token>,
    loading: bool,
    error: Option<String>,
    sort: SortState,
    metric: Metric,
    mode: Mode,
    query: TokenQuery,
}

impl Dashboard {
    pub fn new(cfg: &Config) -> Self {
        Self {
            tokens: Vec::new(),
            loading: true,
            error: None,
            sort: SortState::new(cfg.sort_key.clone()),
            metric: cfg.chart_metric,
            mode: cfg.chart_mode,
            query: TokenQuery::with_limit(cfg.fetch_limit),
        }
    }

    /// Fetch a fresh list and replace the current one wholesale. On failure
    /// the previous list stays and the error is kept for display.
    pub async fn refresh<S>(&mut self, source: &S)
    where
        S: TokenSource + ?Sized,
    {
        self.loading = true;
        self.error = None;

        match source.fetch_tokens(&self.query).await {
            Ok(all) => {
                let total = all.len();
                self.tokens = filter::filter_active(all);
                info!("{} of {} tokens are active", self.tokens.len(), total);
            }
            Err(e) => {
                error!("API fetch error: {}", e);
                self.error = Some(format!("Failed to fetch token data: {e}"));
            }
        }

        self.loading = false;
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn select_sort(&mut self, key: &str) {
        self.sort.select(key);
    }

    pub fn select_metric(&mut self, metric: Metric) {
        self.metric = metric;
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Table rows in the active sort order.
    pub fn rows(&self) -> Vec<&Token> {
        self.sort.apply(&self.tokens)
    }

    /// The selected chart over the 24 hours ending at `now`.
    pub fn series<Tz: TimeZone>(&self, now: DateTime<Tz>) -> Series {
        let timeline = Timeline::new(now);
        aggregator::aggregate(&self.tokens, self.metric, self.mode, &timeline)
    }

    pub fn status_line(&self) -> String {
        format!("{} tokens • Sorted by {}", self.tokens.len(), self.sort)
    }
}

/// A line typed on stdin while the dashboard is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `s <key>`: sort the table by a field (same key again flips direction)
    Sort(String),
    /// `m <metric>`: switch the chart tab
    Chart(Metric),
    /// `c`: flip between hourly and cumulative
    ToggleMode,
    /// `r`: refetch now
    Refresh,
    /// `q`
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let cmd = parts.next()?;
        let arg = parts.next();

        match (cmd, arg) {
            ("s" | "sort", Some(key)) => Some(Command::Sort(key.to_string())),
            ("m" | "chart", Some(metric)) => metric.parse().ok().map(Command::Chart),
            ("c" | "mode", None) => Some(Command::ToggleMode),
            ("r" | "refresh", None) => Some(Command::Refresh),
            ("q" | "quit", None) => Some(Command::Quit),
            _ => None,
        }
    }
}

impl Dashboard {
    /// Apply one command; returns `false` when the dashboard should stop.
    pub async fn apply<S>(&mut self, command: Command, source: &S) -> bool
    where
        S: TokenSource + ?Sized,
    {
        match command {
            Command::Sort(key) => self.select_sort(&key),
            Command::Chart(metric) => self.select_metric(metric),
            Command::ToggleMode => self.set_mode(self.mode.toggled()),
            Command::Refresh => self.refresh(source).await,
            Command::Quit => return false,
        }
        true
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Forward lines from `reader` over a channel. Reads happen on a plain OS
/// thread so a pending read never holds up runtime shutdown on Ctrl-C. The
/// channel closes at EOF or on a read error.
pub fn spawn_line_reader<R>(reader: R) -> mpsc::UnboundedReceiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

fn show(dashboard: &Dashboard, rows: usize) {
    println!("{}", render::render_dashboard(dashboard, Local::now(), rows));
    println!("{}", render::COMMAND_HELP);
}

/// Initial load, then refresh every `refresh_secs` (when non-zero) or on
/// the `r` command, until `q` or stdin closes with no timer running.
pub async fn run(cfg: Config) -> Result<()> {
    let api = TokenApi::from_config(&cfg)?;
    let mut dashboard = Dashboard::new(&cfg);

    info!("Dashboard started, refresh interval = {}s", cfg.refresh_secs);

    show(&dashboard, cfg.table_rows);
    dashboard.refresh(&api).await;
    show(&dashboard, cfg.table_rows);

    let mut ticker = (cfg.refresh_secs > 0).then(|| {
        let mut t = interval(Duration::from_secs(cfg.refresh_secs));
        t.set_missed_tick_behavior(MissedTickBehavior::Delay);
        t.reset(); // initial load already happened
        t
    });

    let mut lines = spawn_line_reader(io::BufReader::new(io::stdin()));
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = next_tick(&mut ticker) => {
                dashboard.refresh(&api).await;
                if dashboard.error().is_some() {
                    warn!("Refresh failed, showing the previous token list");
                }
                show(&dashboard, cfg.table_rows);
            }
            line = lines.recv(), if stdin_open => match line {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => match Command::parse(&line) {
                    Some(command) => {
                        if !dashboard.apply(command, &api).await {
                            return Ok(());
                        }
                        show(&dashboard, cfg.table_rows);
                    }
                    None => warn!("Unknown command: {}", line.trim()),
                },
                None => {
                    stdin_open = false;
                    if ticker.is_none() {
                        return Ok(());
                    }
                }
            },
        }
    }
}
