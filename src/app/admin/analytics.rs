use std::fs;
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::http::{self, FetchError};
use crate::store::{KEY_COUNTED_VISIT, KeyValueStore, get_or_log};

pub(crate) const COUNTER_HIT_URL: &str =
    "https://api.countapi.xyz/hit/better-english-everyday/visits";
pub(crate) const COUNTER_GET_URL: &str =
    "https://api.countapi.xyz/get/better-english-everyday/visits";
pub(crate) const IP_URL: &str = "https://api.ipify.org?format=json";
pub(crate) const VISITOR_LOG_LIMIT: usize = 50;
pub(crate) const LOADING: &str = "Loading...";

#[derive(Debug, Deserialize)]
struct CountResponse {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct IpResponse {
    ip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct VisitorEntry {
    #[serde(default)]
    pub(crate) timestamp: String,
    #[serde(default)]
    pub(crate) ip: String,
    #[serde(default)]
    pub(crate) path: String,
}

impl VisitorEntry {
    pub(crate) fn display_time(&self) -> String {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|_| self.timestamp.clone())
    }
}

/// One JSON object per line, trailing commas allowed; newest (last) first.
pub(crate) fn parse_visitor_log(text: &str) -> Vec<VisitorEntry> {
    let mut entries: Vec<VisitorEntry> = text
        .trim()
        .lines()
        .filter_map(|line| {
            let clean = line.trim();
            let clean = clean.strip_suffix(',').unwrap_or(clean);
            serde_json::from_str(clean).ok()
        })
        .collect();
    entries.reverse();
    entries.truncate(VISITOR_LOG_LIMIT);
    entries
}

fn read_visitor_log(source: &str) -> Result<String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        http::get_text(source, http::CONNECT_TIMEOUT, http::READ_TIMEOUT)
            .with_context(|| format!("failed to fetch visitor log from {source}"))
    } else {
        fs::read_to_string(source).with_context(|| format!("failed to read visitor log {source}"))
    }
}

#[derive(Debug)]
pub(crate) enum AnalyticsUpdate {
    Visits { value: u64, counted: bool },
    Ip(String),
    VisitorLog(Vec<VisitorEntry>),
    VisitorLogUnavailable(String),
    Failed { what: &'static str, error: String },
}

/// A remote value that stays "Loading..." until (and unless) it resolves.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) enum Remote<T> {
    #[default]
    Loading,
    Ready(T),
}

impl<T> Remote<T> {
    pub(crate) fn ready(&self) -> Option<&T> {
        match self {
            Self::Loading => None,
            Self::Ready(value) => Some(value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Analytics {
    pub(crate) visits: Remote<u64>,
    pub(crate) ip: Remote<String>,
    pub(crate) visitor_log: Remote<Vec<VisitorEntry>>,
}

impl Analytics {
    pub(crate) fn visits_label(&self) -> String {
        match self.visits.ready() {
            Some(value) => format_count(*value),
            None => LOADING.to_string(),
        }
    }

    pub(crate) fn ip_label(&self) -> String {
        self.ip.ready().cloned().unwrap_or_else(|| LOADING.to_string())
    }

    /// Applies one fetch result. A counted visit is recorded in the session
    /// store so later fetches in this session only read the counter.
    pub(crate) fn apply(&mut self, update: AnalyticsUpdate, session: &dyn KeyValueStore) {
        match update {
            AnalyticsUpdate::Visits { value, counted } => {
                self.visits = Remote::Ready(value);
                if counted {
                    if let Err(err) = session.set(KEY_COUNTED_VISIT, "true") {
                        warn!(error = %err, "failed to record counted visit");
                    }
                }
            }
            AnalyticsUpdate::Ip(ip) => self.ip = Remote::Ready(ip),
            AnalyticsUpdate::VisitorLog(entries) => self.visitor_log = Remote::Ready(entries),
            AnalyticsUpdate::VisitorLogUnavailable(error) => {
                debug!(error = %error, "visitor log unavailable");
                self.visitor_log = Remote::Ready(Vec::new());
            }
            AnalyticsUpdate::Failed { what, error } => {
                warn!(what, error = %error, "analytics fetch failed");
            }
        }
    }
}

pub(crate) fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// The first counter fetch of a session increments; later ones only read.
pub(crate) fn counter_url(session: &dyn KeyValueStore) -> (&'static str, bool) {
    if get_or_log(session, KEY_COUNTED_VISIT).is_some() {
        (COUNTER_GET_URL, false)
    } else {
        (COUNTER_HIT_URL, true)
    }
}

fn fetch_count(url: &str) -> Result<u64, FetchError> {
    http::get_json::<CountResponse>(url).map(|response| response.value)
}

pub(crate) fn spawn_visit_count(url: &'static str, counted: bool, tx: &mpsc::Sender<AnalyticsUpdate>) {
    let tx = tx.clone();
    thread::spawn(move || {
        let update = match fetch_count(url) {
            Ok(value) => AnalyticsUpdate::Visits {
                value,
                counted,
            },
            Err(err) => AnalyticsUpdate::Failed {
                what: "visit count",
                error: err.to_string(),
            },
        };
        let _ = tx.send(update);
    });
}

pub(crate) fn spawn_ip_lookup(tx: &mpsc::Sender<AnalyticsUpdate>) {
    let tx = tx.clone();
    thread::spawn(move || {
        let update = match http::get_json::<IpResponse>(IP_URL) {
            Ok(response) => AnalyticsUpdate::Ip(response.ip),
            Err(err) => AnalyticsUpdate::Failed {
                what: "ip lookup",
                error: err.to_string(),
            },
        };
        let _ = tx.send(update);
    });
}

pub(crate) fn spawn_visitor_log(source: Option<String>, tx: &mpsc::Sender<AnalyticsUpdate>) {
    let tx = tx.clone();
    thread::spawn(move || {
        let update = match source {
            None => AnalyticsUpdate::VisitorLogUnavailable("no visitor log configured".to_string()),
            Some(source) => match read_visitor_log(&source) {
                Ok(text) => AnalyticsUpdate::VisitorLog(parse_visitor_log(&text)),
                Err(err) => AnalyticsUpdate::VisitorLogUnavailable(format!("{err:#}")),
            },
        };
        let _ = tx.send(update);
    });
}

/// Admin screen refresh: counter read, caller IP and the visitor log.
pub(crate) fn spawn_admin_fetches(visitor_log: Option<String>, tx: &mpsc::Sender<AnalyticsUpdate>) {
    spawn_visit_count(COUNTER_GET_URL, false, tx);
    spawn_ip_lookup(tx);
    spawn_visitor_log(visitor_log, tx);
}

pub(crate) fn drain_analytics_updates(
    rx: &mpsc::Receiver<AnalyticsUpdate>,
    analytics: &mut Analytics,
    session: &dyn KeyValueStore,
) {
    while let Ok(update) = rx.try_recv() {
        analytics.apply(update, session);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::http::test_server::{Behavior, TestServer};
    use crate::store::MemoryStore;

    #[test]
    fn visitor_log_keeps_latest_fifty_newest_first() {
        let mut text = String::new();
        for n in 0..60 {
            text.push_str(&format!(
                "{{\"timestamp\":\"2024-01-01T00:00:{:02}Z\",\"ip\":\"10.0.0.{n}\",\"path\":\"/\"}},\n",
                n % 60
            ));
        }
        text.push_str("garbage line\n");
        let entries = parse_visitor_log(&text);
        assert_eq!(entries.len(), VISITOR_LOG_LIMIT);
        assert_eq!(entries[0].ip, "10.0.0.59");
        assert_eq!(entries[49].ip, "10.0.0.10");
    }

    #[test]
    fn visitor_log_drops_bad_lines() {
        let text = "{\"ip\":\"1.1.1.1\",\"path\":\"/a\",\"timestamp\":\"x\"},\n{broken\n\n";
        let entries = parse_visitor_log(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display_time(), "x");
    }

    #[test]
    fn session_counts_visit_once() {
        let session = MemoryStore::new();
        assert_eq!(counter_url(&session), (COUNTER_HIT_URL, true));

        let mut analytics = Analytics::default();
        analytics.apply(
            AnalyticsUpdate::Visits {
                value: 1234,
                counted: true,
            },
            &session,
        );
        assert_eq!(counter_url(&session), (COUNTER_GET_URL, false));
        assert_eq!(analytics.visits_label(), "1,234");
    }

    #[test]
    fn failures_leave_fields_loading() {
        let session = MemoryStore::new();
        let mut analytics = Analytics::default();
        analytics.apply(
            AnalyticsUpdate::Failed {
                what: "ip lookup",
                error: "timeout".to_string(),
            },
            &session,
        );
        assert_eq!(analytics.ip_label(), LOADING);
        assert_eq!(analytics.visits_label(), LOADING);

        analytics.apply(
            AnalyticsUpdate::VisitorLogUnavailable("missing".to_string()),
            &session,
        );
        assert_eq!(analytics.visitor_log, Remote::Ready(Vec::new()));
    }

    #[test]
    fn count_formatting_groups_thousands() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn visit_count_is_read_from_counter_response() {
        let server = TestServer::spawn(vec![Behavior::Respond(200, r#"{"value":42}"#.to_string())]);
        assert_eq!(fetch_count(&server.base_url).expect("count"), 42);
    }

    #[test]
    fn visitor_log_is_fetched_over_http() {
        let server = TestServer::spawn(vec![Behavior::Respond(
            200,
            "{\"ip\":\"2.2.2.2\",\"path\":\"/\",\"timestamp\":\"t\"},".to_string(),
        )]);
        let (tx, rx) = mpsc::channel();
        spawn_visitor_log(Some(server.base_url.clone()), &tx);
        match rx.recv_timeout(Duration::from_secs(5)).expect("update") {
            AnalyticsUpdate::VisitorLog(entries) => assert_eq!(entries[0].ip, "2.2.2.2"),
            other => panic!("unexpected update: {other:?}"),
        }
    }
}
