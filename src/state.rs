//! Dashboard state container and its reducer.
//!
//! All shared view state lives in [`DashboardState`]. Input events and fetch
//! results arrive as [`Message`]s; [`update`] applies one message and returns
//! the fetches to start as [`Command`]s. Nothing in here performs I/O.
//!
//! Each fetch slot has a fence that hands out increasing request tokens. A
//! response is applied only if it carries the latest token for its slot, so
//! a slow superseded request can never overwrite a newer one.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::api::{ApiError, Endpoint, Snapshot};
use crate::history::ChartPoint;
use crate::metric::Metric;
use crate::stats::sort_data;

/// Initial map center (lat, lon)
pub const DEFAULT_CENTER: (f64, f64) = (29.2985, 42.551);
/// Zoom level for the worldwide view
pub const DEFAULT_ZOOM: u8 = 3;
/// Zoom level after selecting a country
pub const COUNTRY_ZOOM: u8 = 4;

/// Region chosen in the picker
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Worldwide,
    /// ISO2 code, or the country name when the API has no code for it
    Country(String),
}

impl Selection {
    /// Worldwide reads the aggregate endpoint, everything else the
    /// per-country endpoint.
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Selection::Worldwide => Endpoint::All,
            Selection::Country(code) => Endpoint::Country(code.clone()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Selection::Worldwide => "worldwide",
            Selection::Country(code) => code,
        }
    }

    /// Code of the selected country; the aggregate has no marker or row
    pub fn country_code(&self) -> Option<&str> {
        match self {
            Selection::Worldwide => None,
            Selection::Country(code) => Some(code.as_str()),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Selection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            Err("empty country code".to_string())
        } else if s.eq_ignore_ascii_case("worldwide") {
            Ok(Selection::Worldwide)
        } else {
            Ok(Selection::Country(s.to_string()))
        }
    }
}

/// Dropdown entry derived from the country list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PicklistEntry {
    pub name: String,
    pub value: String,
}

/// Where the map should look. `revision` changes every time the
/// coordinator moves the map so the view applies it once and then
/// leaves the user free to pan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapFocus {
    pub lat: f64,
    pub lon: f64,
    pub level: u8,
    pub revision: u64,
}

impl Default for MapFocus {
    fn default() -> Self {
        Self {
            lat: DEFAULT_CENTER.0,
            lon: DEFAULT_CENTER.1,
            level: DEFAULT_ZOOM,
            revision: 0,
        }
    }
}

/// Progress of one fetch slot
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Failed(String),
}

/// Independent fetch lifecycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Countries,
    Snapshot,
    History,
}

/// Identifies one issued request within its slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct RequestToken(u64);

#[derive(Debug, Default)]
struct Fence {
    issued: u64,
}

impl Fence {
    fn issue(&mut self) -> RequestToken {
        self.issued += 1;
        RequestToken(self.issued)
    }

    fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.issued
    }
}

/// Why a snapshot was requested; only user selections move the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Selection,
    Refresh,
}

/// Fetch to perform
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchCountries {
        token: RequestToken,
    },
    FetchSnapshot {
        token: RequestToken,
        selection: Selection,
        origin: Origin,
    },
    FetchHistory {
        token: RequestToken,
        metric: Metric,
        last_days: u32,
    },
}

impl Command {
    pub fn slot(&self) -> Slot {
        match self {
            Command::FetchCountries { .. } => Slot::Countries,
            Command::FetchSnapshot { .. } => Slot::Snapshot,
            Command::FetchHistory { .. } => Slot::History,
        }
    }
}

/// Everything that can change the dashboard state
#[derive(Debug)]
pub enum Message {
    /// First frame: load the country list, the global snapshot and the chart
    Mounted,
    /// Refresh interval elapsed or manual refresh
    Refresh,
    SelectRegion(Selection),
    SelectMetric(Metric),
    CountriesLoaded {
        token: RequestToken,
        result: Result<Vec<Snapshot>, ApiError>,
    },
    SnapshotLoaded {
        token: RequestToken,
        selection: Selection,
        origin: Origin,
        result: Result<Snapshot, ApiError>,
    },
    HistoryLoaded {
        token: RequestToken,
        metric: Metric,
        result: Result<Vec<ChartPoint>, ApiError>,
    },
}

/// Shared view state
#[derive(Debug, Default)]
pub struct DashboardState {
    /// Picker entries, API order
    pub countries: Vec<PicklistEntry>,
    /// Active region; changes only once its snapshot arrived
    pub selection: Selection,
    /// Requested region whose snapshot has not landed yet
    pub pending: Option<Selection>,
    /// Snapshot behind the statistic panels
    pub country_info: Option<Snapshot>,
    /// Raw country list, API order, for the map
    pub map_countries: Vec<Snapshot>,
    /// Country list ordered by cases for the table
    pub table_data: Vec<Snapshot>,
    pub map_focus: MapFocus,
    pub metric: Metric,
    /// Daily new values for `history_metric`
    pub history: Vec<ChartPoint>,
    pub history_metric: Metric,
    pub history_days: u32,
    pub countries_status: FetchStatus,
    pub snapshot_status: FetchStatus,
    pub history_status: FetchStatus,
    pub last_updated: Option<DateTime<Utc>>,
    countries_fence: Fence,
    snapshot_fence: Fence,
    history_fence: Fence,
}

impl DashboardState {
    pub fn new(metric: Metric, history_days: u32) -> Self {
        Self {
            metric,
            history_metric: metric,
            history_days,
            ..Self::default()
        }
    }

    /// True while any slot waits on the network
    pub fn is_loading(&self) -> bool {
        [
            &self.countries_status,
            &self.snapshot_status,
            &self.history_status,
        ]
        .iter()
        .any(|s| matches!(s, FetchStatus::Loading))
    }

    /// First failure message across slots, for the status bar
    pub fn error(&self) -> Option<(Slot, &str)> {
        [
            (Slot::Countries, &self.countries_status),
            (Slot::Snapshot, &self.snapshot_status),
            (Slot::History, &self.history_status),
        ]
        .into_iter()
        .find_map(|(slot, status)| match status {
            FetchStatus::Failed(msg) => Some((slot, msg.as_str())),
            _ => None,
        })
    }

    fn fetch_countries(&mut self) -> Command {
        self.countries_status = FetchStatus::Loading;
        Command::FetchCountries {
            token: self.countries_fence.issue(),
        }
    }

    fn fetch_snapshot(&mut self, selection: Selection, origin: Origin) -> Command {
        self.snapshot_status = FetchStatus::Loading;
        Command::FetchSnapshot {
            token: self.snapshot_fence.issue(),
            selection,
            origin,
        }
    }

    fn fetch_history(&mut self) -> Command {
        self.history_status = FetchStatus::Loading;
        Command::FetchHistory {
            token: self.history_fence.issue(),
            metric: self.metric,
            last_days: self.history_days,
        }
    }

    fn focus(&mut self, lat: f64, lon: f64, level: u8) {
        self.map_focus = MapFocus {
            lat,
            lon,
            level,
            revision: self.map_focus.revision + 1,
        };
    }
}

/// Apply one message, returning the fetches it requires
pub fn update(state: &mut DashboardState, msg: Message) -> Vec<Command> {
    match msg {
        Message::Mounted => {
            let selection = state.selection.clone();
            vec![
                state.fetch_countries(),
                state.fetch_snapshot(selection, Origin::Refresh),
                state.fetch_history(),
            ]
        }
        Message::Refresh => {
            // A pending selection is the one the user wants to see refreshed
            let selection = state
                .pending
                .clone()
                .unwrap_or_else(|| state.selection.clone());
            let origin = if state.pending.is_some() {
                Origin::Selection
            } else {
                Origin::Refresh
            };
            vec![
                state.fetch_countries(),
                state.fetch_snapshot(selection, origin),
                state.fetch_history(),
            ]
        }
        Message::SelectRegion(selection) => {
            state.pending = Some(selection.clone());
            vec![state.fetch_snapshot(selection, Origin::Selection)]
        }
        Message::SelectMetric(metric) => {
            if metric == state.metric {
                return Vec::new();
            }
            state.metric = metric;
            vec![state.fetch_history()]
        }
        Message::CountriesLoaded { token, result } => {
            if !state.countries_fence.is_current(token) {
                tracing::debug!(?token, "discarding stale country list");
                return Vec::new();
            }
            match result {
                Ok(list) => {
                    tracing::info!(count = list.len(), "country list loaded");
                    state.countries = list
                        .iter()
                        .filter_map(|snap| {
                            snap.code().map(|code| PicklistEntry {
                                name: snap.name().to_string(),
                                value: code.to_string(),
                            })
                        })
                        .collect();
                    state.table_data = sort_data(&list);
                    state.map_countries = list;
                    state.countries_status = FetchStatus::Idle;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "country list fetch failed");
                    state.countries_status = FetchStatus::Failed(e.summary());
                }
            }
            Vec::new()
        }
        Message::SnapshotLoaded {
            token,
            selection,
            origin,
            result,
        } => {
            if !state.snapshot_fence.is_current(token) {
                tracing::debug!(?token, %selection, "discarding stale snapshot");
                return Vec::new();
            }
            state.pending = None;
            match result {
                Ok(snap) => {
                    tracing::debug!(%selection, cases = snap.cases, "snapshot loaded");
                    if origin == Origin::Selection {
                        match (&selection, snap.coords()) {
                            (Selection::Country(_), Some((lat, lon))) => {
                                state.focus(lat, lon, COUNTRY_ZOOM)
                            }
                            (Selection::Country(_), None) => {}
                            (Selection::Worldwide, _) => {
                                state.focus(DEFAULT_CENTER.0, DEFAULT_CENTER.1, DEFAULT_ZOOM)
                            }
                        }
                    }
                    state.last_updated = snap.updated_at().or(state.last_updated);
                    state.selection = selection;
                    state.country_info = Some(snap);
                    state.snapshot_status = FetchStatus::Idle;
                }
                Err(e) => {
                    tracing::warn!(%selection, error = %e, "snapshot fetch failed");
                    state.snapshot_status = FetchStatus::Failed(e.summary());
                }
            }
            Vec::new()
        }
        Message::HistoryLoaded {
            token,
            metric,
            result,
        } => {
            if !state.history_fence.is_current(token) {
                tracing::debug!(?token, %metric, "discarding stale history");
                return Vec::new();
            }
            match result {
                Ok(points) => {
                    state.history = points;
                    state.history_metric = metric;
                    state.history_status = FetchStatus::Idle;
                }
                Err(e) => {
                    tracing::warn!(%metric, error = %e, "history fetch failed");
                    state.history_status = FetchStatus::Failed(e.summary());
                }
            }
            Vec::new()
        }
    }
}
