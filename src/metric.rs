use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use ratatui::style::Color;

use crate::api::{Snapshot, Timeline};

/// Which statistic drives the panels, map markers and trend chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Metric {
    #[default]
    Cases,
    Recovered,
    Deaths,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Cases, Metric::Recovered, Metric::Deaths];

    /// Panel heading
    pub fn title(self) -> &'static str {
        match self {
            Metric::Cases => "Coronavirus Cases",
            Metric::Recovered => "Recovered",
            Metric::Deaths => "Deaths",
        }
    }

    /// Lowercase name as used by the API and the CLI
    pub fn key(self) -> &'static str {
        match self {
            Metric::Cases => "cases",
            Metric::Recovered => "recovered",
            Metric::Deaths => "deaths",
        }
    }

    /// Marker and chart color (#CC1034, #7DD71D, #FB4443)
    pub fn color(self) -> Color {
        match self {
            Metric::Cases => Color::Rgb(0xcc, 0x10, 0x34),
            Metric::Recovered => Color::Rgb(0x7d, 0xd7, 0x1d),
            Metric::Deaths => Color::Rgb(0xfb, 0x44, 0x43),
        }
    }

    /// Panels for cases and deaths are drawn in red, recovered in green
    pub fn is_red(self) -> bool {
        !matches!(self, Metric::Recovered)
    }

    pub fn total(self, snap: &Snapshot) -> u64 {
        match self {
            Metric::Cases => snap.cases,
            Metric::Recovered => snap.recovered,
            Metric::Deaths => snap.deaths,
        }
    }

    /// Change since yesterday; negative after an upstream correction
    pub fn today(self, snap: &Snapshot) -> Option<i64> {
        match self {
            Metric::Cases => snap.today_cases,
            Metric::Recovered => snap.today_recovered,
            Metric::Deaths => snap.today_deaths,
        }
    }

    pub fn series(self, timeline: &Timeline) -> &HashMap<String, u64> {
        match self {
            Metric::Cases => &timeline.cases,
            Metric::Recovered => &timeline.recovered,
            Metric::Deaths => &timeline.deaths,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cases" | "c" => Ok(Metric::Cases),
            "recovered" | "r" => Ok(Metric::Recovered),
            "deaths" | "d" => Ok(Metric::Deaths),
            other => Err(format!("unknown metric '{other}' (cases, recovered, deaths)")),
        }
    }
}
