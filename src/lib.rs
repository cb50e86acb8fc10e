//! Terminal COVID-19 dashboard.
//!
//! Polls a disease.sh compatible API and shows the numbers as statistic
//! panels, a Braille world map with one marker per country, a country table
//! sorted by cases and a trend chart of worldwide daily new values.
//!
//! Data flow: [`state::update`] turns input and fetch results into new state
//! plus [`state::Command`]s; [`fetch::Fetcher`] runs those on tokio and sends
//! the results back as [`state::Message`]s; [`ui::render`] draws [`app::App`].

pub mod api;
pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod fetch;
pub mod geo;
pub mod history;
pub mod map;
pub mod metric;
pub mod state;
pub mod stats;
pub mod ui;
