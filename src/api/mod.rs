//! Statistics API access: payload types, errors and the HTTP client.

mod client;
mod error;
mod types;

use async_trait::async_trait;

pub use client::{DiseaseClient, Endpoint};
pub use error::ApiError;
pub use types::{ordered_series, CountryInfo, Snapshot, Timeline};

/// Source of dashboard data. Implemented by [`DiseaseClient`]; tests swap in
/// an in-memory source.
#[async_trait]
pub trait StatsSource: Send + Sync + 'static {
    /// Fetch a single snapshot (`/all` or `/countries/{code}`)
    async fn fetch(&self, endpoint: Endpoint) -> Result<Snapshot, ApiError>;

    /// Fetch every country's snapshot
    async fn fetch_countries(&self) -> Result<Vec<Snapshot>, ApiError>;

    /// Fetch the worldwide cumulative timeline
    async fn fetch_timeline(&self, last_days: u32) -> Result<Timeline, ApiError>;
}
