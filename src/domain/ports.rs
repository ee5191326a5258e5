use crate::domain::model::{Coordinate, CountryCode, PostalEntry, RouteRow, RunSummary};
use crate::core::report::RenderOutcome;
use crate::utils::error::{Result, RouteFetchError};
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Human-readable location of `path` for log and console output.
    fn location(&self, path: &str) -> String;
}

/// Offline postal-code table keyed by country.
pub trait PostalLookup: Send + Sync {
    fn lookup(&self, country: &CountryCode, postal_code: &str) -> Option<PostalEntry>;
}

#[async_trait]
pub trait RouteService: Send + Sync {
    /// Returns the driving route as `[lat, lon]` coordinates.
    async fn fetch_route(
        &self,
        from: Coordinate,
        to: Coordinate,
        timeout: Duration,
    ) -> std::result::Result<Vec<Coordinate>, RouteFetchError>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<RouteRow>>;
    async fn transform(&self, rows: Vec<RouteRow>) -> Result<RenderOutcome>;
    async fn load(&self, outcome: RenderOutcome) -> Result<RunSummary>;
}
