use crate::domain::model::Coordinate;
use crate::domain::ports::RouteService;
use crate::utils::error::RouteFetchError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_OSRM_ENDPOINT: &str = "https://router.project-osrm.org";

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// GeoJSON order: `[lon, lat]`.
    coordinates: Vec<[f64; 2]>,
}

/// Client for the OSRM `route` service.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    client: Client,
    endpoint: String,
    profile: String,
}

impl OsrmClient {
    pub fn new(client: Client, endpoint: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            profile: profile.into(),
        }
    }

    pub fn route_url(&self, from: Coordinate, to: Coordinate) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}",
            self.endpoint.trim_end_matches('/'),
            self.profile,
            from.longitude,
            from.latitude,
            to.longitude,
            to.latitude
        )
    }
}

#[async_trait]
impl RouteService for OsrmClient {
    async fn fetch_route(
        &self,
        from: Coordinate,
        to: Coordinate,
        timeout: Duration,
    ) -> Result<Vec<Coordinate>, RouteFetchError> {
        let url = self.route_url(from, to);
        tracing::debug!("Requesting route: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Routing response status: {}", status);
        let body = response.text().await?;

        if !status.is_success() {
            // OSRM 的錯誤回應也帶有 code/message
            if let Ok(parsed) = serde_json::from_str::<OsrmResponse>(&body) {
                tracing::debug!(
                    "Routing service error {}: {}",
                    parsed.code,
                    parsed.message.as_deref().unwrap_or_default()
                );
            }
            return Err(RouteFetchError::Status {
                status: status.as_u16(),
            });
        }

        let parsed: OsrmResponse =
            serde_json::from_str(&body).map_err(|e| RouteFetchError::Malformed(e.to_string()))?;

        if parsed.code != "Ok" {
            return Err(RouteFetchError::Service {
                code: parsed.code,
                message: parsed.message.unwrap_or_default(),
            });
        }

        let route = parsed.routes.into_iter().next().ok_or(RouteFetchError::NoRoute)?;
        let points: Vec<Coordinate> = route
            .geometry
            .coordinates
            .into_iter()
            .map(|[lon, lat]| Coordinate::new(lat, lon))
            .collect();

        if points.len() < 2 {
            return Err(RouteFetchError::Malformed(format!(
                "route geometry has {} point(s)",
                points.len()
            )));
        }

        Ok(points)
    }
}
