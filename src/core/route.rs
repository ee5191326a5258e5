use crate::domain::model::{ResolvedPoint, RouteLine};
use crate::domain::ports::RouteService;
use crate::utils::error::{RouteFetchError, RowError};
use crate::utils::retry::{retry, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::fmt;

const HUE_SATURATION: f64 = 0.75;
const HUE_VALUE: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    /// 直線連接 (as the crow flies)
    #[default]
    Straight,
    Routed,
}

/// `#rrggbb`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HexColor(String);

impl HexColor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Spreads `total` colors evenly around the hue circle.
pub fn color_for(index: usize, total: usize) -> HexColor {
    let total = total.max(1);
    // sector position in [0, 6), computed without dividing first
    let sector_pos = ((index % total) as f64 * 6.0) / total as f64;
    let (r, g, b) = hsv_to_rgb(sector_pos, HUE_SATURATION, HUE_VALUE);
    HexColor(format!(
        "#{:02x}{:02x}{:02x}",
        to_channel(r),
        to_channel(g),
        to_channel(b)
    ))
}

fn to_channel(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

fn hsv_to_rgb(sector_pos: f64, s: f64, v: f64) -> (f64, f64, f64) {
    let sector = sector_pos.floor();
    let f = sector_pos - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as u8 % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

pub fn straight_line(from: &ResolvedPoint, to: &ResolvedPoint) -> RouteLine {
    RouteLine::between(from.coordinate(), to.coordinate())
}

pub struct RouteBuilder<R: RouteService> {
    mode: RouteMode,
    service: R,
    policy: RetryPolicy,
}

impl<R: RouteService> RouteBuilder<R> {
    pub fn new(mode: RouteMode, service: R, policy: RetryPolicy) -> Self {
        Self {
            mode,
            service,
            policy,
        }
    }

    pub fn mode(&self) -> RouteMode {
        self.mode
    }

    pub async fn build(&self, from: &ResolvedPoint, to: &ResolvedPoint) -> Result<RouteLine, RowError> {
        match self.mode {
            RouteMode::Straight => Ok(straight_line(from, to)),
            RouteMode::Routed => self.routed_line(from, to).await,
        }
    }

    pub async fn routed_line(&self, from: &ResolvedPoint, to: &ResolvedPoint) -> Result<RouteLine, RowError> {
        let (start, end) = (from.coordinate(), to.coordinate());

        retry(&self.policy, RouteFetchError::is_transient, |attempt| {
            tracing::debug!(
                "Routing {},{} -> {},{} (attempt {})",
                start.latitude,
                start.longitude,
                end.latitude,
                end.longitude,
                attempt
            );
            let fetch = self.service.fetch_route(start, end, self.policy.timeout);
            async move {
                // 少於兩點也算失敗，交給 retry 重試
                let points = fetch.await?;
                RouteLine::new(points).ok_or_else(|| {
                    RouteFetchError::Malformed("route has fewer than two points".to_string())
                })
            }
        })
        .await
        .map_err(|exhausted| RowError::Routing {
            attempts: exhausted.attempts,
            elapsed: exhausted.elapsed,
            last_error: exhausted.last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::osrm::OsrmClient;
    use crate::domain::model::{Coordinate, CountryCode};
    use async_trait::async_trait;
    use httpmock::prelude::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Fails with 503 until `fail_times` calls have been made.
    struct FlakyService {
        fail_times: u32,
        calls: AtomicU32,
    }

    impl FlakyService {
        fn new(fail_times: u32) -> Self {
            Self {
                fail_times,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RouteService for FlakyService {
        async fn fetch_route(
            &self,
            from: Coordinate,
            to: Coordinate,
            _timeout: Duration,
        ) -> Result<Vec<Coordinate>, RouteFetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.fail_times {
                Err(RouteFetchError::Status { status: 503 })
            } else {
                Ok(vec![from, Coordinate::new(47.2, 9.2), to])
            }
        }
    }

    /// Returns a single-point geometry on the first call, a full one after.
    struct ShortFirstService {
        calls: AtomicU32,
    }

    #[async_trait]
    impl RouteService for ShortFirstService {
        async fn fetch_route(
            &self,
            from: Coordinate,
            to: Coordinate,
            _timeout: Duration,
        ) -> Result<Vec<Coordinate>, RouteFetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n == 1 {
                Ok(vec![from])
            } else {
                Ok(vec![from, to])
            }
        }
    }

    fn point(lat: f64, lon: f64, name: &str, cc: &str) -> ResolvedPoint {
        ResolvedPoint {
            latitude: lat,
            longitude: lon,
            place_name: name.to_string(),
            country_code: CountryCode::normalized(cc),
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            timeout: Duration::from_secs(5),
            delay: Duration::ZERO,
            retry_all: true,
        }
    }

    #[test]
    fn test_straight_line_is_exactly_the_endpoints() {
        let a = point(47.0, 9.0, "A", "CH");
        let b = point(47.5, 9.5, "B", "LI");
        let line = straight_line(&a, &b);
        assert_eq!(
            line.points(),
            &[Coordinate::new(47.0, 9.0), Coordinate::new(47.5, 9.5)]
        );
    }

    #[test]
    fn test_color_for_distinct_and_deterministic() {
        for total in [1usize, 2, 7, 10, 36] {
            let colors: HashSet<HexColor> = (0..total).map(|i| color_for(i, total)).collect();
            assert_eq!(colors.len(), total, "total = {}", total);
        }
        assert_eq!(color_for(3, 10), color_for(3, 10));
    }

    #[test]
    fn test_color_for_format() {
        let first = color_for(0, 10);
        assert_eq!(first.as_str(), "#e63939");
        for i in 0..10 {
            let c = color_for(i, 10);
            assert_eq!(c.as_str().len(), 7);
            assert!(c.as_str().starts_with('#'));
            assert!(c.as_str()[1..].chars().all(|ch| ch.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn test_color_for_zero_total_does_not_panic() {
        assert_eq!(color_for(0, 0), color_for(0, 1));
    }

    #[tokio::test]
    async fn test_straight_mode_never_calls_service() {
        let service = FlakyService::new(0);
        let builder = RouteBuilder::new(RouteMode::Straight, service, policy(3));
        let line = builder
            .build(&point(47.0, 9.0, "A", "CH"), &point(47.5, 9.5, "B", "CH"))
            .await
            .unwrap();
        assert_eq!(line.len(), 2);
        assert_eq!(builder.service.calls(), 0);
    }

    #[tokio::test]
    async fn test_routed_line_recovers_after_transient_failures() {
        let builder = RouteBuilder::new(RouteMode::Routed, FlakyService::new(2), policy(3));
        let line = builder
            .build(&point(47.0, 9.0, "A", "CH"), &point(47.5, 9.5, "B", "CH"))
            .await
            .unwrap();

        assert_eq!(line.len(), 3);
        assert_eq!(builder.service.calls(), 3);
    }

    #[tokio::test]
    async fn test_routed_line_raises_once_after_all_attempts() {
        let builder = RouteBuilder::new(RouteMode::Routed, FlakyService::new(u32::MAX), policy(3));
        let err = builder
            .routed_line(&point(47.0, 9.0, "A", "CH"), &point(47.5, 9.5, "B", "CH"))
            .await
            .unwrap_err();

        assert_eq!(builder.service.calls(), 3);
        match err {
            RowError::Routing {
                attempts,
                last_error,
                ..
            } => {
                assert_eq!(attempts, 3);
                assert!(matches!(last_error, RouteFetchError::Status { status: 503 }));
            }
            other => panic!("expected routing error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_short_geometry_is_retried() {
        let service = ShortFirstService {
            calls: AtomicU32::new(0),
        };
        let builder = RouteBuilder::new(RouteMode::Routed, service, policy(3));
        let line = builder
            .routed_line(&point(47.0, 9.0, "A", "CH"), &point(47.5, 9.5, "B", "CH"))
            .await
            .unwrap();

        assert_eq!(line.len(), 2);
        assert_eq!(builder.service.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_short_geometry_exhausts_attempts() {
        let service = ShortFirstService {
            calls: AtomicU32::new(0),
        };
        let builder = RouteBuilder::new(RouteMode::Routed, service, policy(1));
        let err = builder
            .routed_line(&point(47.0, 9.0, "A", "CH"), &point(47.5, 9.5, "B", "CH"))
            .await
            .unwrap_err();

        match err {
            RowError::Routing {
                attempts,
                last_error,
                ..
            } => {
                assert_eq!(attempts, 1);
                assert!(matches!(last_error, RouteFetchError::Malformed(_)));
            }
            other => panic!("expected routing error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_routed_line_against_failing_http_service() {
        let server = MockServer::start_async().await;
        let route_mock = server
            .mock_async(|when, then| {
                when.method(GET).path_contains("/route/v1/driving/");
                then.status(502);
            })
            .await;

        let client = OsrmClient::new(reqwest::Client::new(), server.base_url(), "driving");
        let builder = RouteBuilder::new(RouteMode::Routed, client, policy(4));
        let err = builder
            .routed_line(&point(47.0, 9.0, "A", "CH"), &point(47.5, 9.5, "B", "CH"))
            .await
            .unwrap_err();

        route_mock.assert_hits_async(4).await;
        assert!(matches!(err, RowError::Routing { attempts: 4, .. }));
    }

    #[tokio::test]
    async fn test_strict_policy_does_not_retry_client_errors() {
        let server = MockServer::start_async().await;
        let route_mock = server
            .mock_async(|when, then| {
                when.method(GET).path_contains("/route/v1/driving/");
                then.status(400);
            })
            .await;

        let client = OsrmClient::new(reqwest::Client::new(), server.base_url(), "driving");
        let strict = RetryPolicy {
            retry_all: false,
            ..policy(4)
        };
        let builder = RouteBuilder::new(RouteMode::Routed, client, strict);
        let err = builder
            .routed_line(&point(47.0, 9.0, "A", "CH"), &point(47.5, 9.5, "B", "CH"))
            .await
            .unwrap_err();

        route_mock.assert_hits_async(1).await;
        assert!(matches!(err, RowError::Routing { attempts: 1, .. }));
    }
}
