use std::time::Duration;

use crate::{
    error::RouteError,
    geometry::{midpoint, perpendicular_unit, straight_line_deg},
    models::{CandidateRoute, Coordinate},
    provider::{ProviderError, RoutingProvider},
};

/// Below this many direct alternatives, detours are synthesized.
pub const MIN_ALTERNATIVES: usize = 3;
pub const MAX_ROUTES: usize = 4;
/// Via-point distance from the midpoint, as a fraction of the straight line.
pub const VIA_OFFSET_RATIO: f64 = 0.15;
/// Routes whose total distances differ by less than this are treated as the same path.
pub const DUPLICATE_DISTANCE_M: f64 = 5.0;
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Collects enough distinct walking routes to make ranking meaningful.
///
/// # Algorithm
///
/// 1. Ask the provider for `from -> to`.
/// 2. With fewer than [`MIN_ALTERNATIVES`] answers, place two via-points on
///    either side of the straight line, at its midpoint, offset by
///    [`VIA_OFFSET_RATIO`] of its length along the perpendicular.
/// 3. Route `from -> via -> to` for each and keep the first answer unless a
///    route of nearly the same length (within [`DUPLICATE_DISTANCE_M`]) is
///    already collected.
/// 4. Stop at [`MAX_ROUTES`].
///
/// Lat/lng are treated as a plane when placing via-points, which only
/// holds at city scale.
#[derive(Debug, Clone)]
pub struct RouteAugmenter {
    timeout: Duration,
}

impl Default for RouteAugmenter {
    fn default() -> Self {
        Self::new(DEFAULT_PROVIDER_TIMEOUT)
    }
}

impl RouteAugmenter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn candidates<P: RoutingProvider>(
        &self,
        provider: &P,
        from: Coordinate,
        to: Coordinate,
    ) -> Result<Vec<CandidateRoute>, RouteError> {
        let mut routes = match self.query(provider, &[from, to]).await {
            Ok(routes) if !routes.is_empty() => routes,
            Ok(_) => {
                tracing::info!("no direct route from {from:?} to {to:?}");
                return Err(RouteError::NoRoute);
            }
            Err(err) => {
                tracing::warn!("direct route query failed: {err}");
                return Err(RouteError::NoRoute);
            }
        };

        if routes.len() >= MIN_ALTERNATIVES {
            return Ok(routes);
        }

        for via in via_points(from, to) {
            match self.query(provider, &[from, via, to]).await {
                Ok(via_routes) => match via_routes.into_iter().next() {
                    Some(route) if !is_duplicate(&routes, &route) => {
                        tracing::debug!(
                            "added detour via {via:?}: {:.0} m, {:.0} s",
                            route.distance_m,
                            route.duration_s
                        );
                        routes.push(route);
                    }
                    Some(route) => {
                        tracing::debug!(
                            "dropped detour via {via:?}, {:.0} m matches an existing route",
                            route.distance_m
                        );
                    }
                    None => tracing::debug!("no detour route via {via:?}"),
                },
                Err(err) => tracing::debug!("detour query via {via:?} failed: {err}"),
            }
            if routes.len() >= MAX_ROUTES {
                break;
            }
        }

        Ok(routes)
    }

    async fn query<P: RoutingProvider>(
        &self,
        provider: &P,
        waypoints: &[Coordinate],
    ) -> Result<Vec<CandidateRoute>, ProviderError> {
        tokio::time::timeout(self.timeout, provider.routes(waypoints))
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout))?
    }
}

/// The two detour waypoints, left of the travel direction first.
pub fn via_points(from: Coordinate, to: Coordinate) -> [Coordinate; 2] {
    let mid = midpoint(from, to);
    let perp = perpendicular_unit(from, to);
    let offset = VIA_OFFSET_RATIO * straight_line_deg(from, to);
    [
        Coordinate {
            lat: mid.lat + perp.lat * offset,
            lng: mid.lng + perp.lng * offset,
        },
        Coordinate {
            lat: mid.lat - perp.lat * offset,
            lng: mid.lng - perp.lng * offset,
        },
    ]
}

fn is_duplicate(existing: &[CandidateRoute], candidate: &CandidateRoute) -> bool {
    existing
        .iter()
        .any(|route| (route.distance_m - candidate.distance_m).abs() < DUPLICATE_DISTANCE_M)
}
