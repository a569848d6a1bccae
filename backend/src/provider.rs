use std::{future::Future, time::Duration};

use serde::Deserialize;

use crate::models::{CandidateRoute, Coordinate};

pub const DEFAULT_OSRM_BASE_URL: &str = "https://router.project-osrm.org/route/v1/foot";

/// External walking-route service.
///
/// Implementations receive an ordered waypoint list (start, optional
/// via-points, end) and return every route they can offer, alternatives
/// included. An empty list means "no route".
pub trait RoutingProvider: Send + Sync {
    fn routes(
        &self,
        waypoints: &[Coordinate],
    ) -> impl Future<Output = Result<Vec<CandidateRoute>, ProviderError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("routing request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("routing service answered with HTTP {0}")]
    Status(u16),
    #[error("routing request timed out after {0:?}")]
    Timeout(Duration),
    #[error("a route needs at least two waypoints, got {0}")]
    TooFewWaypoints(usize),
}

/// OSRM `route` service client.
#[derive(Clone, Debug)]
pub struct OsrmClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    duration: f64,
    distance: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// GeoJSON order: `[lng, lat]`.
    coordinates: Vec<[f64; 2]>,
}

impl OsrmClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn request_url(&self, waypoints: &[Coordinate]) -> String {
        let coords = waypoints
            .iter()
            .map(|c| format!("{},{}", c.lng, c.lat))
            .collect::<Vec<_>>()
            .join(";");
        format!(
            "{}/{coords}?alternatives=3&geometries=geojson&overview=full",
            self.base_url
        )
    }
}

impl RoutingProvider for OsrmClient {
    async fn routes(&self, waypoints: &[Coordinate]) -> Result<Vec<CandidateRoute>, ProviderError> {
        if waypoints.len() < 2 {
            return Err(ProviderError::TooFewWaypoints(waypoints.len()));
        }
        let url = self.request_url(waypoints);
        tracing::debug!("OSRM request: {url}");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }
        let body: OsrmResponse = response.json().await?;
        if body.code != "Ok" {
            tracing::debug!("OSRM returned code {} for {} waypoints", body.code, waypoints.len());
            return Ok(Vec::new());
        }

        Ok(body.routes.into_iter().map(CandidateRoute::from).collect())
    }
}

impl From<OsrmRoute> for CandidateRoute {
    fn from(route: OsrmRoute) -> Self {
        Self {
            geometry: route
                .geometry
                .coordinates
                .into_iter()
                .map(|[lng, lat]| Coordinate { lat, lng })
                .collect(),
            duration_s: route.duration,
            distance_m: route.distance,
        }
    }
}
