use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn interpolate(self, other: Self, t: f64) -> Self {
        Self {
            lat: self.lat + (other.lat - self.lat) * t,
            lng: self.lng + (other.lng - self.lng) * t,
        }
    }
}

/// Safety score of the stretch between two consecutive sample points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentScore {
    pub start: Coordinate,
    pub end: Coordinate,
    pub score: u8,
}

/// Sample point whose normalized crime density crosses the hotspot threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DangerPoint {
    pub lat: f64,
    pub lng: f64,
    pub intensity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredRoute {
    pub geometry: Vec<Coordinate>,
    /// Whole seconds.
    pub duration: f64,
    /// Whole meters.
    pub distance: f64,
    pub safety_score: u8,
    pub crime_score: u8,
    pub lighting_score: u8,
    pub segments: Vec<SegmentScore>,
    pub danger_points: Vec<DangerPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    pub routes: Vec<ScoredRoute>,
    pub recommended: usize,
    pub fastest: usize,
    pub safest_options: Vec<usize>,
    pub fastest_options: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}
