use serde::{Deserialize, Serialize};

pub use shared::{ApiError, Coordinate, DangerPoint, RankedResult, ScoredRoute, SegmentScore};

/// A route as returned by the routing provider. Never mutated after it is obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRoute {
    pub geometry: Vec<Coordinate>,
    pub duration_s: f64,
    pub distance_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    #[default]
    Day,
    Night,
}

impl TimeOfDay {
    pub fn from_night_flag(night: bool) -> Self {
        if night {
            Self::Night
        } else {
            Self::Day
        }
    }
}

/// Query string of `GET /api/route`.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(default)]
    pub night: Option<String>,
}
