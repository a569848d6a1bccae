use std::sync::Arc;

use rayon::prelude::*;

use crate::{
    geometry::sample_points,
    grid::{DEFAULT_LIGHT_RADIUS_M, GridStore, Grids},
    models::{CandidateRoute, Coordinate, DangerPoint, ScoredRoute, SegmentScore, TimeOfDay},
};

/// Offset of the canonical safety formula `60 + avgSafety * 120`.
pub const SAFETY_OFFSET: f64 = 60.0;
/// Scale of the canonical safety formula `60 + avgSafety * 120`.
pub const SAFETY_SCALE: f64 = 120.0;
pub const NEUTRAL_SCORE: u8 = 50;
/// Normalized crime above which a sample point is reported as a hotspot.
pub const DANGER_THRESHOLD: f64 = 0.4;
pub const SAMPLE_INTERVAL_M: f64 = 50.0;

/// Relative importance of lighting and crime for one time of day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyWeights {
    pub light: f64,
    pub crime: f64,
}

/// By day crime avoidance dominates; at night lighting counts as much as crime.
pub const DAY_WEIGHTS: SafetyWeights = SafetyWeights {
    light: 0.1,
    crime: 0.9,
};
pub const NIGHT_WEIGHTS: SafetyWeights = SafetyWeights {
    light: 0.5,
    crime: 0.5,
};

/// Tuning knobs of the scorer. [`Default`] is the canonical formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    pub offset: f64,
    pub scale: f64,
    pub day: SafetyWeights,
    pub night: SafetyWeights,
    pub danger_threshold: f64,
    pub sample_interval_m: f64,
    pub light_radius_m: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            offset: SAFETY_OFFSET,
            scale: SAFETY_SCALE,
            day: DAY_WEIGHTS,
            night: NIGHT_WEIGHTS,
            danger_threshold: DANGER_THRESHOLD,
            sample_interval_m: SAMPLE_INTERVAL_M,
            light_radius_m: DEFAULT_LIGHT_RADIUS_M,
        }
    }
}

impl ScoringConfig {
    pub fn weights(&self, time_of_day: TimeOfDay) -> SafetyWeights {
        match time_of_day {
            TimeOfDay::Day => self.day,
            TimeOfDay::Night => self.night,
        }
    }

    /// Map a mean local safety onto `0..=100`.
    pub fn to_score(&self, safety: f64) -> u8 {
        percent(self.offset + safety * self.scale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredPoint {
    pub coord: Coordinate,
    pub normalized_crime: f64,
    pub normalized_light: f64,
    pub local_safety: f64,
}

/// Safety breakdown of one route geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct SafetyReport {
    pub safety_score: u8,
    pub crime_score: u8,
    pub lighting_score: u8,
    pub segments: Vec<SegmentScore>,
    pub danger_points: Vec<DangerPoint>,
}

impl SafetyReport {
    pub fn neutral() -> Self {
        Self {
            safety_score: NEUTRAL_SCORE,
            crime_score: NEUTRAL_SCORE,
            lighting_score: NEUTRAL_SCORE,
            segments: Vec::new(),
            danger_points: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SafetyScorer {
    grids: Arc<GridStore>,
    config: ScoringConfig,
}

impl SafetyScorer {
    pub fn new(grids: Arc<GridStore>) -> Self {
        Self::with_config(grids, ScoringConfig::default())
    }

    pub fn with_config(grids: Arc<GridStore>, config: ScoringConfig) -> Self {
        Self { grids, config }
    }

    pub fn grids(&self) -> Arc<GridStore> {
        Arc::clone(&self.grids)
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score one provider route. Never fails: missing data or a degenerate
    /// geometry produce the neutral 50/50/50 report.
    pub fn score_route(&self, route: &CandidateRoute, time_of_day: TimeOfDay) -> ScoredRoute {
        let report = self.score_geometry(&route.geometry, time_of_day);
        ScoredRoute {
            geometry: route.geometry.clone(),
            duration: route.duration_s.round(),
            distance: route.distance_m.round(),
            safety_score: report.safety_score,
            crime_score: report.crime_score,
            lighting_score: report.lighting_score,
            segments: report.segments,
            danger_points: report.danger_points,
        }
    }

    /// Score every candidate in parallel, preserving input order.
    pub fn score_routes(
        &self,
        routes: &[CandidateRoute],
        time_of_day: TimeOfDay,
    ) -> Vec<ScoredRoute> {
        routes
            .par_iter()
            .map(|route| self.score_route(route, time_of_day))
            .collect()
    }

    pub fn score_geometry(&self, geometry: &[Coordinate], time_of_day: TimeOfDay) -> SafetyReport {
        if geometry.len() < 2 {
            return SafetyReport::neutral();
        }
        let Some(grids) = self.grids.load() else {
            return SafetyReport::neutral();
        };

        let points: Vec<ScoredPoint> = sample_points(geometry, self.config.sample_interval_m)
            .into_iter()
            .map(|coord| self.score_point(grids, coord, time_of_day))
            .collect();
        self.aggregate(&points)
    }

    pub fn score_point(
        &self,
        grids: &Grids,
        coord: Coordinate,
        time_of_day: TimeOfDay,
    ) -> ScoredPoint {
        let crime = grids.crime.count_at(coord.lat, coord.lng);
        let lights = grids
            .lighting
            .sum_around(coord.lat, coord.lng, self.config.light_radius_m);

        let normalized_crime = log_normalize(crime, grids.crime.max_count());
        let normalized_light = log_normalize(lights, grids.lighting.max_count());
        let weights = self.config.weights(time_of_day);

        ScoredPoint {
            coord,
            normalized_crime,
            normalized_light,
            local_safety: weights.light * normalized_light - weights.crime * normalized_crime,
        }
    }

    fn aggregate(&self, points: &[ScoredPoint]) -> SafetyReport {
        if points.is_empty() {
            return SafetyReport::neutral();
        }
        let n = points.len() as f64;
        let avg_safety = points.iter().map(|p| p.local_safety).sum::<f64>() / n;
        let mean_crime = points.iter().map(|p| p.normalized_crime).sum::<f64>() / n;
        let mean_light = points.iter().map(|p| p.normalized_light).sum::<f64>() / n;

        let segments = points
            .windows(2)
            .map(|pair| SegmentScore {
                start: pair[0].coord,
                end: pair[1].coord,
                score: self
                    .config
                    .to_score((pair[0].local_safety + pair[1].local_safety) / 2.0),
            })
            .collect();

        let danger_points = points
            .iter()
            .filter(|p| p.normalized_crime > self.config.danger_threshold)
            .map(|p| DangerPoint {
                lat: p.coord.lat,
                lng: p.coord.lng,
                intensity: p.normalized_crime,
            })
            .collect();

        SafetyReport {
            safety_score: self.config.to_score(avg_safety),
            crime_score: percent((1.0 - mean_crime) * 100.0),
            lighting_score: percent(mean_light * 100.0),
            segments,
            danger_points,
        }
    }
}

/// `log1p(count) / log1p(max)`, capped at 1. `max` is at least 1 so the
/// denominator is never zero.
///
/// Lighting compares a neighbourhood sum with the single-cell maximum, so the
/// uncapped ratio routinely exceeds 1 on lit streets.
pub fn log_normalize(count: u64, max: u64) -> f64 {
    let denominator = (max.max(1) as f64).ln_1p();
    ((count as f64).ln_1p() / denominator).clamp(0.0, 1.0)
}

fn percent(value: f64) -> u8 {
    if value.is_nan() {
        return NEUTRAL_SCORE;
    }
    value.round().clamp(0.0, 100.0) as u8
}
