use crate::models::{RankedResult, ScoredRoute};

pub const TOP_OPTIONS: usize = 3;

/// Indices of the safest routes first. Ties keep input order.
pub fn safest_options(routes: &[ScoredRoute], limit: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..routes.len()).collect();
    indices.sort_by(|&a, &b| routes[b].safety_score.cmp(&routes[a].safety_score));
    indices.truncate(limit);
    indices
}

/// Indices of the quickest routes first. Ties keep input order.
pub fn fastest_options(routes: &[ScoredRoute], limit: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..routes.len()).collect();
    indices.sort_by(|&a, &b| routes[a].duration.total_cmp(&routes[b].duration));
    indices.truncate(limit);
    indices
}

pub fn rank_routes(routes: Vec<ScoredRoute>) -> RankedResult {
    let safest = safest_options(&routes, TOP_OPTIONS);
    let fastest = fastest_options(&routes, TOP_OPTIONS);
    RankedResult {
        recommended: safest.first().copied().unwrap_or(0),
        fastest: fastest.first().copied().unwrap_or(0),
        safest_options: safest,
        fastest_options: fastest,
        routes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(safety_score: u8, duration: f64) -> ScoredRoute {
        ScoredRoute {
            geometry: Vec::new(),
            duration,
            distance: duration * 1.4,
            safety_score,
            crime_score: 50,
            lighting_score: 50,
            segments: Vec::new(),
            danger_points: Vec::new(),
        }
    }

    #[test]
    fn picks_safest_three() {
        let routes: Vec<_> = [10, 90, 50, 70, 30]
            .into_iter()
            .map(|score| route(score, 100.0))
            .collect();
        let ranked = rank_routes(routes);
        assert_eq!(ranked.safest_options, vec![1, 3, 2]);
        assert_eq!(ranked.recommended, 1);
    }

    #[test]
    fn picks_fastest_three() {
        let routes: Vec<_> = [300.0, 100.0, 250.0, 400.0, 50.0]
            .into_iter()
            .map(|duration| route(50, duration))
            .collect();
        let ranked = rank_routes(routes);
        assert_eq!(ranked.fastest_options, vec![4, 1, 2]);
        assert_eq!(ranked.fastest, 4);
    }

    #[test]
    fn ties_keep_input_order() {
        let routes = vec![route(70, 200.0), route(80, 100.0), route(70, 100.0), route(80, 300.0)];
        assert_eq!(safest_options(&routes, 4), vec![1, 3, 0, 2]);
        assert_eq!(fastest_options(&routes, 4), vec![1, 2, 0, 3]);
    }

    #[test]
    fn single_route_is_both_recommended_and_fastest() {
        let ranked = rank_routes(vec![route(42, 600.0)]);
        assert_eq!(ranked.safest_options, vec![0]);
        assert_eq!(ranked.fastest_options, vec![0]);
        assert_eq!(ranked.recommended, 0);
        assert_eq!(ranked.fastest, 0);
    }

    #[test]
    fn empty_list_defaults_to_zero() {
        let ranked = rank_routes(Vec::new());
        assert!(ranked.safest_options.is_empty());
        assert!(ranked.fastest_options.is_empty());
        assert_eq!(ranked.recommended, 0);
        assert_eq!(ranked.fastest, 0);
    }
}
