use crate::models::Coordinate;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters.
pub fn haversine_m(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlng = (dlng / 2.0).sin();

    let h = (sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlng * sin_dlng).min(1.0);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Densify a route into the points that get scored.
///
/// Every vertex pair is split into `max(1, floor(d / interval_m))` equal
/// steps and the route's last vertex is appended once, so short segments
/// are sampled finer than `interval_m`. An empty geometry yields no points.
pub fn sample_points(geometry: &[Coordinate], interval_m: f64) -> Vec<Coordinate> {
    let Some(&last) = geometry.last() else {
        return Vec::new();
    };

    let mut points = Vec::with_capacity(geometry.len() * 2);
    for window in geometry.windows(2) {
        let (start, end) = (window[0], window[1]);
        let distance = haversine_m(start, end);
        let steps = ((distance / interval_m).floor() as usize).max(1);
        for j in 0..steps {
            points.push(start.interpolate(end, j as f64 / steps as f64));
        }
    }
    points.push(last);
    points
}

pub fn midpoint(a: Coordinate, b: Coordinate) -> Coordinate {
    a.interpolate(b, 0.5)
}

/// Euclidean length of the lat/lng delta, in degrees. City scale only.
pub fn straight_line_deg(a: Coordinate, b: Coordinate) -> f64 {
    let dlat = b.lat - a.lat;
    let dlng = b.lng - a.lng;
    (dlat * dlat + dlng * dlng).sqrt()
}

/// Unit vector perpendicular to `start -> end`, treating lat/lng as a plane.
pub fn perpendicular_unit(start: Coordinate, end: Coordinate) -> Coordinate {
    let dlat = end.lat - start.lat;
    let dlng = end.lng - start.lng;
    let len = (dlat * dlat + dlng * dlng).sqrt().max(f64::EPSILON);
    Coordinate {
        lat: -dlng / len,
        lng: dlat / len,
    }
}
