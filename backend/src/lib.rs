pub mod augment;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod models;
pub mod provider;
pub mod ranking;
pub mod scoring;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use tower_http::cors::{Any, CorsLayer};

use crate::engine::SafeRouteEngine;
use crate::error::RouteError;
use crate::models::{ApiError, Coordinate, RankedResult, RouteQuery, TimeOfDay};
use crate::provider::RoutingProvider;

pub struct AppState<P> {
    pub engine: Arc<SafeRouteEngine<P>>,
}

impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

pub fn create_router<P: RoutingProvider + 'static>(state: AppState<P>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/route", get(route_handler::<P>))
        .route("/api/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

async fn route_handler<P: RoutingProvider + 'static>(
    State(state): State<AppState<P>>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<RankedResult>, (StatusCode, Json<ApiError>)> {
    let (from, to) = match (query.from.as_deref(), query.to.as_deref()) {
        (Some(from), Some(to)) => (
            parse_coordinate(from).map_err(api_error)?,
            parse_coordinate(to).map_err(api_error)?,
        ),
        _ => return Err(api_error(RouteError::MissingEndpoints)),
    };
    let night = matches!(query.night.as_deref(), Some("true" | "1"));

    tracing::info!("route request: {from:?} -> {to:?} (night: {night})");

    state
        .engine
        .plan(from, to, TimeOfDay::from_night_flag(night))
        .await
        .map(Json)
        .map_err(api_error)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

/// Parse `lat,lng` as sent by clients.
pub fn parse_coordinate(raw: &str) -> Result<Coordinate, RouteError> {
    let invalid = || RouteError::InvalidCoordinate(raw.to_string());
    let (lat, lng) = raw.split_once(',').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(invalid());
    }
    Ok(Coordinate { lat, lng })
}

fn api_error(err: RouteError) -> (StatusCode, Json<ApiError>) {
    let status = match err {
        RouteError::InvalidCoordinate(_) | RouteError::MissingEndpoints => StatusCode::BAD_REQUEST,
        RouteError::NoRoute => StatusCode::NOT_FOUND,
        RouteError::Scoring(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ApiError {
            error: err.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lat_lng_pairs() {
        assert_eq!(
            parse_coordinate("49.2827, -123.1207").unwrap(),
            Coordinate::new(49.2827, -123.1207)
        );
    }

    #[test]
    fn rejects_malformed_coordinates() {
        let malformed = [
            "",
            "49.28",
            "49.28,",
            "abc,def",
            "49.28,-123.12,5",
            "91,0",
            "0,181",
            "NaN,0",
        ];
        for raw in malformed {
            assert!(
                matches!(parse_coordinate(raw), Err(RouteError::InvalidCoordinate(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn maps_route_errors_to_status_codes() {
        let status = |err| api_error(err).0;
        assert_eq!(status(RouteError::MissingEndpoints), StatusCode::BAD_REQUEST);
        assert_eq!(status(RouteError::NoRoute), StatusCode::NOT_FOUND);
        assert_eq!(
            status(RouteError::Scoring("task panicked".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
