use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid coordinate `{0}`, expected `lat,lng`")]
    InvalidCoordinate(String),
    #[error("missing or invalid from/to, use ?from=lat,lng&to=lat,lng")]
    MissingEndpoints,
    #[error("No route found")]
    NoRoute,
    #[error("route scoring failed: {0}")]
    Scoring(String),
}
