use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use crate::{
    cache::{DEFAULT_CAPACITY, DEFAULT_TTL},
    grid::GridSources,
    provider::DEFAULT_OSRM_BASE_URL,
};

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_CRIME_GRID_PATH: &str = "backend/data/crime-grid.json";
const DEFAULT_LIGHTING_GRID_PATH: &str = "backend/data/lighting.json";
const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value `{value}` for {var}")]
    Invalid { var: &'static str, value: String },
}

/// Server settings, read from the environment with sensible defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub grids: GridSources,
    pub osrm_base_url: String,
    pub provider_timeout: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let string = |var: &str, default: &str| lookup(var).unwrap_or_else(|| default.to_string());

        Ok(Self {
            addr: parse(&lookup, "SAFEMAPS_ADDR", SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))?,
            grids: GridSources {
                crime_path: PathBuf::from(string("CRIME_GRID_PATH", DEFAULT_CRIME_GRID_PATH)),
                lighting_path: PathBuf::from(string("LIGHTING_GRID_PATH", DEFAULT_LIGHTING_GRID_PATH)),
            },
            osrm_base_url: string("OSRM_BASE_URL", DEFAULT_OSRM_BASE_URL),
            provider_timeout: Duration::from_millis(parse(
                &lookup,
                "PROVIDER_TIMEOUT_MS",
                DEFAULT_PROVIDER_TIMEOUT_MS,
            )?),
            cache_ttl: Duration::from_secs(parse(
                &lookup,
                "ROUTE_CACHE_TTL_SECS",
                DEFAULT_TTL.as_secs(),
            )?),
            cache_capacity: parse(&lookup, "ROUTE_CACHE_CAPACITY", DEFAULT_CAPACITY)?,
        })
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}
