use std::sync::Arc;

use safemaps::{
    AppState,
    augment::RouteAugmenter,
    cache::RouteCache,
    config::ServerConfig,
    create_router,
    engine::SafeRouteEngine,
    grid::GridStore,
    provider::OsrmClient,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "safemaps=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        "crime grid: {}, lighting grid: {}",
        config.grids.crime_path.display(),
        config.grids.lighting_path.display()
    );

    let grids = Arc::new(GridStore::new(config.grids.clone()));
    // Parse the grids before serving so the first request does not pay for it.
    if grids.is_unavailable() {
        tracing::warn!("serving with neutral safety scores");
    }

    let provider = OsrmClient::new(config.osrm_base_url.clone(), config.provider_timeout)?;
    tracing::info!("routing provider: {}", config.osrm_base_url);

    let engine = SafeRouteEngine::new(provider, grids)
        .with_augmenter(RouteAugmenter::new(config.provider_timeout))
        .with_cache(RouteCache::new(config.cache_ttl, config.cache_capacity));
    let app = create_router(AppState {
        engine: Arc::new(engine),
    });

    tracing::info!("starting safemaps on http://{}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
