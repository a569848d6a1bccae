use std::sync::Arc;

use crate::{
    augment::RouteAugmenter,
    cache::RouteCache,
    error::RouteError,
    grid::GridStore,
    models::{Coordinate, RankedResult, TimeOfDay},
    provider::RoutingProvider,
    ranking::rank_routes,
    scoring::{ScoringConfig, SafetyScorer},
};

/// Safety-aware route planner: candidates from the provider (or the cache),
/// scored against the grids, then ranked.
pub struct SafeRouteEngine<P> {
    provider: P,
    augmenter: RouteAugmenter,
    scorer: SafetyScorer,
    cache: Option<RouteCache>,
}

impl<P: RoutingProvider> SafeRouteEngine<P> {
    pub fn new(provider: P, grids: Arc<GridStore>) -> Self {
        Self {
            provider,
            augmenter: RouteAugmenter::default(),
            scorer: SafetyScorer::new(grids),
            cache: None,
        }
    }

    pub fn with_augmenter(mut self, augmenter: RouteAugmenter) -> Self {
        self.augmenter = augmenter;
        self
    }

    pub fn with_scoring(mut self, config: ScoringConfig) -> Self {
        self.scorer = SafetyScorer::with_config(self.scorer.grids(), config);
        self
    }

    pub fn with_cache(mut self, cache: RouteCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn scorer(&self) -> &SafetyScorer {
        &self.scorer
    }

    /// Plan, score and rank walking routes between two points.
    ///
    /// Fails with [`RouteError::NoRoute`] when the provider offers no route
    /// at all. Missing safety data degrades scores to neutral instead.
    pub async fn plan(
        &self,
        from: Coordinate,
        to: Coordinate,
        time_of_day: TimeOfDay,
    ) -> Result<RankedResult, RouteError> {
        let cached = self.cache.as_ref().and_then(|cache| cache.get(from, to));
        let candidates = match cached {
            Some(routes) => {
                tracing::debug!("route cache hit ({} routes)", routes.len());
                routes
            }
            None => {
                let routes = self.augmenter.candidates(&self.provider, from, to).await?;
                if let Some(cache) = &self.cache {
                    cache.set(from, to, routes.clone());
                }
                routes
            }
        };
        if candidates.is_empty() {
            return Err(RouteError::NoRoute);
        }

        // Long geometries make scoring CPU-bound; keep it off the async workers.
        let scorer = self.scorer.clone();
        let scored =
            tokio::task::spawn_blocking(move || scorer.score_routes(&candidates, time_of_day))
                .await
                .map_err(|err| {
                    tracing::error!("scoring task failed: {err}");
                    RouteError::Scoring(err.to_string())
                })?;
        let ranked = rank_routes(scored);
        tracing::info!(
            "ranked {} routes ({:?}): recommended #{} fastest #{}",
            ranked.routes.len(),
            time_of_day,
            ranked.recommended,
            ranked.fastest
        );
        Ok(ranked)
    }
}
