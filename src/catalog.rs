//! Catalog service: owns the query engine, detail aggregator and the
//! cancellation tokens of in-flight work, and turns effects into actions

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::action::Action;
use crate::api::CatalogSource;
use crate::cache::ResolverCache;
use crate::config::Config;
use crate::detail::DetailAggregator;
use crate::error::CatalogError;
use crate::query::{self, QueryEngine};
use crate::resolver::Resolver;

struct Generation {
    id: u64,
    token: CancellationToken,
}

pub struct Catalog {
    config: Config,
    engine: QueryEngine,
    details: DetailAggregator,
    generation: Mutex<Option<Generation>>,
    detail_token: Mutex<Option<CancellationToken>>,
}

impl Catalog {
    pub fn new(source: Arc<dyn CatalogSource>, config: Config) -> Self {
        Self::with_cache(source, config, Arc::new(ResolverCache::new()))
    }

    pub fn with_cache(
        source: Arc<dyn CatalogSource>,
        config: Config,
        cache: Arc<ResolverCache>,
    ) -> Self {
        let resolver = Arc::new(Resolver::new(
            Arc::clone(&source),
            cache,
            config.max_lineage_depth,
        ));
        let engine = QueryEngine::new(
            Arc::clone(&source),
            resolver,
            config.unfiltered_cap,
            config.lookup_concurrency,
        );
        let details = DetailAggregator::new(source, config.detail_timeout);
        Self {
            config,
            engine,
            details,
            generation: Mutex::new(None),
            detail_token: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    pub fn details(&self) -> &DetailAggregator {
        &self.details
    }

    pub fn cache(&self) -> &Arc<ResolverCache> {
        self.engine.resolver().cache()
    }

    /// Cancel whatever generation is live and make `id` the live one.
    pub fn begin_generation(&self, id: u64) -> CancellationToken {
        let mut current = lock(&self.generation);
        if let Some(previous) = current.take() {
            tracing::debug!(previous = previous.id, next = id, "superseding generation");
            previous.token.cancel();
        }
        let token = CancellationToken::new();
        *current = Some(Generation {
            id,
            token: token.clone(),
        });
        token
    }

    /// Token for a follow-up page of generation `id`; `None` once superseded.
    ///
    /// Pages get a child token so a refresh cancels them, while a page never
    /// cancels its own generation.
    pub fn page_token(&self, id: u64) -> Option<CancellationToken> {
        lock(&self.generation)
            .as_ref()
            .filter(|generation| generation.id == id)
            .map(|generation| generation.token.child_token())
    }

    /// Fresh token for a detail load, cancelling the previous one.
    pub fn begin_detail(&self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some(previous) = lock(&self.detail_token).replace(token.clone()) {
            previous.cancel();
        }
        token
    }

    pub fn cancel_detail(&self) {
        if let Some(previous) = lock(&self.detail_token).take() {
            previous.cancel();
        }
    }

    pub async fn refresh(
        &self,
        generation: u64,
        groups: &[String],
        search: &str,
        page_size: usize,
        token: CancellationToken,
    ) -> Action {
        let result = async {
            let candidates = self
                .engine
                .build_candidate_set(groups, search, &token)
                .await?;
            let first = query::page(&candidates, 0, page_size);
            let entries = self.engine.load_entries(first, &token).await?;
            Ok::<_, CatalogError>((candidates, entries))
        }
        .await;

        match result {
            Ok((candidates, entries)) => {
                tracing::debug!(
                    generation,
                    candidates = candidates.len(),
                    "catalog refreshed"
                );
                Action::CatalogDidLoad {
                    generation,
                    candidates,
                    entries,
                }
            }
            Err(err) if err.is_cancelled() => Action::CatalogDidCancel { generation },
            Err(err) => {
                tracing::warn!(generation, %err, "catalog refresh failed");
                Action::CatalogDidError {
                    generation,
                    error: err.to_string(),
                }
            }
        }
    }

    pub async fn load_page(
        &self,
        generation: u64,
        page: usize,
        names: &[String],
        token: CancellationToken,
    ) -> Action {
        match self.engine.load_entries(names, &token).await {
            Ok(entries) => Action::PageDidLoad {
                generation,
                page,
                entries,
            },
            Err(err) if err.is_cancelled() => Action::CatalogDidCancel { generation },
            Err(err) => {
                tracing::warn!(generation, page, %err, "page load failed");
                Action::PageDidError {
                    generation,
                    error: err.to_string(),
                }
            }
        }
    }

    pub async fn load_detail(&self, name: &str, token: CancellationToken) -> Action {
        match self.details.full_detail(name, &token).await {
            Ok(detail) => Action::DetailDidLoad {
                name: name.to_string(),
                detail,
            },
            Err(err) if err.is_cancelled() => Action::DetailDidCancel {
                name: name.to_string(),
            },
            Err(err) => {
                tracing::warn!(name, %err, "detail load failed");
                Action::DetailDidError {
                    name: name.to_string(),
                    error: err.to_string(),
                }
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
