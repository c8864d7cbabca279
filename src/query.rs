//! Catalog query engine: filter groups + search text -> sorted base forms

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::api::{CatalogSource, Lookup};
use crate::error::CatalogError;
use crate::filters;
use crate::resolver::Resolver;
use crate::state::CatalogEntry;

pub struct QueryEngine {
    source: Arc<dyn CatalogSource>,
    resolver: Arc<Resolver>,
    unfiltered_cap: usize,
    concurrency: usize,
}

impl QueryEngine {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        resolver: Arc<Resolver>,
        unfiltered_cap: usize,
        concurrency: usize,
    ) -> Self {
        Self {
            source,
            resolver,
            unfiltered_cap,
            concurrency: concurrency.max(1),
        }
    }

    pub fn resolver(&self) -> &Arc<Resolver> {
        &self.resolver
    }

    /// Ordered, de-duplicated base-form names matching the filters.
    ///
    /// Only cancellation is reported as an error; any other failure drops
    /// the affected candidates.
    pub async fn build_candidate_set(
        &self,
        groups: &[String],
        search: &str,
        token: &CancellationToken,
    ) -> Result<Vec<String>, CatalogError> {
        if token.is_cancelled() {
            return Err(CatalogError::Cancelled);
        }
        let pool = if groups.is_empty() {
            self.unfiltered_pool(token).await?
        } else {
            self.group_pool(groups, token).await?
        };

        let needle = normalize_search(search);
        let mut candidates: HashSet<String> = if needle.is_empty() {
            pool
        } else {
            pool.into_iter()
                .filter(|name| name.to_lowercase().contains(&needle))
                .collect()
        };

        if !needle.is_empty() {
            match self.resolver.resolve_base_ancestor(&needle, token).await {
                Ok(Some(root)) => {
                    candidates.insert(root);
                }
                Ok(None) => {}
                Err(CatalogError::Cancelled) => return Err(CatalogError::Cancelled),
                Err(err) => tracing::debug!(search = %needle, %err, "no base ancestor"),
            }
        }

        let mut names = self.base_forms_only(candidates, token).await?;
        sort_names(&mut names);
        Ok(names)
    }

    /// Resolve names to cards, keeping input order and skipping failures.
    pub async fn load_entries(
        &self,
        names: &[String],
        token: &CancellationToken,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        load_entries(self.source.as_ref(), names, token).await
    }

    async fn unfiltered_pool(
        &self,
        token: &CancellationToken,
    ) -> Result<HashSet<String>, CatalogError> {
        match self
            .source
            .list_entries(0, self.unfiltered_cap, token)
            .await
        {
            Lookup::Found(names) => Ok(names.into_iter().collect()),
            Lookup::Cancelled => Err(CatalogError::Cancelled),
            Lookup::NotFound => Ok(HashSet::new()),
            Lookup::Failed(reason) => {
                tracing::warn!(%reason, "entry listing unavailable");
                Ok(HashSet::new())
            }
        }
    }

    async fn group_pool(
        &self,
        groups: &[String],
        token: &CancellationToken,
    ) -> Result<HashSet<String>, CatalogError> {
        let tags = filters::tags_for(groups);
        let lookups = join_all(tags.iter().map(|tag| self.resolver.members(tag, token))).await;

        let mut pool = HashSet::new();
        for lookup in lookups {
            match lookup {
                Lookup::Found(names) => pool.extend(names),
                Lookup::Cancelled => return Err(CatalogError::Cancelled),
                Lookup::NotFound | Lookup::Failed(_) => {}
            }
        }
        Ok(pool)
    }

    async fn base_forms_only(
        &self,
        candidates: HashSet<String>,
        token: &CancellationToken,
    ) -> Result<Vec<String>, CatalogError> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = JoinSet::new();
        for name in candidates {
            let resolver = Arc::clone(&self.resolver);
            let semaphore = Arc::clone(&semaphore);
            let token = token.clone();
            join_set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (name, Lookup::Cancelled);
                };
                let verdict = resolver.is_base_form(&name, &token).await;
                (name, verdict)
            });
        }

        let mut names = Vec::new();
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((name, Lookup::Found(true))) => names.push(name),
                Ok((_, Lookup::Cancelled)) => return Err(CatalogError::Cancelled),
                Ok((name, Lookup::Failed(reason))) => {
                    tracing::debug!(%name, %reason, "skipping candidate with unknown lineage");
                }
                Ok(_) => {}
                Err(err) => tracing::warn!(%err, "base form task failed"),
            }
        }
        Ok(names)
    }
}

pub async fn load_entries(
    source: &dyn CatalogSource,
    names: &[String],
    token: &CancellationToken,
) -> Result<Vec<CatalogEntry>, CatalogError> {
    let lookups = join_all(names.iter().map(|name| source.entry(name, token))).await;

    let mut entries = Vec::with_capacity(names.len());
    for (name, lookup) in names.iter().zip(lookups) {
        match lookup {
            Lookup::Found(record) => entries.push(record.summary()),
            Lookup::Cancelled => return Err(CatalogError::Cancelled),
            Lookup::NotFound => tracing::debug!(%name, "entry missing"),
            Lookup::Failed(reason) => tracing::debug!(%name, %reason, "entry unavailable"),
        }
    }
    Ok(entries)
}

/// The `page`-th slice of `candidates`, empty past the end.
pub fn page(candidates: &[String], page: usize, page_size: usize) -> &[String] {
    let start = page.saturating_mul(page_size).min(candidates.len());
    let end = start.saturating_add(page_size).min(candidates.len());
    &candidates[start..end]
}

pub fn normalize_search(search: &str) -> String {
    search.trim().to_lowercase()
}

/// Case-insensitive ascending order with a bytewise tie-break.
pub fn sort_names(names: &mut [String]) {
    names.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn test_page_slices_and_clamps() {
        let all = names(&["a", "b", "c", "d", "e"]);
        assert_eq!(page(&all, 0, 2), &all[0..2]);
        assert_eq!(page(&all, 2, 2), &all[4..5]);
        assert!(page(&all, 3, 2).is_empty());
        assert!(page(&all, usize::MAX, 2).is_empty());
    }

    #[test]
    fn test_sort_names_ignores_case() {
        let mut all = names(&["vulpix", "Abra", "charmander", "abra"]);
        sort_names(&mut all);
        assert_eq!(all, names(&["Abra", "abra", "charmander", "vulpix"]));
    }

    #[test]
    fn test_normalize_search() {
        assert_eq!(normalize_search("  ChariZard "), "charizard");
        assert_eq!(normalize_search("   "), "");
    }
}
