//! Membership and lineage lookups with read-through memoization

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::{CatalogSource, Lookup};
use crate::cache::ResolverCache;
use crate::error::CatalogError;

pub struct Resolver {
    source: Arc<dyn CatalogSource>,
    cache: Arc<ResolverCache>,
    max_depth: usize,
}

impl Resolver {
    pub fn new(source: Arc<dyn CatalogSource>, cache: Arc<ResolverCache>, max_depth: usize) -> Self {
        Self {
            source,
            cache,
            max_depth: max_depth.max(1),
        }
    }

    pub fn cache(&self) -> &Arc<ResolverCache> {
        &self.cache
    }

    /// Names belonging to a type tag.
    ///
    /// A tag the API does not know is remembered as empty. Transient failures
    /// are reported but not remembered, so the next query asks again.
    pub async fn members(&self, tag: &str, token: &CancellationToken) -> Lookup<Vec<String>> {
        if let Some(names) = self.cache.members(tag) {
            return Lookup::Found(names);
        }
        match self.source.type_members(tag, token).await {
            Lookup::Found(names) => {
                self.cache.store_members(tag, names.clone());
                Lookup::Found(names)
            }
            Lookup::NotFound => {
                self.cache.store_members(tag, Vec::new());
                Lookup::Found(Vec::new())
            }
            Lookup::Failed(reason) => {
                tracing::warn!(tag, %reason, "type membership unavailable");
                Lookup::Failed(reason)
            }
            Lookup::Cancelled => Lookup::Cancelled,
        }
    }

    /// Whether `name` has no recorded ancestor.
    ///
    /// A default form named apart from its species (`giratina-altered`)
    /// takes its species' answer. Alternate forms and names without species
    /// data count as evolved forms and are remembered that way; transient
    /// failures are not remembered.
    pub async fn is_base_form(&self, name: &str, token: &CancellationToken) -> Lookup<bool> {
        if let Some(is_base) = self.cache.base_form(name) {
            return Lookup::Found(is_base);
        }
        let verdict = match self.source.species(name, token).await {
            Lookup::Found(species) => Lookup::Found(species.evolves_from.is_none()),
            Lookup::NotFound => self.default_form_verdict(name, token).await,
            Lookup::Failed(reason) => Lookup::Failed(reason),
            Lookup::Cancelled => Lookup::Cancelled,
        };
        if let Lookup::Found(is_base) = verdict {
            self.cache.store_base_form(name, is_base);
        }
        verdict
    }

    async fn default_form_verdict(&self, name: &str, token: &CancellationToken) -> Lookup<bool> {
        let record = match self.source.entry(name, token).await {
            Lookup::Found(record) => record,
            Lookup::NotFound => return Lookup::Found(false),
            Lookup::Failed(reason) => return Lookup::Failed(reason),
            Lookup::Cancelled => return Lookup::Cancelled,
        };
        let species = match record.species {
            Some(species) if record.is_default && species != name => species,
            _ => return Lookup::Found(false),
        };
        tracing::debug!(name, %species, "checking default form through its species");
        match self.source.species(&species, token).await {
            Lookup::Found(species) => Lookup::Found(species.evolves_from.is_none()),
            Lookup::NotFound => Lookup::Found(false),
            Lookup::Failed(reason) => Lookup::Failed(reason),
            Lookup::Cancelled => Lookup::Cancelled,
        }
    }

    /// Follow "evolves from" links up to the root of `name`'s lineage.
    ///
    /// Returns `Ok(None)` when `name` is not a species at all.
    pub async fn resolve_base_ancestor(
        &self,
        name: &str,
        token: &CancellationToken,
    ) -> Result<Option<String>, CatalogError> {
        let mut current = name.to_string();
        for _ in 0..self.max_depth {
            match self.source.species(&current, token).await {
                Lookup::Found(species) => {
                    self.cache
                        .store_base_form(&species.name, species.evolves_from.is_none());
                    match species.evolves_from {
                        Some(parent) => current = parent,
                        None => return Ok(Some(species.name)),
                    }
                }
                Lookup::NotFound if current == name => return Ok(None),
                Lookup::NotFound => return Err(CatalogError::NotFound(current)),
                Lookup::Failed(reason) => return Err(CatalogError::Transient(reason)),
                Lookup::Cancelled => return Err(CatalogError::Cancelled),
            }
        }
        Err(CatalogError::AmbiguousLineage(name.to_string()))
    }
}
