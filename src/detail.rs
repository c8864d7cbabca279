//! Detail aggregation for the modal: attributes, gallery and evolution line

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join;
use tokio_util::sync::CancellationToken;

use crate::api::{CatalogSource, ChainNode, EntryRecord};
use crate::error::CatalogError;
use crate::query::load_entries;
use crate::state::{CatalogEntry, FullEntry};

pub struct DetailAggregator {
    source: Arc<dyn CatalogSource>,
    timeout: Duration,
}

impl DetailAggregator {
    pub fn new(source: Arc<dyn CatalogSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    /// Full record for `name`. Fails when the entry itself cannot be
    /// loaded; a missing evolution line only leaves `evolution` empty.
    pub async fn full_detail(
        &self,
        name: &str,
        token: &CancellationToken,
    ) -> Result<FullEntry, CatalogError> {
        let fetch = async {
            let (record, evolution) = join(
                self.source.entry(name, token),
                self.evolution_sequence(name, token),
            )
            .await;
            let record = record.require(name)?;
            Ok::<_, CatalogError>(assemble(record, evolution))
        };

        match tokio::time::timeout(self.timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(CatalogError::Timeout(name.to_string())),
        }
    }

    /// `name`'s evolution line: every stage of its chain, root first.
    /// Empty when any step fails.
    pub async fn evolution_sequence(
        &self,
        name: &str,
        token: &CancellationToken,
    ) -> Vec<CatalogEntry> {
        let Some(species) = self.source.species(name, token).await.found() else {
            return Vec::new();
        };
        let Some(url) = species.evolution_chain_url else {
            return Vec::new();
        };
        let Some(chain) = self.source.evolution_chain(&url, token).await.found() else {
            return Vec::new();
        };

        let mut stages = Vec::new();
        collect_stages(&chain, &mut stages);
        load_entries(self.source.as_ref(), &stages, token)
            .await
            .unwrap_or_default()
    }
}

/// Depth-first over every `evolves_to` branch, skipping names already seen.
pub fn collect_stages(chain: &ChainNode, stages: &mut Vec<String>) {
    if !stages.contains(&chain.species) {
        stages.push(chain.species.clone());
    }
    for next in &chain.evolves_to {
        collect_stages(next, stages);
    }
}

fn assemble(record: EntryRecord, evolution: Vec<CatalogEntry>) -> FullEntry {
    let entry = record.summary();
    FullEntry {
        entry,
        height: record.height,
        weight: record.weight,
        stats: record.stats,
        abilities: record.abilities,
        evolution,
        images: record.images,
    }
}
