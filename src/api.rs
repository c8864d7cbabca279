//! PokeAPI gateway
//!
//! Every lookup resolves to a [`Lookup`] instead of an error: callers decide
//! whether an absent value shrinks a result, fails a detail view, or is
//! worth asking for again later.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::CatalogError;
use crate::state::{CatalogEntry, EntryStat};

/// Outcome of one upstream lookup
#[derive(Clone, Debug, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    Failed(String),
    Cancelled,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::NotFound => Lookup::NotFound,
            Lookup::Failed(reason) => Lookup::Failed(reason),
            Lookup::Cancelled => Lookup::Cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Lookup::Cancelled)
    }

    /// Treat anything but `Found` as an error naming `what`.
    pub fn require(self, what: &str) -> Result<T, CatalogError> {
        match self {
            Lookup::Found(value) => Ok(value),
            Lookup::NotFound => Err(CatalogError::NotFound(what.to_string())),
            Lookup::Failed(reason) => Err(CatalogError::Transient(reason)),
            Lookup::Cancelled => Err(CatalogError::Cancelled),
        }
    }
}

/// One entry's detail as the catalog needs it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryRecord {
    pub id: u16,
    pub name: String,
    pub height: u16,
    pub weight: u16,
    pub types: Vec<String>,
    pub stats: Vec<EntryStat>,
    pub abilities: Vec<String>,
    pub sprite_url: Option<String>,
    pub images: Vec<String>,
    /// Species this entry is a form of
    pub species: Option<String>,
    /// False for alternate forms (megas, regional variants)
    pub is_default: bool,
}

impl EntryRecord {
    pub fn summary(&self) -> CatalogEntry {
        CatalogEntry {
            name: self.name.clone(),
            id: self.id,
            sprite_url: self.sprite_url.clone(),
            types: self.types.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpeciesRecord {
    pub name: String,
    pub evolves_from: Option<String>,
    pub evolution_chain_url: Option<String>,
}

/// Node of an evolution chain; children are every "evolves to" branch
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChainNode {
    #[serde(deserialize_with = "named_resource_name")]
    pub species: String,
    #[serde(default)]
    pub evolves_to: Vec<ChainNode>,
}

/// The five read-only resources the catalog is built from
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_entries(
        &self,
        offset: usize,
        limit: usize,
        token: &CancellationToken,
    ) -> Lookup<Vec<String>>;

    async fn entry(&self, name: &str, token: &CancellationToken) -> Lookup<EntryRecord>;

    async fn species(&self, name: &str, token: &CancellationToken) -> Lookup<SpeciesRecord>;

    async fn evolution_chain(&self, url: &str, token: &CancellationToken) -> Lookup<ChainNode>;

    async fn type_members(&self, tag: &str, token: &CancellationToken) -> Lookup<Vec<String>>;
}

#[derive(Clone, Debug, Deserialize)]
struct NamedResource {
    name: String,
}

#[derive(Clone, Debug, Deserialize)]
struct ApiResource {
    url: String,
}

#[derive(Clone, Debug, Deserialize)]
struct ListResponse {
    results: Vec<NamedResource>,
}

#[derive(Clone, Debug, Deserialize)]
struct TypeDetailResponse {
    pokemon: Vec<TypePokemonEntry>,
}

#[derive(Clone, Debug, Deserialize)]
struct TypePokemonEntry {
    pokemon: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonResponse {
    id: u16,
    name: String,
    height: u16,
    weight: u16,
    types: Vec<PokemonTypeSlot>,
    stats: Vec<PokemonStatSlot>,
    abilities: Vec<PokemonAbilitySlot>,
    sprites: serde_json::Value,
    #[serde(default)]
    species: Option<NamedResource>,
    #[serde(default)]
    is_default: bool,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonTypeSlot {
    #[serde(rename = "type")]
    type_info: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonStatSlot {
    base_stat: u16,
    stat: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonAbilitySlot {
    ability: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonSpeciesResponse {
    name: String,
    evolution_chain: Option<ApiResource>,
    evolves_from_species: Option<NamedResource>,
}

#[derive(Clone, Debug, Deserialize)]
struct EvolutionChainResponse {
    chain: ChainNode,
}

const GALLERY_POINTERS: &[&str] = &[
    "/other/official-artwork/front_default",
    "/other/home/front_default",
    "/front_default",
    "/back_default",
    "/front_shiny",
    "/back_shiny",
    "/other/dream_world/front_default",
];

/// HTTP implementation of [`CatalogSource`]
pub struct PokeApi {
    client: reqwest::Client,
    base: String,
}

impl PokeApi {
    pub fn new(config: &Config) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, token: &CancellationToken) -> Lookup<T> {
        fetch_json(&self.client, url, token).await
    }
}

#[async_trait]
impl CatalogSource for PokeApi {
    async fn list_entries(
        &self,
        offset: usize,
        limit: usize,
        token: &CancellationToken,
    ) -> Lookup<Vec<String>> {
        let url = format!("{}/pokemon?offset={offset}&limit={limit}", self.base);
        self.get::<ListResponse>(&url, token)
            .await
            .map(|response| response.results.into_iter().map(|entry| entry.name).collect())
    }

    async fn entry(&self, name: &str, token: &CancellationToken) -> Lookup<EntryRecord> {
        let url = format!("{}/pokemon/{name}", self.base);
        self.get::<PokemonResponse>(&url, token)
            .await
            .map(entry_from_response)
    }

    async fn species(&self, name: &str, token: &CancellationToken) -> Lookup<SpeciesRecord> {
        let url = format!("{}/pokemon-species/{name}", self.base);
        self.get::<PokemonSpeciesResponse>(&url, token)
            .await
            .map(|response| SpeciesRecord {
                name: response.name,
                evolves_from: response.evolves_from_species.map(|species| species.name),
                evolution_chain_url: response.evolution_chain.map(|chain| chain.url),
            })
    }

    async fn evolution_chain(&self, url: &str, token: &CancellationToken) -> Lookup<ChainNode> {
        self.get::<EvolutionChainResponse>(url, token)
            .await
            .map(|response| response.chain)
    }

    async fn type_members(&self, tag: &str, token: &CancellationToken) -> Lookup<Vec<String>> {
        let url = format!("{}/type/{tag}", self.base);
        self.get::<TypeDetailResponse>(&url, token)
            .await
            .map(|response| {
                response
                    .pokemon
                    .into_iter()
                    .map(|entry| entry.pokemon.name)
                    .collect()
            })
    }
}

enum FetchError {
    NotFound,
    Failed(String),
}

/// GET `url` and decode it as JSON, aborting when `token` fires.
pub async fn fetch_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    token: &CancellationToken,
) -> Lookup<T> {
    if token.is_cancelled() {
        return Lookup::Cancelled;
    }

    let request = async {
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|err| FetchError::Failed(err.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        let response = response
            .error_for_status()
            .map_err(|err| FetchError::Failed(err.to_string()))?;
        response
            .json::<T>()
            .await
            .map_err(|err| FetchError::Failed(err.to_string()))
    };

    tokio::select! {
        biased;
        _ = token.cancelled() => {
            tracing::trace!(url, "request cancelled");
            Lookup::Cancelled
        }
        result = request => match result {
            Ok(value) => Lookup::Found(value),
            Err(FetchError::NotFound) => {
                tracing::debug!(url, "resource not found");
                Lookup::NotFound
            }
            Err(FetchError::Failed(reason)) => {
                tracing::warn!(url, %reason, "request failed");
                Lookup::Failed(reason)
            }
        },
    }
}

fn entry_from_response(response: PokemonResponse) -> EntryRecord {
    let sprite_url = pointer_string(&response.sprites, "/front_default").or_else(|| {
        pointer_string(&response.sprites, "/other/official-artwork/front_default")
    });
    EntryRecord {
        id: response.id,
        name: response.name,
        height: response.height,
        weight: response.weight,
        types: response
            .types
            .into_iter()
            .map(|slot| slot.type_info.name)
            .collect(),
        stats: response
            .stats
            .into_iter()
            .map(|slot| EntryStat {
                name: slot.stat.name,
                base: slot.base_stat,
            })
            .collect(),
        abilities: response
            .abilities
            .into_iter()
            .map(|slot| slot.ability.name)
            .collect(),
        images: gallery(&response.sprites),
        sprite_url,
        species: response.species.map(|species| species.name),
        is_default: response.is_default,
    }
}

/// Sprite URLs worth showing in the modal carousel, first occurrence wins.
pub fn gallery(sprites: &serde_json::Value) -> Vec<String> {
    let mut images: Vec<String> = Vec::new();
    for pointer in GALLERY_POINTERS {
        if let Some(url) = pointer_string(sprites, pointer) {
            if !images.contains(&url) {
                images.push(url);
            }
        }
    }
    images
}

fn pointer_string(value: &serde_json::Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(|val| val.as_str())
        .map(|s| s.to_string())
}

fn named_resource_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    NamedResource::deserialize(deserializer).map(|resource| resource.name)
}
