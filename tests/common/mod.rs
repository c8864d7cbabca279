//! In-memory catalog source shared by the integration tests
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use pokegrid::api::{CatalogSource, ChainNode, EntryRecord, Lookup, SpeciesRecord};
use pokegrid::state::EntryStat;

/// (name, id, evolves_from, types)
const DEX: &[(&str, u16, Option<&str>, &[&str])] = &[
    ("bulbasaur", 1, None, &["grass", "poison"]),
    ("charmander", 4, None, &["fire"]),
    ("charmeleon", 5, Some("charmander"), &["fire"]),
    ("charizard", 6, Some("charmeleon"), &["fire", "flying"]),
    ("squirtle", 7, None, &["water"]),
    ("wartortle", 8, Some("squirtle"), &["water"]),
    ("blastoise", 9, Some("wartortle"), &["water"]),
    ("pikachu", 25, Some("pichu"), &["electric"]),
    ("vulpix", 37, None, &["fire"]),
    ("ninetales", 38, Some("vulpix"), &["fire"]),
    ("psyduck", 54, None, &["water"]),
    ("golduck", 55, Some("psyduck"), &["water"]),
    ("growlithe", 58, None, &["fire"]),
    ("arcanine", 59, Some("growlithe"), &["fire"]),
    ("magnemite", 81, None, &["electric", "steel"]),
    ("magneton", 82, Some("magnemite"), &["electric", "steel"]),
    ("onix", 95, None, &["rock", "ground"]),
    ("jynx", 124, Some("smoochum"), &["ice", "psychic"]),
    ("magikarp", 129, None, &["water"]),
    ("gyarados", 130, Some("magikarp"), &["water", "flying"]),
    ("lapras", 131, None, &["water", "ice"]),
    ("eevee", 133, None, &["normal"]),
    ("vaporeon", 134, Some("eevee"), &["water"]),
    ("jolteon", 135, Some("eevee"), &["electric"]),
    ("flareon", 136, Some("eevee"), &["fire"]),
    ("pichu", 172, None, &["electric"]),
    ("steelix", 208, Some("onix"), &["steel", "ground"]),
    ("skarmory", 227, None, &["steel", "flying"]),
    ("smoochum", 238, None, &["ice", "psychic"]),
];

/// Alternate forms have an entry but no species record of their own.
/// (name, id, species, types)
const FORMS: &[(&str, u16, &str, &[&str])] =
    &[("charizard-mega-x", 10034, "charizard", &["fire", "dragon"])];

const TYPES: &[(&str, &[&str])] = &[
    (
        "water",
        &[
            "squirtle", "wartortle", "blastoise", "psyduck", "golduck", "magikarp", "gyarados",
            "lapras", "vaporeon",
        ],
    ),
    ("ice", &["lapras", "smoochum", "jynx"]),
    (
        "fire",
        &[
            "charmander",
            "charmeleon",
            "charizard",
            "charizard-mega-x",
            "vulpix",
            "ninetales",
            "growlithe",
            "arcanine",
            "flareon",
        ],
    ),
    ("steel", &["magnemite", "magneton", "steelix", "skarmory"]),
    (
        "electric",
        &["magnemite", "magneton", "jolteon", "pichu", "pikachu"],
    ),
    ("grass", &["bulbasaur"]),
    ("normal", &["eevee"]),
];

pub const WATER_AND_FIRE_BASES: &[&str] = &[
    "charmander",
    "growlithe",
    "lapras",
    "magikarp",
    "magnemite",
    "psyduck",
    "skarmory",
    "smoochum",
    "squirtle",
    "vulpix",
];

#[derive(Default)]
pub struct Calls {
    pub list: AtomicUsize,
    pub entry: AtomicUsize,
    pub species: AtomicUsize,
    pub chain: AtomicUsize,
    pub types: AtomicUsize,
}

pub struct FixtureSource {
    listing: Vec<String>,
    entries: HashMap<String, EntryRecord>,
    species: HashMap<String, SpeciesRecord>,
    chains: HashMap<String, ChainNode>,
    types: HashMap<String, Vec<String>>,
    failing: Mutex<HashSet<String>>,
    delay: Option<Duration>,
    pub calls: Calls,
}

impl FixtureSource {
    pub fn kanto() -> Self {
        let mut source = Self {
            listing: Vec::new(),
            entries: HashMap::new(),
            species: HashMap::new(),
            chains: HashMap::new(),
            types: HashMap::new(),
            failing: Mutex::new(HashSet::new()),
            delay: None,
            calls: Calls::default(),
        };

        for (name, id, evolves_from, types) in DEX {
            source.listing.push(name.to_string());
            source
                .entries
                .insert(name.to_string(), record(name, *id, types, name, true));
            source.species.insert(
                name.to_string(),
                SpeciesRecord {
                    name: name.to_string(),
                    evolves_from: evolves_from.map(str::to_string),
                    evolution_chain_url: Some(chain_url(root_of(name))),
                },
            );
        }
        for (name, id, species, types) in FORMS {
            source.listing.push(name.to_string());
            source
                .entries
                .insert(name.to_string(), record(name, *id, types, species, false));
        }
        for (name, _, evolves_from, _) in DEX {
            if evolves_from.is_none() {
                source.chains.insert(chain_url(name), chain_from(name));
            }
        }
        for (tag, members) in TYPES {
            source.types.insert(
                tag.to_string(),
                members.iter().map(|name| name.to_string()).collect(),
            );
        }
        source
    }

    /// Every call sleeps `delay` first, returning early when cancelled.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add a species record with no entry or chain.
    pub fn with_species(mut self, name: &str, evolves_from: Option<&str>) -> Self {
        self.species.insert(
            name.to_string(),
            SpeciesRecord {
                name: name.to_string(),
                evolves_from: evolves_from.map(str::to_string),
                evolution_chain_url: None,
            },
        );
        self
    }

    /// Add a default form whose entry name differs from its species, listed
    /// under each of `types`. An unknown species is added as a base form.
    pub fn with_default_form(mut self, name: &str, id: u16, species: &str, types: &[&str]) -> Self {
        self.listing.push(name.to_string());
        self.entries
            .insert(name.to_string(), record(name, id, types, species, true));
        for tag in types {
            self.types
                .entry(tag.to_string())
                .or_default()
                .push(name.to_string());
        }
        if self.species.contains_key(species) {
            self
        } else {
            self.with_species(species, None)
        }
    }

    /// Make lookups of `key` ("entry:squirtle", "species:lapras",
    /// "type:ice", "chain:eevee", "list") fail until [`Self::recover`].
    pub fn fail(&self, key: &str) {
        lock(&self.failing).insert(key.to_string());
    }

    pub fn recover(&self, key: &str) {
        lock(&self.failing).remove(key);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    async fn gate<T>(&self, key: &str, token: &CancellationToken) -> Option<Lookup<T>> {
        if token.is_cancelled() {
            return Some(Lookup::Cancelled);
        }
        if let Some(delay) = self.delay {
            tokio::select! {
                _ = token.cancelled() => return Some(Lookup::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
        if lock(&self.failing).contains(key) {
            return Some(Lookup::Failed(format!("{key} unavailable")));
        }
        None
    }
}

#[async_trait]
impl CatalogSource for FixtureSource {
    async fn list_entries(
        &self,
        offset: usize,
        limit: usize,
        token: &CancellationToken,
    ) -> Lookup<Vec<String>> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        if let Some(early) = self.gate("list", token).await {
            return early;
        }
        Lookup::Found(self.listing.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn entry(&self, name: &str, token: &CancellationToken) -> Lookup<EntryRecord> {
        self.calls.entry.fetch_add(1, Ordering::SeqCst);
        if let Some(early) = self.gate(&format!("entry:{name}"), token).await {
            return early;
        }
        found(self.entries.get(name))
    }

    async fn species(&self, name: &str, token: &CancellationToken) -> Lookup<SpeciesRecord> {
        self.calls.species.fetch_add(1, Ordering::SeqCst);
        if let Some(early) = self.gate(&format!("species:{name}"), token).await {
            return early;
        }
        found(self.species.get(name))
    }

    async fn evolution_chain(&self, url: &str, token: &CancellationToken) -> Lookup<ChainNode> {
        self.calls.chain.fetch_add(1, Ordering::SeqCst);
        let root = url.trim_start_matches("chain/");
        if let Some(early) = self.gate(&format!("chain:{root}"), token).await {
            return early;
        }
        found(self.chains.get(url))
    }

    async fn type_members(&self, tag: &str, token: &CancellationToken) -> Lookup<Vec<String>> {
        self.calls.types.fetch_add(1, Ordering::SeqCst);
        if let Some(early) = self.gate(&format!("type:{tag}"), token).await {
            return early;
        }
        found(self.types.get(tag))
    }
}

pub fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn found<T: Clone>(value: Option<&T>) -> Lookup<T> {
    match value {
        Some(value) => Lookup::Found(value.clone()),
        None => Lookup::NotFound,
    }
}

fn record(name: &str, id: u16, types: &[&str], species: &str, is_default: bool) -> EntryRecord {
    let artwork = format!("https://img.test/artwork/{id}.png");
    let front = format!("https://img.test/front/{id}.png");
    EntryRecord {
        id,
        name: name.to_string(),
        height: 10,
        weight: 100,
        types: names(types),
        stats: vec![
            EntryStat {
                name: "hp".into(),
                base: 45,
            },
            EntryStat {
                name: "speed".into(),
                base: 60,
            },
        ],
        abilities: vec![format!("{name}-ability")],
        sprite_url: Some(front.clone()),
        images: vec![artwork, front],
        species: Some(species.to_string()),
        is_default,
    }
}

fn chain_url(root: &str) -> String {
    format!("chain/{root}")
}

fn root_of(name: &str) -> &str {
    let mut current = name;
    while let Some((_, _, Some(parent), _)) = DEX.iter().find(|(candidate, ..)| *candidate == current)
    {
        current = *parent;
    }
    current
}

fn chain_from(name: &str) -> ChainNode {
    ChainNode {
        species: name.to_string(),
        evolves_to: DEX
            .iter()
            .filter(|(_, _, evolves_from, _)| *evolves_from == Some(name))
            .map(|(child, ..)| chain_from(child))
            .collect(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
