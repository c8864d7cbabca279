//! Static filter groups shown as toggles above the grid
//!
//! Each group stands for one or more PokeAPI type tags. Selecting several
//! groups widens the result: memberships are OR'd across groups and tags.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterGroup {
    pub id: &'static str,
    pub label: &'static str,
    pub tags: &'static [&'static str],
}

pub const FILTER_GROUPS: &[FilterGroup] = &[
    FilterGroup {
        id: "water",
        label: "Water",
        tags: &["water", "ice"],
    },
    FilterGroup {
        id: "fire",
        label: "Fire",
        tags: &["fire", "steel"],
    },
    FilterGroup {
        id: "grass",
        label: "Grass",
        tags: &["grass", "bug"],
    },
    FilterGroup {
        id: "electric",
        label: "Electric",
        tags: &["electric"],
    },
    FilterGroup {
        id: "psychic",
        label: "Psychic",
        tags: &["psychic", "fairy"],
    },
    FilterGroup {
        id: "fighting",
        label: "Fighting",
        tags: &["fighting", "rock", "ground"],
    },
    FilterGroup {
        id: "shadow",
        label: "Shadow",
        tags: &["dark", "ghost", "poison"],
    },
    FilterGroup {
        id: "dragon",
        label: "Dragon",
        tags: &["dragon", "flying"],
    },
    FilterGroup {
        id: "normal",
        label: "Normal",
        tags: &["normal"],
    },
];

pub fn group(id: &str) -> Option<&'static FilterGroup> {
    FILTER_GROUPS.iter().find(|group| group.id == id)
}

pub fn group_index(id: &str) -> Option<usize> {
    FILTER_GROUPS.iter().position(|group| group.id == id)
}

/// Type tags behind the given group ids, in selection order, without repeats.
/// Unknown ids are skipped.
pub fn tags_for(ids: &[String]) -> Vec<&'static str> {
    let mut tags = Vec::new();
    for group in ids.iter().filter_map(|id| group(id)) {
        for tag in group.tags {
            if !tags.contains(tag) {
                tags.push(*tag);
            }
        }
    }
    tags
}
