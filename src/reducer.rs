//! Reducer - pure function: (state, action) -> DispatchResult

use tui_dispatch::{DataResource, DispatchResult};

use crate::action::Action;
use crate::effect::Effect;
use crate::filters;
use crate::query;
use crate::state::{AppState, DetailModal, ListStatus};

pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::Init => begin_refresh(state),

        // ===== Filter actions =====
        Action::FilterToggle(id) => {
            if filters::group(&id).is_none() {
                return DispatchResult::unchanged();
            }
            if let Some(pos) = state.selected_groups.iter().position(|group| group == &id) {
                state.selected_groups.remove(pos);
            } else {
                state.selected_groups.push(id);
                state
                    .selected_groups
                    .sort_by_key(|group| filters::group_index(group));
            }
            begin_refresh(state)
        }

        Action::FilterClear => {
            if state.selected_groups.is_empty() {
                return DispatchResult::unchanged();
            }
            state.selected_groups.clear();
            begin_refresh(state)
        }

        // ===== Search actions =====
        Action::SearchStart => {
            if state.search.editing {
                return DispatchResult::unchanged();
            }
            state.search.editing = true;
            DispatchResult::changed()
        }

        Action::SearchClose => {
            if !state.search.editing {
                return DispatchResult::unchanged();
            }
            state.search.editing = false;
            DispatchResult::changed()
        }

        Action::SearchInput(text) => {
            if text == state.search.raw {
                return DispatchResult::unchanged();
            }
            state.search.raw = text.clone();
            DispatchResult::changed_with(Effect::DebounceSearch { text })
        }

        Action::SearchDidSettle(text) => {
            if text != state.search.raw {
                return DispatchResult::unchanged();
            }
            let settled = query::normalize_search(&text);
            if settled == state.search.settled {
                return DispatchResult::unchanged();
            }
            state.search.settled = settled;
            begin_refresh(state)
        }

        // ===== Catalog results =====
        Action::CatalogDidLoad {
            generation,
            candidates,
            entries,
        } => {
            if generation != state.generation {
                return DispatchResult::unchanged();
            }
            state.has_more = is_full_page(&candidates, 0, state.page_size);
            state.candidates = candidates;
            state.entries = entries;
            state.page = 0;
            state.selected_index = 0;
            state.list_status = ListStatus::Idle;
            state.message = None;
            DispatchResult::changed()
        }

        Action::CatalogDidError { generation, error } => {
            if generation != state.generation {
                return DispatchResult::unchanged();
            }
            state.list_status = ListStatus::Failed;
            state.candidates.clear();
            state.entries.clear();
            state.page = 0;
            state.has_more = false;
            state.selected_index = 0;
            state.message = Some(format!("Catalog error: {error}"));
            DispatchResult::changed()
        }

        Action::CatalogDidCancel { generation } => {
            // Only a live generation's load can leave the list busy
            if generation != state.generation || state.list_status == ListStatus::Idle {
                return DispatchResult::unchanged();
            }
            state.list_status = ListStatus::Idle;
            DispatchResult::changed()
        }

        // ===== Pagination =====
        Action::PageLoadMore => {
            if state.list_status != ListStatus::Idle || !state.has_more {
                return DispatchResult::unchanged();
            }
            let next = state.page + 1;
            let names = query::page(&state.candidates, next, state.page_size).to_vec();
            if names.is_empty() {
                state.has_more = false;
                return DispatchResult::changed();
            }
            state.list_status = ListStatus::Appending;
            DispatchResult::changed_with(Effect::LoadPage {
                generation: state.generation,
                page: next,
                names,
            })
        }

        Action::PageDidLoad {
            generation,
            page,
            entries,
        } => {
            if generation != state.generation || page != state.page + 1 {
                return DispatchResult::unchanged();
            }
            state.page = page;
            state.has_more = is_full_page(&state.candidates, page, state.page_size);
            state.entries.extend(entries);
            state.list_status = ListStatus::Idle;
            DispatchResult::changed()
        }

        Action::PageDidError { generation, error } => {
            if generation != state.generation {
                return DispatchResult::unchanged();
            }
            state.list_status = ListStatus::Idle;
            state.message = Some(format!("Page error: {error}"));
            DispatchResult::changed()
        }

        // ===== Selection =====
        Action::SelectionMove(delta) => {
            let index = (state.selected_index as i64 + delta as i64).max(0) as usize;
            if state.set_selected_index(index) {
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::SelectionSet(index) => {
            if state.set_selected_index(index) {
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        // ===== Detail modal =====
        Action::DetailOpen(name) => {
            if let Some(modal) = &state.modal {
                if modal.target == name && !modal.detail.is_failed() {
                    return DispatchResult::unchanged();
                }
            }
            state.modal = Some(DetailModal::loading(name.clone()));
            DispatchResult::changed_with(Effect::LoadDetail { name })
        }

        Action::DetailDidLoad { name, detail } => {
            let Some(modal) = state.modal.as_mut().filter(|modal| modal.target == name) else {
                return DispatchResult::unchanged();
            };
            modal.evolution_index = detail
                .evolution
                .iter()
                .position(|stage| stage.name == name)
                .unwrap_or(modal.evolution_index);
            modal.image_index = 0;
            modal.detail = DataResource::Loaded(detail);
            DispatchResult::changed()
        }

        Action::DetailDidError { name, error } => {
            let Some(modal) = state.modal.as_mut().filter(|modal| modal.target == name) else {
                return DispatchResult::unchanged();
            };
            modal.detail = DataResource::Failed(error);
            DispatchResult::changed()
        }

        Action::DetailDidCancel { .. } => DispatchResult::unchanged(),

        Action::DetailClose => {
            if state.modal.take().is_none() {
                return DispatchResult::unchanged();
            }
            DispatchResult::changed_with(Effect::CancelDetail)
        }

        Action::DetailImageSelect(index) => {
            let Some(modal) = state.modal.as_mut() else {
                return DispatchResult::unchanged();
            };
            let count = modal.detail.data().map_or(0, |detail| detail.images.len());
            if index >= count || index == modal.image_index {
                return DispatchResult::unchanged();
            }
            modal.image_index = index;
            DispatchResult::changed()
        }

        Action::DetailImageNext => cycle_image(state, 1),
        Action::DetailImagePrev => cycle_image(state, -1),

        Action::DetailEvolutionSelect(index) => {
            let Some(modal) = state.modal.as_ref() else {
                return DispatchResult::unchanged();
            };
            let Some(stage) = modal
                .detail
                .data()
                .and_then(|detail| detail.evolution.get(index))
            else {
                return DispatchResult::unchanged();
            };
            if stage.name == modal.target {
                return DispatchResult::unchanged();
            }
            let name = stage.name.clone();
            let mut next = DetailModal::loading(name.clone());
            next.evolution_index = index;
            state.modal = Some(next);
            DispatchResult::changed_with(Effect::LoadDetail { name })
        }

        Action::UiTerminalResize(width, height) => {
            if state.terminal_size != (width, height) {
                state.terminal_size = (width, height);
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::Quit => DispatchResult::unchanged(),
    }
}

/// Start a new generation. The current list stays on screen until the
/// generation's result replaces it.
fn begin_refresh(state: &mut AppState) -> DispatchResult<Effect> {
    state.generation += 1;
    state.list_status = ListStatus::Refreshing;
    state.message = None;
    DispatchResult::changed_with(Effect::Refresh {
        generation: state.generation,
        groups: state.selected_groups.clone(),
        search: state.search.settled.clone(),
        page_size: state.page_size,
    })
}

// Full-page heuristic: cannot tell "exactly N pages" from "one more page".
fn is_full_page(candidates: &[String], page: usize, page_size: usize) -> bool {
    query::page(candidates, page, page_size).len() == page_size
}

fn cycle_image(state: &mut AppState, step: i64) -> DispatchResult<Effect> {
    let Some(modal) = state.modal.as_mut() else {
        return DispatchResult::unchanged();
    };
    let count = modal.detail.data().map_or(0, |detail| detail.images.len()) as i64;
    if count <= 1 {
        return DispatchResult::unchanged();
    }
    let next = (modal.image_index as i64 + step).rem_euclid(count);
    modal.image_index = next as usize;
    DispatchResult::changed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CatalogEntry, FullEntry};

    fn entry(name: &str, id: u16) -> CatalogEntry {
        CatalogEntry {
            name: name.to_string(),
            id,
            sprite_url: None,
            types: vec!["water".to_string()],
        }
    }

    fn names(count: usize) -> Vec<String> {
        (0..count).map(|idx| format!("mon{idx:02}")).collect()
    }

    fn full(name: &str, images: &[&str], evolution: &[&str]) -> FullEntry {
        FullEntry {
            entry: entry(name, 1),
            height: 7,
            weight: 69,
            stats: Vec::new(),
            abilities: Vec::new(),
            evolution: evolution
                .iter()
                .enumerate()
                .map(|(idx, stage)| entry(stage, idx as u16 + 1))
                .collect(),
            images: images.iter().map(|url| url.to_string()).collect(),
        }
    }

    fn loaded_state(candidates: Vec<String>, page_size: usize) -> AppState {
        let mut state = AppState::new(page_size);
        reducer(&mut state, Action::Init);
        let entries = query::page(&candidates, 0, page_size)
            .iter()
            .enumerate()
            .map(|(idx, name)| entry(name, idx as u16))
            .collect();
        let generation = state.generation;
        reducer(
            &mut state,
            Action::CatalogDidLoad {
                generation,
                candidates,
                entries,
            },
        );
        state
    }

    #[test]
    fn test_init_starts_refresh() {
        let mut state = AppState::default();

        let result = reducer(&mut state, Action::Init);

        assert!(result.changed);
        assert_eq!(state.list_status, ListStatus::Refreshing);
        assert_eq!(state.generation, 1);
        assert_eq!(
            result.effects,
            vec![Effect::Refresh {
                generation: 1,
                groups: Vec::new(),
                search: String::new(),
                page_size: 24,
            }]
        );
    }

    #[test]
    fn test_filter_toggle_adds_then_removes() {
        let mut state = AppState::default();

        reducer(&mut state, Action::FilterToggle("fire".into()));
        reducer(&mut state, Action::FilterToggle("water".into()));
        assert_eq!(state.selected_groups, vec!["water", "fire"]);
        assert!(state.is_group_selected("fire"));

        let result = reducer(&mut state, Action::FilterToggle("water".into()));
        assert!(result.changed);
        assert_eq!(state.selected_groups, vec!["fire"]);
        assert_eq!(state.generation, 3);
    }

    #[test]
    fn test_unknown_filter_is_ignored() {
        let mut state = AppState::default();
        let result = reducer(&mut state, Action::FilterToggle("cosmic".into()));
        assert!(!result.changed);
        assert!(result.effects.is_empty());
        assert_eq!(state.generation, 0);
    }

    #[test]
    fn test_refresh_keeps_list_until_result() {
        let mut state = loaded_state(names(30), 10);
        state.selected_index = 4;
        let before = state.entries.clone();

        reducer(&mut state, Action::FilterToggle("grass".into()));
        assert_eq!(state.entries, before);
        assert_eq!(state.selected_index, 4);
        assert!(state.is_loading());
        assert!(!reducer(&mut state, Action::PageLoadMore).changed);

        let generation = state.generation;
        reducer(
            &mut state,
            Action::CatalogDidLoad {
                generation,
                candidates: vec!["bulbasaur".into()],
                entries: vec![entry("bulbasaur", 1)],
            },
        );
        assert_eq!(state.entries, vec![entry("bulbasaur", 1)]);
        assert_eq!(state.page, 0);
        assert_eq!(state.selected_index, 0);
        assert!(!state.has_more);
    }

    #[test]
    fn test_stale_generation_is_dropped() {
        let mut state = AppState::default();
        reducer(&mut state, Action::FilterToggle("water".into()));
        let stale = state.generation;
        reducer(&mut state, Action::FilterToggle("fire".into()));

        let result = reducer(
            &mut state,
            Action::CatalogDidLoad {
                generation: stale,
                candidates: vec!["squirtle".into()],
                entries: vec![entry("squirtle", 7)],
            },
        );

        assert!(!result.changed);
        assert!(state.entries.is_empty());
        assert_eq!(state.list_status, ListStatus::Refreshing);
    }

    #[test]
    fn test_cancel_of_live_generation_settles_list() {
        let mut state = loaded_state(names(30), 10);
        let before = state.entries.clone();
        reducer(&mut state, Action::FilterToggle("grass".into()));
        let live = state.generation;

        let stale = reducer(
            &mut state,
            Action::CatalogDidCancel {
                generation: live - 1,
            },
        );
        assert!(!stale.changed);
        assert!(state.is_loading());

        let result = reducer(&mut state, Action::CatalogDidCancel { generation: live });
        assert!(result.changed);
        assert_eq!(state.list_status, ListStatus::Idle);
        assert_eq!(state.entries, before);
        assert!(!reducer(&mut state, Action::CatalogDidCancel { generation: live }).changed);
    }

    #[test]
    fn test_catalog_error_marks_failed() {
        let mut state = AppState::default();
        reducer(&mut state, Action::Init);
        let generation = state.generation;

        reducer(
            &mut state,
            Action::CatalogDidError {
                generation,
                error: "boom".into(),
            },
        );

        assert_eq!(state.list_status, ListStatus::Failed);
        assert_eq!(state.message.as_deref(), Some("Catalog error: boom"));
        assert!(state.entries.is_empty());
    }

    #[test]
    fn test_has_more_follows_full_page_heuristic() {
        assert!(loaded_state(names(20), 10).has_more);
        assert!(!loaded_state(names(9), 10).has_more);
        assert!(loaded_state(names(10), 10).has_more);
    }

    #[test]
    fn test_load_more_requests_next_slice() {
        let all = names(25);
        let mut state = loaded_state(all.clone(), 10);

        let result = reducer(&mut state, Action::PageLoadMore);

        assert_eq!(state.list_status, ListStatus::Appending);
        assert_eq!(
            result.effects,
            vec![Effect::LoadPage {
                generation: state.generation,
                page: 1,
                names: all[10..20].to_vec(),
            }]
        );

        // Second request while appending is ignored
        let again = reducer(&mut state, Action::PageLoadMore);
        assert!(!again.changed);
    }

    #[test]
    fn test_page_did_load_appends() {
        let all = names(15);
        let mut state = loaded_state(all.clone(), 10);
        reducer(&mut state, Action::PageLoadMore);

        let page_entries: Vec<_> = all[10..]
            .iter()
            .map(|name| entry(name, 0))
            .collect();
        let generation = state.generation;
        reducer(
            &mut state,
            Action::PageDidLoad {
                generation,
                page: 1,
                entries: page_entries,
            },
        );

        assert_eq!(state.entries.len(), 15);
        assert_eq!(state.page, 1);
        assert!(!state.has_more);
        assert_eq!(state.list_status, ListStatus::Idle);
        assert!(!reducer(&mut state, Action::PageLoadMore).changed);
    }

    #[test]
    fn test_exact_multiple_reports_more_then_settles() {
        let mut state = loaded_state(names(10), 10);
        assert!(state.has_more);

        let result = reducer(&mut state, Action::PageLoadMore);

        assert!(result.changed);
        assert!(result.effects.is_empty());
        assert!(!state.has_more);
        assert_eq!(state.list_status, ListStatus::Idle);
    }

    #[test]
    fn test_search_input_debounces_before_refresh() {
        let mut state = AppState::default();

        let result = reducer(&mut state, Action::SearchInput("Char".into()));
        assert_eq!(
            result.effects,
            vec![Effect::DebounceSearch {
                text: "Char".into()
            }]
        );
        assert_eq!(state.generation, 0);

        // A settle for text that was typed over does nothing
        reducer(&mut state, Action::SearchInput("Charm".into()));
        assert!(!reducer(&mut state, Action::SearchDidSettle("Char".into())).changed);

        let settled = reducer(&mut state, Action::SearchDidSettle("Charm".into()));
        assert!(settled.changed);
        assert_eq!(state.search.settled, "charm");
        assert!(matches!(
            settled.effects.as_slice(),
            [Effect::Refresh { search, .. }] if search == "charm"
        ));
    }

    #[test]
    fn test_settle_with_same_normalized_text_is_unchanged() {
        let mut state = AppState::default();
        state.search.settled = "eevee".into();
        reducer(&mut state, Action::SearchInput(" Eevee ".into()));

        let result = reducer(&mut state, Action::SearchDidSettle(" Eevee ".into()));

        assert!(!result.changed);
        assert_eq!(state.generation, 0);
    }

    #[test]
    fn test_detail_open_sets_loading() {
        let mut state = AppState::default();

        let result = reducer(&mut state, Action::DetailOpen("bulbasaur".into()));

        let modal = state.modal.as_ref().unwrap();
        assert_eq!(modal.target, "bulbasaur");
        assert!(modal.detail.is_loading());
        assert_eq!(
            result.effects,
            vec![Effect::LoadDetail {
                name: "bulbasaur".into()
            }]
        );
    }

    #[test]
    fn test_detail_error_is_explicit() {
        let mut state = AppState::default();
        reducer(&mut state, Action::DetailOpen("missingno".into()));

        reducer(
            &mut state,
            Action::DetailDidError {
                name: "missingno".into(),
                error: "missingno not found".into(),
            },
        );

        let modal = state.modal.as_ref().unwrap();
        assert!(modal.detail.is_failed());
        assert_eq!(modal.detail.error(), Some("missingno not found"));
    }

    #[test]
    fn test_detail_result_for_other_target_is_ignored() {
        let mut state = AppState::default();
        reducer(&mut state, Action::DetailOpen("squirtle".into()));
        reducer(&mut state, Action::DetailOpen("psyduck".into()));

        let result = reducer(
            &mut state,
            Action::DetailDidLoad {
                name: "squirtle".into(),
                detail: full("squirtle", &[], &[]),
            },
        );

        assert!(!result.changed);
        assert!(state.modal.as_ref().unwrap().detail.is_loading());
    }

    #[test]
    fn test_detail_close_cancels() {
        let mut state = AppState::default();
        reducer(&mut state, Action::DetailOpen("squirtle".into()));

        let result = reducer(&mut state, Action::DetailClose);

        assert!(state.modal.is_none());
        assert_eq!(result.effects, vec![Effect::CancelDetail]);
        assert!(!reducer(&mut state, Action::DetailClose).changed);
    }

    #[test]
    fn test_image_carousel_wraps_and_clamps() {
        let mut state = AppState::default();
        reducer(&mut state, Action::DetailOpen("eevee".into()));
        reducer(
            &mut state,
            Action::DetailDidLoad {
                name: "eevee".into(),
                detail: full("eevee", &["a", "b", "c"], &[]),
            },
        );

        reducer(&mut state, Action::DetailImagePrev);
        assert_eq!(state.modal.as_ref().unwrap().image(), Some("c"));
        reducer(&mut state, Action::DetailImageNext);
        assert_eq!(state.modal.as_ref().unwrap().image_index, 0);

        assert!(!reducer(&mut state, Action::DetailImageSelect(3)).changed);
        assert!(reducer(&mut state, Action::DetailImageSelect(1)).changed);
        assert_eq!(state.modal.as_ref().unwrap().image(), Some("b"));
    }

    #[test]
    fn test_evolution_select_navigates_lineage() {
        let mut state = AppState::default();
        reducer(&mut state, Action::DetailOpen("charmeleon".into()));
        reducer(
            &mut state,
            Action::DetailDidLoad {
                name: "charmeleon".into(),
                detail: full(
                    "charmeleon",
                    &[],
                    &["charmander", "charmeleon", "charizard"],
                ),
            },
        );
        assert_eq!(state.modal.as_ref().unwrap().evolution_index, 1);

        assert!(!reducer(&mut state, Action::DetailEvolutionSelect(1)).changed);

        let result = reducer(&mut state, Action::DetailEvolutionSelect(2));
        let modal = state.modal.as_ref().unwrap();
        assert_eq!(modal.target, "charizard");
        assert_eq!(modal.evolution_index, 2);
        assert!(modal.detail.is_loading());
        assert_eq!(
            result.effects,
            vec![Effect::LoadDetail {
                name: "charizard".into()
            }]
        );
    }

    #[test]
    fn test_selection_is_bounded() {
        let mut state = loaded_state(names(5), 10);

        assert!(reducer(&mut state, Action::SelectionMove(3)).changed);
        assert_eq!(state.selected_index, 3);
        reducer(&mut state, Action::SelectionMove(10));
        assert_eq!(state.selected_index, 4);
        reducer(&mut state, Action::SelectionMove(-10));
        assert_eq!(state.selected_index, 0);
        assert!(!reducer(&mut state, Action::SelectionSet(0)).changed);
    }
}
