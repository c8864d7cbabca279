use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use tui_dispatch::{Component, EventContext, EventKind, HandlerResponse, RenderContext};
use tui_dispatch_components::style::BorderStyle;
use tui_dispatch_components::{
    centered_rect, BaseStyle, Padding, SelectList, SelectListBehavior, SelectListProps,
    SelectListStyle, SelectionStyle, StatusBar, StatusBarHint, StatusBarItem, StatusBarProps,
    StatusBarSection, StatusBarStyle,
};

use pokegrid::action::Action;
use pokegrid::filters::FILTER_GROUPS;
use pokegrid::state::{AppState, CatalogEntry, DetailModal, EntryStat, ListStatus};

use crate::GridComponentId;

const BG_BASE: Color = Color::Rgb(12, 18, 28);
const BG_PANEL: Color = Color::Rgb(20, 32, 46);
const BG_HIGHLIGHT: Color = Color::Rgb(28, 92, 110);
const TEXT_MAIN: Color = Color::Rgb(232, 242, 244);
const TEXT_DIM: Color = Color::Rgb(176, 195, 207);
const ACCENT_TEAL: Color = Color::Rgb(72, 204, 184);
const ACCENT_GOLD: Color = Color::Rgb(228, 176, 88);
const ACCENT_RED: Color = Color::Rgb(224, 96, 96);

pub struct GridUi {
    entry_list: SelectList,
    evolution_list: SelectList,
    status_bar: StatusBar,
}

impl GridUi {
    pub fn new() -> Self {
        Self {
            entry_list: SelectList::new(),
            evolution_list: SelectList::new(),
            status_bar: StatusBar::new(),
        }
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        state: &AppState,
        _render_ctx: RenderContext,
        event_ctx: &mut EventContext<GridComponentId>,
    ) {
        let base = Block::default().style(Style::default().bg(BG_BASE));
        frame.render_widget(base, area);
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(6),
                Constraint::Length(3),
            ])
            .split(area);

        render_header(frame, layout[0], state, event_ctx);
        render_list(frame, layout[1], state, event_ctx, &mut self.entry_list);
        render_footer(frame, layout[2], state, &mut self.status_bar);

        if let Some(modal) = state.modal.as_ref() {
            render_modal(frame, area, modal, event_ctx, &mut self.evolution_list);
        }
    }

    pub fn handle_grid_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        handle_grid_event(event, state, &mut self.entry_list)
    }

    pub fn handle_search_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        handle_search_event(event, state)
    }

    pub fn handle_detail_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        handle_detail_event(event, state, &mut self.evolution_list)
    }
}

fn handle_grid_event(
    event: &EventKind,
    state: &AppState,
    entry_list: &mut SelectList,
) -> HandlerResponse<Action> {
    let actions = match event {
        EventKind::Key(key) => match key.code {
            crossterm::event::KeyCode::Char(ch @ '1'..='9') => {
                let index = ch as usize - '1' as usize;
                FILTER_GROUPS
                    .get(index)
                    .map(|group| vec![Action::FilterToggle(group.id.to_string())])
                    .unwrap_or_default()
            }
            crossterm::event::KeyCode::Char('c') => vec![Action::FilterClear],
            crossterm::event::KeyCode::Char('/') => vec![Action::SearchStart],
            crossterm::event::KeyCode::Char('m') => vec![Action::PageLoadMore],
            crossterm::event::KeyCode::Enter => state
                .selected_entry()
                .map(|entry| vec![Action::DetailOpen(entry.name.clone())])
                .unwrap_or_default(),
            _ => {
                let items = entry_items(state);
                let props = SelectListProps {
                    items: &items,
                    count: items.len(),
                    selected: state.selected_index.min(items.len().saturating_sub(1)),
                    is_focused: true,
                    style: list_style(None),
                    behavior: SelectListBehavior {
                        show_scrollbar: true,
                        wrap_navigation: false,
                    },
                    on_select: Action::SelectionSet,
                    render_item: &|item| item.clone(),
                };
                let actions: Vec<_> = entry_list.handle_event(event, props).into_iter().collect();
                return handler_response(actions);
            }
        },
        EventKind::Scroll { delta, .. } => vec![Action::SelectionMove((*delta * 3) as i16)],
        _ => vec![],
    };
    handler_response(actions)
}

fn handle_search_event(event: &EventKind, state: &AppState) -> HandlerResponse<Action> {
    let actions = match event {
        EventKind::Key(key) => match key.code {
            crossterm::event::KeyCode::Esc | crossterm::event::KeyCode::Enter => {
                vec![Action::SearchClose]
            }
            crossterm::event::KeyCode::Backspace => {
                let mut text = state.search.raw.clone();
                if text.pop().is_some() {
                    vec![Action::SearchInput(text)]
                } else {
                    vec![]
                }
            }
            crossterm::event::KeyCode::Char(ch) => {
                let mut text = state.search.raw.clone();
                text.push(ch);
                vec![Action::SearchInput(text)]
            }
            _ => vec![],
        },
        _ => vec![],
    };
    handler_response(actions)
}

fn handle_detail_event(
    event: &EventKind,
    state: &AppState,
    evolution_list: &mut SelectList,
) -> HandlerResponse<Action> {
    let actions = match event {
        EventKind::Key(key) => handle_detail_key(*key),
        _ => vec![],
    };
    if !actions.is_empty() {
        return handler_response(actions);
    }

    let Some(modal) = state.modal.as_ref() else {
        return HandlerResponse::ignored();
    };
    let items = evolution_items(modal);
    if items.is_empty() {
        return HandlerResponse::ignored();
    }
    let props = SelectListProps {
        items: &items,
        count: items.len(),
        selected: modal.evolution_index.min(items.len().saturating_sub(1)),
        is_focused: true,
        style: list_style(Some(BG_PANEL)),
        behavior: SelectListBehavior {
            show_scrollbar: true,
            wrap_navigation: false,
        },
        on_select: Action::DetailEvolutionSelect,
        render_item: &|item| item.clone(),
    };
    let actions: Vec<_> = evolution_list
        .handle_event(event, props)
        .into_iter()
        .collect();
    handler_response(actions)
}

fn handle_detail_key(key: crossterm::event::KeyEvent) -> Vec<Action> {
    match key.code {
        crossterm::event::KeyCode::Esc => vec![Action::DetailClose],
        crossterm::event::KeyCode::Left | crossterm::event::KeyCode::Char('h') => {
            vec![Action::DetailImagePrev]
        }
        crossterm::event::KeyCode::Right | crossterm::event::KeyCode::Char('l') => {
            vec![Action::DetailImageNext]
        }
        // Images are numbered from 1 in the modal
        crossterm::event::KeyCode::Char(ch @ '1'..='9') => {
            vec![Action::DetailImageSelect(ch as usize - '1' as usize)]
        }
        _ => vec![],
    }
}

fn handler_response(actions: Vec<Action>) -> HandlerResponse<Action> {
    if actions.is_empty() {
        HandlerResponse::ignored()
    } else {
        HandlerResponse {
            actions,
            consumed: true,
            needs_render: false,
        }
    }
}

fn render_header(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    event_ctx: &mut EventContext<GridComponentId>,
) {
    if state.search.editing {
        event_ctx.set_component_area(GridComponentId::Search, area);
    }

    let mut chips = Vec::new();
    for (idx, group) in FILTER_GROUPS.iter().enumerate() {
        let style = if state.is_group_selected(group.id) {
            Style::default()
                .fg(BG_BASE)
                .bg(ACCENT_TEAL)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(TEXT_DIM)
        };
        chips.push(Span::styled(format!(" {} {} ", idx + 1, group.label), style));
        chips.push(Span::raw(" "));
    }

    let search = if state.search.editing {
        format!("/{}_", state.search.raw)
    } else if state.search.raw.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", state.search.raw)
    };
    let search_line = Line::from(vec![
        Span::raw("Search: "),
        Span::styled(search, Style::default().fg(ACCENT_GOLD)),
        Span::raw("  |  Showing: "),
        Span::styled(
            format!("{}/{}", state.entries.len(), state.candidates.len()),
            Style::default().fg(ACCENT_TEAL),
        ),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(Style::default().fg(TEXT_DIM))
        .title("POKEGRID");
    let paragraph = Paragraph::new(Text::from(vec![Line::from(chips), search_line]))
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_list(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    event_ctx: &mut EventContext<GridComponentId>,
    entry_list: &mut SelectList,
) {
    event_ctx.set_component_area(GridComponentId::Grid, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("BASE FORMS")
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(Style::default().fg(ACCENT_TEAL));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.entries.is_empty() {
        let text = match state.list_status {
            ListStatus::Refreshing => "Loading...",
            ListStatus::Failed => "Could not load the catalog.",
            _ => "Nothing matches these filters.",
        };
        frame.render_widget(
            Paragraph::new(text).style(Style::default().fg(TEXT_DIM)),
            inner,
        );
        return;
    }

    let items = entry_items(state);
    let props = SelectListProps {
        items: &items,
        count: items.len(),
        selected: state.selected_index.min(items.len().saturating_sub(1)),
        is_focused: state.modal.is_none() && !state.search.editing,
        style: list_style(None),
        behavior: SelectListBehavior {
            show_scrollbar: true,
            wrap_navigation: false,
        },
        on_select: Action::SelectionSet,
        render_item: &|item| item.clone(),
    };
    entry_list.render(frame, inner, props);
}

fn render_footer(frame: &mut Frame, area: Rect, state: &AppState, status_bar: &mut StatusBar) {
    let status = state
        .message
        .clone()
        .unwrap_or_else(|| match state.list_status {
            ListStatus::Refreshing => "Loading catalog...".to_string(),
            ListStatus::Appending => "Loading more...".to_string(),
            ListStatus::Failed => "Load failed".to_string(),
            ListStatus::Idle if state.has_more => "More available".to_string(),
            ListStatus::Idle => String::new(),
        });
    let left_hints = status_hints(state);
    let status_span = Span::styled(status.as_str(), Style::default().fg(ACCENT_GOLD));
    let status_items = [StatusBarItem::span(status_span)];

    let style = StatusBarStyle {
        base: BaseStyle {
            border: Some(BorderStyle {
                borders: Borders::ALL,
                style: Style::default().fg(TEXT_DIM),
                focused_style: Some(Style::default().fg(ACCENT_TEAL)),
            }),
            padding: Padding::xy(1, 0),
            bg: Some(BG_PANEL),
            fg: Some(TEXT_MAIN),
        },
        text: Style::default().fg(TEXT_DIM),
        hint_key: Style::default()
            .fg(ACCENT_TEAL)
            .add_modifier(Modifier::BOLD),
        hint_label: Style::default().fg(TEXT_DIM),
        separator: Style::default().fg(TEXT_DIM),
    };

    let props = StatusBarProps {
        left: StatusBarSection::hints(&left_hints).with_separator("  "),
        center: StatusBarSection::empty(),
        right: StatusBarSection::items(&status_items).with_separator("  "),
        style,
        is_focused: false,
    };
    Component::<Action>::render(status_bar, frame, area, props);
}

fn status_hints(state: &AppState) -> Vec<StatusBarHint<'static>> {
    if state.search.editing {
        return vec![
            StatusBarHint::new("Enter/Esc", "Done"),
            StatusBarHint::new("Bksp", "Delete"),
        ];
    }
    if state.modal.is_some() {
        return vec![
            StatusBarHint::new("h/l", "Image"),
            StatusBarHint::new("1-9", "Jump"),
            StatusBarHint::new("j/k", "Evolution"),
            StatusBarHint::new("Esc", "Close"),
        ];
    }
    let mut hints = vec![
        StatusBarHint::new("1-9", "Filter"),
        StatusBarHint::new("c", "Clear"),
        StatusBarHint::new("/", "Search"),
        StatusBarHint::new("Enter", "Details"),
    ];
    if state.has_more {
        hints.push(StatusBarHint::new("m", "More"));
    }
    hints.push(StatusBarHint::new("q", "Quit"));
    hints
}

fn render_modal(
    frame: &mut Frame,
    area: Rect,
    modal: &DetailModal,
    event_ctx: &mut EventContext<GridComponentId>,
    evolution_list: &mut SelectList,
) {
    let modal_area = centered_rect(64, 22, area);
    event_ctx.set_component_area(GridComponentId::Detail, modal_area);
    frame.render_widget(Clear, modal_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format_name(&modal.target))
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(Style::default().fg(ACCENT_GOLD));
    let inner = block.inner(modal_area);
    frame.render_widget(block, modal_area);

    let Some(detail) = modal.detail.data() else {
        let text = match modal.detail.error() {
            Some(error) => Line::from(Span::styled(
                format!("Could not load details: {error}"),
                Style::default().fg(ACCENT_RED),
            )),
            None => Line::from(Span::styled(
                "Loading details...",
                Style::default().fg(TEXT_DIM),
            )),
        };
        frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), inner);
        return;
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
        .split(inner);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("#{:03} ", detail.entry.id),
                Style::default().fg(ACCENT_GOLD),
            ),
            Span::raw(detail.entry.types.join(" / ")),
        ]),
        Line::from(format!(
            "Height {:.1} m  Weight {:.1} kg",
            f32::from(detail.height) / 10.0,
            f32::from(detail.weight) / 10.0
        )),
        Line::from(""),
    ];
    lines.extend(detail.stats.iter().map(|stat| Line::from(render_stat(stat))));
    lines.push(Line::from(""));
    lines.push(Line::from(format!(
        "Abilities: {}",
        detail
            .abilities
            .iter()
            .map(|ability| format_name(ability))
            .collect::<Vec<_>>()
            .join(", ")
    )));
    lines.push(Line::from(""));
    let image_line = match modal.image() {
        Some(url) => format!(
            "Image {}/{}: {url}",
            modal.image_index + 1,
            detail.images.len()
        ),
        None => "No images".to_string(),
    };
    lines.push(Line::from(Span::styled(
        image_line,
        Style::default().fg(TEXT_DIM),
    )));
    frame.render_widget(
        Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true }),
        columns[0],
    );

    let evo_block = Block::default()
        .borders(Borders::LEFT)
        .title("EVOLUTION")
        .border_style(Style::default().fg(TEXT_DIM));
    let evo_inner = evo_block.inner(columns[1]);
    frame.render_widget(evo_block, columns[1]);

    let items = evolution_items(modal);
    if items.is_empty() {
        frame.render_widget(
            Paragraph::new("Does not evolve.").style(Style::default().fg(TEXT_DIM)),
            evo_inner,
        );
        return;
    }
    let props = SelectListProps {
        items: &items,
        count: items.len(),
        selected: modal.evolution_index.min(items.len().saturating_sub(1)),
        is_focused: true,
        style: list_style(Some(BG_PANEL)),
        behavior: SelectListBehavior {
            show_scrollbar: true,
            wrap_navigation: false,
        },
        on_select: Action::DetailEvolutionSelect,
        render_item: &|item| item.clone(),
    };
    evolution_list.render(frame, evo_inner, props);
}

fn entry_items(state: &AppState) -> Vec<Line<'static>> {
    state.entries.iter().map(entry_line).collect()
}

fn entry_line(entry: &CatalogEntry) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("#{:03} ", entry.id),
            Style::default().fg(ACCENT_GOLD),
        ),
        Span::raw(format!("{:<14}", format_name(&entry.name))),
        Span::styled(entry.types.join("/"), Style::default().fg(TEXT_DIM)),
    ])
}

fn evolution_items(modal: &DetailModal) -> Vec<Line<'static>> {
    let Some(detail) = modal.detail.data() else {
        return Vec::new();
    };
    detail
        .evolution
        .iter()
        .enumerate()
        .map(|(idx, stage)| Line::from(format!("{:02} {}", idx + 1, format_name(&stage.name))))
        .collect()
}

fn list_style(bg: Option<Color>) -> SelectListStyle {
    SelectListStyle {
        base: BaseStyle {
            border: None,
            padding: Padding::xy(1, 0),
            bg,
            fg: Some(TEXT_MAIN),
        },
        selection: SelectionStyle {
            style: Some(
                Style::default()
                    .bg(BG_HIGHLIGHT)
                    .fg(TEXT_MAIN)
                    .add_modifier(Modifier::BOLD),
            ),
            marker: None,
            disabled: false,
        },
        ..SelectListStyle::default()
    }
}

fn format_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => format!("{}{}", first.to_ascii_uppercase(), chars.as_str()),
                None => "".to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_stat(stat: &EntryStat) -> String {
    let label = shorten_stat(&stat.name);
    let bar_len = (stat.base as usize / 10).clamp(1, 20);
    let bar = "#".repeat(bar_len);
    format!("{label:>4} {value:>3} {bar}", value = stat.base)
}

fn shorten_stat(name: &str) -> String {
    match name {
        "hp" => " HP".to_string(),
        "attack" => "ATK".to_string(),
        "defense" => "DEF".to_string(),
        "special-attack" => "SAT".to_string(),
        "special-defense" => "SDF".to_string(),
        "speed" => "SPD".to_string(),
        _ => name.to_ascii_uppercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn detail_digits_select_images_from_one() {
        assert_eq!(
            handle_detail_key(press(KeyCode::Char('1'))),
            vec![Action::DetailImageSelect(0)]
        );
        assert_eq!(
            handle_detail_key(press(KeyCode::Char('3'))),
            vec![Action::DetailImageSelect(2)]
        );
        assert!(handle_detail_key(press(KeyCode::Char('0'))).is_empty());
    }

    #[test]
    fn detail_arrows_cycle_images() {
        assert_eq!(
            handle_detail_key(press(KeyCode::Left)),
            vec![Action::DetailImagePrev]
        );
        assert_eq!(
            handle_detail_key(press(KeyCode::Char('l'))),
            vec![Action::DetailImageNext]
        );
        assert_eq!(handle_detail_key(press(KeyCode::Esc)), vec![Action::DetailClose]);
    }
}
