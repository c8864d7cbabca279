mod ui;

use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::EnvFilter;
use tui_dispatch::{
    EffectContext, EffectStoreLike, EffectStoreWithMiddleware, EventBus, EventKind,
    EventRoutingState, HandlerResponse, Keybindings, TaskKey,
};
use tui_dispatch_debug::debug::DebugLayer;
use tui_dispatch_debug::{
    DebugCliArgs, DebugRunOutput, DebugSession, DebugSessionError, ReplayItem,
};

use pokegrid::action::Action;
use pokegrid::api::PokeApi;
use pokegrid::catalog::Catalog;
use pokegrid::config::{Config, API_BASE, DEFAULT_PAGE_SIZE, SEARCH_DEBOUNCE_MS};
use pokegrid::effect::Effect;
use pokegrid::reducer::reducer;
use pokegrid::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "pokegrid")]
#[command(about = "Browse base-form Pokemon by type group")]
struct Args {
    /// PokeAPI v2 root URL
    #[arg(long, env = "POKEGRID_API_BASE", default_value = API_BASE)]
    api_base: String,

    /// Entries per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Quiet period after typing before the search runs
    #[arg(long, default_value_t = SEARCH_DEBOUNCE_MS)]
    debounce_ms: u64,

    /// Write tracing output here (filter with RUST_LOG, default "warn")
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(flatten)]
    debug: DebugCliArgs,
}

#[derive(tui_dispatch::ComponentId, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum GridComponentId {
    Grid,
    Search,
    Detail,
}

#[derive(tui_dispatch::BindingContext, Clone, Copy, PartialEq, Eq, Hash)]
enum GridContext {
    Grid,
    Search,
    Detail,
}

impl EventRoutingState<GridComponentId, GridContext> for AppState {
    fn focused(&self) -> Option<GridComponentId> {
        self.modal().or(Some(GridComponentId::Grid))
    }

    fn modal(&self) -> Option<GridComponentId> {
        if self.modal.is_some() {
            Some(GridComponentId::Detail)
        } else if self.search.editing {
            Some(GridComponentId::Search)
        } else {
            None
        }
    }

    fn binding_context(&self, id: GridComponentId) -> GridContext {
        match id {
            GridComponentId::Grid => GridContext::Grid,
            GridComponentId::Search => GridContext::Search,
            GridComponentId::Detail => GridContext::Detail,
        }
    }

    fn default_context(&self) -> GridContext {
        GridContext::Grid
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let Args {
        api_base,
        page_size,
        debounce_ms,
        log_file,
        debug: debug_args,
    } = Args::parse();

    init_tracing(log_file)?;

    let config = Config::default()
        .with_api_base(api_base)
        .with_page_size(page_size)
        .with_search_debounce(Duration::from_millis(debounce_ms));
    let source = PokeApi::new(&config).map_err(io::Error::other)?;
    let catalog = Arc::new(Catalog::new(Arc::new(source), config.clone()));

    let debug = DebugSession::new(debug_args);
    debug.save_state_schema::<AppState>().map_err(debug_error)?;
    debug.save_actions_schema::<Action>().map_err(debug_error)?;

    let page_size = config.page_size;
    let state = debug
        .load_state_or_else_async(move || async move {
            Ok::<AppState, io::Error>(AppState::new(page_size))
        })
        .await
        .map_err(debug_error)?;
    let replay_actions = debug.load_replay_items().map_err(debug_error)?;
    let (middleware, recorder) = debug.middleware_with_recorder();
    let store = EffectStoreWithMiddleware::new(state, reducer, middleware);

    let use_alt_screen = debug.use_alt_screen();
    let mut stdout = io::stdout();
    if use_alt_screen {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &debug, store, catalog, replay_actions).await;

    if use_alt_screen {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
    }

    let run_output = result?;
    run_output.write_render_output()?;
    debug.save_actions(recorder.as_ref()).map_err(debug_error)?;
    Ok(())
}

fn init_tracing(log_file: Option<PathBuf>) -> io::Result<()> {
    // The terminal belongs to the UI, so logs only go to a file.
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = std::fs::File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

fn debug_error(error: DebugSessionError) -> io::Error {
    io::Error::other(format!("debug session error: {error}"))
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    debug: &DebugSession,
    store: impl EffectStoreLike<AppState, Action, Effect>,
    catalog: Arc<Catalog>,
    replay_actions: Vec<ReplayItem<Action>>,
) -> io::Result<DebugRunOutput<AppState>> {
    let ui = Rc::new(RefCell::new(ui::GridUi::new()));
    let mut bus: EventBus<AppState, Action, GridComponentId, GridContext> = EventBus::new();
    let keybindings: Keybindings<GridContext> = Keybindings::new();

    let ui_grid = Rc::clone(&ui);
    bus.register(GridComponentId::Grid, move |event, state| {
        ui_grid.borrow_mut().handle_grid_event(&event.kind, state)
    });

    let ui_search = Rc::clone(&ui);
    bus.register(GridComponentId::Search, move |event, state| {
        ui_search
            .borrow_mut()
            .handle_search_event(&event.kind, state)
    });

    let ui_detail = Rc::clone(&ui);
    bus.register(GridComponentId::Detail, move |event, state| {
        ui_detail
            .borrow_mut()
            .handle_detail_event(&event.kind, state)
    });

    bus.register_global(|event, state| match event.kind {
        EventKind::Resize(width, height) => {
            HandlerResponse::action(Action::UiTerminalResize(width, height)).with_render()
        }
        EventKind::Key(key) => match key.code {
            crossterm::event::KeyCode::Char('q') if !state.search.editing => {
                HandlerResponse::action(Action::Quit)
            }
            _ => HandlerResponse::ignored(),
        },
        _ => HandlerResponse::ignored(),
    });

    debug
        .run_effect_app_with_bus(
            terminal,
            store,
            DebugLayer::simple(),
            replay_actions,
            Some(Action::Init),
            Some(Action::Quit),
            |_runtime| {},
            &mut bus,
            &keybindings,
            |frame, area, state, render_ctx, event_ctx| {
                ui.borrow_mut()
                    .render(frame, area, state, render_ctx, event_ctx);
            },
            |action| matches!(action, Action::Quit),
            move |effect, ctx| handle_effect(&catalog, effect, ctx),
        )
        .await
}

fn handle_effect(catalog: &Arc<Catalog>, effect: Effect, ctx: &mut EffectContext<Action>) {
    match effect {
        Effect::Refresh {
            generation,
            groups,
            search,
            page_size,
        } => {
            let token = catalog.begin_generation(generation);
            let catalog = Arc::clone(catalog);
            ctx.tasks().spawn(TaskKey::new("catalog"), async move {
                catalog
                    .refresh(generation, &groups, &search, page_size, token)
                    .await
            });
        }
        Effect::LoadPage {
            generation,
            page,
            names,
        } => {
            let Some(token) = catalog.page_token(generation) else {
                return;
            };
            let catalog = Arc::clone(catalog);
            ctx.tasks().spawn(TaskKey::new("catalog_page"), async move {
                catalog.load_page(generation, page, &names, token).await
            });
        }
        Effect::DebounceSearch { text } => {
            let delay = catalog.config().search_debounce;
            ctx.tasks()
                .debounce("search", delay, async move { Action::SearchDidSettle(text) });
        }
        Effect::LoadDetail { name } => {
            let token = catalog.begin_detail();
            let catalog = Arc::clone(catalog);
            ctx.tasks().spawn(TaskKey::new("detail"), async move {
                catalog.load_detail(&name, token).await
            });
        }
        Effect::CancelDetail => {
            catalog.cancel_detail();
            ctx.tasks().cancel(&TaskKey::new("detail"));
        }
    }
}
