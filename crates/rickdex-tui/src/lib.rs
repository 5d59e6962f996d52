// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use rickdex_app::{
    AppCommand, AppEvent, AppMode, AppState, Character, CharacterPage, ColumnId,
    DEFAULT_SEARCH_DEBOUNCE, Debouncer, FetchOutcome, FetchRequest, FetchTracker,
    FilterDimension, PickerKind, QueryKey, apply_client_filter, needs_client_filter,
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};
use time::macros::format_description;

const DEFAULT_PAGE_ROWS: usize = 10;
const POLL_INTERVAL: Duration = Duration::from_millis(120);
const STATUS_CLEAR_DELAY: Duration = Duration::from_secs(4);

/// Side effects the UI needs from the outside world.
pub trait AppRuntime {
    fn fetch_characters(&mut self, key: &QueryKey) -> Result<CharacterPage>;
    fn clear_cache(&mut self) -> Result<usize>;

    /// Runs a fetch and reports it on `tx`. The default runs inline; real
    /// runtimes move the request to a worker thread.
    fn spawn_fetch(
        &mut self,
        generation: u64,
        key: &QueryKey,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self
            .fetch_characters(key)
            .map_err(|error| format!("{error:#}"));
        tx.send(InternalEvent::Fetched { generation, result })
            .map_err(|_| anyhow::anyhow!("fetch event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    Fetched {
        generation: u64,
        result: std::result::Result<CharacterPage, String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiOptions {
    pub search_debounce: Duration,
    pub page_rows: usize,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            page_rows: DEFAULT_PAGE_ROWS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ViewData {
    search_input: String,
    search_debounce: Debouncer<String>,
    fetch: FetchTracker,
    selected_row: usize,
    picker_cursor: usize,
    help_visible: bool,
    status_token: u64,
    page_rows: usize,
}

impl ViewData {
    fn new(state: &AppState, options: UiOptions) -> Self {
        Self {
            search_input: state.location.state().search.clone(),
            search_debounce: Debouncer::new(options.search_debounce),
            fetch: FetchTracker::default(),
            selected_row: 0,
            picker_cursor: 0,
            help_visible: false,
            status_token: 0,
            page_rows: options.page_rows.max(1),
        }
    }

    fn search_pending(&self, state: &AppState) -> bool {
        self.search_input != state.location.state().search
    }

    fn loading(&self, state: &AppState) -> bool {
        self.fetch.loading() || self.search_pending(state)
    }

    fn total_pages(&self, state: &AppState) -> u32 {
        self.fetch
            .data()
            .map_or(state.location.state().page, CharacterPage::total_pages)
    }
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    options: UiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(state, options);
    let (internal_tx, internal_rx) = mpsc::channel();
    sync_fetch(state, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_rx);
        flush_due_search(state, runtime, &mut view_data, &internal_tx, Instant::now());

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let timeout = view_data
            .search_debounce
            .time_until_due(Instant::now())
            .map_or(POLL_INTERVAL, |due| due.min(POLL_INTERVAL));
        let has_event = match event::poll(timeout).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    view_data.search_debounce.cancel();
    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Fetched { generation, result } => {
                if let Err(error) = &result {
                    tracing::warn!(generation, error = %error, "character fetch failed");
                }
                if view_data.fetch.complete(generation, result) == FetchOutcome::Applied {
                    view_data.selected_row = row_after_fetch(state, view_data);
                }
            }
        }
    }
}

fn row_after_fetch(state: &AppState, view_data: &ViewData) -> usize {
    let rows = visible_rows(state, view_data);
    let selected = &state.location.state().selected_character;
    rows.iter()
        .position(|character| character.id == *selected)
        .unwrap_or_else(|| view_data.selected_row.min(rows.len().saturating_sub(1)))
}

fn flush_due_search<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    now: Instant,
) {
    if let Some(search) = view_data.search_debounce.poll(now) {
        dispatch_and_sync(
            state,
            runtime,
            view_data,
            internal_tx,
            AppCommand::SetSearch(search),
        );
    }
}

fn dispatch_and_sync<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let events = state.dispatch(command);
    apply_app_events(state, view_data, internal_tx, &events);
    sync_fetch(state, runtime, view_data, internal_tx);
}

fn apply_app_events(
    state: &AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    events: &[AppEvent],
) {
    for event in events {
        match event {
            AppEvent::LocationChanged(_) => {
                // Typing owns the input until its debounce fires.
                if !view_data.search_debounce.is_pending() {
                    view_data.search_input = state.location.state().search.clone();
                }
            }
            AppEvent::StatusUpdated(_) => {
                view_data.status_token = view_data.status_token.saturating_add(1);
                schedule_status_clear(internal_tx, view_data.status_token);
            }
            AppEvent::ModeChanged(_) | AppEvent::StatusCleared => {}
        }
    }
}

fn sync_fetch<R: AppRuntime>(
    state: &AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let key = QueryKey::for_state(state.location.state());
    if let Some(request) = view_data.fetch.request(key) {
        start_fetch(runtime, view_data, internal_tx, request);
    }
}

fn start_fetch<R: AppRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    request: FetchRequest,
) {
    if let Err(error) = runtime.spawn_fetch(request.generation, &request.key, internal_tx.clone())
    {
        view_data
            .fetch
            .complete(request.generation, Err(format!("{error:#}")));
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_DELAY);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    let events = state.dispatch(AppCommand::SetStatus(message.into()));
    apply_app_events(state, view_data, internal_tx, &events);
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    match state.mode {
        AppMode::Search => {
            handle_search_key(state, runtime, view_data, internal_tx, key);
            false
        }
        AppMode::Picker(kind) => {
            handle_picker_key(state, runtime, view_data, internal_tx, kind, key);
            false
        }
        AppMode::Nav => handle_nav_key(state, runtime, view_data, internal_tx, key),
    }
}

fn handle_nav_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let page = state.location.state().page;
    let total_pages = view_data.total_pages(state);

    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => return true,
        (KeyCode::Char('j') | KeyCode::Down, _) => move_row(state, view_data, 1),
        (KeyCode::Char('k') | KeyCode::Up, _) => move_row(state, view_data, -1),
        (KeyCode::Char('d'), KeyModifiers::CONTROL) | (KeyCode::PageDown, _) => {
            let step = view_data.page_rows as isize;
            move_row(state, view_data, step);
        }
        (KeyCode::Char('u'), KeyModifiers::CONTROL) | (KeyCode::PageUp, _) => {
            let step = view_data.page_rows as isize;
            move_row(state, view_data, -step);
        }
        (KeyCode::Char('n') | KeyCode::Right, _) => {
            if page >= total_pages {
                emit_status(state, view_data, internal_tx, "already on the last page");
            } else {
                go_to_page(state, runtime, view_data, internal_tx, page + 1);
            }
        }
        (KeyCode::Char('p') | KeyCode::Left, _) => {
            if page <= 1 {
                emit_status(state, view_data, internal_tx, "already on the first page");
            } else {
                go_to_page(state, runtime, view_data, internal_tx, page - 1);
            }
        }
        (KeyCode::Char('g'), KeyModifiers::NONE) | (KeyCode::Home, _) => {
            go_to_page(state, runtime, view_data, internal_tx, 1);
        }
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => {
            go_to_page(state, runtime, view_data, internal_tx, total_pages);
        }
        (KeyCode::Char('/'), _) => {
            state.dispatch(AppCommand::EnterSearch);
        }
        (KeyCode::Char('s'), KeyModifiers::NONE) => {
            open_picker(state, view_data, PickerKind::Filter(FilterDimension::Status));
        }
        (KeyCode::Char('x'), KeyModifiers::NONE) => {
            open_picker(state, view_data, PickerKind::Filter(FilterDimension::Gender));
        }
        (KeyCode::Char('e'), KeyModifiers::NONE) => {
            open_picker(state, view_data, PickerKind::Filter(FilterDimension::Species));
        }
        (KeyCode::Char('c'), KeyModifiers::NONE) => {
            open_picker(state, view_data, PickerKind::Columns);
        }
        (KeyCode::Enter, _) => {
            let rows = visible_rows(state, view_data);
            match rows.get(view_data.selected_row) {
                Some(character) => {
                    let id = character.id.clone();
                    dispatch_and_sync(
                        state,
                        runtime,
                        view_data,
                        internal_tx,
                        AppCommand::SelectCharacter(id),
                    );
                }
                None => emit_status(state, view_data, internal_tx, "no character selected"),
            }
        }
        (KeyCode::Esc, _) => {
            if state.location.state().is_detail_open() {
                dispatch_and_sync(
                    state,
                    runtime,
                    view_data,
                    internal_tx,
                    AppCommand::CloseDetail,
                );
            }
        }
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            if let Some(request) = view_data.fetch.retry() {
                start_fetch(runtime, view_data, internal_tx, request);
                emit_status(state, view_data, internal_tx, "retrying");
            }
        }
        (KeyCode::Char('R'), _) => {
            view_data.search_debounce.cancel();
            view_data.search_input.clear();
            dispatch_and_sync(
                state,
                runtime,
                view_data,
                internal_tx,
                AppCommand::ResetFilters,
            );
        }
        (KeyCode::Char('l'), KeyModifiers::CONTROL) => {
            clear_cache(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('b'), KeyModifiers::NONE) | (KeyCode::Backspace, _) => {
            view_data.search_debounce.cancel();
            dispatch_and_sync(state, runtime, view_data, internal_tx, AppCommand::Back);
            view_data.search_input = state.location.state().search.clone();
        }
        (KeyCode::Char('?'), _) => {
            view_data.help_visible = true;
        }
        _ => {}
    }
    false
}

fn handle_search_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match (key.code, key.modifiers) {
        (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
            view_data.search_debounce.cancel();
            view_data.search_input.clear();
            dispatch_and_sync(
                state,
                runtime,
                view_data,
                internal_tx,
                AppCommand::SetSearch(String::new()),
            );
        }
        (KeyCode::Enter, _) => {
            if let Some(search) = view_data.search_debounce.flush() {
                dispatch_and_sync(
                    state,
                    runtime,
                    view_data,
                    internal_tx,
                    AppCommand::SetSearch(search),
                );
            }
            state.dispatch(AppCommand::ExitToNav);
        }
        (KeyCode::Esc, _) => {
            state.dispatch(AppCommand::ExitToNav);
        }
        (KeyCode::Backspace, _) => {
            if view_data.search_input.pop().is_some() {
                let input = view_data.search_input.clone();
                view_data.search_debounce.call(input, Instant::now());
            }
        }
        (KeyCode::Char(ch), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
            view_data.search_input.push(ch);
            let input = view_data.search_input.clone();
            view_data.search_debounce.call(input, Instant::now());
        }
        _ => {}
    }
}

fn handle_picker_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    kind: PickerKind,
    key: KeyEvent,
) {
    let option_count = kind.options().len();
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            view_data.picker_cursor =
                (view_data.picker_cursor + 1).min(option_count.saturating_sub(1));
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.picker_cursor = view_data.picker_cursor.saturating_sub(1);
        }
        KeyCode::Char(' ') => {
            let command = match kind {
                PickerKind::Filter(dimension) => kind
                    .options()
                    .get(view_data.picker_cursor)
                    .map(|value| AppCommand::ToggleFilterValue(dimension, (*value).to_owned())),
                PickerKind::Columns => ColumnId::ALL
                    .get(view_data.picker_cursor)
                    .map(|column| AppCommand::ToggleColumn(*column)),
            };
            if let Some(command) = command {
                dispatch_and_sync(state, runtime, view_data, internal_tx, command);
            }
        }
        KeyCode::Char('a') => {
            let command = match kind {
                PickerKind::Filter(dimension) => AppCommand::SetFilter(dimension, Vec::new()),
                PickerKind::Columns => AppCommand::SetColumns(Vec::new()),
            };
            dispatch_and_sync(state, runtime, view_data, internal_tx, command);
        }
        KeyCode::Enter | KeyCode::Esc => {
            state.dispatch(AppCommand::ExitToNav);
        }
        _ => {}
    }
}

fn open_picker(state: &mut AppState, view_data: &mut ViewData, kind: PickerKind) {
    view_data.picker_cursor = 0;
    state.dispatch(AppCommand::OpenPicker(kind));
}

fn go_to_page<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    page: u32,
) {
    dispatch_and_sync(
        state,
        runtime,
        view_data,
        internal_tx,
        AppCommand::SetPage(page),
    );
}

fn clear_cache<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    match runtime.clear_cache() {
        Ok(removed) => {
            if let Some(request) = view_data.fetch.retry() {
                start_fetch(runtime, view_data, internal_tx, request);
            }
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("cache cleared ({removed} pages); refetching"),
            );
        }
        Err(error) => {
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("clear cache failed: {error}"),
            );
        }
    }
}

fn move_row(state: &AppState, view_data: &mut ViewData, delta: isize) {
    let rows = visible_rows(state, view_data).len();
    if rows == 0 {
        view_data.selected_row = 0;
        return;
    }
    let max = rows as isize - 1;
    let next = (view_data.selected_row as isize + delta).clamp(0, max);
    view_data.selected_row = next as usize;
}

fn visible_rows(state: &AppState, view_data: &ViewData) -> Vec<Character> {
    view_data
        .fetch
        .data()
        .map(|page| apply_client_filter(state.location.state(), page.results.clone()))
        .unwrap_or_default()
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let search_style = if state.mode == AppMode::Search {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let header = Paragraph::new(header_text(state, view_data))
        .block(
            Block::default()
                .title("rickdex")
                .borders(Borders::ALL)
                .border_style(search_style),
        );
    frame.render_widget(header, layout[0]);

    render_table(frame, layout[1], state, view_data);

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    if let Some((title, body)) = drawer_text(state, view_data) {
        let area = centered_rect(60, 60, frame.area());
        frame.render_widget(Clear, area);
        let drawer = Paragraph::new(body)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Cyan)),
            );
        frame.render_widget(drawer, area);
    }

    if let AppMode::Picker(kind) = state.mode {
        let area = centered_rect(40, 50, frame.area());
        frame.render_widget(Clear, area);
        let picker = Paragraph::new(picker_text(state, kind, view_data.picker_cursor))
            .block(Block::default().title(kind.title()).borders(Borders::ALL));
        frame.render_widget(picker, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn header_text(state: &AppState, view_data: &ViewData) -> String {
    let cursor = if state.mode == AppMode::Search {
        "_"
    } else {
        ""
    };
    let filters = FilterDimension::ALL
        .iter()
        .map(|dimension| {
            let selected = state.location.state().filter(*dimension);
            let value = if selected.is_empty() {
                "any".to_owned()
            } else {
                selected.join(", ")
            };
            format!("{}: {value}", dimension.param())
        })
        .collect::<Vec<_>>()
        .join(" | ");
    format!(
        "search: {}{cursor}\n{filters}",
        view_data.search_input
    )
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let block = Block::default()
        .title(table_title(state, view_data))
        .borders(Borders::ALL);

    let body = match (view_data.fetch.error(), view_data.fetch.data()) {
        (Some(error), _) => Some(error_panel_text(error)),
        (None, None) => Some("loading characters...".to_owned()),
        (None, Some(_)) => None,
    };
    if let Some(text) = body {
        let style = if view_data.fetch.error().is_some() {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };
        let panel = Paragraph::new(text)
            .style(style)
            .wrap(Wrap { trim: false })
            .block(block);
        frame.render_widget(panel, area);
        return;
    }

    let rows = visible_rows(state, view_data);
    if rows.is_empty() {
        let empty = Paragraph::new("no characters found").block(block);
        frame.render_widget(empty, area);
        return;
    }

    let columns = state.location.state().visible_columns();
    let widths = vec![Constraint::Min(8); columns.len()];
    let header = Row::new(columns.iter().map(|column| {
        Cell::from(column.label()).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let selected_character = &state.location.state().selected_character;
    let table_rows = rows.iter().enumerate().map(|(index, character)| {
        let mut style = Style::default();
        if character.id == *selected_character {
            style = style.fg(Color::Cyan);
        }
        if index == view_data.selected_row {
            style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
        }
        Row::new(
            columns
                .iter()
                .map(|column| Cell::from(character.cell(*column)))
                .collect::<Vec<_>>(),
        )
        .style(style)
    });

    let table = Table::new(table_rows, widths)
        .header(header)
        .column_spacing(1)
        .block(block);
    frame.render_widget(table, area);
}

fn table_title(state: &AppState, view_data: &ViewData) -> String {
    let table_state = state.location.state();
    let mut title = match view_data.fetch.data() {
        Some(page) => format!(
            "characters | page {}/{} | {} total",
            table_state.page,
            page.total_pages(),
            page.info.count
        ),
        None => format!("characters | page {}", table_state.page),
    };
    if needs_client_filter(table_state) {
        title.push_str(" (filtered on page)");
    }
    if view_data.loading(state) {
        title.push_str(" | loading");
    }
    title
}

fn error_panel_text(error: &str) -> String {
    format!("could not load characters: {error}\n\npress r to retry")
}

fn drawer_text(state: &AppState, view_data: &ViewData) -> Option<(String, String)> {
    let table_state = state.location.state();
    if !table_state.is_detail_open() {
        return None;
    }

    let id = &table_state.selected_character;
    let rows = visible_rows(state, view_data);
    let Some(character) = rows.iter().find(|character| character.id == *id) else {
        return Some((
            format!("character {id}"),
            "character not on this page\n\nesc close".to_owned(),
        ));
    };

    let episodes = character.episode_count();
    let plural = if episodes == 1 { "" } else { "s" };
    let created = character
        .created
        .and_then(|created| created.format(format_description!("[year]-[month]-[day]")).ok())
        .unwrap_or_else(|| "unknown".to_owned());
    let kind = if character.kind.is_empty() {
        "-"
    } else {
        character.kind.as_str()
    };

    let body = [
        format!("status: {}", character.status.as_str()),
        format!("species: {}", character.species),
        format!("type: {kind}"),
        format!("gender: {}", character.gender.as_str()),
        format!("origin: {}", character.origin),
        format!("last known location: {}", character.location),
        format!("appears in {episodes} episode{plural}"),
        format!("image: {}", character.image),
        format!("created: {created}"),
        String::new(),
        "esc close".to_owned(),
    ]
    .join("\n");
    Some((character.name.clone(), body))
}

fn picker_text(state: &AppState, kind: PickerKind, cursor: usize) -> String {
    let table_state = state.location.state();
    let lines = kind
        .options()
        .into_iter()
        .enumerate()
        .map(|(index, option)| {
            let checked = match kind {
                PickerKind::Filter(dimension) => {
                    table_state.filter(dimension).iter().any(|value| value == option)
                }
                PickerKind::Columns => table_state
                    .visible_columns()
                    .iter()
                    .any(|column| column.as_str() == option),
            };
            let pointer = if index == cursor { ">" } else { " " };
            let mark = if checked { "x" } else { " " };
            format!("{pointer} [{mark}] {option}")
        })
        .collect::<Vec<_>>();
    format!(
        "{}\n\nspace toggle | a clear | enter close",
        lines.join("\n")
    )
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if view_data.help_visible {
        return String::new();
    }

    let mode = match state.mode {
        AppMode::Nav => "NAV",
        AppMode::Search => "SEARCH",
        AppMode::Picker(_) => "PICK",
    };
    let hints = match state.mode {
        AppMode::Nav => "j/k n/p / s/x/e c enter r R b ? q",
        AppMode::Search => "enter apply | ctrl+u clear | esc nav",
        AppMode::Picker(_) => "j/k space a enter",
    };
    let href = state.location.href();
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {href} | {hints}"),
        None => format!("{mode} | {href} | {hints}"),
    }
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | ? help\n\
nav: j/k rows | ctrl+d/ctrl+u jump rows | n/p or right/left page | g/G first/last page\n\
nav: / search | s status | x gender | e species | c columns\n\
nav: enter details | esc close details | r retry | R reset filters\n\
nav: ctrl+l clear cache | b back | q quit\n\
search: type to filter by name | enter apply now | ctrl+u clear | esc nav\n\
picker: j/k move | space toggle | a clear all | enter/esc close"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, InternalEvent, UiOptions, ViewData, drawer_text, flush_due_search,
        handle_key_event, header_text, picker_text, process_internal_events, render,
        status_text, sync_fetch, table_title, visible_rows,
    };
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use rickdex_app::{
        AppMode, AppState, CharacterFilter, CharacterPage, CharacterStatus, FilterDimension,
        Location, PickerKind, QueryKey,
    };
    use rickdex_testkit::sample_page;
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    #[derive(Debug, Default)]
    struct TestRuntime {
        fetched: Vec<QueryKey>,
        fail_with: Option<String>,
        empty: bool,
        cache_clears: usize,
    }

    impl AppRuntime for TestRuntime {
        fn fetch_characters(&mut self, key: &QueryKey) -> anyhow::Result<CharacterPage> {
            self.fetched.push(key.clone());
            if let Some(error) = &self.fail_with {
                anyhow::bail!("{error}");
            }
            if self.empty {
                return Ok(CharacterPage::default());
            }
            Ok(sample_page(key.page, 3))
        }

        fn clear_cache(&mut self) -> anyhow::Result<usize> {
            self.cache_clears += 1;
            Ok(4)
        }
    }

    struct Harness {
        state: AppState,
        runtime: TestRuntime,
        view_data: ViewData,
        tx: mpsc::Sender<InternalEvent>,
        rx: mpsc::Receiver<InternalEvent>,
    }

    impl Harness {
        fn at(location: &str) -> Self {
            Self::with_runtime(location, TestRuntime::default())
        }

        fn with_runtime(location: &str, runtime: TestRuntime) -> Self {
            let state = AppState::with_location(Location::parse(location));
            let view_data = ViewData::new(&state, UiOptions::default());
            let (tx, rx) = mpsc::channel();
            let mut harness = Self {
                state,
                runtime,
                view_data,
                tx,
                rx,
            };
            sync_fetch(
                &harness.state,
                &mut harness.runtime,
                &mut harness.view_data,
                &harness.tx,
            );
            harness.drain();
            harness
        }

        fn press(&mut self, code: KeyCode) -> bool {
            self.press_with(code, KeyModifiers::NONE)
        }

        fn press_with(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
            let quit = handle_key_event(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                KeyEvent::new(code, modifiers),
            );
            self.drain();
            quit
        }

        fn type_text(&mut self, text: &str) {
            for ch in text.chars() {
                self.press(KeyCode::Char(ch));
            }
        }

        fn tick(&mut self, now: Instant) {
            flush_due_search(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                now,
            );
            self.drain();
        }

        fn drain(&mut self) {
            process_internal_events(&mut self.state, &mut self.view_data, &self.rx);
        }

        fn screen(&self) -> String {
            let backend = TestBackend::new(140, 40);
            let mut terminal = Terminal::new(backend).expect("test terminal");
            terminal
                .draw(|frame| render(frame, &self.state, &self.view_data))
                .expect("draw should succeed");
            terminal
                .backend()
                .buffer()
                .content()
                .iter()
                .map(|cell| cell.symbol())
                .collect()
        }
    }

    #[test]
    fn startup_fetches_first_page_once() {
        let mut harness = Harness::at("");
        assert_eq!(
            harness.runtime.fetched,
            vec![QueryKey {
                page: 1,
                filter: None
            }]
        );

        sync_fetch(
            &harness.state,
            &mut harness.runtime,
            &mut harness.view_data,
            &harness.tx,
        );
        assert_eq!(harness.runtime.fetched.len(), 1);
        assert_eq!(visible_rows(&harness.state, &harness.view_data).len(), 10);
        assert!(harness.screen().contains("Rick Sanchez"));
    }

    #[test]
    fn paging_keys_move_through_pages_and_clamp() {
        let mut harness = Harness::at("");

        harness.press(KeyCode::Char('n'));
        assert_eq!(harness.state.location.href(), "/?page=2");
        assert_eq!(harness.runtime.fetched.last().map(|key| key.page), Some(2));

        harness.press(KeyCode::Char('G'));
        assert_eq!(harness.state.location.state().page, 3);

        harness.press(KeyCode::Right);
        assert_eq!(harness.state.location.state().page, 3);
        assert_eq!(
            harness.state.status_line.as_deref(),
            Some("already on the last page")
        );

        harness.press(KeyCode::Char('g'));
        assert_eq!(harness.state.location.href(), "/");

        harness.press(KeyCode::Left);
        assert_eq!(
            harness.state.status_line.as_deref(),
            Some("already on the first page")
        );
    }

    #[test]
    fn row_jumps_move_by_page_rows_and_clamp() {
        let mut harness = Harness::at("");
        harness.view_data.page_rows = 4;
        assert_eq!(harness.view_data.selected_row, 0);

        harness.press_with(KeyCode::Char('d'), KeyModifiers::CONTROL);
        assert_eq!(harness.view_data.selected_row, 4);
        harness.press(KeyCode::PageDown);
        assert_eq!(harness.view_data.selected_row, 8);
        harness.press_with(KeyCode::Char('d'), KeyModifiers::CONTROL);
        assert_eq!(harness.view_data.selected_row, 9);

        harness.press_with(KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert_eq!(harness.view_data.selected_row, 5);
        harness.press(KeyCode::PageUp);
        assert_eq!(harness.view_data.selected_row, 1);
        harness.press(KeyCode::PageUp);
        assert_eq!(harness.view_data.selected_row, 0);

        assert_eq!(harness.state.location.href(), "/");
        assert_eq!(harness.runtime.fetched.len(), 1);
    }

    #[test]
    fn search_input_is_debounced_before_touching_the_location() {
        let mut harness = Harness::at("page=3");

        harness.press(KeyCode::Char('/'));
        assert_eq!(harness.state.mode, AppMode::Search);
        harness.type_text("rick");

        assert_eq!(harness.view_data.search_input, "rick");
        assert_eq!(harness.state.location.state().search, "");
        assert_eq!(harness.runtime.fetched.len(), 1);
        assert!(table_title(&harness.state, &harness.view_data).contains("loading"));

        harness.tick(Instant::now() + Duration::from_secs(1));
        assert_eq!(harness.state.location.href(), "/?search=rick");
        assert_eq!(
            harness.runtime.fetched.last(),
            Some(&QueryKey {
                page: 1,
                filter: Some(CharacterFilter {
                    name: Some("rick".to_owned()),
                    ..CharacterFilter::default()
                }),
            })
        );
        assert_eq!(harness.runtime.fetched.len(), 2);
    }

    #[test]
    fn enter_applies_pending_search_immediately() {
        let mut harness = Harness::at("");
        harness.press(KeyCode::Char('/'));
        harness.type_text("morty");
        harness.press(KeyCode::Enter);

        assert_eq!(harness.state.mode, AppMode::Nav);
        assert_eq!(harness.state.location.state().search, "morty");
        assert!(!harness.view_data.search_debounce.is_pending());
    }

    #[test]
    fn escape_keeps_pending_search_running() {
        let mut harness = Harness::at("");
        harness.press(KeyCode::Char('/'));
        harness.type_text("sum");
        harness.press(KeyCode::Esc);

        assert_eq!(harness.state.mode, AppMode::Nav);
        assert!(harness.view_data.search_debounce.is_pending());

        harness.tick(Instant::now() + Duration::from_secs(1));
        assert_eq!(harness.state.location.state().search, "sum");
    }

    #[test]
    fn clearing_search_applies_without_delay() {
        let mut harness = Harness::at("search=rick");
        harness.press(KeyCode::Char('/'));
        harness.type_text("y");
        harness.press_with(KeyCode::Char('u'), KeyModifiers::CONTROL);

        assert_eq!(harness.view_data.search_input, "");
        assert_eq!(harness.state.location.href(), "/");
        assert!(!harness.view_data.search_debounce.is_pending());
        assert!(!table_title(&harness.state, &harness.view_data).contains("loading"));
    }

    #[test]
    fn stale_fetch_results_are_ignored() {
        let mut harness = Harness::at("");
        let first = harness
            .view_data
            .fetch
            .request(QueryKey {
                page: 2,
                filter: None,
            })
            .expect("new key should request");
        let second = harness
            .view_data
            .fetch
            .request(QueryKey {
                page: 3,
                filter: None,
            })
            .expect("new key should request");

        harness
            .tx
            .send(InternalEvent::Fetched {
                generation: second.generation,
                result: Ok(sample_page(3, 3)),
            })
            .expect("send");
        harness
            .tx
            .send(InternalEvent::Fetched {
                generation: first.generation,
                result: Ok(sample_page(2, 3)),
            })
            .expect("send");
        harness.drain();

        let data = harness.view_data.fetch.data().expect("data should be set");
        assert_eq!(data.info.prev, Some(2));
        assert!(!harness.view_data.fetch.loading());
    }

    #[test]
    fn multi_select_filters_locally_and_flags_title() {
        let harness = Harness::at("?page=2&status=Alive,Dead");

        assert_eq!(
            harness.runtime.fetched,
            vec![QueryKey {
                page: 2,
                filter: None
            }]
        );
        let rows = visible_rows(&harness.state, &harness.view_data);
        assert_eq!(rows.len(), 8);
        assert!(rows.iter().all(|character| matches!(
            character.status,
            CharacterStatus::Alive | CharacterStatus::Dead
        )));

        let title = table_title(&harness.state, &harness.view_data);
        assert!(title.contains("page 2/3"));
        assert!(title.contains("(filtered on page)"));
    }

    #[test]
    fn picker_toggles_write_the_location_immediately() {
        let mut harness = Harness::at("");
        harness.press(KeyCode::Char('s'));
        assert_eq!(
            harness.state.mode,
            AppMode::Picker(PickerKind::Filter(FilterDimension::Status))
        );

        harness.press(KeyCode::Char(' '));
        assert_eq!(harness.state.location.href(), "/?status=Alive");
        assert_eq!(
            harness.runtime.fetched.last().and_then(|key| key.filter.clone()),
            Some(CharacterFilter {
                status: Some("Alive".to_owned()),
                ..CharacterFilter::default()
            })
        );

        harness.press(KeyCode::Char('j'));
        harness.press(KeyCode::Char(' '));
        assert_eq!(harness.state.location.state().status, vec!["Alive", "Dead"]);
        assert!(
            picker_text(
                &harness.state,
                PickerKind::Filter(FilterDimension::Status),
                harness.view_data.picker_cursor
            )
            .contains("> [x] Dead")
        );

        harness.press(KeyCode::Char('a'));
        assert_eq!(harness.state.location.href(), "/");

        harness.press(KeyCode::Enter);
        assert_eq!(harness.state.mode, AppMode::Nav);
    }

    #[test]
    fn columns_picker_shows_extra_columns() {
        let mut harness = Harness::at("");
        harness.press(KeyCode::Char('c'));
        for _ in 0..6 {
            harness.press(KeyCode::Down);
        }
        harness.press(KeyCode::Char(' '));
        harness.press(KeyCode::Esc);

        assert_eq!(
            harness.state.location.href(),
            "/?columns=name%2Cstatus%2Cspecies%2Cgender%2Cepisodes"
        );
        assert!(harness.screen().contains("Episodes"));
    }

    #[test]
    fn enter_opens_drawer_and_escape_closes_it() {
        let mut harness = Harness::at("");
        harness.press(KeyCode::Enter);
        assert_eq!(harness.state.location.href(), "/?character=1");

        let (title, body) =
            drawer_text(&harness.state, &harness.view_data).expect("drawer should be open");
        assert_eq!(title, "Rick Sanchez");
        assert!(body.contains("appears in 5 episodes"));
        assert!(body.contains("last known location: Citadel of Ricks"));
        assert!(harness.screen().contains("appears in 5 episodes"));

        harness.press(KeyCode::Esc);
        assert_eq!(harness.state.location.href(), "/");
        assert!(drawer_text(&harness.state, &harness.view_data).is_none());
    }

    #[test]
    fn drawer_for_character_off_page_says_so() {
        let harness = Harness::at("character=9999");
        let (_, body) =
            drawer_text(&harness.state, &harness.view_data).expect("drawer should be open");
        assert!(body.contains("character not on this page"));
    }

    #[test]
    fn fetch_errors_render_a_retry_hint() {
        let runtime = TestRuntime {
            fail_with: Some("server returned 500".to_owned()),
            ..TestRuntime::default()
        };
        let mut harness = Harness::with_runtime("", runtime);

        assert_eq!(
            harness.view_data.fetch.error(),
            Some("server returned 500")
        );
        let screen = harness.screen();
        assert!(screen.contains("could not load characters"));
        assert!(screen.contains("press r to retry"));

        harness.runtime.fail_with = None;
        harness.press(KeyCode::Char('r'));
        assert_eq!(harness.runtime.fetched.len(), 2);
        assert!(harness.view_data.fetch.error().is_none());
        assert!(harness.view_data.fetch.data().is_some());
    }

    #[test]
    fn empty_results_say_no_characters_found() {
        let runtime = TestRuntime {
            empty: true,
            ..TestRuntime::default()
        };
        let harness = Harness::with_runtime("search=zzz", runtime);
        assert!(harness.screen().contains("no characters found"));
    }

    #[test]
    fn clear_cache_refetches_current_page() {
        let mut harness = Harness::at("page=2");
        harness.press_with(KeyCode::Char('l'), KeyModifiers::CONTROL);

        assert_eq!(harness.runtime.cache_clears, 1);
        assert_eq!(harness.runtime.fetched.len(), 2);
        assert_eq!(
            harness.state.status_line.as_deref(),
            Some("cache cleared (4 pages); refetching")
        );
    }

    #[test]
    fn reset_and_back_restore_locations() {
        let mut harness = Harness::at("search=rick&gender=Male&page=2");
        harness.press(KeyCode::Char('R'));
        assert_eq!(harness.state.location.href(), "/");
        assert_eq!(harness.view_data.search_input, "");
        assert_eq!(harness.state.status_line.as_deref(), Some("filters reset"));

        harness.press(KeyCode::Char('b'));
        assert_eq!(harness.state.location.state().search, "rick");
        assert_eq!(harness.view_data.search_input, "rick");
        assert_eq!(harness.state.location.state().page, 2);
    }

    #[test]
    fn empty_columns_render_default_headers() {
        let harness = Harness::at("columns=");
        let screen = harness.screen();
        for label in ["Name", "Status", "Species", "Gender"] {
            assert!(screen.contains(label), "missing header {label}");
        }
        assert!(!screen.contains("Origin"));
    }

    #[test]
    fn stale_status_clear_tokens_are_ignored() {
        let mut harness = Harness::at("");
        harness.press(KeyCode::Char('p'));
        harness.press(KeyCode::Char('p'));
        assert_eq!(harness.view_data.status_token, 2);

        harness
            .tx
            .send(InternalEvent::ClearStatus { token: 1 })
            .expect("send");
        harness.drain();
        assert!(harness.state.status_line.is_some());

        harness
            .tx
            .send(InternalEvent::ClearStatus { token: 2 })
            .expect("send");
        harness.drain();
        assert!(harness.state.status_line.is_none());
    }

    #[test]
    fn header_and_status_describe_location() {
        let mut harness = Harness::at("status=Dead&species=Alien");
        let header = header_text(&harness.state, &harness.view_data);
        assert!(header.contains("status: Dead"));
        assert!(header.contains("gender: any"));
        assert!(header.contains("species: Alien"));

        let status = status_text(&harness.state, &harness.view_data);
        assert!(status.starts_with("NAV"));
        assert!(status.contains("/?status=Dead&species=Alien"));

        harness.press(KeyCode::Char('?'));
        assert!(status_text(&harness.state, &harness.view_data).is_empty());
        harness.press(KeyCode::Esc);
        assert!(!harness.view_data.help_visible);
    }

    #[test]
    fn quit_keys_stop_the_loop() {
        let mut harness = Harness::at("");
        assert!(harness.press(KeyCode::Char('q')));
        assert!(harness.press_with(KeyCode::Char('q'), KeyModifiers::CONTROL));

        harness.press(KeyCode::Char('/'));
        assert!(!harness.press(KeyCode::Char('q')));
        assert_eq!(harness.view_data.search_input, "q");
    }
}
