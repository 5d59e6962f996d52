// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{ColumnId, FilterDimension, Location, Navigation, TableUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerKind {
    Filter(FilterDimension),
    Columns,
}

impl PickerKind {
    pub const fn title(self) -> &'static str {
        match self {
            Self::Filter(dimension) => dimension.label(),
            Self::Columns => "Columns",
        }
    }

    pub fn options(self) -> Vec<&'static str> {
        match self {
            Self::Filter(dimension) => dimension.options(),
            Self::Columns => ColumnId::ALL.iter().map(|column| column.as_str()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Nav,
    Search,
    Picker(PickerKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub location: Location,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_location(Location::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    SetPage(u32),
    SetSearch(String),
    SetFilter(FilterDimension, Vec<String>),
    ToggleFilterValue(FilterDimension, String),
    SetColumns(Vec<ColumnId>),
    ToggleColumn(ColumnId),
    SelectCharacter(String),
    CloseDetail,
    ResetFilters,
    Back,
    EnterSearch,
    OpenPicker(PickerKind),
    ExitToNav,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    LocationChanged(String),
    ModeChanged(AppMode),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn with_location(location: Location) -> Self {
        Self {
            mode: AppMode::Nav,
            location,
            status_line: None,
        }
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::SetPage(page) => self.navigate(TableUpdate::page(page)),
            AppCommand::SetSearch(search) => self.navigate(TableUpdate::search(search)),
            AppCommand::SetFilter(dimension, values) => {
                self.navigate(TableUpdate::filter(dimension, values))
            }
            AppCommand::ToggleFilterValue(dimension, value) => {
                let mut values = self.location.state().filter(dimension).to_vec();
                match values.iter().position(|selected| *selected == value) {
                    Some(index) => {
                        values.remove(index);
                    }
                    None => values.push(value),
                }
                self.navigate(TableUpdate::filter(dimension, values))
            }
            AppCommand::SetColumns(columns) => self.navigate(TableUpdate::columns(columns)),
            AppCommand::ToggleColumn(column) => self.toggle_column(column),
            AppCommand::SelectCharacter(id) => {
                self.navigate(TableUpdate::selected_character(id))
            }
            AppCommand::CloseDetail => {
                self.navigate(TableUpdate::selected_character(String::new()))
            }
            AppCommand::ResetFilters => {
                let mut events = self.navigate(TableUpdate::reset_filters());
                events.push(self.set_status("filters reset"));
                events
            }
            AppCommand::Back => {
                let mut events = navigation_events(self.location.back());
                if events.is_empty() {
                    events.push(self.set_status("no earlier location"));
                }
                events
            }
            AppCommand::EnterSearch => self.set_mode(AppMode::Search),
            AppCommand::OpenPicker(kind) => self.set_mode(AppMode::Picker(kind)),
            AppCommand::ExitToNav => self.set_mode(AppMode::Nav),
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn toggle_column(&mut self, column: ColumnId) -> Vec<AppEvent> {
        let visible = self.location.state().visible_columns();
        let columns: Vec<ColumnId> = if visible.contains(&column) {
            visible.iter().copied().filter(|c| *c != column).collect()
        } else {
            ColumnId::ALL
                .into_iter()
                .filter(|c| *c == column || visible.contains(c))
                .collect()
        };

        let emptied = columns.is_empty();
        let mut events = self.navigate(TableUpdate::columns(columns));
        if emptied {
            events.push(self.set_status("columns reset to default"));
        }
        events
    }

    fn navigate(&mut self, update: TableUpdate) -> Vec<AppEvent> {
        navigation_events(self.location.update(update))
    }

    fn set_mode(&mut self, mode: AppMode) -> Vec<AppEvent> {
        self.mode = mode;
        vec![AppEvent::ModeChanged(mode)]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}

fn navigation_events(navigation: Navigation) -> Vec<AppEvent> {
    match navigation {
        Navigation::Navigated(href) => vec![AppEvent::LocationChanged(href)],
        Navigation::Unchanged => Vec::new(),
    }
}
