// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{ColumnId, DEFAULT_COLUMNS, FilterDimension};
use std::collections::VecDeque;
use url::form_urlencoded;

pub const DEFAULT_PAGE: u32 = 1;
/// Oldest entries are dropped once back history reaches this length.
pub const MAX_HISTORY: usize = 256;

const PAGE_PARAM: &str = "page";
const SEARCH_PARAM: &str = "search";
const COLUMNS_PARAM: &str = "columns";
const CHARACTER_PARAM: &str = "character";
const KNOWN_PARAMS: [&str; 7] = [
    PAGE_PARAM,
    SEARCH_PARAM,
    "status",
    "gender",
    "species",
    COLUMNS_PARAM,
    CHARACTER_PARAM,
];

/// Every user-adjustable view parameter. Reconstructed from the location on
/// each navigation; never persisted anywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    pub page: u32,
    pub search: String,
    pub status: Vec<String>,
    pub gender: Vec<String>,
    pub species: Vec<String>,
    pub columns: Vec<ColumnId>,
    pub selected_character: String,
}

impl Default for TableState {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            search: String::new(),
            status: Vec::new(),
            gender: Vec::new(),
            species: Vec::new(),
            columns: DEFAULT_COLUMNS.to_vec(),
            selected_character: String::new(),
        }
    }
}

impl TableState {
    pub fn from_query(query: &str) -> Self {
        Self::from_pairs(&parse_pairs(query))
    }

    pub fn to_query(&self) -> String {
        encode(self, &[])
    }

    pub fn filter(&self, dimension: FilterDimension) -> &[String] {
        match dimension {
            FilterDimension::Status => &self.status,
            FilterDimension::Gender => &self.gender,
            FilterDimension::Species => &self.species,
        }
    }

    fn filter_mut(&mut self, dimension: FilterDimension) -> &mut Vec<String> {
        match dimension {
            FilterDimension::Status => &mut self.status,
            FilterDimension::Gender => &mut self.gender,
            FilterDimension::Species => &mut self.species,
        }
    }

    pub fn visible_columns(&self) -> &[ColumnId] {
        if self.columns.is_empty() {
            &DEFAULT_COLUMNS
        } else {
            &self.columns
        }
    }

    pub fn is_detail_open(&self) -> bool {
        !self.selected_character.is_empty()
    }

    pub fn has_criteria(&self) -> bool {
        !self.search.is_empty()
            || FilterDimension::ALL
                .iter()
                .any(|dimension| !self.filter(*dimension).is_empty())
    }

    /// Applies a partial update. A change to search or any filter sends the
    /// view back to the first page unless the update names a page itself.
    pub fn merged(&self, update: TableUpdate) -> Self {
        let mut next = self.clone();
        let mut criteria_changed = false;

        if let Some(search) = update.search {
            criteria_changed |= search != next.search;
            next.search = search;
        }

        for (dimension, values) in [
            (FilterDimension::Status, update.status),
            (FilterDimension::Gender, update.gender),
            (FilterDimension::Species, update.species),
        ] {
            let Some(values) = values else {
                continue;
            };
            // Commas separate list entries in the query string.
            let values = dedup_values(
                values
                    .into_iter()
                    .map(|value| value.replace(',', ""))
                    .collect(),
            );
            criteria_changed |= values.as_slice() != next.filter(dimension);
            *next.filter_mut(dimension) = values;
        }

        if let Some(columns) = update.columns {
            next.columns = normalize_columns(columns);
        }

        if let Some(character) = update.selected_character {
            next.selected_character = character;
        }

        match update.page {
            Some(page) => next.page = page.max(DEFAULT_PAGE),
            None if criteria_changed => next.page = DEFAULT_PAGE,
            None => {}
        }

        next
    }

    fn from_pairs(pairs: &[(String, String)]) -> Self {
        let first = |key: &str| first_value(pairs, key);

        Self {
            page: first(PAGE_PARAM).map_or(DEFAULT_PAGE, parse_page),
            search: first(SEARCH_PARAM).unwrap_or_default().to_owned(),
            status: first("status").map(split_list).unwrap_or_default(),
            gender: first("gender").map(split_list).unwrap_or_default(),
            species: first("species").map(split_list).unwrap_or_default(),
            columns: normalize_columns(
                first(COLUMNS_PARAM)
                    .map(split_list)
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|id| ColumnId::parse(id))
                    .collect(),
            ),
            selected_character: first(CHARACTER_PARAM).unwrap_or_default().to_owned(),
        }
    }
}

/// A partial [`TableState`]; `None` leaves the field as it is. Commas are
/// stripped from filter values when merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableUpdate {
    pub page: Option<u32>,
    pub search: Option<String>,
    pub status: Option<Vec<String>>,
    pub gender: Option<Vec<String>>,
    pub species: Option<Vec<String>>,
    pub columns: Option<Vec<ColumnId>>,
    pub selected_character: Option<String>,
}

impl TableUpdate {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    pub fn search(search: impl Into<String>) -> Self {
        Self {
            search: Some(search.into()),
            ..Self::default()
        }
    }

    pub fn filter(dimension: FilterDimension, values: Vec<String>) -> Self {
        let mut update = Self::default();
        match dimension {
            FilterDimension::Status => update.status = Some(values),
            FilterDimension::Gender => update.gender = Some(values),
            FilterDimension::Species => update.species = Some(values),
        }
        update
    }

    pub fn columns(columns: Vec<ColumnId>) -> Self {
        Self {
            columns: Some(columns),
            ..Self::default()
        }
    }

    pub fn selected_character(id: impl Into<String>) -> Self {
        Self {
            selected_character: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn reset_filters() -> Self {
        Self {
            page: Some(DEFAULT_PAGE),
            search: Some(String::new()),
            status: Some(Vec::new()),
            gender: Some(Vec::new()),
            species: Some(Vec::new()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Navigated(String),
    Unchanged,
}

/// The address bar: the single owner of [`TableState`]. All writes go
/// through [`Location::update`] (or [`Location::back`]), which re-encodes the
/// query string and derives the state from it again.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    state: TableState,
    extra: Vec<(String, String)>,
    query: String,
    history: VecDeque<String>,
}

impl Location {
    pub fn parse(raw: &str) -> Self {
        let (state, extra) = split_pairs(parse_pairs(raw));
        let query = encode(&state, &extra);
        Self {
            state,
            extra,
            query,
            history: VecDeque::new(),
        }
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn href(&self) -> String {
        if self.query.is_empty() {
            "/".to_owned()
        } else {
            format!("/?{}", self.query)
        }
    }

    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn update(&mut self, update: TableUpdate) -> Navigation {
        let next = self.state.merged(update);
        let query = encode(&next, &self.extra);
        if query == self.query {
            return Navigation::Unchanged;
        }

        let previous = std::mem::replace(&mut self.query, query);
        if self.history.len() == MAX_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(previous);
        self.state = TableState::from_query(&self.query);
        tracing::debug!(location = %self.href(), "navigate");
        Navigation::Navigated(self.href())
    }

    pub fn back(&mut self) -> Navigation {
        let Some(previous) = self.history.pop_back() else {
            return Navigation::Unchanged;
        };

        let (state, extra) = split_pairs(parse_pairs(&previous));
        self.state = state;
        self.extra = extra;
        self.query = previous;
        tracing::debug!(location = %self.href(), "navigate back");
        Navigation::Navigated(self.href())
    }

    pub fn set_page(&mut self, page: u32) -> Navigation {
        self.update(TableUpdate::page(page))
    }

    pub fn set_search(&mut self, search: impl Into<String>) -> Navigation {
        self.update(TableUpdate::search(search))
    }

    pub fn set_filter(&mut self, dimension: FilterDimension, values: Vec<String>) -> Navigation {
        self.update(TableUpdate::filter(dimension, values))
    }

    pub fn set_status_filter(&mut self, values: Vec<String>) -> Navigation {
        self.set_filter(FilterDimension::Status, values)
    }

    pub fn set_gender_filter(&mut self, values: Vec<String>) -> Navigation {
        self.set_filter(FilterDimension::Gender, values)
    }

    pub fn set_species_filter(&mut self, values: Vec<String>) -> Navigation {
        self.set_filter(FilterDimension::Species, values)
    }

    pub fn set_visible_columns(&mut self, columns: Vec<ColumnId>) -> Navigation {
        self.update(TableUpdate::columns(columns))
    }

    pub fn set_selected_character(&mut self, id: impl Into<String>) -> Navigation {
        self.update(TableUpdate::selected_character(id))
    }

    pub fn reset_filters(&mut self) -> Navigation {
        self.update(TableUpdate::reset_filters())
    }
}

pub fn parse_page(raw: &str) -> u32 {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|page| *page >= DEFAULT_PAGE)
        .unwrap_or(DEFAULT_PAGE)
}

fn parse_pairs(raw: &str) -> Vec<(String, String)> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);
    let trimmed = trimmed.strip_prefix('?').unwrap_or(trimmed);
    form_urlencoded::parse(trimmed.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

fn first_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

fn split_pairs(pairs: Vec<(String, String)>) -> (TableState, Vec<(String, String)>) {
    let state = TableState::from_pairs(&pairs);
    let mut extra: Vec<(String, String)> = Vec::new();
    for (key, value) in pairs {
        if KNOWN_PARAMS.contains(&key.as_str()) || extra.iter().any(|(name, _)| *name == key) {
            continue;
        }
        extra.push((key, value));
    }
    (state, extra)
}

fn split_list(raw: &str) -> Vec<String> {
    dedup_values(raw.split(',').map(str::to_owned).collect())
}

fn dedup_values(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !value.is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

fn normalize_columns(columns: Vec<ColumnId>) -> Vec<ColumnId> {
    let mut out: Vec<ColumnId> = Vec::with_capacity(columns.len());
    for column in columns {
        if !out.contains(&column) {
            out.push(column);
        }
    }
    if out.is_empty() {
        DEFAULT_COLUMNS.to_vec()
    } else {
        out
    }
}

fn encode(state: &TableState, extra: &[(String, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if state.page > DEFAULT_PAGE {
        serializer.append_pair(PAGE_PARAM, &state.page.to_string());
    }
    if !state.search.is_empty() {
        serializer.append_pair(SEARCH_PARAM, &state.search);
    }
    for dimension in FilterDimension::ALL {
        let values = state.filter(dimension);
        if !values.is_empty() {
            serializer.append_pair(dimension.param(), &values.join(","));
        }
    }
    let columns = state.visible_columns();
    if columns != DEFAULT_COLUMNS {
        let joined = columns
            .iter()
            .map(|column| column.as_str())
            .collect::<Vec<_>>()
            .join(",");
        serializer.append_pair(COLUMNS_PARAM, &joined);
    }
    if !state.selected_character.is_empty() {
        serializer.append_pair(CHARACTER_PARAM, &state.selected_character);
    }
    for (key, value) in extra {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}
