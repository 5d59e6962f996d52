// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{FilterDimension, TableState};
use serde::Serialize;

/// The remote `FilterCharacter` input. The schema only takes scalar values,
/// so a dimension with several selections cannot be expressed here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct CharacterFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl CharacterFilter {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.status.is_none()
            && self.species.is_none()
            && self.gender.is_none()
            && self.kind.is_none()
    }
}

pub fn build_filter(state: &TableState) -> Option<CharacterFilter> {
    let single = |dimension: FilterDimension| match state.filter(dimension) {
        [only] => Some(only.clone()),
        _ => None,
    };

    let filter = CharacterFilter {
        name: (!state.search.is_empty()).then(|| state.search.clone()),
        status: single(FilterDimension::Status),
        species: single(FilterDimension::Species),
        gender: single(FilterDimension::Gender),
        kind: None,
    };

    (!filter.is_empty()).then_some(filter)
}

/// Variables of one `characters` query. Compared by value so a freshly built
/// filter with the same content never triggers another request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub page: u32,
    pub filter: Option<CharacterFilter>,
}

impl QueryKey {
    pub fn for_state(state: &TableState) -> Self {
        Self {
            page: state.page,
            filter: build_filter(state),
        }
    }
}
