// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Character, FilterDimension, TableState};

/// True when some dimension has more than one selection, which the remote
/// filter cannot express and therefore has to be applied locally.
pub fn needs_client_filter(state: &TableState) -> bool {
    FilterDimension::ALL
        .iter()
        .any(|dimension| state.filter(*dimension).len() > 1)
}

/// Narrows one fetched page. Selections within a dimension are OR'd,
/// dimensions are AND'd, an empty selection places no constraint. Only the
/// current page is narrowed, so page totals still describe the unfiltered
/// server result.
pub fn apply_client_filter(state: &TableState, characters: Vec<Character>) -> Vec<Character> {
    if !needs_client_filter(state) {
        return characters;
    }

    characters
        .into_iter()
        .filter(|character| matches_selection(state, character))
        .collect()
}

pub fn matches_selection(state: &TableState, character: &Character) -> bool {
    FilterDimension::ALL.iter().all(|dimension| {
        let selected = state.filter(*dimension);
        if selected.is_empty() {
            return true;
        }
        let value = match dimension {
            FilterDimension::Status => character.status.as_str(),
            FilterDimension::Gender => character.gender.as_str(),
            FilterDimension::Species => character.species.as_str(),
        };
        selected.iter().any(|candidate| candidate == value)
    })
}
