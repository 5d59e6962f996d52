// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterStatus {
    Alive,
    Dead,
    Unknown,
}

impl CharacterStatus {
    pub const ALL: [Self; 3] = [Self::Alive, Self::Dead, Self::Unknown];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alive => "Alive",
            Self::Dead => "Dead",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Alive" => Some(Self::Alive),
            "Dead" => Some(Self::Dead),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
    Genderless,
    Unknown,
}

impl Gender {
    pub const ALL: [Self; 4] = [Self::Female, Self::Male, Self::Genderless, Self::Unknown];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Female => "Female",
            Self::Male => "Male",
            Self::Genderless => "Genderless",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Female" => Some(Self::Female),
            "Male" => Some(Self::Male),
            "Genderless" => Some(Self::Genderless),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// Species offered by the picker. The API accepts any species string, so
/// values outside this list are still valid in a location.
pub const SPECIES_OPTIONS: [&str; 10] = [
    "Human",
    "Alien",
    "Humanoid",
    "Robot",
    "Animal",
    "Mythological Creature",
    "Cronenberg",
    "Disease",
    "Poopybutthole",
    "unknown",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterDimension {
    Status,
    Gender,
    Species,
}

impl FilterDimension {
    pub const ALL: [Self; 3] = [Self::Status, Self::Gender, Self::Species];

    pub const fn param(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Gender => "gender",
            Self::Species => "species",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Status => "Status",
            Self::Gender => "Gender",
            Self::Species => "Species",
        }
    }

    pub fn options(self) -> Vec<&'static str> {
        match self {
            Self::Status => CharacterStatus::ALL.iter().map(|s| s.as_str()).collect(),
            Self::Gender => Gender::ALL.iter().map(|g| g.as_str()).collect(),
            Self::Species => SPECIES_OPTIONS.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnId {
    Name,
    Status,
    Species,
    Gender,
    Origin,
    Location,
    Episodes,
}

pub const DEFAULT_COLUMNS: [ColumnId; 4] = [
    ColumnId::Name,
    ColumnId::Status,
    ColumnId::Species,
    ColumnId::Gender,
];

impl ColumnId {
    pub const ALL: [Self; 7] = [
        Self::Name,
        Self::Status,
        Self::Species,
        Self::Gender,
        Self::Origin,
        Self::Location,
        Self::Episodes,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Status => "status",
            Self::Species => "species",
            Self::Gender => "gender",
            Self::Origin => "origin",
            Self::Location => "location",
            Self::Episodes => "episodes",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Status => "Status",
            Self::Species => "Species",
            Self::Gender => "Gender",
            Self::Origin => "Origin",
            Self::Location => "Location",
            Self::Episodes => "Episodes",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|column| column.as_str() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub status: CharacterStatus,
    pub species: String,
    pub kind: String,
    pub gender: Gender,
    pub origin: String,
    pub location: String,
    pub image: String,
    pub episode_ids: Vec<String>,
    pub created: Option<OffsetDateTime>,
}

impl Character {
    pub fn episode_count(&self) -> usize {
        self.episode_ids.len()
    }

    pub fn cell(&self, column: ColumnId) -> String {
        match column {
            ColumnId::Name => self.name.clone(),
            ColumnId::Status => self.status.as_str().to_owned(),
            ColumnId::Species => self.species.clone(),
            ColumnId::Gender => self.gender.as_str().to_owned(),
            ColumnId::Origin => self.origin.clone(),
            ColumnId::Location => self.location.clone(),
            ColumnId::Episodes => self.episode_count().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageInfo {
    pub count: u32,
    pub pages: u32,
    pub next: Option<u32>,
    pub prev: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CharacterPage {
    pub info: PageInfo,
    pub results: Vec<Character>,
}

impl CharacterPage {
    /// Total pages for pagination; the API reports zero for empty result
    /// sets but the pager always shows at least one page.
    pub fn total_pages(&self) -> u32 {
        self.info.pages.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::{CharacterPage, CharacterStatus, ColumnId, FilterDimension, Gender, PageInfo};

    #[test]
    fn status_and_gender_round_trip_wire_names() {
        for status in CharacterStatus::ALL {
            assert_eq!(CharacterStatus::parse(status.as_str()), Some(status));
        }
        for gender in Gender::ALL {
            assert_eq!(Gender::parse(gender.as_str()), Some(gender));
        }
        assert_eq!(CharacterStatus::parse("alive"), None);
        assert_eq!(Gender::parse("Unknown"), None);
    }

    #[test]
    fn column_ids_parse_from_params() {
        assert_eq!(ColumnId::parse("episodes"), Some(ColumnId::Episodes));
        assert_eq!(ColumnId::parse("character"), None);
    }

    #[test]
    fn filter_options_use_wire_values() {
        assert_eq!(
            FilterDimension::Status.options(),
            vec!["Alive", "Dead", "unknown"]
        );
        assert!(FilterDimension::Species.options().contains(&"Human"));
    }

    #[test]
    fn total_pages_never_drops_below_one() {
        let page = CharacterPage {
            info: PageInfo::default(),
            results: Vec::new(),
        };
        assert_eq!(page.total_pages(), 1);
    }
}
