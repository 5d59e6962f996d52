// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use rickdex_app::{Character, CharacterPage, CharacterStatus, Gender, PageInfo};
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Page size of the public API.
pub const API_PAGE_SIZE: u32 = 20;

struct Seed {
    id: u32,
    name: &'static str,
    status: CharacterStatus,
    species: &'static str,
    kind: &'static str,
    gender: Gender,
    origin: &'static str,
    location: &'static str,
    episodes: &'static [u32],
}

const SEEDS: [Seed; 10] = [
    Seed {
        id: 1,
        name: "Rick Sanchez",
        status: CharacterStatus::Alive,
        species: "Human",
        kind: "",
        gender: Gender::Male,
        origin: "Earth (C-137)",
        location: "Citadel of Ricks",
        episodes: &[1, 2, 3, 4, 5],
    },
    Seed {
        id: 2,
        name: "Morty Smith",
        status: CharacterStatus::Alive,
        species: "Human",
        kind: "",
        gender: Gender::Male,
        origin: "unknown",
        location: "Citadel of Ricks",
        episodes: &[1, 2, 3],
    },
    Seed {
        id: 3,
        name: "Summer Smith",
        status: CharacterStatus::Alive,
        species: "Human",
        kind: "",
        gender: Gender::Female,
        origin: "Earth (Replacement Dimension)",
        location: "Earth (Replacement Dimension)",
        episodes: &[6, 7],
    },
    Seed {
        id: 6,
        name: "Abadango Cluster Princess",
        status: CharacterStatus::Alive,
        species: "Alien",
        kind: "",
        gender: Gender::Female,
        origin: "Abadango",
        location: "Abadango",
        episodes: &[27],
    },
    Seed {
        id: 8,
        name: "Adjudicator Rick",
        status: CharacterStatus::Dead,
        species: "Human",
        kind: "",
        gender: Gender::Male,
        origin: "unknown",
        location: "Citadel of Ricks",
        episodes: &[28],
    },
    Seed {
        id: 15,
        name: "Alien Rick",
        status: CharacterStatus::Unknown,
        species: "Alien",
        kind: "",
        gender: Gender::Male,
        origin: "unknown",
        location: "Earth (Replacement Dimension)",
        episodes: &[10],
    },
    Seed {
        id: 47,
        name: "Birdperson",
        status: CharacterStatus::Dead,
        species: "Alien",
        kind: "Bird-Person",
        gender: Gender::Male,
        origin: "Bird World",
        location: "Planet Squanch",
        episodes: &[11, 22, 26],
    },
    Seed {
        id: 244,
        name: "Mr. Poopybutthole",
        status: CharacterStatus::Alive,
        species: "Poopybutthole",
        kind: "",
        gender: Gender::Male,
        origin: "unknown",
        location: "Earth (Replacement Dimension)",
        episodes: &[19, 21, 25],
    },
    Seed {
        id: 331,
        name: "Prince Nebulon",
        status: CharacterStatus::Alive,
        species: "Alien",
        kind: "Zigerion",
        gender: Gender::Male,
        origin: "Zigerion's Base",
        location: "Zigerion's Base",
        episodes: &[4],
    },
    Seed {
        id: 380,
        name: "Robot",
        status: CharacterStatus::Unknown,
        species: "Robot",
        kind: "Butter-Robot",
        gender: Gender::Genderless,
        origin: "Earth (C-137)",
        location: "Earth (C-137)",
        episodes: &[9],
    },
];

pub fn sample_characters() -> Vec<Character> {
    SEEDS.iter().map(character_from_seed).collect()
}

pub fn sample_character(id: &str) -> Option<Character> {
    sample_characters()
        .into_iter()
        .find(|character| character.id == id)
}

pub fn sample_page(page: u32, pages: u32) -> CharacterPage {
    let results = sample_characters();
    CharacterPage {
        info: PageInfo {
            count: pages.saturating_mul(API_PAGE_SIZE),
            pages,
            next: (page < pages).then_some(page + 1),
            prev: (page > 1).then(|| page - 1),
        },
        results,
    }
}

/// A `characters` response body in the shape the GraphQL endpoint returns.
pub fn graphql_body(page: &CharacterPage) -> String {
    json!({
        "data": {
            "characters": {
                "info": {
                    "count": page.info.count,
                    "pages": page.info.pages,
                    "next": page.info.next,
                    "prev": page.info.prev,
                },
                "results": page.results.iter().map(character_json).collect::<Vec<Value>>(),
            }
        }
    })
    .to_string()
}

pub fn graphql_error_body(message: &str) -> String {
    json!({
        "errors": [{ "message": message }],
        "data": { "characters": null }
    })
    .to_string()
}

fn character_json(character: &Character) -> Value {
    json!({
        "id": character.id,
        "name": character.name,
        "status": character.status.as_str(),
        "species": character.species,
        "type": character.kind,
        "gender": character.gender.as_str(),
        "origin": { "name": character.origin },
        "location": { "name": character.location },
        "image": character.image,
        "episode": character
            .episode_ids
            .iter()
            .map(|id| json!({ "id": id, "name": format!("Episode {id}") }))
            .collect::<Vec<Value>>(),
        "created": character
            .created
            .and_then(|created| created.format(&Rfc3339).ok()),
    })
}

fn character_from_seed(seed: &Seed) -> Character {
    Character {
        id: seed.id.to_string(),
        name: seed.name.to_owned(),
        status: seed.status,
        species: seed.species.to_owned(),
        kind: seed.kind.to_owned(),
        gender: seed.gender,
        origin: seed.origin.to_owned(),
        location: seed.location.to_owned(),
        image: format!(
            "https://rickandmortyapi.com/api/character/avatar/{}.jpeg",
            seed.id
        ),
        episode_ids: seed.episodes.iter().map(u32::to_string).collect(),
        created: Some(fixed_created(seed.id)),
    }
}

fn fixed_created(id: u32) -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH + time::Duration::days(17_476 + i64::from(id))
}
