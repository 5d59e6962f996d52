// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod cache;

pub use cache::{CharacterSource, ResponseCache};

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use rickdex_app::{
    Character, CharacterFilter, CharacterPage, CharacterStatus, Gender, PageInfo, QueryKey,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://rickandmortyapi.com/graphql";

pub const CHARACTERS_QUERY: &str = "query GetCharactersTable($page: Int, $filter: FilterCharacter) {
  characters(page: $page, filter: $filter) {
    info { count pages next prev }
    results {
      id name status species type gender
      origin { name }
      location { name }
      image
      episode { id name }
      created
    }
  }
}";

const UNKNOWN_NAME: &str = "Unknown";

#[derive(Debug, Clone)]
pub struct Client {
    endpoint: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            bail!("api.url must not be empty");
        }
        let parsed = Url::parse(endpoint).with_context(|| {
            format!("invalid api.url {endpoint:?}; expected an absolute http(s) URL")
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "api.url {endpoint:?} uses scheme {:?}; only http and https are supported",
                parsed.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            endpoint: endpoint.to_owned(),
            timeout,
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn fetch_characters(&self, key: &QueryKey) -> Result<CharacterPage> {
        let request = GraphqlRequest {
            query: CHARACTERS_QUERY,
            variables: Variables {
                page: key.page,
                filter: key.filter.as_ref(),
            },
        };
        tracing::debug!(page = key.page, filter = ?key.filter, "fetch characters");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|error| connection_error(&self.endpoint, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let envelope: GraphqlResponse = response.json().context("decode characters response")?;
        envelope.into_page()
    }
}

fn connection_error(endpoint: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- check your network or set [api].url ({})",
        endpoint,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<GraphqlResponse>(body)
        && let Some(errors) = parsed.errors
        && !errors.is_empty()
    {
        return anyhow!(
            "server error ({}): {}",
            status.as_u16(),
            join_messages(&errors)
        );
    }

    if body.len() < 100 && !body.contains('{') && !body.trim().is_empty() {
        return anyhow!("server error ({}): {}", status.as_u16(), body.trim());
    }

    anyhow!("server returned {}", status.as_u16())
}

fn join_messages(errors: &[GraphqlError]) -> String {
    errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// The public API answers an empty result set with a "404" GraphQL error
/// instead of an empty list.
fn is_not_found(error: &GraphqlError) -> bool {
    error.message.contains("404") || error.message.eq_ignore_ascii_case("There is nothing here")
}

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Variables<'a>,
}

#[derive(Debug, Serialize)]
struct Variables<'a> {
    page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a CharacterFilter>,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<ResponseData>,
    errors: Option<Vec<GraphqlError>>,
}

impl GraphqlResponse {
    fn into_page(self) -> Result<CharacterPage> {
        let errors = self.errors.unwrap_or_default();
        match self.data.and_then(|data| data.characters) {
            Some(characters) => {
                if let Some(first) = errors.first() {
                    tracing::warn!(error = %first.message, "GraphQL returned data with errors");
                }
                Ok(characters.into_page())
            }
            None if errors.iter().any(is_not_found) => Ok(CharacterPage::default()),
            None if errors.is_empty() => bail!("GraphQL response has no characters field"),
            None => bail!("GraphQL error: {}", join_messages(&errors)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    characters: Option<WireCharacters>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct WireCharacters {
    info: Option<WireInfo>,
    results: Option<Vec<Option<WireCharacter>>>,
}

impl WireCharacters {
    fn into_page(self) -> CharacterPage {
        let info = self.info.map_or_else(PageInfo::default, |info| PageInfo {
            count: info.count.unwrap_or(0),
            pages: info.pages.unwrap_or(0),
            next: info.next,
            prev: info.prev,
        });
        let results = self
            .results
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .map(WireCharacter::into_character)
            .collect();
        CharacterPage { info, results }
    }
}

#[derive(Debug, Deserialize)]
struct WireInfo {
    count: Option<u32>,
    pages: Option<u32>,
    next: Option<u32>,
    prev: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WireCharacter {
    id: Option<String>,
    name: Option<String>,
    status: Option<String>,
    species: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    gender: Option<String>,
    origin: Option<WireNamed>,
    location: Option<WireNamed>,
    image: Option<String>,
    episode: Option<Vec<Option<WireEpisode>>>,
    created: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireNamed {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireEpisode {
    id: Option<String>,
}

impl WireCharacter {
    fn into_character(self) -> Character {
        Character {
            id: self.id.unwrap_or_default(),
            name: non_empty_or_unknown(self.name),
            status: self
                .status
                .as_deref()
                .and_then(CharacterStatus::parse)
                .unwrap_or(CharacterStatus::Unknown),
            species: self.species.unwrap_or_default(),
            kind: self.kind.unwrap_or_default(),
            gender: self
                .gender
                .as_deref()
                .and_then(Gender::parse)
                .unwrap_or(Gender::Unknown),
            origin: non_empty_or_unknown(self.origin.and_then(|origin| origin.name)),
            location: non_empty_or_unknown(self.location.and_then(|location| location.name)),
            image: self.image.unwrap_or_default(),
            episode_ids: self
                .episode
                .unwrap_or_default()
                .into_iter()
                .flatten()
                .map(|episode| episode.id.unwrap_or_default())
                .collect(),
            created: self.created.as_deref().and_then(parse_created),
        }
    }
}

fn non_empty_or_unknown(value: Option<String>) -> String {
    value
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| UNKNOWN_NAME.to_owned())
}

fn parse_created(raw: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339).ok()
}
