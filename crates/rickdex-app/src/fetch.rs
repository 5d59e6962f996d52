// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{CharacterPage, QueryKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub key: QueryKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    Stale,
}

/// Loading/error/data for the character query. Requests are tagged with a
/// generation; only the newest generation may change what is shown.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchTracker {
    generation: u64,
    current: Option<QueryKey>,
    loading: bool,
    error: Option<String>,
    data: Option<CharacterPage>,
}

impl FetchTracker {
    /// Starts a request unless `key` equals the key already requested.
    pub fn request(&mut self, key: QueryKey) -> Option<FetchRequest> {
        if self.current.as_ref() == Some(&key) {
            return None;
        }
        Some(self.start(key))
    }

    /// Re-issues the current key even though it has not changed.
    pub fn retry(&mut self) -> Option<FetchRequest> {
        let key = self.current.clone()?;
        Some(self.start(key))
    }

    fn start(&mut self, key: QueryKey) -> FetchRequest {
        self.generation = self.generation.wrapping_add(1);
        self.current = Some(key.clone());
        self.loading = true;
        self.error = None;
        FetchRequest {
            generation: self.generation,
            key,
        }
    }

    pub fn complete(
        &mut self,
        generation: u64,
        result: Result<CharacterPage, String>,
    ) -> FetchOutcome {
        if generation != self.generation {
            tracing::debug!(
                generation,
                latest = self.generation,
                "dropping stale fetch result"
            );
            return FetchOutcome::Stale;
        }

        self.loading = false;
        match result {
            Ok(page) => {
                self.error = None;
                self.data = Some(page);
            }
            Err(error) => {
                self.error = Some(error);
                self.data = None;
            }
        }
        FetchOutcome::Applied
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn data(&self) -> Option<&CharacterPage> {
        self.data.as_ref()
    }
}
