// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::Client;
use anyhow::Result;
use rickdex_app::{CharacterPage, QueryKey};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Pages {
    epoch: u64,
    entries: HashMap<QueryKey, CharacterPage>,
}

/// Successful pages keyed by `(page, filter)`. Clones share storage so a
/// worker thread can fill the cache the UI thread reads.
///
/// Every [`ResponseCache::clear`] starts a new epoch. A fetch that began
/// before the clear cannot write its page back into the emptied cache.
#[derive(Debug, Clone, Default)]
pub struct ResponseCache {
    pages: Arc<Mutex<Pages>>,
}

impl ResponseCache {
    pub fn get(&self, key: &QueryKey) -> Option<CharacterPage> {
        self.lock().entries.get(key).cloned()
    }

    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    pub fn insert(&self, key: QueryKey, page: CharacterPage) {
        self.lock().entries.insert(key, page);
    }

    /// Stores `page` only if no clear happened since `epoch` was read.
    pub fn insert_if_current(&self, epoch: u64, key: QueryKey, page: CharacterPage) -> bool {
        let mut pages = self.lock();
        if pages.epoch != epoch {
            return false;
        }
        pages.entries.insert(key, page);
        true
    }

    pub fn clear(&self) -> usize {
        let mut pages = self.lock();
        let removed = pages.entries.len();
        pages.entries.clear();
        pages.epoch = pages.epoch.wrapping_add(1);
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Pages> {
        match self.pages.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Cache-first access to the characters query.
#[derive(Debug, Clone)]
pub struct CharacterSource {
    client: Client,
    cache: ResponseCache,
}

impl CharacterSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            cache: ResponseCache::default(),
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn fetch(&self, key: &QueryKey) -> Result<CharacterPage> {
        if let Some(page) = self.cache.get(key) {
            tracing::debug!(page = key.page, "characters cache hit");
            return Ok(page);
        }

        let epoch = self.cache.epoch();
        let page = self.client.fetch_characters(key)?;
        if !self.cache.insert_if_current(epoch, key.clone(), page.clone()) {
            tracing::debug!(page = key.page, "cache cleared during fetch; result not cached");
        }
        Ok(page)
    }

    pub fn clear_cache(&self) -> usize {
        let removed = self.cache.clear();
        tracing::debug!(removed, "characters cache cleared");
        removed
    }
}
