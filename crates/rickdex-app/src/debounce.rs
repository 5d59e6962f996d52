// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::{Duration, Instant};

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pending<T> {
    value: T,
    due: Instant,
}

/// Trailing-edge debounce driven by the caller's clock. Each call replaces
/// the pending value and pushes the deadline out; at most one value is ever
/// pending. Dropping the debouncer discards whatever is pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// A delay too large to represent as an `Instant` fires on the next poll.
    pub fn call(&mut self, value: T, now: Instant) {
        self.pending = Some(Pending {
            value,
            due: now.checked_add(self.delay).unwrap_or(now),
        });
    }

    /// Returns the pending value once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some(pending) if pending.due <= now => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.value)
    }

    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|pending| pending.due.saturating_duration_since(now))
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_DEBOUNCE)
    }
}
