// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-caller cancellation scopes.
//!
//! A caller owns at most one in-flight single run. Beginning a new run
//! cancels the previous one; the superseded call is abandoned, not deleted,
//! and its failed row is still persisted. Callers are keyed by the identity
//! the identity service resolved, never by unverified claims.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug)]
struct Slot {
    generation: u64,
    token: CancellationToken,
}

/// Cancellation scopes keyed by caller identity.
///
/// Entries live only while their run is in flight.
#[derive(Debug, Default)]
pub struct CancelRegistry {
    scopes: DashMap<String, Slot>,
    next_generation: AtomicU64,
}

/// Handle for one in-flight run. Dropping it releases the caller's slot
/// unless a newer run has taken it over.
#[derive(Debug)]
pub struct ScopeTicket<'a> {
    registry: &'a CancelRegistry,
    key: String,
    generation: u64,
    token: CancellationToken,
}

impl ScopeTicket<'_> {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for ScopeTicket<'_> {
    fn drop(&mut self) {
        self.registry
            .scopes
            .remove_if(&self.key, |_, slot| slot.generation == self.generation);
    }
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel `key`'s in-flight run, if any, and register a new one.
    pub fn begin(&self, key: &str) -> ScopeTicket<'_> {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let slot = Slot {
            generation,
            token: token.clone(),
        };
        if let Some(previous) = self.scopes.insert(key.to_string(), slot) {
            if !previous.token.is_cancelled() {
                debug!(caller = key, "cancelling superseded run");
                previous.token.cancel();
            }
        }
        ScopeTicket {
            registry: self,
            key: key.to_string(),
            generation,
            token,
        }
    }

    /// Cancel every in-flight run.
    pub fn cancel_all(&self) {
        for slot in self.scopes.iter() {
            slot.value().token.cancel();
        }
    }

    /// Number of callers with a run in flight.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_cancels_previous_run() {
        let registry = CancelRegistry::new();
        let first = registry.begin("alice");
        assert!(!first.token().is_cancelled());
        let second = registry.begin("alice");
        assert!(first.token().is_cancelled());
        assert!(!second.token().is_cancelled());
    }

    #[test]
    fn separate_callers_do_not_interfere() {
        let registry = CancelRegistry::new();
        let alice = registry.begin("alice");
        let bob = registry.begin("bob");
        let _alice_again = registry.begin("alice");
        assert!(alice.token().is_cancelled());
        assert!(!bob.token().is_cancelled());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn finished_runs_release_their_slot() {
        let registry = CancelRegistry::new();
        {
            let _a = registry.begin("a");
            let _b = registry.begin("b");
            assert_eq!(registry.len(), 2);
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn superseded_ticket_does_not_release_newer_run() {
        let registry = CancelRegistry::new();
        let first = registry.begin("alice");
        let second = registry.begin("alice");
        drop(first);
        assert_eq!(registry.len(), 1);

        registry.cancel_all();
        assert!(second.token().is_cancelled());
        drop(second);
        assert!(registry.is_empty());
    }

    #[test]
    fn cancel_all_reaches_every_caller() {
        let registry = CancelRegistry::new();
        let a = registry.begin("a");
        let b = registry.begin("b");
        registry.cancel_all();
        assert!(a.token().is_cancelled() && b.token().is_cancelled());
    }
}
