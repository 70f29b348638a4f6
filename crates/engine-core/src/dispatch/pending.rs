use model::operation::Operation;
use serde::Serialize;
use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};
use tokio::time::Instant;

/// Lifecycle of one dispatched operation.
///
/// `Idle -> Sent -> { Succeeded | Retrying -> Sent | Failed }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DispatchState {
    Idle,
    Sent,
    Retrying,
    Succeeded,
    Failed,
}

impl DispatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DispatchState::Succeeded | DispatchState::Failed)
    }

    pub fn can_transition_to(&self, next: DispatchState) -> bool {
        use DispatchState::*;
        matches!(
            (self, next),
            (Idle, Sent) | (Sent, Succeeded) | (Sent, Retrying) | (Sent, Failed) | (Retrying, Sent)
        )
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DispatchState::Idle => "Idle",
            DispatchState::Sent => "Sent",
            DispatchState::Retrying => "Retrying",
            DispatchState::Succeeded => "Succeeded",
            DispatchState::Failed => "Failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PendingKey {
    pub operation: Operation,
    pub subject: String,
}

/// An in-flight remote call.
#[derive(Debug, Clone)]
pub struct PendingOperation {
    pub key: PendingKey,
    pub attempts: u32,
    pub state: DispatchState,
    /// Deadline of the attempt currently on the wire.
    pub deadline: Option<Instant>,
}

impl PendingOperation {
    fn new(key: PendingKey) -> Self {
        PendingOperation {
            key,
            attempts: 0,
            state: DispatchState::Idle,
            deadline: None,
        }
    }

    /// Applies a state change. Invalid transitions leave the state untouched
    /// and return `false`.
    pub fn transition(&mut self, next: DispatchState) -> bool {
        if !self.state.can_transition_to(next) {
            return false;
        }
        if next != DispatchState::Sent {
            self.deadline = None;
        }
        self.state = next;
        true
    }
}

/// Registry of operations that have been dispatched and not yet reached a
/// terminal state. At most one entry per (operation, subject).
#[derive(Debug, Clone, Default)]
pub struct PendingRegistry {
    inner: Arc<Mutex<HashMap<PendingKey, PendingOperation>>>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PendingKey, PendingOperation>> {
        // The map holds plain data; a poisoned lock still has a usable map.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers a new operation, or returns `None` if the key is taken.
    pub fn register(&self, key: PendingKey) -> Option<PendingGuard> {
        let mut map = self.lock();
        if map.contains_key(&key) {
            return None;
        }
        map.insert(key.clone(), PendingOperation::new(key.clone()));
        Some(PendingGuard {
            registry: self.clone(),
            key,
        })
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<PendingOperation> {
        self.lock().values().cloned().collect()
    }
}

/// Handle on one registered operation. Dropping it removes the entry, so an
/// abandoned dispatch never leaves a stale key behind.
pub struct PendingGuard {
    registry: PendingRegistry,
    key: PendingKey,
}

impl PendingGuard {
    fn update<R>(&self, f: impl FnOnce(&mut PendingOperation) -> R) -> Option<R> {
        self.registry.lock().get_mut(&self.key).map(f)
    }

    /// Moves to `Sent`, bumps the attempt counter and records the deadline.
    /// Returns the 1-based attempt number.
    pub fn send(&self, deadline: Instant) -> u32 {
        self.update(|op| {
            op.transition(DispatchState::Sent);
            op.attempts += 1;
            op.deadline = Some(deadline);
            op.attempts
        })
        .unwrap_or(0)
    }

    pub fn transition(&self, next: DispatchState) -> bool {
        self.update(|op| op.transition(next)).unwrap_or(false)
    }

    pub fn state(&self) -> Option<DispatchState> {
        self.update(|op| op.state)
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.key);
    }
}
