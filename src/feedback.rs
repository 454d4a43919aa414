//! Transient selection sessions shown while the user keeps scrolling.
//!
//! A session remembers the index that was active when it opened and a
//! running offset from it.  Steps only move the offset; nothing is
//! activated until the session is closed, at which point the caller
//! activates the final position once.

use crate::arbiter::IndexPolicy;
use crate::command::Action;
use log::{debug, warn};
use std::time::{Duration, Instant};

/// Identifies one session.  Ids are never reused, so a handle kept past
/// [`close`](FeedbackCoordinator::close) can never reach a newer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

/// A live feedback session.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackSession {
    pub id: SessionId,
    pub action: Action,
    /// Index active when the session opened.
    pub base_index: usize,
    /// Offset from `base_index`; `base_index + selected_index` is always a
    /// valid position in the collection as of the last step.
    pub selected_index: i64,
    /// When the session closes absent further input.
    pub expiry: Instant,
}

impl FeedbackSession {
    /// Absolute index currently selected.
    pub fn position(&self) -> usize {
        (self.base_index as i64 + self.selected_index).max(0) as usize
    }
}

/// Owns at most one session per [`Action`].
#[derive(Debug, Default)]
pub struct FeedbackCoordinator {
    next_id: u64,
    sessions: [Option<FeedbackSession>; 2],
}

impl FeedbackCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The open session for `action`, if any.
    pub fn session(&self, action: Action) -> Option<&FeedbackSession> {
        self.sessions[action.index()].as_ref()
    }

    /// Return the open session for `action`, or open one at `base_index`.
    ///
    /// Either way the expiry is pushed to `now + timeout`.
    pub fn begin_or_extend(
        &mut self,
        action: Action,
        base_index: usize,
        now: Instant,
        timeout: Duration,
    ) -> SessionId {
        let slot = &mut self.sessions[action.index()];
        if let Some(session) = slot {
            session.expiry = now + timeout;
            return session.id;
        }
        let id = SessionId(self.next_id);
        self.next_id += 1;
        debug!("{}: feedback session opened at index {}", action, base_index);
        *slot = Some(FeedbackSession {
            id,
            action,
            base_index,
            selected_index: 0,
            expiry: now + timeout,
        });
        id
    }

    fn find_mut(&mut self, id: SessionId) -> Option<&mut FeedbackSession> {
        self.sessions
            .iter_mut()
            .flatten()
            .find(|session| session.id == id)
    }

    /// Move the selection of session `id` by `distance`.
    ///
    /// The current position is first clamped into the collection (it may
    /// have shrunk since the last step), then moved under `policy`.
    /// Returns the new absolute position, or `None` if the session is no
    /// longer open or the collection is empty.
    pub fn record_step(
        &mut self,
        id: SessionId,
        distance: i32,
        collection_size: usize,
        policy: IndexPolicy,
        now: Instant,
        timeout: Duration,
    ) -> Option<usize> {
        let Some(session) = self.find_mut(id) else {
            warn!("step recorded on closed feedback session {:?}", id);
            return None;
        };
        session.expiry = now + timeout;
        if collection_size == 0 {
            warn!("{}: collection is empty, step ignored", session.action);
            return None;
        }
        let current = session.position().min(collection_size - 1);
        let target = policy.target(current, distance as i64, collection_size)?;
        session.selected_index = target as i64 - session.base_index as i64;
        debug!(
            "{}: feedback step {:+} -> index {} (offset {:+})",
            session.action, distance, target, session.selected_index
        );
        Some(target)
    }

    /// Push the expiry of session `id` to `now + timeout`.
    pub fn touch(&mut self, id: SessionId, now: Instant, timeout: Duration) -> bool {
        match self.find_mut(id) {
            Some(session) => {
                session.expiry = now + timeout;
                true
            }
            None => false,
        }
    }

    /// Close session `id` and return its final position.
    ///
    /// Closing an already-closed session is a no-op returning `None`.
    pub fn close(&mut self, id: SessionId) -> Option<usize> {
        let slot = self
            .sessions
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|s| s.id == id));
        match slot.and_then(Option::take) {
            Some(session) => {
                let position = session.position();
                debug!("{}: feedback session closed at index {}", session.action, position);
                Some(position)
            }
            None => {
                warn!("feedback session {:?} already closed", id);
                None
            }
        }
    }

    /// Drop the session of `action` without reporting a final position.
    pub fn discard(&mut self, action: Action) -> Option<SessionId> {
        let session = self.sessions[action.index()].take()?;
        debug!("{}: feedback session discarded", action);
        Some(session.id)
    }
}
