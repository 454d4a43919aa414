//! Debounce and target-index state machine for one switch action.
//!
//! ```text
//!            distance != 0                      timer fires
//!   Idle ─────────────────────▶ Debouncing ─────────────────▶ Idle
//!                                 │    ▲
//!                                 └────┘ distance == 0, or a step merged
//!                                        into the open feedback session:
//!                                        timer re-armed
//! ```
//!
//! Without visual feedback the first nonzero distance activates its target
//! immediately and everything after it is absorbed until the timer fires.
//! With visual feedback the first distance opens a
//! [`FeedbackSession`](crate::feedback::FeedbackSession) and later ones are
//! merged into it; the target is activated once, when the timer closes the
//! session.

use crate::command::Action;
use crate::feedback::{FeedbackCoordinator, SessionId};
use crate::timer::{TimerId, Timers};
use log::{debug, error, info};
use std::time::{Duration, Instant};

/// How a target index is derived when the move would leave the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexPolicy {
    /// Wrap around at both ends.
    Cycle,
    /// Stop at the first and last item.
    Clamp,
}

impl IndexPolicy {
    pub fn from_cycle(cycle: bool) -> Self {
        if cycle {
            IndexPolicy::Cycle
        } else {
            IndexPolicy::Clamp
        }
    }

    /// Index reached by moving `distance` steps from `current` in a
    /// collection of `size` items.  `None` for an empty collection.
    pub fn target(self, current: usize, distance: i64, size: usize) -> Option<usize> {
        if size == 0 {
            return None;
        }
        let size = size as i64;
        let moved = (current as i64).saturating_add(distance);
        let index = match self {
            IndexPolicy::Cycle => moved.rem_euclid(size),
            IndexPolicy::Clamp => moved.clamp(0, size - 1),
        };
        Some(index as usize)
    }
}

/// The hot-reloadable settings of one action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionSettings {
    pub cycle: bool,
    pub visualize: bool,
    pub timeout: Duration,
}

impl ActionSettings {
    pub fn policy(&self) -> IndexPolicy {
        IndexPolicy::from_cycle(self.cycle)
    }
}

/// Size of the switchable collection and the index of its current item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSnapshot {
    pub size: usize,
    pub current: usize,
}

impl CollectionSnapshot {
    pub fn new(size: usize, current: usize) -> Self {
        Self { size, current }
    }
}

/// What the arbiter decided for one distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchDecision {
    /// Activate this index now.
    Activate(usize),
    /// A feedback session now selects this index; activation is deferred.
    Preview {
        session: SessionId,
        base: usize,
        selected: usize,
        size: usize,
    },
    /// Input arrived while debouncing and was swallowed.
    Absorbed,
    /// Nothing to do (zero distance while idle, nothing to switch to, or
    /// already at a clamped bound).
    NoSwitch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArbiterState {
    Idle,
    Debouncing { timer: TimerId },
}

/// Result of tearing down an arbiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Teardown {
    pub timer_cancelled: bool,
    pub session_discarded: bool,
}

/// Debounce state machine for one [`Action`].
#[derive(Debug)]
pub struct SwitchArbiter {
    action: Action,
    state: ArbiterState,
}

impl SwitchArbiter {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            state: ArbiterState::Idle,
        }
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn is_debouncing(&self) -> bool {
        matches!(self.state, ArbiterState::Debouncing { .. })
    }

    /// (Re-)arm the debounce timer to fire `timeout` after `now`.
    fn arm(&mut self, timers: &mut Timers<Action>, now: Instant, timeout: Duration) {
        if let ArbiterState::Debouncing { timer } = self.state {
            timers.cancel(timer);
        }
        let timer = timers.schedule_in(self.action, now, timeout);
        self.state = ArbiterState::Debouncing { timer };
    }

    /// Decide what `distance` does.
    ///
    /// `snapshot` is only called when the decision depends on the
    /// collection; returning `None` means the collection could not be read
    /// and is treated as "no switch".
    pub fn on_distance<F>(
        &mut self,
        distance: i32,
        settings: &ActionSettings,
        snapshot: F,
        now: Instant,
        timers: &mut Timers<Action>,
        feedback: &mut FeedbackCoordinator,
    ) -> SwitchDecision
    where
        F: FnOnce() -> Option<CollectionSnapshot>,
    {
        let action = self.action;
        match self.state {
            ArbiterState::Idle => {
                if distance == 0 {
                    return SwitchDecision::NoSwitch;
                }
                let Some(snap) = snapshot() else {
                    return SwitchDecision::NoSwitch;
                };
                if snap.size == 0 {
                    error!("{}: nothing to switch between (empty collection)", action);
                    return SwitchDecision::NoSwitch;
                }
                if snap.size == 1 {
                    debug!("{}: single item, nothing to switch to", action);
                    return SwitchDecision::NoSwitch;
                }
                let current = snap.current.min(snap.size - 1);
                self.arm(timers, now, settings.timeout);

                if settings.visualize {
                    let session = feedback.begin_or_extend(action, current, now, settings.timeout);
                    return self.preview(session, distance, settings, snap.size, now, feedback);
                }

                match settings.policy().target(current, distance as i64, snap.size) {
                    Some(target) if target != current => {
                        info!("{}: switch {} -> {} ({:+})", action, current, target, distance);
                        SwitchDecision::Activate(target)
                    }
                    _ => {
                        debug!("{}: already at bound {}", action, current);
                        SwitchDecision::NoSwitch
                    }
                }
            }

            ArbiterState::Debouncing { .. } => {
                let session = feedback.session(action).map(|s| s.id);
                if distance == 0 {
                    self.arm(timers, now, settings.timeout);
                    if let Some(session) = session {
                        feedback.touch(session, now, settings.timeout);
                    }
                    return SwitchDecision::Absorbed;
                }
                let Some(session) = session else {
                    debug!("{}: debouncing, {:+} absorbed", action, distance);
                    return SwitchDecision::Absorbed;
                };
                self.arm(timers, now, settings.timeout);
                let size = match snapshot() {
                    Some(snap) if snap.size > 0 => snap.size,
                    Some(_) => {
                        error!("{}: collection emptied during feedback session", action);
                        feedback.touch(session, now, settings.timeout);
                        return SwitchDecision::Absorbed;
                    }
                    None => {
                        feedback.touch(session, now, settings.timeout);
                        return SwitchDecision::Absorbed;
                    }
                };
                self.preview(session, distance, settings, size, now, feedback)
            }
        }
    }

    fn preview(
        &self,
        session: SessionId,
        distance: i32,
        settings: &ActionSettings,
        size: usize,
        now: Instant,
        feedback: &mut FeedbackCoordinator,
    ) -> SwitchDecision {
        let selected =
            feedback.record_step(session, distance, size, settings.policy(), now, settings.timeout);
        let base = feedback.session(self.action).map(|s| s.base_index);
        match (selected, base) {
            (Some(selected), Some(base)) => SwitchDecision::Preview {
                session,
                base,
                selected,
                size,
            },
            _ => SwitchDecision::Absorbed,
        }
    }

    /// Handle a fired timer.
    ///
    /// Returns the index to activate if the timer closed a feedback session
    /// whose final position differs from the current item.  A timer that
    /// is not the one this arbiter is waiting for is ignored.
    pub fn on_timer<F>(
        &mut self,
        timer: TimerId,
        snapshot: F,
        feedback: &mut FeedbackCoordinator,
    ) -> Option<usize>
    where
        F: FnOnce() -> Option<CollectionSnapshot>,
    {
        match self.state {
            ArbiterState::Debouncing { timer: armed } if armed == timer => {}
            _ => {
                debug!("{}: stale timer {:?} ignored", self.action, timer);
                return None;
            }
        }
        self.state = ArbiterState::Idle;
        debug!("{}: debounce elapsed", self.action);

        let session = feedback.session(self.action)?.id;
        let position = feedback.close(session)?;
        let snap = snapshot()?;
        if snap.size == 0 {
            error!("{}: collection emptied before switch could be applied", self.action);
            return None;
        }
        let target = position.min(snap.size - 1);
        if target == snap.current {
            debug!("{}: feedback session ended on current item {}", self.action, target);
            return None;
        }
        info!("{}: switch {} -> {} (deferred)", self.action, snap.current, target);
        Some(target)
    }

    /// Cancel the pending timer and drop the open session without
    /// activating anything.
    pub fn reset(
        &mut self,
        timers: &mut Timers<Action>,
        feedback: &mut FeedbackCoordinator,
    ) -> Teardown {
        let timer_cancelled = match std::mem::replace(&mut self.state, ArbiterState::Idle) {
            ArbiterState::Debouncing { timer } => timers.cancel(timer),
            ArbiterState::Idle => false,
        };
        let session_discarded = feedback.discard(self.action).is_some();
        Teardown {
            timer_cancelled,
            session_discarded,
        }
    }
}
