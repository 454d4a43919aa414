//! Core traits that decouple hyprscroll from any specific compositor or
//! transport mechanism.
//!
//! Every concrete backend (Hyprland, a Unix-socket listener, a test harness,
//! …) implements one of these traits.  The
//! [`ScrollSwitcher`](crate::switcher::ScrollSwitcher) only depends on these
//! abstractions.

use crate::arbiter::CollectionSnapshot;
use crate::command::{Action, Command};
use std::sync::mpsc;

/// Abstraction over the ordered collections an action switches between:
/// the windows of the active workspace, or the workspaces themselves.
///
/// An implementation might talk to Hyprland via IPC, or it might be an
/// in-memory stub used in tests.
pub trait CollectionProvider {
    /// The error type produced by this provider.
    type Error: std::error::Error + Send + 'static;

    /// Number of items for `action` and the index of the current one
    /// (focused window / active workspace).
    fn snapshot(&self, action: Action) -> Result<CollectionSnapshot, Self::Error>;

    /// Make the item at `index` current.
    ///
    /// If the item disappeared since the last snapshot the implementation
    /// should do nothing rather than fail.
    fn activate(&self, action: Action, index: usize) -> Result<(), Self::Error>;
}

//  Feedback

/// Snapshot of an open feedback session, enough to draw a switcher popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackPayload {
    pub action: Action,
    /// Index that was current when the session opened.
    pub base_index: usize,
    /// Index the session currently points at.
    pub selected_index: usize,
    /// Number of items in the collection.
    pub size: usize,
}

/// Events sent from the [`ScrollSwitcher`](crate::switcher::ScrollSwitcher)
/// to an external overlay over an [`mpsc`](std::sync::mpsc) channel.
///
/// The switcher holds an `Option<mpsc::Sender<FeedbackEvent>>`.  Any
/// listener (an on-screen popup, a debug logger, …) can receive these
/// events without being owned by the switcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackEvent {
    /// Show (or update) the popup for `payload.action`.
    Show(FeedbackPayload),
    /// The session for this action ended; hide the popup.
    Hide(Action),
}

//  Command Source

/// A source of [`Command`]s.
///
/// Implementations listen on some transport (a Unix socket, a compositor
/// plugin pipe, an in-memory channel, …) and forward parsed commands into
/// the provided [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](CommandSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Commands are sent in the order they were received; scroll direction
///   depends on the order of consecutive samples.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait CommandSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`Command`] into `sink`.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error>;
}
