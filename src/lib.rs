//! **hyprscroll**: scroll over a bar region to switch windows or
//! workspaces.
//!
//! Raw scroll samples from wheels and touchpads are turned into discrete
//! switch steps, debounced, optionally previewed in a feedback session, and
//! finally applied to an ordered collection (the windows of the active
//! workspace, or the workspaces themselves).
//!
//! # Architecture
//!
//! A sample flows through one pipeline per [`command::Action`]:
//!
//! 1. [`device`] picks the calibration rule for the emitting device.
//! 2. [`gesture`] turns the sample into a signed step distance.
//! 3. [`arbiter`] debounces steps and decides between switching now,
//!    previewing, or absorbing.
//! 4. [`feedback`] tracks deferred selections until their timeout.
//!
//! [`switcher::ScrollSwitcher`] wires these together, driven by
//! [`timer::Timers`] with time passed in explicitly.  Two traits keep it
//! independent of the environment:
//!
//! * [`traits::CollectionProvider`]: reads and activates the collections.
//! * [`traits::CommandSource`]: delivers [`command::Command`]s.
//!
//! Concrete implementations live in [`hyprland`] (Hyprland IPC) and
//! [`ipc`] (Unix-socket command listener).

pub mod arbiter;
pub mod command;
pub mod config;
pub mod device;
pub mod feedback;
pub mod gesture;
pub mod hyprland;
pub mod ipc;
pub mod switcher;
pub mod timer;
pub mod trace;
pub mod traits;
