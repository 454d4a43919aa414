//! Hyprland-specific implementations.
//!
//! This module provides the concrete
//! [`CollectionProvider`](crate::traits::CollectionProvider) backend,
//! powered by Hyprland's IPC socket.
//!
//! Nothing outside this module should reference Hyprland directly.

pub mod collection;
