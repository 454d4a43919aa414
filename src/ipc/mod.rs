//! Command transport.
//!
//! A compositor plugin (or a shell script bound to a scroll region) writes
//! scroll samples and control commands to the daemon's Unix socket as
//! newline-delimited JSON.

pub mod listener;
