//! Call tracing for collection providers.
//!
//! [`Traced`] wraps a [`CollectionProvider`] at construction time and logs
//! every call on the way in and out at `trace` level, with its duration and
//! result.  With `RUST_LOG` below `trace` the wrapper costs one level check
//! per call.

use crate::arbiter::CollectionSnapshot;
use crate::command::Action;
use crate::traits::CollectionProvider;
use log::{log_enabled, trace, Level};
use std::fmt::Debug;
use std::time::Instant;

/// A [`CollectionProvider`] that logs every call it forwards.
#[derive(Debug)]
pub struct Traced<P> {
    inner: P,
    label: &'static str,
}

impl<P> Traced<P> {
    pub fn new(inner: P, label: &'static str) -> Self {
        Self { inner, label }
    }

    fn call<T: Debug, E: Debug>(
        &self,
        name: &str,
        args: &dyn Debug,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        if !log_enabled!(Level::Trace) {
            return f();
        }
        trace!("[{}] -> {}{:?}", self.label, name, args);
        let started = Instant::now();
        let result = f();
        trace!(
            "[{}] <- {} = {:?} ({:?})",
            self.label,
            name,
            result,
            started.elapsed()
        );
        result
    }
}

impl<P: CollectionProvider> CollectionProvider for Traced<P> {
    type Error = P::Error;

    fn snapshot(&self, action: Action) -> Result<CollectionSnapshot, Self::Error> {
        self.call("snapshot", &(action,), || self.inner.snapshot(action))
    }

    fn activate(&self, action: Action, index: usize) -> Result<(), Self::Error> {
        self.call("activate", &(action, index), || self.inner.activate(action, index))
    }
}
