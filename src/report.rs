//! Reporting of errors no observer asked to handle.
//!
//! When a producer emits an error and the subscriber supplied no error
//! handler, the error is passed to a process-wide hook. The default hook logs
//! it with `tracing::error!`. Install a different one with [`set_hook`], for
//! example to fail a test or forward errors to an error tracker:
//!
//! ```
//! use stop_observable::report;
//!
//! report::set_hook(|err| eprintln!("{}", err));
//! # report::reset_hook();
//! ```

use core::any::Any;
use core::fmt;
use std::sync::{Arc, PoisonError, RwLock};

type Hook = dyn Fn(&UnhandledError<'_>) + Send + Sync + 'static;

static HOOK: RwLock<Option<Arc<Hook>>> = RwLock::new(None);

/// An error emitted to a subscriber without an error handler.
#[derive(Debug)]
pub struct UnhandledError<'a> {
    payload: &'a (dyn Any + Send),
    debug: &'a dyn fmt::Debug,
}

impl<'a> UnhandledError<'a> {
    /// Returns the error if it is of type `E`.
    pub fn downcast_ref<E: Any>(&self) -> Option<&'a E> {
        self.payload.downcast_ref::<E>()
    }
}

impl fmt::Display for UnhandledError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unhandled observable error: {:?}", self.debug)
    }
}

/// Replaces the unhandled-error hook.
pub fn set_hook<F>(hook: F)
where
    F: Fn(&UnhandledError<'_>) + Send + Sync + 'static,
{
    let mut slot = HOOK.write().unwrap_or_else(PoisonError::into_inner);
    *slot = Some(Arc::new(hook));
}

/// Restores the default hook, which logs through `tracing`.
pub fn reset_hook() {
    let mut slot = HOOK.write().unwrap_or_else(PoisonError::into_inner);
    *slot = None;
}

fn default_hook(err: &UnhandledError<'_>) {
    tracing::error!(error = ?err.debug, "unhandled observable error");
}

pub(crate) fn report<E>(err: E)
where
    E: fmt::Debug + Send + 'static,
{
    let hook = HOOK
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    let unhandled = UnhandledError {
        payload: &err,
        debug: &err,
    };
    match hook {
        Some(hook) => hook(&unhandled),
        None => default_hook(&unhandled),
    }
}
