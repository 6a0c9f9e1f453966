use core::fmt;
use std::error;

/// An error returned when a future is cut short by a [`StopToken`].
///
/// [`StopToken`]: crate::StopToken
#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Ord)]
pub struct StoppedError {
    _private: (),
}

impl fmt::Debug for StoppedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoppedError").finish()
    }
}

impl StoppedError {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

impl error::Error for StoppedError {}

impl fmt::Display for StoppedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "Future was stopped".fmt(f)
    }
}

/// The error produced by [`for_each`], [`last`] and [`first`].
///
/// [`for_each`]: crate::Observable::for_each
/// [`last`]: crate::Observable::last
/// [`first`]: crate::Observable::first
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error<E> {
    /// The observable emitted an error, or the `for_each` handler returned one.
    Failed(E),
    /// The observable completed without emitting a value.
    NoFirstValue,
    /// The operation's token stopped, or the producer went away, before a
    /// result was available.
    Stopped,
}

impl<E> From<StoppedError> for Error<E> {
    fn from(_: StoppedError) -> Self {
        Error::Stopped
    }
}

impl<E: fmt::Display> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Failed(err) => err.fmt(f),
            Error::NoFirstValue => "No first value".fmt(f),
            Error::Stopped => "Observable was stopped".fmt(f),
        }
    }
}

impl<E> error::Error for Error<E>
where
    E: error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Failed(err) => Some(err),
            _ => None,
        }
    }
}
