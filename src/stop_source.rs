use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_channel::{bounded, Receiver, Sender};
use futures_core::stream::Stream;

enum Never {}

type Callback = Box<dyn FnOnce() + Send>;

/// Identifies a callback registered with [`StopToken::on_stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Callback)>,
}

struct Inner {
    stopped: AtomicBool,
    /// Closed on stop, which completes every `StopToken` future.
    chan: Sender<Never>,
    listeners: Mutex<Listeners>,
    /// Our registration in the parent's listener list, if linked.
    parent: Mutex<Option<(Weak<Inner>, ListenerId)>>,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Inner {
    fn stop(&self) -> bool {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.chan.close();

        let link = lock(&self.parent).take();
        if let Some((parent, id)) = link {
            if let Some(parent) = parent.upgrade() {
                parent.remove(id);
            }
        }

        // Listeners may stop other tokens, so never call them under the lock.
        let entries = std::mem::take(&mut lock(&self.listeners).entries);
        for (_, callback) in entries {
            callback();
        }
        true
    }

    fn add(&self, callback: Callback) -> ListenerId {
        let mut listeners = lock(&self.listeners);
        let id = ListenerId(listeners.next_id);
        listeners.next_id += 1;
        if self.stopped.load(Ordering::Acquire) {
            drop(listeners);
            callback();
        } else {
            listeners.entries.push((id, callback));
        }
        id
    }

    fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = lock(&self.listeners);
        match listeners.entries.iter().position(|(key, _)| *key == id) {
            Some(pos) => {
                listeners.entries.remove(pos);
                true
            }
            None => false,
        }
    }
}

/// `StopSource` produces `StopToken` and cancels all of its tokens on `stop`
/// or on drop.
///
/// A source can be linked to a parent token with [`StopSource::child_of`]:
/// stopping the parent stops the child, stopping the child leaves the parent
/// untouched.
///
/// # Example:
///
/// ```ignore
/// let source = StopSource::new();
/// let token = source.token();
/// schedule_some_work(token);
/// source.stop(); // At this point, scheduled work notices that it is canceled.
/// ```
pub struct StopSource {
    inner: Arc<Inner>,
    stop_token: StopToken,
}

/// `StopToken` is a future which completes when the associated `StopSource`
/// is stopped or dropped.
#[derive(Clone)]
pub struct StopToken {
    inner: Arc<Inner>,
    chan: Receiver<Never>,
}

impl Default for StopSource {
    fn default() -> StopSource {
        let (sender, receiver) = bounded::<Never>(1);
        let inner = Arc::new(Inner {
            stopped: AtomicBool::new(false),
            chan: sender,
            listeners: Mutex::new(Listeners::default()),
            parent: Mutex::new(None),
        });

        StopSource {
            stop_token: StopToken {
                inner: inner.clone(),
                chan: receiver,
            },
            inner,
        }
    }
}

impl StopSource {
    /// Creates a new `StopSource`.
    pub fn new() -> StopSource {
        StopSource::default()
    }

    /// Creates a `StopSource` which is stopped whenever `parent` is.
    ///
    /// If `parent` is already stopped the new source starts out stopped.
    pub fn child_of(parent: &StopToken) -> StopSource {
        let source = StopSource::new();
        let child = Arc::downgrade(&source.inner);
        let id = parent.inner.add(Box::new(move || {
            if let Some(child) = child.upgrade() {
                child.stop();
            }
        }));
        if !source.is_stopped() {
            *lock(&source.inner.parent) = Some((Arc::downgrade(&parent.inner), id));
        }
        source
    }

    /// Creates a child of `parent` if there is one, or an independent source.
    pub fn from_parent(parent: Option<&StopToken>) -> StopSource {
        match parent {
            Some(parent) => StopSource::child_of(parent),
            None => StopSource::new(),
        }
    }

    /// Produces a new `StopToken`, associated with this source.
    ///
    /// Once the source is stopped or destroyed, `StopToken` future completes.
    pub fn token(&self) -> StopToken {
        self.stop_token.clone()
    }

    /// Stops this source and every child linked to it.
    ///
    /// Returns `false` if the source was already stopped.
    pub fn stop(&self) -> bool {
        self.inner.stop()
    }

    /// Returns `true` once the source has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::Acquire)
    }
}

impl Drop for StopSource {
    fn drop(&mut self) {
        self.inner.stop();
    }
}

impl fmt::Debug for StopSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopSource")
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

impl StopToken {
    /// Returns `true` once the associated source has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::Acquire)
    }

    /// Registers `callback` to run when the token stops.
    ///
    /// Runs `callback` right away if the token is already stopped. Callbacks
    /// run on the thread that stops the source, in registration order.
    pub fn on_stop<F>(&self, callback: F) -> ListenerId
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.add(Box::new(callback))
    }

    /// Unregisters a callback that has not run yet.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.remove(id)
    }
}

impl fmt::Debug for StopToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopToken")
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

impl Future for StopToken {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let chan = Pin::new(&mut self.chan);
        match Stream::poll_next(chan, cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(never)) => match never {},
            Poll::Ready(None) => Poll::Ready(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listener_count(token: &StopToken) -> usize {
        lock(&token.inner.listeners).entries.len()
    }

    #[test]
    fn stopped_children_unlink_from_parent() {
        let parent = StopSource::new();
        let token = parent.token();

        let children: Vec<_> = (0..3).map(|_| StopSource::child_of(&token)).collect();
        assert_eq!(listener_count(&token), 3);

        children[1].stop();
        assert_eq!(listener_count(&token), 2);

        drop(children);
        assert_eq!(listener_count(&token), 0);
        assert!(!parent.is_stopped());
    }
}
