//! The emission core: producers, observers and subscriptions.

use core::fmt;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::report;
use crate::stop_source::lock;
use crate::{StopSource, StopToken};

type Producer<T, E> = dyn Fn(Next<T, E>, Fail<T, E>, Complete<T, E>, StopToken) + Send + Sync;

/// A cold, push-based sequence of values.
///
/// The producer passed to [`Observable::new`] runs once per call to
/// [`subscribe`](Observable::subscribe), and each run is independent of the
/// others. It receives three emission handles and the subscription's
/// [`StopToken`], which stops once the subscriber stops listening or the
/// sequence terminates.
///
/// # Example
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use stop_observable::{Observable, Observer};
///
/// let source = Observable::<i32, ()>::new(|next, _error, complete, _token| {
///     next.emit(1);
///     next.emit(2);
///     complete.emit();
/// });
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// source.subscribe(Observer::new().on_next(move |v| sink.lock().unwrap().push(v)), None);
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
/// ```
pub struct Observable<T, E> {
    producer: Arc<Producer<T, E>>,
}

impl<T, E> Observable<T, E> {
    /// Creates an observable from a producer function.
    ///
    /// Nothing runs until the first subscription.
    pub fn new<F>(producer: F) -> Self
    where
        F: Fn(Next<T, E>, Fail<T, E>, Complete<T, E>, StopToken) + Send + Sync + 'static,
    {
        Self {
            producer: Arc::new(producer),
        }
    }
}

impl<T, E> Observable<T, E>
where
    T: Send + 'static,
    E: fmt::Debug + Send + 'static,
{
    /// Runs the producer, delivering its emissions to `observer`.
    ///
    /// The subscription gets a fresh token which is a child of `token`:
    /// stopping `token` ends the subscription without calling the error or
    /// completion handler. A panic in the producer is not caught and unwinds
    /// out of this call.
    pub fn subscribe(&self, observer: Observer<T, E>, token: Option<&StopToken>) {
        let subscription = Arc::new(Subscription {
            terminated: AtomicBool::new(false),
            source: StopSource::from_parent(token),
            state: Mutex::new(State {
                observer,
                queue: VecDeque::new(),
                delivering: false,
            }),
        });
        let token = subscription.source.token();
        tracing::trace!(stopped = token.is_stopped(), "subscribing to observable");

        (self.producer)(
            Next {
                subscription: subscription.clone(),
            },
            Fail {
                subscription: subscription.clone(),
            },
            Complete { subscription },
            token,
        );
    }
}

impl<T, E> Clone for Observable<T, E> {
    fn clone(&self) -> Self {
        Self {
            producer: self.producer.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Observable<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable").finish_non_exhaustive()
    }
}

/// The handlers of a single subscription. All three are optional.
pub struct Observer<T, E> {
    next: Option<Box<dyn FnMut(T) + Send>>,
    error: Option<Box<dyn FnOnce(E) + Send>>,
    complete: Option<Box<dyn FnOnce() + Send>>,
}

impl<T, E> Observer<T, E> {
    /// Creates an observer that ignores everything it is sent.
    ///
    /// Errors are still passed to the [`report`](crate::report) hook unless an
    /// error handler is set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the handler called for every value.
    pub fn on_next<F>(mut self, f: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        self.next = Some(Box::new(f));
        self
    }

    /// Sets the handler called if the sequence fails.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: FnOnce(E) + Send + 'static,
    {
        self.error = Some(Box::new(f));
        self
    }

    /// Sets the handler called if the sequence completes.
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.complete = Some(Box::new(f));
        self
    }
}

impl<T, E> Default for Observer<T, E> {
    fn default() -> Self {
        Self {
            next: None,
            error: None,
            complete: None,
        }
    }
}

impl<T, E> fmt::Debug for Observer<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("next", &self.next.is_some())
            .field("error", &self.error.is_some())
            .field("complete", &self.complete.is_some())
            .finish()
    }
}

enum Signal<T, E> {
    Next(T),
    Error(E),
    Complete,
}

struct State<T, E> {
    /// Empty while a delivery is running; the deliverer holds the handlers.
    observer: Observer<T, E>,
    /// Signals emitted while a delivery is running, in emission order.
    queue: VecDeque<Signal<T, E>>,
    delivering: bool,
}

struct Subscription<T, E> {
    terminated: AtomicBool,
    source: StopSource,
    state: Mutex<State<T, E>>,
}

impl<T, E> Subscription<T, E>
where
    E: fmt::Debug + Send + 'static,
{
    fn can_emit(&self) -> bool {
        !self.terminated.load(Ordering::Acquire) && !self.source.is_stopped()
    }

    /// Marks the subscription terminated. Only the first caller wins.
    fn terminate(&self) -> bool {
        !self.source.is_stopped() && !self.terminated.swap(true, Ordering::AcqRel)
    }

    fn next(&self, value: T) {
        if self.can_emit() {
            self.deliver(Signal::Next(value));
        }
    }

    fn error(&self, err: E) {
        if self.terminate() {
            self.deliver(Signal::Error(err));
        }
    }

    fn complete(&self) {
        if self.terminate() {
            self.deliver(Signal::Complete);
        }
    }

    /// Runs handlers without holding the state lock. An emission made while
    /// another delivery is running (from inside a handler, say) is queued and
    /// handed to its handler by that delivery, in order.
    fn deliver(&self, signal: Signal<T, E>) {
        let mut observer = {
            let mut state = lock(&self.state);
            if state.delivering {
                state.queue.push_back(signal);
                return;
            }
            state.delivering = true;
            std::mem::take(&mut state.observer)
        };

        let mut signal = signal;
        loop {
            let finished = self.dispatch(&mut observer, signal);
            let mut state = lock(&self.state);
            match state.queue.pop_front() {
                Some(queued) if !finished => signal = queued,
                _ => {
                    state.delivering = false;
                    let leftover = std::mem::take(&mut state.queue);
                    let released = if finished {
                        Some(observer)
                    } else {
                        state.observer = observer;
                        None
                    };
                    drop(state);
                    drop(leftover);
                    drop(released);
                    return;
                }
            }
        }
    }

    /// Returns `true` once a terminal signal has been handled.
    fn dispatch(&self, observer: &mut Observer<T, E>, signal: Signal<T, E>) -> bool {
        match signal {
            Signal::Next(value) => {
                if !self.source.is_stopped() {
                    if let Some(next) = observer.next.as_mut() {
                        next(value);
                    }
                }
                false
            }
            Signal::Error(err) => {
                tracing::debug!("observable errored");
                match observer.error.take() {
                    Some(handler) => handler(err),
                    None => report::report(err),
                }
                self.source.stop();
                true
            }
            Signal::Complete => {
                tracing::debug!("observable completed");
                if let Some(handler) = observer.complete.take() {
                    handler();
                }
                self.source.stop();
                true
            }
        }
    }
}

/// Emits values to a subscription.
///
/// Emitting after the subscription terminated or was stopped does nothing.
pub struct Next<T, E> {
    subscription: Arc<Subscription<T, E>>,
}

impl<T, E> Next<T, E>
where
    E: fmt::Debug + Send + 'static,
{
    /// Delivers `value` to the subscriber's value handler.
    pub fn emit(&self, value: T) {
        self.subscription.next(value);
    }
}

/// Ends a subscription with an error.
///
/// Only the first terminal signal of a subscription has any effect.
pub struct Fail<T, E> {
    subscription: Arc<Subscription<T, E>>,
}

impl<T, E> Fail<T, E>
where
    E: fmt::Debug + Send + 'static,
{
    /// Delivers `err` to the error handler, or to the unhandled-error hook if
    /// the subscriber has none, then stops the subscription.
    pub fn emit(&self, err: E) {
        self.subscription.error(err);
    }
}

/// Ends a subscription successfully.
///
/// Only the first terminal signal of a subscription has any effect.
pub struct Complete<T, E> {
    subscription: Arc<Subscription<T, E>>,
}

impl<T, E> Complete<T, E>
where
    E: fmt::Debug + Send + 'static,
{
    /// Calls the completion handler, then stops the subscription.
    pub fn emit(&self) {
        self.subscription.complete();
    }
}

macro_rules! emitter_impls {
    ($($name:ident),*) => {$(
        impl<T, E> Clone for $name<T, E> {
            fn clone(&self) -> Self {
                Self {
                    subscription: self.subscription.clone(),
                }
            }
        }

        impl<T, E> fmt::Debug for $name<T, E> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("terminated", &self.subscription.terminated.load(Ordering::Acquire))
                    .field("stopped", &self.subscription.source.is_stopped())
                    .finish()
            }
        }
    )*};
}

emitter_impls!(Next, Fail, Complete);
