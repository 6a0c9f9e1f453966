//! Promise-style consumers: `for_each`, `last` and `first`.

use core::fmt;
use core::future::Future;
use core::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_channel::{bounded, Receiver, Sender};
use futures_core::Stream;
use pin_project_lite::pin_project;

use crate::future::{FutureExt, Until};
use crate::stop_source::lock;
use crate::{Error, Observable, Observer, StopSource, StopToken};

type Outcome<T, E> = Result<T, Error<E>>;

/// Settles a [`Deferred`] and owns the operation's stop source.
///
/// The source stops once the last resolver is dropped, which happens when the
/// subscription releases its handlers.
struct Resolver<T, E> {
    chan: Sender<Outcome<T, E>>,
    source: Arc<StopSource>,
}

impl<T, E> Resolver<T, E> {
    /// The first settlement wins, the rest are dropped.
    fn settle(&self, outcome: Outcome<T, E>) {
        if self.chan.try_send(outcome).is_ok() {
            self.chan.close();
        }
    }

    fn stop(&self) {
        self.source.stop();
    }
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            chan: self.chan.clone(),
            source: self.source.clone(),
        }
    }
}

fn deferred<T, E>(source: StopSource) -> (Resolver<T, E>, Deferred<T, E>) {
    let (sender, receiver) = bounded(1);
    let deferred = Deferred {
        inner: Settled { chan: receiver }.until(source.token()),
    };
    let resolver = Resolver {
        chan: sender,
        source: Arc::new(source),
    };
    (resolver, deferred)
}

pin_project! {
    #[derive(Debug)]
    struct Settled<T> {
        #[pin]
        chan: Receiver<T>,
    }
}

impl<T> Future for Settled<T> {
    type Output = Option<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.project().chan.poll_next(cx)
    }
}

pin_project! {
    /// The eventual result of a terminal operation on an [`Observable`].
    ///
    /// Resolves with `Err(Error::Stopped)` if the operation's token stops, or
    /// the producer drops its emitters, before a result is available.
    #[must_use = "Futures do nothing unless polled or .awaited"]
    pub struct Deferred<T, E> {
        #[pin]
        inner: Until<Settled<Outcome<T, E>>>,
    }
}

impl<T, E> Future for Deferred<T, E> {
    type Output = Outcome<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project().inner.poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(Some(outcome))) => Poll::Ready(outcome),
            Poll::Ready(Ok(None)) => Poll::Ready(Err(Error::Stopped)),
            Poll::Ready(Err(stopped)) => Poll::Ready(Err(stopped.into())),
        }
    }
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred").finish_non_exhaustive()
    }
}

impl<T, E> Observable<T, E>
where
    T: Send + 'static,
    E: fmt::Debug + Send + 'static,
{
    /// Calls `f` for every value, resolving once the sequence completes.
    ///
    /// If `f` returns an error the returned future fails with it. The
    /// subscription itself keeps running until it terminates or `token`
    /// stops.
    pub fn for_each<F>(&self, mut f: F, token: Option<&StopToken>) -> Deferred<(), E>
    where
        F: FnMut(T) -> Result<(), E> + Send + 'static,
    {
        let source = StopSource::from_parent(token);
        let subscription_token = source.token();
        let (resolver, deferred) = deferred(source);

        let on_error = resolver.clone();
        let on_complete = resolver.clone();
        let observer = Observer::new()
            .on_next(move |value| {
                if let Err(err) = f(value) {
                    resolver.settle(Err(Error::Failed(err)));
                }
            })
            .on_error(move |err| on_error.settle(Err(Error::Failed(err))))
            .on_complete(move || on_complete.settle(Ok(())));

        self.subscribe(observer, Some(&subscription_token));
        deferred
    }

    /// Resolves with the last value seen once the sequence completes, or with
    /// `None` if it completes empty.
    pub fn last(&self, token: Option<&StopToken>) -> Deferred<Option<T>, E> {
        let source = StopSource::from_parent(token);
        let subscription_token = source.token();
        let (resolver, deferred) = deferred(source);

        let latest = Arc::new(Mutex::new(None));
        let on_next = latest.clone();
        let on_error = resolver.clone();
        let observer = Observer::new()
            .on_next(move |value| *lock(&on_next) = Some(value))
            .on_error(move |err| on_error.settle(Err(Error::Failed(err))))
            .on_complete(move || {
                let value = lock(&latest).take();
                resolver.settle(Ok(value));
            });

        self.subscribe(observer, Some(&subscription_token));
        deferred
    }

    /// Resolves with the first value, then stops the subscription.
    ///
    /// Fails with [`Error::NoFirstValue`] if the sequence completes empty.
    pub fn first(&self, token: Option<&StopToken>) -> Deferred<T, E> {
        let source = StopSource::from_parent(token);
        let subscription_token = source.token();
        let (resolver, deferred) = deferred(source);

        let on_error = resolver.clone();
        let on_complete = resolver.clone();
        let observer = Observer::new()
            .on_next(move |value| {
                resolver.settle(Ok(value));
                tracing::trace!("first value received, stopping subscription");
                resolver.stop();
            })
            .on_error(move |err| on_error.settle(Err(Error::Failed(err))))
            .on_complete(move || on_complete.settle(Err(Error::NoFirstValue)));

        self.subscribe(observer, Some(&subscription_token));
        deferred
    }
}
