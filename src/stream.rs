//! Pull-based consumption of an [`Observable`] as a `Stream`.

use core::fmt;
use core::future::Future;
use core::pin::Pin;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use futures_core::Stream;

use crate::stop_source::lock;
use crate::{Observable, Observer, StopSource};

struct Buffer<T, E> {
    queue: VecDeque<T>,
    error: Option<E>,
    done: bool,
    waker: Option<Waker>,
}

impl<T, E> Default for Buffer<T, E> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            error: None,
            done: false,
            waker: None,
        }
    }
}

/// The observer half of [`Values`]: every handler writes through one of these.
struct Intake<T, E> {
    buffer: Arc<Mutex<Buffer<T, E>>>,
}

impl<T, E> Intake<T, E> {
    fn update(&self, f: impl FnOnce(&mut Buffer<T, E>)) {
        let waker = {
            let mut buffer = lock(&self.buffer);
            f(&mut buffer);
            buffer.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

impl<T, E> Drop for Intake<T, E> {
    // The producer let go of the subscription; nothing more can arrive.
    fn drop(&mut self) {
        self.update(|buffer| buffer.done = true);
    }
}

/// A stream of the values emitted by one subscription to an [`Observable`].
///
/// Created by [`Observable::values`]. The subscription starts as soon as the
/// stream is created and values are buffered until pulled. Values are yielded
/// in emission order; an error is yielded once, after every value emitted
/// before it, and ends the stream.
///
/// Dropping the stream stops its subscription.
pub struct Values<T, E> {
    buffer: Arc<Mutex<Buffer<T, E>>>,
    finished: bool,
    _source: StopSource,
}

impl<T, E> Observable<T, E>
where
    T: Send + 'static,
    E: fmt::Debug + Send + 'static,
{
    /// Subscribes and returns the emitted values as a [`Stream`].
    pub fn values(&self) -> Values<T, E> {
        let buffer = Arc::new(Mutex::new(Buffer::default()));
        let source = StopSource::new();

        let intake = Arc::new(Intake {
            buffer: buffer.clone(),
        });
        let on_error = intake.clone();
        let on_complete = intake.clone();
        let observer = Observer::new()
            .on_next(move |value| intake.update(|buffer| buffer.queue.push_back(value)))
            .on_error(move |err| {
                on_error.update(|buffer| {
                    buffer.error.get_or_insert(err);
                })
            })
            .on_complete(move || on_complete.update(|buffer| buffer.done = true));

        self.subscribe(observer, Some(&source.token()));
        Values {
            buffer,
            finished: false,
            _source: source,
        }
    }
}

impl<T, E> Values<T, E> {
    /// Returns the next value, error, or `None` once the sequence has ended.
    pub fn next(&mut self) -> NextValue<'_, T, E> {
        NextValue { values: self }
    }
}

impl<T, E> Stream for Values<T, E> {
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        let mut buffer = lock(&this.buffer);
        if let Some(value) = buffer.queue.pop_front() {
            return Poll::Ready(Some(Ok(value)));
        }
        if let Some(err) = buffer.error.take() {
            this.finished = true;
            return Poll::Ready(Some(Err(err)));
        }
        if buffer.done {
            this.finished = true;
            return Poll::Ready(None);
        }
        buffer.waker = Some(cx.waker().clone());
        Poll::Pending
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            return (0, Some(0));
        }
        (lock(&self.buffer).queue.len(), None)
    }
}

impl<T, E> fmt::Debug for Values<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Values")
            .field("buffered", &lock(&self.buffer).queue.len())
            .field("finished", &self.finished)
            .finish()
    }
}

/// Future returned by [`Values::next`].
#[must_use = "Futures do nothing unless polled or .awaited"]
pub struct NextValue<'a, T, E> {
    values: &'a mut Values<T, E>,
}

impl<T, E> Future for NextValue<'_, T, E> {
    type Output = Option<Result<T, E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut *self.values).poll_next(cx)
    }
}

impl<T, E> fmt::Debug for NextValue<'_, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NextValue").field("values", &self.values).finish()
    }
}
