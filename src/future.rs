//! Extension methods and types for the `Future` trait.

use crate::{StopToken, StoppedError};
use core::future::Future;
use core::pin::Pin;

use pin_project_lite::pin_project;
use std::task::{Context, Poll};

/// Extend the `Future` trait with the `until` method.
pub trait FutureExt: Future {
    /// Run a future until it resolves, or until the token is stopped.
    ///
    /// A future that is ready on the same poll the token stops still wins.
    fn until(self, token: StopToken) -> Until<Self>
    where
        Self: Sized,
    {
        Until {
            future: self,
            token,
        }
    }
}

impl<F: Future> FutureExt for F {}

pin_project! {
    /// Run a future until it resolves, or until a token is stopped.
    ///
    /// This future is returned by [`FutureExt::until`].
    #[must_use = "Futures do nothing unless polled or .awaited"]
    #[derive(Debug)]
    pub struct Until<F> {
        #[pin]
        future: F,
        #[pin]
        token: StopToken,
    }
}

impl<F> Future for Until<F>
where
    F: Future,
{
    type Output = Result<F::Output, StoppedError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        if let Poll::Ready(it) = this.future.poll(cx) {
            return Poll::Ready(Ok(it));
        }
        match this.token.poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(()) => Poll::Ready(Err(StoppedError::new())),
        }
    }
}
