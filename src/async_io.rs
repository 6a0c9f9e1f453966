//! Timer-backed observables for the `async-std` and `smol` runtimes.

use std::convert::Infallible;
use std::future::poll_fn;
use std::pin::Pin;
use std::time::Duration;

use async_io::Timer;
use futures_core::Stream;

use crate::future::FutureExt as _;
use crate::Observable;

/// Emits `0, 1, 2, ...`, one value every `period`, until the subscription
/// token stops. The first value arrives one `period` after subscribing.
///
/// Each subscription runs on `async-global-executor`.
pub fn interval(period: Duration) -> Observable<u64, Infallible> {
    Observable::new(move |next, _error, _complete, token| {
        let mut timer = Timer::interval(period);
        async_global_executor::spawn(async move {
            let mut n = 0;
            loop {
                let tick = poll_fn(|cx| Pin::new(&mut timer).poll_next(cx));
                match tick.until(token.clone()).await {
                    Ok(Some(_)) => {
                        next.emit(n);
                        n += 1;
                    }
                    Ok(None) | Err(_) => break,
                }
            }
        })
        .detach();
    })
}
