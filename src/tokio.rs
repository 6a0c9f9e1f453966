//! Timer-backed observables for the `tokio` runtime.

use std::convert::Infallible;
use std::time::Duration;

use ::tokio::time::{interval_at, Instant};

use crate::future::FutureExt as _;
use crate::Observable;

/// Emits `0, 1, 2, ...`, one value every `period`, until the subscription
/// token stops. The first value arrives one `period` after subscribing.
///
/// Each subscription spawns a task, so subscribing outside a tokio runtime
/// panics.
pub fn interval(period: Duration) -> Observable<u64, Infallible> {
    Observable::new(move |next, _error, _complete, token| {
        let mut ticks = interval_at(Instant::now() + period, period);
        ::tokio::spawn(async move {
            let mut n = 0;
            while ticks.tick().until(token.clone()).await.is_ok() {
                next.emit(n);
                n += 1;
            }
        });
    })
}
