//! Push-based observables with cooperative cancellation for async Rust.
//!
//! # Status
//!
//! Experimental. The library works as is, breaking changes will bump major
//! version, but there are no guarantees of long-term support.
//!
//! # Motivation
//!
//! A `Stream` is pulled: nothing happens until the consumer asks for the next
//! item. Plenty of sources don't work that way. A socket, a timer or a file
//! watcher produces values whenever it likes, and the natural thing is to
//! hand those values to a callback as they arrive.
//!
//! An [`Observable`] wraps such a producer. Subscribing runs the producer with
//! three emission handles (values, an error, completion) and a [`StopToken`].
//! The subscriber gets each value as soon as it is emitted, and can stop the
//! subscription at any point by stopping the token it subscribed with. The
//! producer sees that through its own token and can wind down *between*
//! values.
//!
//! Termination happens at most once. The first error or completion wins, and
//! after that, or after the token stops, every emission is a no-op.
//!
//! # Usage
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use stop_observable::{Observable, Observer, StopSource};
//!
//! let source = Observable::<u32, ()>::new(|next, _error, complete, token| {
//!     for i in 0..100 {
//!         if token.is_stopped() {
//!             break;
//!         }
//!         next.emit(i);
//!     }
//!     complete.emit();
//! });
//!
//! let stop = StopSource::new();
//! let token = stop.token();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let observer = {
//!     let seen = seen.clone();
//!     Observer::new().on_next(move |value| {
//!         let mut seen = seen.lock().unwrap();
//!         seen.push(value);
//!         if seen.len() == 3 {
//!             // "Unsubscribe": the producer's token stops too.
//!             stop.stop();
//!         }
//!     })
//! };
//! source.subscribe(observer, Some(&token));
//! assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
//! ```
//!
//! The same observable can also be consumed as a future or as a stream:
//!
//! ```
//! use async_std::prelude::*;
//! use stop_observable::Observable;
//!
//! # async_std::task::block_on(async {
//! let source = Observable::<u32, ()>::new(|next, _error, complete, _token| {
//!     next.emit(1);
//!     next.emit(2);
//!     complete.emit();
//! });
//!
//! assert_eq!(source.first(None).await, Ok(1));
//! assert_eq!(source.last(None).await, Ok(Some(2)));
//!
//! let values: Vec<_> = source.values().collect().await;
//! assert_eq!(values, vec![Ok(1), Ok(2)]);
//! # })
//! ```
//!
//! # Features
//!
//! The `time` submodule is empty when no features are enabled. To get
//! timer-driven observables you can enable one of the following features:
//!
//! - `async-io`: for use with the `async-std` or `smol` runtimes.
//! - `tokio`: for use with the `tokio` runtime.
//!
//! # Lineage
//!
//! The subscription protocol follows the TC39 `Observable` proposal, with
//! `AbortSignal` replaced by [`StopToken`]. The `StopToken / StopSource`
//! terminology is borrowed from [C++ paper P0660](https://wg21.link/p0660).

#![forbid(unsafe_code)]
#![deny(missing_debug_implementations, nonstandard_style, rust_2018_idioms)]
#![warn(missing_docs, future_incompatible, unreachable_pub)]

pub mod future;
pub mod report;
pub mod stream;
pub mod time;

#[cfg(feature = "async-io")]
pub mod async_io;
#[cfg(feature = "tokio")]
pub mod tokio;

mod error;
mod observable;
mod stop_source;
mod terminal;

pub use error::{Error, StoppedError};
pub use observable::{Complete, Fail, Next, Observable, Observer};
pub use stop_source::{ListenerId, StopSource, StopToken};
pub use stream::Values;
pub use terminal::Deferred;

/// A prelude for `stop-observable`.
pub mod prelude {
    pub use crate::future::FutureExt as _;
}
