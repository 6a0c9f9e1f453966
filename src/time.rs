//! Observables driven by a timer.
//!
//! # Features
//!
//! This module is empty when no features are enabled. To get [`interval`] you
//! can enable one of the following features:
//!
//! - `async-io`: use this when using the `async-std` or `smol` runtimes.
//! - `tokio`: use this when using the `tokio` runtime.
//!
//! When both are enabled the `tokio` implementation is used.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! # #[cfg(feature = "tokio")]
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() { run().await }
//! # #[cfg(all(feature = "async-io", not(feature = "tokio")))]
//! # fn main() { async_std::task::block_on(run()) }
//! # #[cfg(not(any(feature = "tokio", feature = "async-io")))]
//! # fn main() {}
//! # #[cfg(any(feature = "tokio", feature = "async-io"))]
//! async fn run() {
//!     use stop_observable::time::interval;
//!
//!     // 0, 1, 2 one tick apart; dropping the stream stops the timer.
//!     let mut values = interval(Duration::from_millis(10)).values();
//!     let mut first_three = Vec::new();
//!     while let Some(Ok(n)) = values.next().await {
//!         first_three.push(n);
//!         if first_three.len() == 3 {
//!             break;
//!         }
//!     }
//!     assert_eq!(first_three, vec![0, 1, 2]);
//! }
//! ```

cfg_if::cfg_if! {
    if #[cfg(feature = "tokio")] {
        pub use crate::tokio::interval;
    } else if #[cfg(feature = "async-io")] {
        pub use crate::async_io::interval;
    }
}
