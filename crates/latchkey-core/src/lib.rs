//! Core services for Latchkey.
//!
//! This crate provides the foundational pieces the keyboard engine is built
//! on:
//!
//! - **Timers**: cancellable one-shot timers, pumped by the host event loop
//! - **Signals**: direct-invocation signal/slot notification
//! - **Errors**: the shared error taxonomy
//!
//! # Timer Example
//!
//! ```
//! use std::time::Duration;
//! use latchkey_core::TimerManager;
//!
//! let mut timers = TimerManager::new();
//! let id = timers.start_one_shot(Duration::from_millis(750));
//!
//! // Later, from the event loop:
//! for fired in timers.process_expired() {
//!     assert_eq!(fired, id);
//! }
//! ```

mod error;
pub mod signal;
mod timer;

pub use error::{CoreError, Result, TimerError};
pub use signal::{ConnectionId, Signal};
pub use timer::{TimerId, TimerManager};
