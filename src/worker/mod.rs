//! Producer, consumer and timer threads
//!
//! A run uses three threads plus the main thread, which only creates and joins
//! them (see [`crate::coordinator`]):
//!
//! ```text
//!            WorkItem                 WorkItem
//! Producer ───────────▶ BoundedQueue ───────────▶ Consumer ──▶ Target
//!    ▲                                               │
//!    │ cancel (last)                 stop requested  │  stopped
//!    └──────────────── Timer ◀───────────────────────┘
//!                        └──── ShutdownCell ─────────▶
//! ```
//!
//! - [`producer`]: sleeps an exponential delay, generates an item, enqueues it
//! - [`consumer`]: executes items, times them, persists statistics on stop
//! - [`timer`]: waits out the run, stops the consumer, then cancels the producer
//! - [`shutdown`]: the atomic state cell and cancellation token they share
//!
//! The single ordering rule is that the producer is never cancelled before the
//! consumer has published `Stopped`.

pub mod consumer;
pub mod producer;
pub mod shutdown;
pub mod timer;

pub use consumer::{Consumer, ConsumerConfig};
pub use producer::{Producer, ProducerHandle, ProducerSummary};
pub use shutdown::{CancelToken, ShutdownCell, ShutdownState};
pub use timer::{Timer, TimerReport};
