//! repsense Feedback - what the user reads and hears
//!
//! This crate implements the feedback path:
//! - Feedback events (text plus optional spoken utterance)
//! - Throttle: rate limit and back-to-back deduplication of visible text
//! - Notification queue: strictly FIFO, one utterance at a time, flushable
//! - Speaker task draining the queue into a speech sink (tokio)

pub mod event;
pub mod queue;
pub mod speaker;
pub mod throttle;

pub use event::*;
pub use queue::*;
pub use speaker::*;
pub use throttle::*;
