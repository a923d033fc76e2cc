//! # Album Engine
//!
//! Reassembles albums that the transport delivers as separate events.
//!
//! Responsibilities:
//! - Buffer album items per `(source, group_id)` in arrival order
//! - Admit exactly one completion task per live album
//! - After the quiescence window, hand the whole album to a `GroupSink`
//!
//! ## Usage Example
//!
//! ```ignore
//! use album_engine::{GroupBuffer, GroupCompletionScheduler};
//!
//! let buffer = Arc::new(GroupBuffer::new());
//! let scheduler = GroupCompletionScheduler::new(Arc::clone(&buffer), dispatcher);
//!
//! if let Some(key) = event.group_key() {
//!     buffer.append(key.clone(), event);
//!     scheduler.ensure_started(key, route, Duration::from_millis(1500));
//! }
//! ```

mod buffer;
mod scheduler;

pub use buffer::GroupBuffer;
pub use scheduler::GroupCompletionScheduler;
