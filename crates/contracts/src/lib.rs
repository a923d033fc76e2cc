//! # Contracts
//!
//! Frozen interface contracts shared by every relay crate: inbound events,
//! routing identities, delivery outcomes and the transport seam.
//! Business crates depend on this crate only, never on each other in reverse.
//!
//! ## Identity Model
//! - `ChannelId` is the transport's numeric chat identifier (may be negative)
//! - `EventId` is monotonic per channel and doubles as the group representative

mod channel_id;
mod delivery;
mod error;
mod event;
mod relay_config;
mod transport;

pub use channel_id::ChannelId;
pub use delivery::*;
pub use error::*;
pub use event::*;
pub use relay_config::*;
pub use transport::{GroupSink, LocalGroupSink, LocalTransport, Transport};
