//! # Relay
//!
//! Wires routing, album reassembly and delivery into one event handler.
//!
//! Control flow per inbound event:
//! 1. Resolve the destination; unmapped sources are dropped
//! 2. Album items are buffered and their completion task ensured
//! 3. Anything else is forwarded immediately
//!
//! ## Usage Example
//!
//! ```ignore
//! use relay_core::Relay;
//!
//! let relay = Relay::from_config(&config, LogTransport::new("log"))?;
//! relay.run(events_rx).await;
//! relay.drain().await;
//! println!("{}", relay.summary());
//! ```

mod error;
mod relay;

pub use error::{RelayError, Result};
pub use relay::{Disposition, Relay};
