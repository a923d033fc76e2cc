//! # Routing
//!
//! Source → destination channel resolution.
//!
//! Responsibilities:
//! - Persist operator mappings as a JSON object (`MappingStore`)
//! - Serve lock-free lookups on every inbound event (`RoutingTable`)
//! - Swap in reloaded mappings atomically, optionally on a timer
//!
//! ## Usage Example
//!
//! ```ignore
//! use routing::{MappingStore, RoutingTable};
//!
//! let table = RoutingTable::open(MappingStore::new("mappings.json"))?;
//! table.store().add_mapping(src, dst)?;
//! table.reload()?;
//! assert_eq!(table.resolve(src), Some(dst));
//! ```

mod error;
mod store;
mod table;

pub use error::{Result, RoutingError};
pub use store::{Mapping, MappingStore};
pub use table::{spawn_reload_task, ReloadOutcome, RoutingTable};
