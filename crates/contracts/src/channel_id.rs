//! ChannelId - numeric channel identifier
//!
//! Channel ids are signed (supergroups and channels use negative ids) and are
//! string-encoded when used as keys of the persisted mapping file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Identifier of a source or destination channel.
///
/// # Examples
/// ```
/// use contracts::ChannelId;
///
/// let id: ChannelId = "-1001234".parse().unwrap();
/// assert_eq!(id, ChannelId::new(-1001234));
/// assert_eq!(id.to_string(), "-1001234");
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(i64);

impl ChannelId {
    /// Wrap a raw channel id.
    #[inline]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for ChannelId {
    #[inline]
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl FromStr for ChannelId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelId({})", self.0)
    }
}
