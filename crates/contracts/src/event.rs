//! InboundEvent - transport feed output
//!
//! One discrete message observed on a source channel. Albums arrive as several
//! events sharing a `group_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ChannelId;

/// Per-channel message identifier (monotonic within a channel)
pub type EventId = u64;

/// Inbound event
///
/// Immutable once received; the relay only ever clones or moves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Channel the event was observed on
    pub source: ChannelId,

    /// Event identifier within `source`
    pub id: EventId,

    /// Album identifier, present iff the event is part of a multi-item album
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,

    /// What to forward
    pub payload: Payload,

    /// Origin timestamp reported by the transport (diagnostics only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

impl InboundEvent {
    /// Create a plain (non-album) event
    pub fn single(source: ChannelId, id: EventId, payload: Payload) -> Self {
        Self {
            source,
            id,
            group_id: None,
            payload,
            date: None,
        }
    }

    /// Create an album item
    pub fn grouped(
        source: ChannelId,
        id: EventId,
        group_id: impl Into<String>,
        payload: Payload,
    ) -> Self {
        Self {
            source,
            id,
            group_id: Some(group_id.into()),
            payload,
            date: None,
        }
    }

    /// Buffer key for album items, `None` for singletons
    pub fn group_key(&self) -> Option<GroupKey> {
        self.group_id
            .as_ref()
            .map(|group_id| GroupKey::new(self.source, group_id.clone()))
    }

    /// Whether the event belongs to an album
    #[inline]
    pub fn is_grouped(&self) -> bool {
        self.group_id.is_some()
    }
}

/// Forwarded content reference
///
/// The relay never inspects payloads; it only hands them back to the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    /// Plain text message
    Text { text: String },
    /// Media message with optional caption
    Media {
        media: MediaRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
}

impl Payload {
    /// Text payload
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Media payload
    pub fn media(
        media_type: MediaType,
        file_id: impl Into<String>,
        caption: Option<String>,
    ) -> Self {
        Self::Media {
            media: MediaRef {
                media_type,
                file_id: file_id.into(),
            },
            caption,
        }
    }
}

/// Opaque reference to media already stored by the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub media_type: MediaType,
    pub file_id: String,
}

/// Media kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Photo,
    Video,
    Document,
    Audio,
    Animation,
    Voice,
}

/// GroupBuffer key: albums are scoped by their source channel
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub source: ChannelId,
    pub group_id: String,
}

impl GroupKey {
    pub fn new(source: ChannelId, group_id: impl Into<String>) -> Self {
        Self {
            source,
            group_id: group_id.into(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source, self.group_id)
    }
}

/// Resolved forwarding route for one event or album
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Route {
    pub source: ChannelId,
    pub destination: ChannelId,
}

impl Route {
    pub fn new(source: ChannelId, destination: ChannelId) -> Self {
        Self {
            source,
            destination,
        }
    }
}
