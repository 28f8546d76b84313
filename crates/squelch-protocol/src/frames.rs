//! What a session receives.
//!
//! Two kinds of frame reach a client: a chat record to show, and a chime to
//! play. Both go through [`crate::codec`].

use serde::{Deserialize, Serialize};

/// Chat box tab a record is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum ChatChannel {
    /// Radio traffic relayed through the router.
    Radio = 0,
    /// Local, in-zone speech.
    Local = 1,
    /// Server announcements.
    Server = 2,
}

impl From<ChatChannel> for u8 {
    fn from(channel: ChatChannel) -> u8 {
        channel as u8
    }
}

impl TryFrom<u8> for ChatChannel {
    type Error = String;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        [ChatChannel::Radio, ChatChannel::Local, ChatChannel::Server]
            .into_iter()
            .find(|channel| *channel as u8 == tag)
            .ok_or_else(|| format!("no chat channel with tag {tag}"))
    }
}

/// A structured chat record.
///
/// Built once per broadcast and never reformatted per recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub channel: ChatChannel,
    /// Text as the speaker wrote it.
    pub message: String,
    /// Markup-wrapped rendering shown in the chat box.
    pub wrapped_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<u64>,
    /// Speech bubble only, keep out of the chat box.
    #[serde(default)]
    pub hide_chat: bool,
}

impl ChatRecord {
    #[must_use]
    pub fn new(
        channel: ChatChannel,
        message: impl Into<String>,
        wrapped_message: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            message: message.into(),
            wrapped_message: wrapped_message.into(),
            sender: None,
            hide_chat: false,
        }
    }

    #[must_use]
    pub fn with_sender(mut self, sender: u64) -> Self {
        self.sender = Some(sender);
        self
    }
}

/// A session frame, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    Chat { record: ChatRecord },
    /// `sound` is a resource path, `volume` is in decibels.
    Chime { sound: String, volume: f32 },
}

impl Frame {
    #[must_use]
    pub fn chat(record: ChatRecord) -> Self {
        Frame::Chat { record }
    }

    #[must_use]
    pub fn chime(sound: impl Into<String>, volume: f32) -> Self {
        Frame::Chime {
            sound: sound.into(),
            volume,
        }
    }

    /// The chat record carried, if any.
    #[must_use]
    pub fn record(&self) -> Option<&ChatRecord> {
        match self {
            Frame::Chat { record } => Some(record),
            Frame::Chime { .. } => None,
        }
    }
}
