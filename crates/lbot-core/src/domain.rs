use std::fmt::Write;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

/// A URL saved by a user.
///
/// Identity is derived from the `(url, owner)` pair, see [`Page::fingerprint`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub url: String,
    pub owner: String,
}

impl Page {
    pub fn new(url: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            owner: owner.into(),
        }
    }

    /// Storage key: lowercase hex SHA-1 of `url ++ owner`.
    pub fn fingerprint(&self) -> String {
        let mut h = Sha1::new();
        h.update(self.url.as_bytes());
        h.update(self.owner.as_bytes());
        let digest = h.finalize();

        let mut out = String::with_capacity(digest.len() * 2);
        for b in digest.iter() {
            let _ = write!(&mut out, "{b:02x}");
        }
        out
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Message,
    Unknown,
}

/// Addressing data carried by `Message` events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventMeta {
    pub chat_id: ChatId,
    pub username: String,
}

/// Transport-agnostic unit of work handed from a fetcher to a processor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub text: String,
    pub meta: Option<EventMeta>,
}

impl Event {
    pub fn message(text: impl Into<String>, chat_id: ChatId, username: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Message,
            text: text.into(),
            meta: Some(EventMeta {
                chat_id,
                username: username.into(),
            }),
        }
    }

    pub fn unknown() -> Self {
        Self {
            kind: EventKind::Unknown,
            text: String::new(),
            meta: None,
        }
    }
}

impl From<RawUpdate> for Event {
    fn from(u: RawUpdate) -> Self {
        match u.message {
            Some(m) => Event::message(m.text, ChatId(m.chat.id), m.from.username),
            None => Event::unknown(),
        }
    }
}

/// Update as delivered by the remote API (Bot API `getUpdates` shape).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUpdate {
    #[serde(rename = "update_id", alias = "id")]
    pub id: i64,
    #[serde(default)]
    pub message: Option<RawMessage>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub from: RawSender,
    pub chat: RawChat,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSender {
    #[serde(default)]
    pub username: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawChat {
    pub id: i64,
}
