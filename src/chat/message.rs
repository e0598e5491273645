//! Chat message model and wire normalization.
//!
//! The real-time channel and the history endpoint both speak a flat JSON
//! shape with per-type optional fields. Internally every message is a tagged
//! union ([`MessageContent`]) so consumption sites never probe for maybe-set
//! fields; [`Message::from_wire`] is the single normalization point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Message type discriminant, shared between the wire shape and the domain
/// model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    File,
    Voice,
}

/// Whether a message was authored by the signed-in user or the correspondent.
/// Derived, never carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    Me,
    Them,
}

/// Reference to an uploaded or recorded binary payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub url: String,
    pub name: String,
    pub size: Option<u64>,
    pub mime_type: Option<String>,
}

/// Per-type message payload. Exactly the fields each type needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text { text: String },
    Image { attachment: Attachment },
    File { attachment: Attachment },
    Voice { attachment: Attachment, duration_secs: u32 },
}

/// One chat item. Immutable once created; discarded when the conversation
/// closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub content: MessageContent,
}

/// The flat JSON shape used by the real-time channel and the history
/// endpoint. Inbound payloads vary their field spellings (`file_url` vs
/// `uri`, `file_name` vs `name`), and ids arrive as either numbers or
/// strings; aliases and a lenient id deserializer absorb both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireMessage {
    #[serde(default, deserialize_with = "string_or_number")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, alias = "uri", skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, alias = "name", skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, alias = "size", skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, alias = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<u64>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(u64),
        Str(String),
    }

    Ok(Option::<Repr>::deserialize(deserializer)?.map(|repr| match repr {
        Repr::Num(n) => n.to_string(),
        Repr::Str(s) => s,
    }))
}

impl Message {
    /// Normalizes a wire payload into the domain model.
    ///
    /// The sender indicator is resolved by comparing the payload's author id
    /// against the signed-in user's id; an event authored by the signed-in
    /// user (their own message delivered back) classifies as [`Sender::Me`].
    /// An unparseable or absent timestamp fails open to `received_at`; the
    /// message is never dropped. A missing id falls back to
    /// `{created_at}_{sender_id}` so history entries stay addressable.
    pub fn from_wire(wire: &WireMessage, my_id: u64, received_at: DateTime<Utc>) -> Self {
        let timestamp = wire
            .created_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|parsed| parsed.with_timezone(&Utc))
            .unwrap_or(received_at);

        let sender = if wire.sender_id == Some(my_id) {
            Sender::Me
        } else {
            Sender::Them
        };

        let id = wire.id.clone().unwrap_or_else(|| {
            format!(
                "{}_{}",
                wire.created_at.as_deref().unwrap_or_default(),
                wire.sender_id.unwrap_or_default()
            )
        });

        let attachment = || Attachment {
            url: wire.file_url.clone().unwrap_or_default(),
            name: wire.file_name.clone().unwrap_or_default(),
            size: wire.file_size,
            mime_type: wire.mime_type.clone(),
        };

        let content = match wire.kind {
            MessageKind::Text => MessageContent::Text {
                text: wire.text.clone().unwrap_or_default(),
            },
            MessageKind::Image => MessageContent::Image {
                attachment: attachment(),
            },
            MessageKind::File => MessageContent::File {
                attachment: attachment(),
            },
            MessageKind::Voice => MessageContent::Voice {
                attachment: attachment(),
                duration_secs: wire.duration.unwrap_or_default(),
            },
        };

        Self {
            id,
            sender,
            timestamp,
            content,
        }
    }

    /// Serializes for outbound emission, stamping the author and recipient.
    pub fn to_wire(&self, sender_id: u64, receiver_id: u64) -> WireMessage {
        let (text, attachment, duration) = match &self.content {
            MessageContent::Text { text } => (Some(text.clone()), None, None),
            MessageContent::Image { attachment } => (None, Some(attachment), None),
            MessageContent::File { attachment } => (None, Some(attachment), None),
            MessageContent::Voice {
                attachment,
                duration_secs,
            } => (None, Some(attachment), Some(*duration_secs)),
        };

        WireMessage {
            id: Some(self.id.clone()),
            kind: self.kind(),
            text,
            file_url: attachment.map(|a| a.url.clone()),
            file_name: attachment.map(|a| a.name.clone()),
            file_size: attachment.and_then(|a| a.size),
            mime_type: attachment.and_then(|a| a.mime_type.clone()),
            sender_id: Some(sender_id),
            created_at: Some(self.timestamp.to_rfc3339()),
            duration,
            receiver_id: Some(receiver_id),
        }
    }

    pub fn kind(&self) -> MessageKind {
        match &self.content {
            MessageContent::Text { .. } => MessageKind::Text,
            MessageContent::Image { .. } => MessageKind::Image,
            MessageContent::File { .. } => MessageKind::File,
            MessageContent::Voice { .. } => MessageKind::Voice,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        match &self.content {
            MessageContent::Text { .. } => None,
            MessageContent::Image { attachment }
            | MessageContent::File { attachment }
            | MessageContent::Voice { attachment, .. } => Some(attachment),
        }
    }
}

/// Generates an id for an offline-authored message from the send timestamp,
/// de-duplicating against the loaded set so rapid sends within the same
/// millisecond stay unique.
pub(crate) fn local_message_id(now: DateTime<Utc>, existing: &[Message]) -> String {
    let base = now.timestamp_millis().to_string();
    if !existing.iter().any(|m| m.id == base) {
        return base;
    }
    let mut n = 1;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !existing.iter().any(|m| m.id == candidate) {
            return candidate;
        }
        n += 1;
    }
}
