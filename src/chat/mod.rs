//! Chat message pipeline.
//!
//! [`ChatSession`] composes the pieces for one chat screen instance: the
//! active conversation, the loaded message collection, the history fetch,
//! and the real-time transport. Voice capture and playback live in their own
//! state machines ([`voice::VoiceRecorder`], [`playback::PlaybackManager`])
//! that the shell owns alongside the session, feeding finished captures into
//! [`ChatSession::send_voice`].
//!
//! Delivery is best effort: an optimistic echo lands in the local list
//! synchronously, before the network dispatch completes, and cross-sender
//! ordering is only as good as each message's embedded timestamp.

pub mod attachments;
pub mod grouping;
pub mod message;
pub mod playback;
pub mod transport;
pub mod voice;

use std::sync::Arc;

use chrono::Utc;

use crate::api::ApiClient;
use crate::error::{Result, StrideError};
use crate::session_store::Session;
use crate::types::User;

use attachments::PickedFile;
use grouping::DateGroup;
use message::{Attachment, Message, MessageContent, Sender, WireMessage, local_message_id};
use transport::{MessageTransport, TransportConnector};
use voice::CapturedAudio;

/// One chat screen instance: zero or one active conversation, its loaded
/// messages, and the channel carrying live events for it.
pub struct ChatSession {
    api: Arc<ApiClient>,
    session: Session,
    connector: Arc<dyn TransportConnector>,
    active: Option<User>,
    messages: Vec<Message>,
    transport: Option<Box<dyn MessageTransport>>,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession").finish_non_exhaustive()
    }
}

impl ChatSession {
    pub fn new(
        api: Arc<ApiClient>,
        session: Session,
        connector: Arc<dyn TransportConnector>,
    ) -> Self {
        Self {
            api,
            session,
            connector,
            active: None,
            messages: Vec::new(),
            transport: None,
        }
    }

    pub fn active_conversation(&self) -> Option<&User> {
        self.active.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The rendered view: messages bucketed by local calendar day. Recomputed
    /// from the collection on every call.
    pub fn grouped_messages(&self) -> Vec<DateGroup> {
        grouping::group_messages(&self.messages)
    }

    /// Switches the active conversation to `friend`.
    ///
    /// The previous channel is closed before anything else happens, the
    /// displayed list is cleared, one history fetch scoped to the new friend
    /// runs and is merged, and a fresh channel opens. The history response is
    /// tagged with the conversation id it targeted and discarded if the
    /// active conversation changed while it was in flight.
    pub async fn open_conversation(&mut self, friend: User) -> Result<()> {
        self.close_conversation().await;

        let friend_id = friend.id;
        tracing::debug!(
            target: "stride::chat",
            "Opening conversation with {} ({})",
            friend.username,
            friend_id
        );
        self.active = Some(friend);

        let history = self
            .api
            .chat_history(&self.session.token, friend_id)
            .await?;
        self.apply_history(friend_id, &history);

        let transport = self.connector.connect(&self.session.token).await?;
        self.transport = Some(transport);
        Ok(())
    }

    /// Merges a history response into the session, unless it belongs to a
    /// conversation that is no longer active (a late response for an
    /// abandoned conversation must not overwrite the new one's list).
    pub fn apply_history(&mut self, conversation_id: u64, history: &[WireMessage]) {
        if self.active.as_ref().map(|f| f.id) != Some(conversation_id) {
            tracing::debug!(
                target: "stride::chat",
                "Discarding stale history response for conversation {}",
                conversation_id
            );
            return;
        }

        let received_at = Utc::now();
        let my_id = self.session.user.id;
        self.messages.extend(
            history
                .iter()
                .map(|wire| Message::from_wire(wire, my_id, received_at)),
        );
    }

    /// Leaves the current conversation: the channel is torn down and the
    /// message collection is discarded (messages are never cached locally).
    pub async fn close_conversation(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close().await;
        }
        self.active = None;
        self.messages.clear();
    }

    /// Sends a text message: immediate optimistic echo, then one outbound
    /// event stamped with the active friend as `receiver_id`.
    pub async fn send_text(&mut self, text: &str) -> Result<Message> {
        self.dispatch(MessageContent::Text {
            text: text.to_string(),
        })
        .await
    }

    /// Sends an image or file attachment via the two-phase workflow.
    ///
    /// Phase 1 uploads the bytes; any failure aborts the send before a
    /// message exists, leaving the local list untouched. Phase 2 builds the
    /// message from the returned `{url, name}` and dispatches it through the
    /// usual echo-and-emit path. Whether it goes out as an image or a file
    /// is decided by the picked file's MIME type.
    pub async fn send_attachment(&mut self, file: &PickedFile) -> Result<Message> {
        if self.active.is_none() {
            return Err(StrideError::NoActiveConversation);
        }

        let uploaded = self.api.upload_file(&self.session.token, file).await?;

        let attachment = Attachment {
            url: uploaded.url,
            name: uploaded.name,
            size: Some(file.size()),
            mime_type: file.mime_type.clone(),
        };
        let content = if file.is_image() {
            MessageContent::Image { attachment }
        } else {
            MessageContent::File { attachment }
        };
        self.dispatch(content).await
    }

    /// Sends a finished voice capture with its elapsed duration.
    pub async fn send_voice(
        &mut self,
        captured: CapturedAudio,
        duration_secs: u32,
    ) -> Result<Message> {
        let name = captured
            .location
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or("voice-message")
            .to_string();

        self.dispatch(MessageContent::Voice {
            attachment: Attachment {
                url: captured.location,
                name,
                size: None,
                mime_type: captured.mime_type,
            },
            duration_secs,
        })
        .await
    }

    /// Normalizes one inbound wire event and appends it. The sender
    /// indicator is resolved against the signed-in user's id, so an echo of
    /// the user's own message classifies as [`Sender::Me`].
    pub fn handle_inbound(&mut self, wire: &WireMessage) -> Message {
        let message = Message::from_wire(wire, self.session.user.id, Utc::now());
        self.messages.push(message.clone());
        message
    }

    /// Awaits the next live event from the channel and folds it into the
    /// collection. `None` once the channel is closed or before a
    /// conversation is open.
    pub async fn next_inbound(&mut self) -> Option<Message> {
        let wire = self.transport.as_mut()?.recv().await?;
        Some(self.handle_inbound(&wire))
    }

    async fn dispatch(&mut self, content: MessageContent) -> Result<Message> {
        let friend_id = match &self.active {
            Some(friend) => friend.id,
            None => return Err(StrideError::NoActiveConversation),
        };

        let now = Utc::now();
        let message = Message {
            id: local_message_id(now, &self.messages),
            sender: Sender::Me,
            timestamp: now,
            content,
        };

        // Optimistic echo: the sender sees their message before the network
        // dispatch completes
        self.messages.push(message.clone());

        let wire = message.to_wire(self.session.user.id, friend_id);
        match &self.transport {
            Some(transport) => transport.send(&wire).await?,
            None => {
                tracing::warn!(
                    target: "stride::chat",
                    "No chat channel open, cannot send message"
                );
            }
        }

        Ok(message)
    }
}
