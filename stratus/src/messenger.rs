//! Client notification channel and push payload shaping.
//!
//! The messenger is a one-way, best-effort broadcast to every controlled
//! page instance. Nothing in the engine depends on delivery: a message sent
//! with no subscribers is dropped, and that is fine by contract.
//!
//! Push payloads arrive as opaque JSON. They are shaped into a
//! [`NotificationPayload`] whose fields all carry defaults, so a partial
//! payload merges over the defaults and a malformed one is swallowed and
//! replaced by them entirely. Presenting the notification is the host's
//! concern.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::warn;

/// How many undelivered messages a slow subscriber may lag behind.
const CHANNEL_CAPACITY: usize = 16;

/// A message posted to all controlled clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Activation finished; this worker now controls all clients.
    #[serde(rename = "WORKER_READY")]
    WorkerReady {
        /// Human-readable status line.
        message: String,
    },
    /// Install failed; the candidate worker was discarded.
    #[serde(rename = "WORKER_ERROR")]
    WorkerError {
        /// What went wrong.
        message: String,
    },
    /// A shaped push payload, republished for presentation by the host.
    #[serde(rename = "NOTIFICATION")]
    Notification {
        /// The shaped payload.
        payload: NotificationPayload,
    },
}

impl ClientMessage {
    /// The message posted after successful activation.
    pub fn worker_ready() -> Self {
        ClientMessage::WorkerReady {
            message: "worker activated and controlling clients".to_owned(),
        }
    }

    /// The message posted after a failed install.
    pub fn worker_error(message: impl Into<String>) -> Self {
        ClientMessage::WorkerError {
            message: message.into(),
        }
    }
}

/// A push notification payload with defaults for every field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationPayload {
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub body: String,
    /// Icon resource path.
    pub icon: String,
    /// Badge resource path.
    pub badge: String,
    /// Replacement tag; a new notification with the same tag replaces the
    /// old one.
    pub tag: String,
    /// Whether re-posting the same tag should re-alert.
    pub renotify: bool,
    /// Whether the notification stays until dismissed.
    pub require_interaction: bool,
    /// URL opened when the notification is activated.
    pub url: String,
}

impl Default for NotificationPayload {
    fn default() -> Self {
        Self {
            title: "Stratus".to_owned(),
            body: "Your update is ready".to_owned(),
            icon: "/icons/icon-192x192.png".to_owned(),
            badge: "/icons/badge-72x72.png".to_owned(),
            tag: "stratus-notification".to_owned(),
            renotify: true,
            require_interaction: false,
            url: "/".to_owned(),
        }
    }
}

impl NotificationPayload {
    /// Shapes a raw push payload.
    ///
    /// Missing fields take their defaults; malformed JSON is swallowed and
    /// the whole default payload is substituted.
    pub fn from_json(raw: &[u8]) -> Self {
        match serde_json::from_slice(raw) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "malformed push payload, substituting defaults");
                Self::default()
            }
        }
    }
}

/// An action a client reported back for a presented notification.
///
/// Action tags are host strings; anything unrecognized is treated as
/// [`NotificationAction::Open`], the explicit default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    /// Open (or focus) the payload's URL.
    Open,
    /// Dismiss without opening.
    Dismiss,
}

impl NotificationAction {
    /// Maps a host action tag to an action.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "open" => NotificationAction::Open,
            "close" | "dismiss" => NotificationAction::Dismiss,
            _ => NotificationAction::Open,
        }
    }
}

/// Best-effort broadcast channel to all controlled clients.
///
/// Clones share the same channel. Subscribers joining late only observe
/// messages posted after they subscribed.
#[derive(Debug, Clone)]
pub struct ClientMessenger {
    sender: broadcast::Sender<ClientMessage>,
}

impl ClientMessenger {
    /// Creates a messenger with no subscribers.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Subscribes a client to future messages.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientMessage> {
        self.sender.subscribe()
    }

    /// Posts a message to every current subscriber. Fire-and-forget: having
    /// no subscribers is not an error.
    pub fn post_to_all(&self, message: ClientMessage) {
        let _ = self.sender.send(message);
    }
}

impl Default for ClientMessenger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_payload_merges_over_defaults() {
        let payload =
            NotificationPayload::from_json(br#"{"title": "Deploy done", "url": "/changelog"}"#);
        assert_eq!(payload.title, "Deploy done");
        assert_eq!(payload.url, "/changelog");
        assert_eq!(payload.body, NotificationPayload::default().body);
    }

    #[test]
    fn malformed_payload_substitutes_defaults() {
        let payload = NotificationPayload::from_json(b"{not json");
        assert_eq!(payload, NotificationPayload::default());
    }

    #[test]
    fn unknown_action_tag_defaults_to_open() {
        assert_eq!(NotificationAction::from_tag("open"), NotificationAction::Open);
        assert_eq!(
            NotificationAction::from_tag("close"),
            NotificationAction::Dismiss
        );
        assert_eq!(
            NotificationAction::from_tag("snooze"),
            NotificationAction::Open
        );
    }

    #[tokio::test]
    async fn posting_without_subscribers_is_fine() {
        let messenger = ClientMessenger::new();
        messenger.post_to_all(ClientMessage::worker_ready());

        let mut receiver = messenger.subscribe();
        messenger.post_to_all(ClientMessage::worker_error("boom"));
        assert_eq!(
            receiver.recv().await.unwrap(),
            ClientMessage::worker_error("boom")
        );
    }
}
