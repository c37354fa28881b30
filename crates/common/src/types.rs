use serde::{Deserialize, Serialize};

/// A decoded delivery request, the unit of work pulled off the queue.
///
/// All fields are optional at the wire level; the renderer substitutes
/// fallbacks for missing recipient data, and a missing identifier makes the
/// request non-deduplicable (it is processed, but never remembered).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRequest {
    /// Opaque identity key for deduplication, unique per logical notification
    pub request_id: Option<String>,
    /// Recipient address extracted from nested user data
    pub recipient_email: Option<String>,
    /// Recipient display name extracted from nested user data
    pub recipient_name: Option<String>,
}

impl DeliveryRequest {
    /// The key this request is deduplicated under.
    ///
    /// Returns `None` for a missing or empty `request_id`; such requests
    /// always look fresh and are never marked processed.
    pub fn dedup_key(&self) -> Option<&str> {
        self.request_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// A rendered email ready for the mail transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Result of a single mail-transport attempt.
///
/// `Sent` is terminal; `Failed` is transient and eligible for retry until
/// the attempt budget runs out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    Failed(String),
}

/// Terminal action taken on an inbound queue message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueDisposition {
    /// Remove the message from the queue
    Acknowledge,
    /// Route the message to the dead-letter destination, no requeue
    RejectNoRequeue,
}

impl std::fmt::Display for QueueDisposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueDisposition::Acknowledge => write!(f, "acknowledge"),
            QueueDisposition::RejectNoRequeue => write!(f, "reject_no_requeue"),
        }
    }
}
