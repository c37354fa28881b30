//! Idempotency guard — suppresses duplicate sends for redelivered requests.
//!
//! Tracks which request identifiers have already produced a successful send
//! in this process's lifetime. State is held in-memory:
//! - State is ephemeral — a restart forgets every mark, so a message
//!   redelivered after a crash between send and mark is sent again.
//!   The email side effect is therefore at-least-once, not exactly-once.
//! - A multi-consumer deployment would need this set to move to a shared
//!   keyed store (set-if-absent with a TTL) instead.

use std::collections::HashSet;

use courier_common::types::DeliveryRequest;

/// In-memory set of request identifiers that completed a successful send.
pub struct IdempotencyGuard {
    processed: HashSet<String>,
}

impl IdempotencyGuard {
    pub fn new() -> Self {
        Self {
            processed: HashSet::new(),
        }
    }

    /// Whether a send already succeeded for this request in this process
    /// lifetime.
    ///
    /// Requests without a dedup key (missing or empty `request_id`) always
    /// report `false`: they cannot be told apart, so each one attempts a
    /// fresh send. Absence of a mark does NOT mean the email was never
    /// sent; see the module docs on the crash window.
    pub fn has_processed(&self, request: &DeliveryRequest) -> bool {
        match request.dedup_key() {
            Some(id) => self.processed.contains(id),
            None => false,
        }
    }

    /// Remember a request as successfully sent.
    ///
    /// Called only after the transport confirms the send and before the
    /// queue acknowledgment, so a crash between the two leaves the message
    /// pending rather than lost. Requests without a dedup key are never
    /// remembered.
    pub fn mark_processed(&mut self, request: &DeliveryRequest) {
        if let Some(id) = request.dedup_key() {
            self.processed.insert(id.to_string());
        }
    }

    /// Get the number of remembered identifiers (for monitoring).
    pub fn tracked_count(&self) -> usize {
        self.processed.len()
    }
}

impl Default for IdempotencyGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_id(id: Option<&str>) -> DeliveryRequest {
        DeliveryRequest {
            request_id: id.map(str::to_string),
            recipient_email: None,
            recipient_name: None,
        }
    }

    #[test]
    fn test_fresh_request_is_unprocessed() {
        let guard = IdempotencyGuard::new();
        assert!(!guard.has_processed(&request_with_id(Some("r1"))));
    }

    #[test]
    fn test_marked_request_is_processed() {
        let mut guard = IdempotencyGuard::new();
        let request = request_with_id(Some("r1"));

        guard.mark_processed(&request);
        assert!(guard.has_processed(&request));
        assert_eq!(guard.tracked_count(), 1);
    }

    #[test]
    fn test_independent_identifiers() {
        let mut guard = IdempotencyGuard::new();
        guard.mark_processed(&request_with_id(Some("r1")));

        assert!(guard.has_processed(&request_with_id(Some("r1"))));
        assert!(!guard.has_processed(&request_with_id(Some("r2"))));
    }

    #[test]
    fn test_missing_identifier_never_processed() {
        let mut guard = IdempotencyGuard::new();
        let request = request_with_id(None);

        assert!(!guard.has_processed(&request));
        guard.mark_processed(&request);

        // Still unprocessed: unkeyed requests are never remembered
        assert!(!guard.has_processed(&request));
        assert_eq!(guard.tracked_count(), 0);
    }

    #[test]
    fn test_empty_identifier_never_processed() {
        let mut guard = IdempotencyGuard::new();
        let request = request_with_id(Some(""));

        guard.mark_processed(&request);
        assert!(!guard.has_processed(&request));
        assert_eq!(guard.tracked_count(), 0);
    }

    #[test]
    fn test_marking_is_idempotent() {
        let mut guard = IdempotencyGuard::new();
        let request = request_with_id(Some("r1"));

        guard.mark_processed(&request);
        guard.mark_processed(&request);
        assert_eq!(guard.tracked_count(), 1);
    }
}
