//! Consumer loop — drives each queue message through the delivery pipeline.
//!
//! State machine per message:
//! decode → dedup check → render → dispatch → disposition. Messages are
//! processed strictly one at a time: the loop does not read the next
//! message until the current one is disposed, and a message that enters the
//! pipeline runs to its disposition without interruption.

use std::time::Duration;

use courier_common::types::QueueDisposition;
use courier_decoders::decode_delivery;
use courier_engine::dedup::IdempotencyGuard;
use courier_engine::renderer::NotificationRenderer;
use courier_mailer::dispatcher::MailDispatcher;
use courier_mailer::transport::MailTransport;

use crate::queue::{DeliveryQueue, InboundDelivery};

/// How long to pause after a queue-side error before retrying.
const QUEUE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Single consumer over the delivery queue.
pub struct DeliveryWorker<T> {
    guard: IdempotencyGuard,
    dispatcher: MailDispatcher<T>,
}

impl<T: MailTransport> DeliveryWorker<T> {
    pub fn new(dispatcher: MailDispatcher<T>) -> Self {
        Self {
            guard: IdempotencyGuard::new(),
            dispatcher,
        }
    }

    /// Start the consume loop. Runs indefinitely until the task is cancelled.
    pub async fn run<Q: DeliveryQueue>(&mut self, queue: &mut Q) -> anyhow::Result<()> {
        loop {
            let delivery = match queue.next().await {
                Ok(Some(delivery)) => delivery,
                // Poll window elapsed with no message, keep waiting
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!(error = %e, "Queue read failed, retrying");
                    tokio::time::sleep(QUEUE_RETRY_DELAY).await;
                    continue;
                }
            };

            let disposition = self.handle(&delivery.payload).await;
            self.dispose(queue, &delivery, disposition).await;
        }
    }

    /// Drive one raw payload through the pipeline and resolve its
    /// disposition.
    ///
    /// Every non-duplicate, non-success path ends in `RejectNoRequeue`;
    /// nothing is silently dropped.
    pub async fn handle(&mut self, payload: &[u8]) -> QueueDisposition {
        tracing::debug!(bytes = payload.len(), "Received delivery message");

        let request = match decode_delivery(payload) {
            Ok(request) => request,
            Err(e) => {
                // A malformed payload will never decode; dead-letter it
                // rather than retrying.
                tracing::warn!(error = %e, "Undecodable payload, dead-lettering");
                return QueueDisposition::RejectNoRequeue;
            }
        };

        if self.guard.has_processed(&request) {
            tracing::info!(
                request_id = request.dedup_key().unwrap_or_default(),
                "Duplicate request, acknowledging without send"
            );
            return QueueDisposition::Acknowledge;
        }

        let email = NotificationRenderer::render(&request);

        match self.dispatcher.send(&email).await {
            Ok(()) => {
                // Mark before the queue acknowledgment: a crash in between
                // leaves the message pending (redelivered, then deduplicated
                // here) rather than lost.
                self.guard.mark_processed(&request);
                tracing::info!(
                    request_id = request.dedup_key().unwrap_or_default(),
                    to = %email.to,
                    "Delivery processed"
                );
                QueueDisposition::Acknowledge
            }
            Err(e) => {
                tracing::error!(
                    request_id = request.dedup_key().unwrap_or_default(),
                    error = %e,
                    "Dispatch failed, dead-lettering"
                );
                QueueDisposition::RejectNoRequeue
            }
        }
    }

    /// Get the number of identifiers remembered as sent (for monitoring).
    pub fn processed_count(&self) -> usize {
        self.guard.tracked_count()
    }

    /// Apply the resolved disposition to the queue.
    ///
    /// A queue-side failure here leaves the message pending; the broker
    /// redelivers it and the idempotency guard suppresses a second send.
    async fn dispose<Q: DeliveryQueue>(
        &self,
        queue: &mut Q,
        delivery: &InboundDelivery,
        disposition: QueueDisposition,
    ) {
        let result = match disposition {
            QueueDisposition::Acknowledge => queue.acknowledge(delivery).await,
            QueueDisposition::RejectNoRequeue => queue.reject(delivery).await,
        };

        if let Err(e) = result {
            tracing::error!(
                entry_id = %delivery.entry_id,
                disposition = %disposition,
                error = %e,
                "Failed to apply queue disposition"
            );
        }
    }
}
