//! Queue adapter — a Redis Streams consumer group over the delivery stream.
//!
//! The broker side (stream durability, pending-entries redelivery) is
//! configured on Redis, not implemented here. Redis has no dead-letter
//! exchange of its own, so rejection diverts the payload to the configured
//! dead-letter stream before acknowledging the original. That routing is
//! this adapter's concern; the consumer loop only ever signals a
//! disposition.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use redis::streams::{StreamReadOptions, StreamReadReply};

use courier_common::config::AppConfig;
use courier_common::error::AppError;

/// Field under which the payload bytes are stored in a stream entry.
pub const PAYLOAD_FIELD: &str = "body";

/// How long one blocking read waits before returning empty, in milliseconds.
const READ_BLOCK_MS: usize = 5_000;

/// One message pulled off the queue, pending a disposition.
#[derive(Debug, Clone)]
pub struct InboundDelivery {
    /// Stream entry id, used to resolve the disposition
    pub entry_id: String,
    /// Raw payload bytes as published
    pub payload: Vec<u8>,
}

/// Queue collaborator driven by the consumer loop.
#[async_trait]
pub trait DeliveryQueue {
    /// Block until a message arrives or the poll window elapses (`None`).
    async fn next(&mut self) -> Result<Option<InboundDelivery>, AppError>;

    /// Remove the message from the queue.
    async fn acknowledge(&mut self, delivery: &InboundDelivery) -> Result<(), AppError>;

    /// Route the message to the dead-letter destination, no requeue.
    async fn reject(&mut self, delivery: &InboundDelivery) -> Result<(), AppError>;
}

/// Redis Streams implementation with a consumer group.
pub struct RedisStreamQueue {
    redis: ConnectionManager,
    stream: String,
    dead_letter_stream: String,
    group: String,
    consumer: String,
}

impl RedisStreamQueue {
    /// Create the queue adapter and ensure the consumer group exists.
    pub async fn new(mut redis: ConnectionManager, config: &AppConfig) -> Result<Self, AppError> {
        // XGROUP CREATE <stream> <group> $ MKSTREAM — a group that already
        // exists (BUSYGROUP) is fine, restarts must be clean.
        let created: Result<(), redis::RedisError> = redis
            .xgroup_create_mkstream(&config.delivery_stream, &config.consumer_group, "$")
            .await;
        if let Err(e) = created {
            if e.code() != Some("BUSYGROUP") {
                return Err(e.into());
            }
        }

        tracing::info!(
            stream = %config.delivery_stream,
            group = %config.consumer_group,
            consumer = %config.consumer_name,
            "Consumer group ready"
        );

        Ok(Self {
            redis,
            stream: config.delivery_stream.clone(),
            dead_letter_stream: config.dead_letter_stream.clone(),
            group: config.consumer_group.clone(),
            consumer: config.consumer_name.clone(),
        })
    }
}

#[async_trait]
impl DeliveryQueue for RedisStreamQueue {
    async fn next(&mut self) -> Result<Option<InboundDelivery>, AppError> {
        let options = StreamReadOptions::default()
            .group(&self.group, &self.consumer)
            .block(READ_BLOCK_MS)
            .count(1);

        let reply: StreamReadReply = self
            .redis
            .xread_options(&[&self.stream], &[">"], &options)
            .await?;

        let Some(entry) = reply.keys.into_iter().flat_map(|key| key.ids).next() else {
            return Ok(None);
        };

        let payload: Vec<u8> = entry.get(PAYLOAD_FIELD).ok_or_else(|| {
            AppError::Queue(format!(
                "stream entry {} has no '{}' field",
                entry.id, PAYLOAD_FIELD
            ))
        })?;

        Ok(Some(InboundDelivery {
            entry_id: entry.id,
            payload,
        }))
    }

    async fn acknowledge(&mut self, delivery: &InboundDelivery) -> Result<(), AppError> {
        let _: i64 = self
            .redis
            .xack(&self.stream, &self.group, &[&delivery.entry_id])
            .await?;

        tracing::debug!(entry_id = %delivery.entry_id, "Message acknowledged");
        Ok(())
    }

    async fn reject(&mut self, delivery: &InboundDelivery) -> Result<(), AppError> {
        let _: String = self
            .redis
            .xadd(
                &self.dead_letter_stream,
                "*",
                &[(PAYLOAD_FIELD, delivery.payload.as_slice())],
            )
            .await?;
        let _: i64 = self
            .redis
            .xack(&self.stream, &self.group, &[&delivery.entry_id])
            .await?;

        tracing::debug!(
            entry_id = %delivery.entry_id,
            dead_letter_stream = %self.dead_letter_stream,
            "Message moved to dead-letter stream"
        );
        Ok(())
    }
}
