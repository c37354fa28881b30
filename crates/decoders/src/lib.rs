//! Inbound payload decoding.
//!
//! Parses the raw bytes pulled off the delivery queue into a structured
//! [`DeliveryRequest`]. A payload that fails to decode is unprocessable:
//! it will never decode on a later attempt, so the caller routes it to the
//! dead-letter path instead of retrying.

use serde::Deserialize;
use serde_json::Value;

use courier_common::error::DecodeError;
use courier_common::types::DeliveryRequest;

/// Wire shape of an inbound delivery payload.
#[derive(Debug, Deserialize)]
struct RawDelivery {
    /// Accepts any JSON type. Only a non-empty string survives as a
    /// dedup identity; anything else makes the request non-deduplicable
    /// rather than failing the whole payload.
    #[serde(default)]
    request_id: Value,

    #[serde(default)]
    user_data: RawUserData,
}

#[derive(Debug, Default, Deserialize)]
struct RawUserData {
    email: Option<String>,
    name: Option<String>,
}

/// Decode a raw queue payload into a [`DeliveryRequest`].
///
/// Malformed JSON or a structurally wrong `user_data` is a [`DecodeError`].
/// A missing, empty, or non-string `request_id` is not: the request decodes
/// with `request_id = None` and is processed without deduplication.
pub fn decode_delivery(payload: &[u8]) -> Result<DeliveryRequest, DecodeError> {
    let raw: RawDelivery = serde_json::from_slice(payload)?;

    let request_id = match raw.request_id {
        Value::String(id) if !id.is_empty() => Some(id),
        Value::String(_) | Value::Null => None,
        other => {
            tracing::warn!(value = %other, "Non-string request_id, treating request as non-deduplicable");
            None
        }
    };

    Ok(DeliveryRequest {
        request_id,
        recipient_email: raw.user_data.email,
        recipient_name: raw.user_data.name,
    })
}
