//! Notification rendering — derives the outbound email from a request.
//!
//! Stands in for the user and template lookup services: a full system would
//! call those here and propagate their failures as a render error. As
//! written it is total over the request shape: missing fields get fixed
//! fallbacks, present fields are used verbatim even when they look wrong.

use courier_common::types::{DeliveryRequest, RenderedEmail};

/// Fallback recipient address when the request carries none.
pub const DEFAULT_RECIPIENT: &str = "default@example.com";

/// Fallback display name used to compose the body.
pub const DEFAULT_NAME: &str = "User";

/// Subject line for notification emails.
pub const NOTIFICATION_SUBJECT: &str = "Your Notification";

pub struct NotificationRenderer;

impl NotificationRenderer {
    /// Render a delivery request into an email ready for dispatch.
    pub fn render(request: &DeliveryRequest) -> RenderedEmail {
        let to = request
            .recipient_email
            .as_deref()
            .unwrap_or(DEFAULT_RECIPIENT);
        let name = request.recipient_name.as_deref().unwrap_or(DEFAULT_NAME);

        RenderedEmail {
            to: to.to_string(),
            subject: NOTIFICATION_SUBJECT.to_string(),
            html_body: format!(
                "<h1>Hello, {}!</h1><p>This is your notification.</p>",
                name
            ),
        }
    }
}
