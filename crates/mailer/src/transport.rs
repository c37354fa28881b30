//! Mail transport — the seam to the external mail provider.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use courier_common::types::RenderedEmail;

/// Opaque send operation against the external mail provider.
///
/// An `Err` is a transient failure from the dispatcher's point of view;
/// the retry policy lives with the caller, not here.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &RenderedEmail) -> anyhow::Result<()>;
}

#[async_trait]
impl<T: MailTransport + ?Sized> MailTransport for Arc<T> {
    async fn send(&self, email: &RenderedEmail) -> anyhow::Result<()> {
        T::send(self, email).await
    }
}

/// Resend HTTP API transport.
pub struct ResendTransport {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl ResendTransport {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl MailTransport for ResendTransport {
    async fn send(&self, email: &RenderedEmail) -> anyhow::Result<()> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from.as_str(),
                "to": [email.to.as_str()],
                "subject": email.subject.as_str(),
                "html": email.html_body.as_str(),
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("mail provider returned {}: {}", status, body);
        }

        tracing::debug!(to = %email.to, status = %status, "Mail provider accepted message");
        Ok(())
    }
}
