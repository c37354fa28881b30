use serde::Deserialize;
use uuid::Uuid;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Redis connection string (queue broker endpoint)
    pub redis_url: String,

    /// Stream key the consumer reads delivery requests from
    pub delivery_stream: String,

    /// Stream key rejected messages are routed to
    pub dead_letter_stream: String,

    /// Consumer group name on the delivery stream
    pub consumer_group: String,

    /// Per-process consumer name within the group (default: courier-<uuid>)
    pub consumer_name: String,

    /// Resend API key for email delivery
    pub resend_api_key: String,

    /// Resend API endpoint (override to point at a test double)
    pub resend_api_url: String,

    /// Email sender address
    pub email_from: String,

    /// Maximum send attempts per message before dead-lettering
    pub dispatch_max_attempts: u32,

    /// Exponential backoff multiplier between send attempts, in seconds
    pub backoff_multiplier_secs: u64,

    /// Minimum wait between send attempts, in seconds
    pub backoff_floor_secs: u64,

    /// Maximum wait between send attempts, in seconds
    pub backoff_ceiling_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            delivery_stream: std::env::var("DELIVERY_STREAM")
                .unwrap_or_else(|_| "email.queue".to_string()),
            dead_letter_stream: std::env::var("DEAD_LETTER_STREAM")
                .unwrap_or_else(|_| "email.failed".to_string()),
            consumer_group: std::env::var("CONSUMER_GROUP")
                .unwrap_or_else(|_| "couriers".to_string()),
            consumer_name: std::env::var("CONSUMER_NAME")
                .unwrap_or_else(|_| format!("courier-{}", Uuid::new_v4())),
            resend_api_key: std::env::var("RESEND_API_KEY")
                .map_err(|_| anyhow::anyhow!("RESEND_API_KEY environment variable is required"))?,
            resend_api_url: std::env::var("RESEND_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com/emails".to_string()),
            email_from: std::env::var("EMAIL_FROM")
                .map_err(|_| anyhow::anyhow!("EMAIL_FROM environment variable is required"))?,
            dispatch_max_attempts: std::env::var("DISPATCH_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DISPATCH_MAX_ATTEMPTS must be a valid u32"))?,
            backoff_multiplier_secs: std::env::var("BACKOFF_MULTIPLIER_SECS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("BACKOFF_MULTIPLIER_SECS must be a valid u64"))?,
            backoff_floor_secs: std::env::var("BACKOFF_FLOOR_SECS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("BACKOFF_FLOOR_SECS must be a valid u64"))?,
            backoff_ceiling_secs: std::env::var("BACKOFF_CEILING_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("BACKOFF_CEILING_SECS must be a valid u64"))?,
        })
    }
}
