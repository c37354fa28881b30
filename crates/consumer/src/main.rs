use courier_common::broker;
use courier_common::config::AppConfig;
use courier_consumer::queue::RedisStreamQueue;
use courier_consumer::worker::DeliveryWorker;
use courier_mailer::dispatcher::{MailDispatcher, RetryPolicy};
use courier_mailer::transport::ResendTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courier_consumer=info,courier_mailer=info".into()),
        )
        .json()
        .init();

    tracing::info!("Courier consumer starting...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Connect to the queue broker
    let redis = broker::connect(&config.redis_url).await?;
    let mut queue = RedisStreamQueue::new(redis, &config).await?;

    // Wire up the dispatch pipeline
    let transport = ResendTransport::new(
        config.resend_api_url.clone(),
        config.resend_api_key.clone(),
        config.email_from.clone(),
    );
    let policy = RetryPolicy {
        max_attempts: config.dispatch_max_attempts,
        multiplier_secs: config.backoff_multiplier_secs,
        floor_secs: config.backoff_floor_secs,
        ceiling_secs: config.backoff_ceiling_secs,
    };
    let mut worker = DeliveryWorker::new(MailDispatcher::new(transport, policy));

    tracing::info!(stream = %config.delivery_stream, "Waiting for delivery messages");

    // Run with graceful shutdown on Ctrl+C
    tokio::select! {
        result = worker.run(&mut queue) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Consumer loop exited with error");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping gracefully...");
        }
    }

    tracing::info!("Courier consumer stopped.");
    Ok(())
}
