use redis::Client;
use redis::aio::ConnectionManager;

/// Connect to the queue broker and return an async connection manager.
///
/// The manager transparently reconnects after broker hiccups, so a consumer
/// that blocks on reads for most of its life does not need its own
/// reconnect handling.
pub async fn connect(redis_url: &str) -> anyhow::Result<ConnectionManager> {
    let client = Client::open(redis_url)?;
    let manager = ConnectionManager::new(client).await?;

    tracing::info!("Connected to queue broker");
    Ok(manager)
}
