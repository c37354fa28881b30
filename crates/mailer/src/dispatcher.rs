//! Bounded-retry mail dispatch with deterministic exponential backoff.
//!
//! One call to [`MailDispatcher::send`] makes up to `max_attempts` transport
//! attempts. A transport error on a non-final attempt waits out the computed
//! backoff and tries again; the same error on the final attempt surfaces as
//! a terminal [`DispatchError`]. A success at any attempt returns
//! immediately with no further attempts. No jitter; the schedule is
//! deterministic.

use std::time::Duration;

use courier_common::error::DispatchError;
use courier_common::types::{RenderedEmail, SendOutcome};

use crate::transport::MailTransport;

/// Retry schedule for send attempts.
///
/// The wait after the k-th failed attempt is
/// `min(ceiling, max(floor, multiplier * 2^(k-1)))` seconds. The defaults
/// (multiplier 4, floor 4, ceiling 10) produce waits of 4s and 8s between
/// the three attempts, with the ceiling clamping from the third failure on.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of transport attempts before giving up.
    pub max_attempts: u32,
    /// Base multiplier for exponential backoff, in seconds.
    pub multiplier_secs: u64,
    /// Minimum wait between attempts, in seconds.
    pub floor_secs: u64,
    /// Maximum wait between attempts, in seconds.
    pub ceiling_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier_secs: 4,
            floor_secs: 4,
            ceiling_secs: 10,
        }
    }
}

impl RetryPolicy {
    /// Wait before the next attempt, given `failed_attempts` failures so far.
    pub fn backoff_delay(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(63);
        let raw = self.multiplier_secs.saturating_mul(1u64 << exponent);
        Duration::from_secs(raw.max(self.floor_secs).min(self.ceiling_secs))
    }
}

/// Sends rendered messages through a [`MailTransport`] with bounded retry.
pub struct MailDispatcher<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: MailTransport> MailDispatcher<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Send one rendered message, retrying transient transport failures.
    ///
    /// Returns `Ok(())` as soon as an attempt succeeds. After the final
    /// failed attempt returns [`DispatchError`] carrying the attempt count
    /// and the last failure reason; no retry follows the final attempt.
    pub async fn send(&self, email: &RenderedEmail) -> Result<(), DispatchError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            tracing::debug!(to = %email.to, attempt, "Attempting to send email");

            match self.attempt(email).await {
                SendOutcome::Sent => {
                    tracing::info!(to = %email.to, attempt, "Email sent");
                    return Ok(());
                }
                SendOutcome::Failed(reason) => {
                    if attempt >= self.policy.max_attempts {
                        return Err(DispatchError {
                            attempts: attempt,
                            reason,
                        });
                    }

                    let delay = self.policy.backoff_delay(attempt);
                    tracing::warn!(
                        to = %email.to,
                        attempt,
                        delay_secs = delay.as_secs(),
                        reason = %reason,
                        "Send attempt failed, backing off before retry"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Run a single transport attempt and classify its outcome.
    async fn attempt(&self, email: &RenderedEmail) -> SendOutcome {
        match self.transport.send(email).await {
            Ok(()) => SendOutcome::Sent,
            Err(e) => SendOutcome::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    /// Transport that replays a scripted sequence of outcomes, then
    /// succeeds for any further attempts.
    struct ScriptedTransport {
        outcomes: Mutex<VecDeque<Result<(), String>>>,
        attempts: AtomicU32,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<Result<(), String>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                attempts: AtomicU32::new(0),
            })
        }

        fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MailTransport for ScriptedTransport {
        async fn send(&self, _email: &RenderedEmail) -> anyhow::Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            match self.outcomes.lock().unwrap().pop_front() {
                Some(Err(reason)) => Err(anyhow::anyhow!(reason)),
                Some(Ok(())) | None => Ok(()),
            }
        }
    }

    fn email() -> RenderedEmail {
        RenderedEmail {
            to: "a@b.com".to_string(),
            subject: "Your Notification".to_string(),
            html_body: "<h1>Hello, Ann!</h1>".to_string(),
        }
    }

    fn fail(reason: &str) -> Result<(), String> {
        Err(reason.to_string())
    }

    #[test]
    fn test_backoff_delay_default_schedule() {
        let policy = RetryPolicy::default();

        // 4*2^0=4, 4*2^1=8, then ceiling-clamped
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(4));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(8));
        assert_eq!(policy.backoff_delay(3), Duration::from_secs(10));
        assert_eq!(policy.backoff_delay(4), Duration::from_secs(10));
    }

    #[test]
    fn test_backoff_delay_floor_applies() {
        let policy = RetryPolicy {
            max_attempts: 5,
            multiplier_secs: 1,
            floor_secs: 4,
            ceiling_secs: 10,
        };

        // 1, 2 and 4 all floor to 4; 8 passes through; 16 hits the ceiling
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(4));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(4));
        assert_eq!(policy.backoff_delay(3), Duration::from_secs(4));
        assert_eq!(policy.backoff_delay(4), Duration::from_secs(8));
        assert_eq!(policy.backoff_delay(5), Duration::from_secs(10));
    }

    #[test]
    fn test_backoff_delay_large_attempt_does_not_overflow() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(200), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_send_succeeds_first_attempt() {
        let transport = ScriptedTransport::new(vec![Ok(())]);
        let dispatcher = MailDispatcher::new(transport.clone(), RetryPolicy::default());

        dispatcher.send(&email()).await.unwrap();
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_retries_then_succeeds() {
        let transport = ScriptedTransport::new(vec![fail("connection reset")]);
        let dispatcher = MailDispatcher::new(transport.clone(), RetryPolicy::default());

        dispatcher.send(&email()).await.unwrap();
        assert_eq!(transport.attempts(), 2, "Should stop as soon as an attempt succeeds");
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_waits_follow_backoff_schedule() {
        let transport = ScriptedTransport::new(vec![fail("timeout"), fail("timeout")]);
        let dispatcher = MailDispatcher::new(transport.clone(), RetryPolicy::default());

        let started = tokio::time::Instant::now();
        dispatcher.send(&email()).await.unwrap();

        // Exactly 3 attempts separated by the 4s and 8s backoff waits
        assert_eq!(transport.attempts(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_exhausts_attempt_budget() {
        let transport = ScriptedTransport::new(vec![
            fail("503 from provider"),
            fail("503 from provider"),
            fail("connection refused"),
        ]);
        let dispatcher = MailDispatcher::new(transport.clone(), RetryPolicy::default());

        let started = tokio::time::Instant::now();
        let err = dispatcher.send(&email()).await.unwrap_err();

        assert_eq!(transport.attempts(), 3);
        assert_eq!(err.attempts, 3);
        assert!(err.reason.contains("connection refused"), "Should carry the last failure reason");
        // No backoff wait after the final attempt
        assert_eq!(started.elapsed(), Duration::from_secs(12));
    }
}
