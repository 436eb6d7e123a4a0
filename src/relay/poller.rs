//! # Settlement Poller
//!
//! Once an intent is published there is nothing left to decide — only to
//! find out. The poller asks the relay for the intent's status on a fixed
//! interval until one of three things happens:
//!
//! - **Settled** — the relay reports an on-chain transaction hash. The only
//!   success.
//! - **Failed** — the relay reports the intent terminally dead.
//! - **TimedOut** — the wait budget ran out with no terminal answer. This
//!   is *not* a failure: the intent is still out there and may yet settle.
//!   Nothing can cancel a published intent, so the poller's silence changes
//!   nothing on-chain — callers must not conclude the funds are lost.
//!
//! Timing runs on `tokio::time`, which keeps the loop testable under a
//! paused clock.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::{RelayTransport, SettlementStatus};
use crate::config::{DEFAULT_POLL_BUDGET, DEFAULT_POLL_INTERVAL};

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// The final word from a polling session.
#[derive(Clone, Debug)]
pub enum SettlementOutcome {
    /// The intent finalized on-chain.
    Settled { tx_hash: String },
    /// The relay reported the intent terminally failed.
    Failed { diagnostic: Option<serde_json::Value> },
    /// No terminal state within the budget. Indeterminate, not failed.
    TimedOut { elapsed: Duration },
}

// ---------------------------------------------------------------------------
// SettlementPoller
// ---------------------------------------------------------------------------

/// Fixed-interval, budget-bounded settlement polling.
#[derive(Clone, Debug)]
pub struct SettlementPoller {
    interval: Duration,
    budget: Duration,
}

impl SettlementPoller {
    /// Creates a poller with an explicit interval and total wait budget.
    pub fn new(interval: Duration, budget: Duration) -> Self {
        Self { interval, budget }
    }

    /// Polls until the intent reaches a terminal state or the budget runs
    /// out. The first status check happens immediately — an intent that
    /// settled before we started looking costs zero sleeps.
    ///
    /// # Errors
    ///
    /// Propagates transport-level failures from the relay. A relay that
    /// *answers* with bad news is an outcome, not an error.
    pub async fn wait<R: RelayTransport + ?Sized>(
        &self,
        relay: &R,
        intent_hash: &str,
    ) -> anyhow::Result<SettlementOutcome> {
        let started = tokio::time::Instant::now();

        loop {
            match relay.settlement_status(intent_hash).await? {
                SettlementStatus::Settled { tx_hash } => {
                    info!(intent_hash, %tx_hash, "intent settled");
                    return Ok(SettlementOutcome::Settled { tx_hash });
                }
                SettlementStatus::Failed { diagnostic } => {
                    warn!(intent_hash, ?diagnostic, "intent settlement failed");
                    return Ok(SettlementOutcome::Failed { diagnostic });
                }
                SettlementStatus::Pending => {
                    debug!(
                        intent_hash,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "intent still pending"
                    );
                }
            }

            if started.elapsed() + self.interval >= self.budget {
                let elapsed = started.elapsed();
                warn!(
                    intent_hash,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "settlement poll budget exhausted; intent may still settle"
                );
                return Ok(SettlementOutcome::TimedOut { elapsed });
            }

            tokio::time::sleep(self.interval).await;
        }
    }
}

impl Default for SettlementPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_POLL_BUDGET)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::{PublishAck, PublishIntentRequest};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Relay double that serves a scripted sequence of statuses. The last
    /// entry repeats once the script runs dry.
    struct ScriptedRelay {
        statuses: Mutex<VecDeque<SettlementStatus>>,
        polls: Mutex<u32>,
    }

    impl ScriptedRelay {
        fn new(statuses: impl IntoIterator<Item = SettlementStatus>) -> Self {
            Self {
                statuses: Mutex::new(statuses.into_iter().collect()),
                polls: Mutex::new(0),
            }
        }

        fn poll_count(&self) -> u32 {
            *self.polls.lock().unwrap()
        }
    }

    #[async_trait]
    impl RelayTransport for ScriptedRelay {
        async fn publish(&self, _request: &PublishIntentRequest) -> anyhow::Result<PublishAck> {
            unreachable!("poller tests never publish")
        }

        async fn settlement_status(
            &self,
            _intent_hash: &str,
        ) -> anyhow::Result<SettlementStatus> {
            *self.polls.lock().unwrap() += 1;
            let mut statuses = self.statuses.lock().unwrap();
            Ok(match statuses.len() {
                0 => SettlementStatus::Pending,
                1 => statuses.front().cloned().unwrap(),
                _ => statuses.pop_front().unwrap(),
            })
        }
    }

    fn fast_poller() -> SettlementPoller {
        SettlementPoller::new(Duration::from_millis(100), Duration::from_secs(5))
    }

    #[tokio::test(start_paused = true)]
    async fn settles_after_pending_polls() {
        let relay = ScriptedRelay::new([
            SettlementStatus::Pending,
            SettlementStatus::Pending,
            SettlementStatus::Settled {
                tx_hash: "0xfeed".to_string(),
            },
        ]);

        let outcome = fast_poller().wait(&relay, "intent-1").await.unwrap();
        match outcome {
            SettlementOutcome::Settled { tx_hash } => assert_eq!(tx_hash, "0xfeed"),
            other => panic!("expected settled, got {other:?}"),
        }
        assert_eq!(relay.poll_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_settlement_needs_one_poll() {
        let relay = ScriptedRelay::new([SettlementStatus::Settled {
            tx_hash: "0x1".to_string(),
        }]);
        let outcome = fast_poller().wait(&relay, "intent-1").await.unwrap();
        assert!(matches!(outcome, SettlementOutcome::Settled { .. }));
        assert_eq!(relay.poll_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_failure_stops_polling() {
        let relay = ScriptedRelay::new([
            SettlementStatus::Pending,
            SettlementStatus::Failed {
                diagnostic: Some(serde_json::json!({"reason": "expired"})),
            },
        ]);

        let outcome = fast_poller().wait(&relay, "intent-1").await.unwrap();
        match outcome {
            SettlementOutcome::Failed { diagnostic } => {
                assert_eq!(diagnostic.unwrap()["reason"], "expired");
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(relay.poll_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn budget_exhaustion_reports_timeout() {
        // A relay that never answers anything but pending.
        let relay = ScriptedRelay::new([SettlementStatus::Pending]);
        let poller = SettlementPoller::new(Duration::from_secs(1), Duration::from_secs(10));

        let outcome = poller.wait(&relay, "intent-1").await.unwrap();
        match outcome {
            SettlementOutcome::TimedOut { elapsed } => {
                assert!(elapsed <= Duration::from_secs(10));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        // 10s budget at 1s cadence: first poll at t=0, last at t=9.
        assert_eq!(relay.poll_count(), 10);
    }
}
