//! Sliding-window request budget
//!
//! Information Hiding:
//! - Timestamp bookkeeping and pruning hidden behind acquire()
//! - Lock is only held for the synchronous check-and-record step
//! - Shared across clients by handing out the same Arc

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Timestamps of recent call attempts within a trailing window.
///
/// At most `budget` attempts are recorded per `window`; callers beyond that
/// wait in [`RequestLedger::acquire`] until the oldest entry ages out.
#[derive(Debug)]
pub struct RequestLedger {
    attempts: Mutex<VecDeque<Instant>>,
    budget: usize,
    window: Duration,
}

impl RequestLedger {
    pub fn new(budget: usize, window: Duration) -> Self {
        let budget = budget.max(1);
        Self {
            attempts: Mutex::new(VecDeque::with_capacity(budget)),
            budget,
            window,
        }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Check the budget and record an attempt in one step.
    ///
    /// Returns the remaining deficit when the budget is spent; nothing is
    /// recorded in that case.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let now = Instant::now();
        let mut attempts = self.attempts.lock();
        self.prune(&mut attempts, now);

        if attempts.len() < self.budget {
            attempts.push_back(now);
            return Ok(());
        }

        // pruned entries are all inside the window, so the front is the oldest
        let oldest = attempts.front().copied().unwrap_or(now);
        let deficit = self.window.saturating_sub(now.duration_since(oldest));
        Err(deficit.max(Duration::from_millis(1)))
    }

    /// Wait until the budget allows another attempt, then record it.
    ///
    /// Dropping the returned future before it resolves records nothing.
    pub async fn acquire(&self) {
        loop {
            match self.try_acquire() {
                Ok(()) => return,
                Err(deficit) => {
                    tracing::info!(
                        "[RequestLedger] Rate limit reached, waiting {:.1} seconds",
                        deficit.as_secs_f64()
                    );
                    sleep(deficit).await;
                }
            }
        }
    }

    /// Number of attempts still inside the window.
    pub fn in_window(&self) -> usize {
        let mut attempts = self.attempts.lock();
        self.prune(&mut attempts, Instant::now());
        attempts.len()
    }

    fn prune(&self, attempts: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = attempts.front() {
            if now.duration_since(oldest) >= self.window {
                attempts.pop_front();
            } else {
                break;
            }
        }
    }
}
