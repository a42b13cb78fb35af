use std::{sync::Arc, time::Duration};

use crate::{
    errors::{AppError, AppResult},
    models::domain::QuizAttempt,
    repositories::{QuizAttemptRepository, UserRepository},
};

/// Second step of attempt completion: folds a completed attempt into its
/// owner's aggregate score. Every write here is idempotent per attempt id, so
/// it can be retried or replayed after a crash without double counting.
pub struct ReconciliationService {
    attempts: Arc<dyn QuizAttemptRepository>,
    users: Arc<dyn UserRepository>,
    batch_size: i64,
}

impl ReconciliationService {
    pub fn new(
        attempts: Arc<dyn QuizAttemptRepository>,
        users: Arc<dyn UserRepository>,
        batch_size: i64,
    ) -> Self {
        Self {
            attempts,
            users,
            batch_size: batch_size.max(1),
        }
    }

    /// An attempt whose owner has been deleted has nothing to count and is
    /// marked reconciled so it is not replayed forever.
    pub async fn reconcile(&self, attempt: &QuizAttempt) -> AppResult<()> {
        match self
            .users
            .record_completed_attempt(&attempt.user_id, &attempt.id, attempt.score)
            .await
        {
            Ok(true) => {}
            Ok(false) => log::debug!(
                "Attempt {} was already counted for user {}",
                attempt.id,
                attempt.user_id
            ),
            Err(AppError::NotFound(_)) => log::warn!(
                "Owner {} of attempt {} no longer exists; skipping aggregate update",
                attempt.user_id,
                attempt.id
            ),
            Err(e) => return Err(e),
        }

        self.attempts.mark_reconciled(&attempt.id).await
    }

    /// Replays one batch of completed, unreconciled attempts. Returns how many
    /// were reconciled; failures are logged and left for the next run.
    pub async fn run_once(&self) -> AppResult<usize> {
        let pending = self.attempts.find_unreconciled(self.batch_size).await?;
        if pending.is_empty() {
            return Ok(0);
        }

        log::info!("Reconciling {} completed attempt(s)", pending.len());

        let mut repaired = 0;
        for attempt in &pending {
            match self.reconcile(attempt).await {
                Ok(()) => repaired += 1,
                Err(e) => log::warn!(
                    "Could not reconcile attempt {} for user {}: {}",
                    attempt.id,
                    attempt.user_id,
                    e
                ),
            }
        }

        Ok(repaired)
    }

    /// Runs `run_once` forever on a fixed interval.
    pub async fn run_periodically(self: Arc<Self>, every: Duration) {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once().await {
                log::error!("Reconciliation pass failed: {}", e);
            }
        }
    }
}
