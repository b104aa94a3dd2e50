//! State shared by the bot's handlers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::pipeline::{IngestOutcome, Ingestor};

/// Counters of what the bot has processed since start.
#[derive(Debug, Default)]
pub struct IngestCounters {
    stored: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`IngestCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub stored: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl IngestCounters {
    /// Counts one processing result.
    pub fn record<E>(&self, result: &std::result::Result<IngestOutcome, E>) {
        let counter = match result {
            Ok(IngestOutcome::Stored { .. }) => &self.stored,
            Ok(IngestOutcome::Skipped(_)) => &self.skipped,
            Err(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            stored: self.stored.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Shared state for the Telegram bot.
pub struct BotState {
    pub ingestor: Ingestor,
    /// Chat allowed to run admin commands; any chat when unset.
    pub alert_chat_id: Option<i64>,
    pub counters: IngestCounters,
    started_at: Instant,
}

impl BotState {
    pub fn new(ingestor: Ingestor, alert_chat_id: Option<i64>) -> Self {
        Self {
            ingestor,
            alert_chat_id,
            counters: IngestCounters::default(),
            started_at: Instant::now(),
        }
    }

    /// Returns true if `chat_id` may run admin commands.
    pub fn is_admin_chat(&self, chat_id: i64) -> bool {
        self.alert_chat_id.map_or(true, |id| id == chat_id)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Creates shared state wrapped in Arc.
pub fn create_shared_state(ingestor: Ingestor, alert_chat_id: Option<i64>) -> Arc<BotState> {
    Arc::new(BotState::new(ingestor, alert_chat_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SkipReason;

    #[test]
    fn test_counters() {
        let counters = IngestCounters::default();
        counters.record::<()>(&Ok(IngestOutcome::Stored { content_id: 1, post_id: 1 }));
        counters.record::<()>(&Ok(IngestOutcome::Skipped(SkipReason::NoUrls)));
        counters.record::<()>(&Ok(IngestOutcome::Skipped(SkipReason::Duplicate)));
        counters.record(&Err::<IngestOutcome, _>("boom"));

        assert_eq!(
            counters.snapshot(),
            CounterSnapshot {
                stored: 1,
                skipped: 2,
                failed: 1
            }
        );
    }
}
