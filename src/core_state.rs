//! Transport-agnostic application state.
//!
//! `CoreState` is the single shared state behind the HTTP API and the CLI.
//! Wrapped in `Arc` at startup; every field is either immutable or guarded.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::config::AppConfig;
use crate::pipeline::batch::{BatchProgress, BatchRunner, BatchStatusEvent, BatchTicket};
use crate::pipeline::structuring::gemini::ExtractionClient;
use crate::pipeline::structuring::variants::ModelVariant;
use crate::store::ReportStore;

/// Finished batch snapshots kept for polling. Running batches are never evicted.
pub const MAX_FINISHED_BATCHES: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock poisoned")]
    LockPoisoned,
}

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    pub config: AppConfig,
    store: Arc<ReportStore>,
    runner: Arc<BatchRunner>,
    /// Progress snapshots for polling, keyed by batch id.
    batches: RwLock<HashMap<Uuid, BatchProgress>>,
}

impl CoreState {
    pub fn new(config: AppConfig, client: Arc<dyn ExtractionClient>) -> Self {
        Self {
            config,
            store: Arc::new(ReportStore::new()),
            runner: Arc::new(BatchRunner::new(client)),
            batches: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<ReportStore> {
        &self.store
    }

    pub fn runner(&self) -> &Arc<BatchRunner> {
        &self.runner
    }

    // ── Batch progress ──────────────────────────

    pub fn register_batch(&self, ticket: &BatchTicket, model: ModelVariant) -> Result<(), CoreError> {
        let mut batches = self.batches.write().map_err(|_| CoreError::LockPoisoned)?;
        batches.insert(ticket.batch_id, BatchProgress::new(ticket, model));
        Ok(())
    }

    /// Fold one runner event into the batch's snapshot.
    pub fn record_event(&self, batch_id: Uuid, event: &BatchStatusEvent) -> Result<(), CoreError> {
        let mut batches = self.batches.write().map_err(|_| CoreError::LockPoisoned)?;
        let Some(progress) = batches.get_mut(&batch_id) else {
            return Ok(());
        };
        progress.apply(event);
        if progress.is_finished() {
            evict_finished(&mut batches, MAX_FINISHED_BATCHES);
        }
        Ok(())
    }

    pub fn batch_progress(&self, batch_id: Uuid) -> Result<Option<BatchProgress>, CoreError> {
        let batches = self.batches.read().map_err(|_| CoreError::LockPoisoned)?;
        Ok(batches.get(&batch_id).cloned())
    }

    pub fn active_batches(&self) -> Result<usize, CoreError> {
        let batches = self.batches.read().map_err(|_| CoreError::LockPoisoned)?;
        Ok(batches.values().filter(|b| !b.is_finished()).count())
    }
}

/// Drop the oldest finished snapshots beyond `keep`.
fn evict_finished(batches: &mut HashMap<Uuid, BatchProgress>, keep: usize) {
    let mut finished: Vec<_> = batches
        .values()
        .filter(|b| b.is_finished())
        .map(|b| (b.finished_at, b.batch_id))
        .collect();
    if finished.len() <= keep {
        return;
    }
    finished.sort();
    let excess = finished.len() - keep;
    for (_, batch_id) in finished.into_iter().take(excess) {
        batches.remove(&batch_id);
    }
    tracing::debug!(evicted = excess, "Finished batch snapshots evicted");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::structuring::gemini::MockExtractionClient;

    fn state() -> CoreState {
        CoreState::new(AppConfig::default(), Arc::new(MockExtractionClient::new("{}")))
    }

    #[test]
    fn unknown_batch_has_no_progress() {
        assert!(state().batch_progress(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn events_update_registered_batch() {
        let core = state();
        let ticket = BatchTicket {
            batch_id: Uuid::new_v4(),
            record_ids: vec![Uuid::new_v4()],
        };
        core.register_batch(&ticket, ModelVariant::Flash).unwrap();
        assert_eq!(core.active_batches().unwrap(), 1);

        core.record_event(
            ticket.batch_id,
            &BatchStatusEvent::Completed {
                completed: 1,
                failed: 0,
                duration_ms: 3,
            },
        )
        .unwrap();

        let progress = core.batch_progress(ticket.batch_id).unwrap().unwrap();
        assert!(progress.is_finished());
        assert_eq!(core.active_batches().unwrap(), 0);
    }

    fn finish(core: &CoreState, batch_id: Uuid) {
        core.record_event(
            batch_id,
            &BatchStatusEvent::Completed {
                completed: 0,
                failed: 0,
                duration_ms: 1,
            },
        )
        .unwrap();
    }

    fn register(core: &CoreState) -> Uuid {
        let ticket = BatchTicket {
            batch_id: Uuid::new_v4(),
            record_ids: Vec::new(),
        };
        core.register_batch(&ticket, ModelVariant::Flash).unwrap();
        ticket.batch_id
    }

    #[test]
    fn finished_snapshots_are_capped_oldest_first() {
        let core = state();
        let running = register(&core);
        for _ in 0..MAX_FINISHED_BATCHES + 3 {
            let id = register(&core);
            finish(&core, id);
        }

        let batches = core.batches.read().unwrap();
        assert_eq!(batches.len(), MAX_FINISHED_BATCHES + 1);
        assert!(batches.contains_key(&running));
        drop(batches);
        assert_eq!(core.active_batches().unwrap(), 1);
    }

    #[test]
    fn evict_keeps_running_batches() {
        let core = state();
        let running: Vec<Uuid> = (0..3).map(|_| register(&core)).collect();
        let done = register(&core);
        finish(&core, done);

        let mut batches = core.batches.write().unwrap();
        evict_finished(&mut batches, 0);
        assert_eq!(batches.len(), 3);
        assert!(running.iter().all(|id| batches.contains_key(id)));
        assert!(!batches.contains_key(&done));
    }

    #[test]
    fn events_for_unknown_batch_are_ignored() {
        let core = state();
        core.record_event(
            Uuid::new_v4(),
            &BatchStatusEvent::ItemDiscarded {
                record_id: Uuid::new_v4(),
            },
        )
        .unwrap();
        assert_eq!(core.active_batches().unwrap(), 0);
    }
}
