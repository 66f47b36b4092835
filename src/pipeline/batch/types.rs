use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::report::{FailureKind, ReportStatus};
use crate::pipeline::structuring::variants::ModelVariant;

// ═══════════════════════════════════════════
// Intake
// ═══════════════════════════════════════════

/// Ids handed out at intake, one per file, in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTicket {
    pub batch_id: Uuid,
    pub record_ids: Vec<Uuid>,
}

// ═══════════════════════════════════════════
// Progress events
// ═══════════════════════════════════════════

/// Emitted by the runner while a batch is processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum BatchStatusEvent {
    Started {
        batch_id: Uuid,
        total: u32,
    },
    ItemStarted {
        record_id: Uuid,
        filename: String,
        index: u32,
        total: u32,
    },
    ItemFinished {
        record_id: Uuid,
        status: ReportStatus,
        error: Option<String>,
    },
    /// The record was deleted while in flight; its result was dropped.
    ItemDiscarded {
        record_id: Uuid,
    },
    Completed {
        completed: u32,
        failed: u32,
        duration_ms: u64,
    },
}

// ═══════════════════════════════════════════
// Results
// ═══════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemError {
    pub record_id: Uuid,
    pub filename: String,
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub batch_id: Uuid,
    pub record_ids: Vec<Uuid>,
    pub completed: u32,
    pub failed: u32,
    /// Items whose record disappeared before the result could be stored.
    pub discarded: u32,
    pub errors: Vec<ItemError>,
    pub duration_ms: u64,
}

// ═══════════════════════════════════════════
// Progress snapshot (polled over HTTP)
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Running,
    Finished,
}

/// Folded view of a batch's event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    pub batch_id: Uuid,
    pub model: ModelVariant,
    pub state: BatchState,
    pub total: u32,
    pub processed: u32,
    pub completed: u32,
    pub failed: u32,
    pub discarded: u32,
    pub current_filename: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
}

impl BatchProgress {
    pub fn new(ticket: &BatchTicket, model: ModelVariant) -> Self {
        Self {
            batch_id: ticket.batch_id,
            model,
            state: BatchState::Running,
            total: ticket.record_ids.len() as u32,
            processed: 0,
            completed: 0,
            failed: 0,
            discarded: 0,
            current_filename: None,
            started_at: Utc::now(),
            finished_at: None,
            duration_ms: None,
        }
    }

    pub fn apply(&mut self, event: &BatchStatusEvent) {
        match event {
            BatchStatusEvent::Started { total, .. } => self.total = *total,
            BatchStatusEvent::ItemStarted { filename, .. } => {
                self.current_filename = Some(filename.clone());
            }
            BatchStatusEvent::ItemFinished { status, .. } => {
                self.processed += 1;
                match status {
                    ReportStatus::Completed => self.completed += 1,
                    _ => self.failed += 1,
                }
            }
            BatchStatusEvent::ItemDiscarded { .. } => {
                self.processed += 1;
                self.discarded += 1;
            }
            BatchStatusEvent::Completed { duration_ms, .. } => {
                self.state = BatchState::Finished;
                self.current_filename = None;
                self.finished_at = Some(Utc::now());
                self.duration_ms = Some(*duration_ms);
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state == BatchState::Finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serde_is_tagged_camel_case() {
        let event = BatchStatusEvent::ItemStarted {
            record_id: Uuid::nil(),
            filename: "a.jpg".into(),
            index: 0,
            total: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ItemStarted");
        assert_eq!(json["recordId"], Uuid::nil().to_string());
        assert_eq!(json["total"], 3);
    }

    #[test]
    fn progress_folds_events() {
        let ticket = BatchTicket {
            batch_id: Uuid::new_v4(),
            record_ids: vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()],
        };
        let mut progress = BatchProgress::new(&ticket, ModelVariant::Pro);
        assert_eq!(progress.total, 3);

        progress.apply(&BatchStatusEvent::ItemStarted {
            record_id: ticket.record_ids[0],
            filename: "a.jpg".into(),
            index: 0,
            total: 3,
        });
        assert_eq!(progress.current_filename.as_deref(), Some("a.jpg"));

        progress.apply(&BatchStatusEvent::ItemFinished {
            record_id: ticket.record_ids[0],
            status: ReportStatus::Completed,
            error: None,
        });
        progress.apply(&BatchStatusEvent::ItemFinished {
            record_id: ticket.record_ids[1],
            status: ReportStatus::Error,
            error: Some("timeout".into()),
        });
        progress.apply(&BatchStatusEvent::ItemDiscarded {
            record_id: ticket.record_ids[2],
        });
        assert!(!progress.is_finished());

        progress.apply(&BatchStatusEvent::Completed {
            completed: 1,
            failed: 1,
            duration_ms: 42,
        });
        assert!(progress.is_finished());
        assert_eq!((progress.processed, progress.completed, progress.failed, progress.discarded), (3, 1, 1, 1));
        assert_eq!(progress.duration_ms, Some(42));
        assert!(progress.current_filename.is_none());
    }
}
