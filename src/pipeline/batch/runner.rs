//! BatchRunner: walks a batch through encode → extract → sanitize.
//!
//! Runs sequentially, one outbound model request at a time. Intended to run
//! on a blocking thread (`spawn_blocking` from the HTTP layer, or directly
//! from the CLI).

use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use super::error::DigitizeError;
use super::types::*;
use crate::models::report::ReportStatus;
use crate::pipeline::import::encode::{encode_file, BatchFile};
use crate::pipeline::structuring::gemini::ExtractionClient;
use crate::pipeline::structuring::parser::{parse_extraction_response, ParsedExtraction};
use crate::pipeline::structuring::variants::ModelVariant;
use crate::store::{ReportStore, StoreError};

pub struct BatchRunner {
    client: Arc<dyn ExtractionClient>,
}

/// What happened to one item.
enum ItemOutcome {
    Stored(ReportStatus, Option<ItemError>),
    Discarded,
}

impl BatchRunner {
    pub fn new(client: Arc<dyn ExtractionClient>) -> Self {
        Self { client }
    }

    /// Create one `processing` record per file, in submission order.
    ///
    /// Runs before any slow work so callers can hand the ids back at once.
    pub fn intake(&self, store: &ReportStore, files: &[BatchFile]) -> Result<BatchTicket, StoreError> {
        let batch_id = Uuid::new_v4();
        let record_ids = files
            .iter()
            .map(|file| store.create_processing(batch_id, &file.filename))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(batch_id = %batch_id, files = record_ids.len(), "Batch accepted");
        Ok(BatchTicket {
            batch_id,
            record_ids,
        })
    }

    /// Process every file of an accepted batch.
    ///
    /// Never fails as a whole: each item ends as `completed`, `error`, or
    /// discarded if its record was deleted meanwhile.
    pub fn process(
        &self,
        store: &ReportStore,
        ticket: &BatchTicket,
        files: &[BatchFile],
        variant: ModelVariant,
        progress_fn: Option<&dyn Fn(BatchStatusEvent)>,
    ) -> BatchResult {
        let start = Instant::now();
        let total = ticket.record_ids.len() as u32;
        let emit = |event: BatchStatusEvent| {
            if let Some(progress) = progress_fn {
                progress(event);
            }
        };

        emit(BatchStatusEvent::Started {
            batch_id: ticket.batch_id,
            total,
        });

        let mut result = BatchResult {
            batch_id: ticket.batch_id,
            record_ids: ticket.record_ids.clone(),
            completed: 0,
            failed: 0,
            discarded: 0,
            errors: Vec::new(),
            duration_ms: 0,
        };

        for (index, (record_id, file)) in ticket.record_ids.iter().zip(files).enumerate() {
            let record_id = *record_id;
            emit(BatchStatusEvent::ItemStarted {
                record_id,
                filename: file.filename.clone(),
                index: index as u32,
                total,
            });

            let span = tracing::info_span!(
                "document",
                record_id = %record_id,
                filename = %file.filename,
                model = variant.as_str()
            );
            let _enter = span.enter();

            match self.process_item(store, record_id, file, variant) {
                ItemOutcome::Stored(status, error) => {
                    let message = error.as_ref().map(|e| e.message.clone());
                    if status == ReportStatus::Completed {
                        result.completed += 1;
                    } else {
                        result.failed += 1;
                    }
                    result.errors.extend(error);
                    emit(BatchStatusEvent::ItemFinished {
                        record_id,
                        status,
                        error: message,
                    });
                }
                ItemOutcome::Discarded => {
                    result.discarded += 1;
                    emit(BatchStatusEvent::ItemDiscarded { record_id });
                }
            }
        }

        if files.len() != ticket.record_ids.len() {
            tracing::warn!(
                batch_id = %ticket.batch_id,
                files = files.len(),
                records = ticket.record_ids.len(),
                "File and record counts differ; extra entries ignored"
            );
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            batch_id = %ticket.batch_id,
            completed = result.completed,
            failed = result.failed,
            discarded = result.discarded,
            elapsed_ms = result.duration_ms,
            "Batch finished"
        );

        emit(BatchStatusEvent::Completed {
            completed: result.completed,
            failed: result.failed,
            duration_ms: result.duration_ms,
        });

        result
    }

    fn process_item(
        &self,
        store: &ReportStore,
        record_id: Uuid,
        file: &BatchFile,
        variant: ModelVariant,
    ) -> ItemOutcome {
        match store.contains(record_id) {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("Record deleted before processing, skipping");
                return ItemOutcome::Discarded;
            }
            Err(e) => return self.store_failure(record_id, file, e),
        }

        let started = Instant::now();
        let outcome = self.digitize(store, record_id, file, variant);

        let stored = match outcome {
            Ok(parsed) => {
                if !parsed.missing_required.is_empty() {
                    tracing::warn!(
                        missing = ?parsed.missing_required,
                        "Reply lacked required fields; stored with empty values"
                    );
                }
                store
                    .complete(record_id, parsed.data, parsed.confidence_score)
                    .map(|_| (ReportStatus::Completed, None))
            }
            Err(e) => {
                let kind = e.kind();
                let message = e.to_string();
                tracing::warn!(kind = kind.as_str(), error = %e, "Document failed");
                store.fail(record_id, kind, message.clone()).map(|_| {
                    let error = ItemError {
                        record_id,
                        filename: file.filename.clone(),
                        kind,
                        message,
                    };
                    (ReportStatus::Error, Some(error))
                })
            }
        };

        match stored {
            Ok((status, error)) => {
                tracing::info!(
                    status = status.as_str(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Document processed"
                );
                ItemOutcome::Stored(status, error)
            }
            Err(StoreError::NotFound(_)) => {
                tracing::warn!("Record deleted while in flight, result discarded");
                ItemOutcome::Discarded
            }
            Err(e) => self.store_failure(record_id, file, e),
        }
    }

    /// encode → preview → extract → sanitize.
    fn digitize(
        &self,
        store: &ReportStore,
        record_id: Uuid,
        file: &BatchFile,
        variant: ModelVariant,
    ) -> Result<ParsedExtraction, DigitizeError> {
        let document = encode_file(file)?;

        if let Err(e) = store.attach_source_image(record_id, document.to_data_url()) {
            tracing::debug!(error = %e, "Could not attach source preview");
        }

        let raw = self.client.extract(&document, variant)?;
        let parsed = parse_extraction_response(&raw)?;
        Ok(parsed)
    }

    fn store_failure(&self, record_id: Uuid, file: &BatchFile, e: StoreError) -> ItemOutcome {
        tracing::error!(error = %e, "Could not record document outcome");
        ItemOutcome::Stored(
            ReportStatus::Error,
            Some(ItemError {
                record_id,
                filename: file.filename.clone(),
                kind: crate::models::report::FailureKind::Extraction,
                message: e.to_string(),
            }),
        )
    }
}

/// Intake followed by processing, for callers that do not need the ids early.
pub fn run_batch(
    runner: &BatchRunner,
    store: &ReportStore,
    files: &[BatchFile],
    variant: ModelVariant,
    progress_fn: Option<&dyn Fn(BatchStatusEvent)>,
) -> Result<BatchResult, StoreError> {
    let ticket = runner.intake(store, files)?;
    Ok(runner.process(store, &ticket, files, variant, progress_fn))
}
