//! In-memory report store.
//!
//! The authoritative collection of `DocumentRecord`s. Every mutation names
//! its target by id and replaces that record in place under the write lock,
//! so the batch worker and HTTP handlers never overwrite each other's edits
//! to other records.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use uuid::Uuid;

use crate::models::report::{
    DocumentRecord, FailureKind, FieldValue, ReportData, ReportField, ReportStatus,
};
use crate::pipeline::structuring::checkbox::{CheckboxGroup, CheckboxSelection};

#[derive(Error, Debug, PartialEq)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid status transition {from} -> {to}")]
    InvalidTransition { from: ReportStatus, to: ReportStatus },

    #[error("Record {0} is still processing")]
    RecordBusy(Uuid),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field {field} expects {expected}")]
    FieldType {
        field: ReportField,
        expected: &'static str,
    },

    #[error("Unknown option '{option}' for {group}")]
    UnknownOption { group: CheckboxGroup, option: String },

    #[error("Internal lock poisoned")]
    LockPoisoned,
}

#[derive(Debug, Default)]
pub struct ReportStore {
    records: RwLock<Vec<DocumentRecord>>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<DocumentRecord>>, StoreError> {
        self.records.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<DocumentRecord>>, StoreError> {
        self.records.write().map_err(|_| StoreError::LockPoisoned)
    }

    /// Apply `f` to the record with `id` and return a snapshot of the result.
    fn modify<F>(&self, id: Uuid, f: F) -> Result<DocumentRecord, StoreError>
    where
        F: FnOnce(&mut DocumentRecord) -> Result<(), StoreError>,
    {
        let mut records = self.write()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        f(record)?;
        record.touch();
        Ok(record.clone())
    }

    fn transition(record: &mut DocumentRecord, to: ReportStatus) -> Result<(), StoreError> {
        if !record.status.can_transition_to(to) {
            return Err(StoreError::InvalidTransition {
                from: record.status,
                to,
            });
        }
        record.status = to;
        Ok(())
    }

    // ── Lifecycle ───────────────────────────────

    /// Insert a new record already in `processing`.
    ///
    /// The `pending` state exists only inside this call, under the write lock.
    pub fn create_processing(&self, batch_id: Uuid, filename: &str) -> Result<Uuid, StoreError> {
        let mut record = DocumentRecord::new(batch_id, filename);
        Self::transition(&mut record, ReportStatus::Processing)?;
        let id = record.id;
        self.write()?.push(record);
        Ok(id)
    }

    /// Set the preview payload. Only the first call has an effect.
    pub fn attach_source_image(&self, id: Uuid, data_url: String) -> Result<(), StoreError> {
        self.modify(id, |record| {
            if record.source_image.is_none() {
                record.source_image = Some(data_url);
            }
            Ok(())
        })
        .map(|_| ())
    }

    pub fn complete(
        &self,
        id: Uuid,
        data: ReportData,
        confidence_score: f32,
    ) -> Result<DocumentRecord, StoreError> {
        self.modify(id, |record| {
            Self::transition(record, ReportStatus::Completed)?;
            record.extracted_data = data;
            record.confidence_score = confidence_score;
            record.error_detail = None;
            record.error_kind = None;
            Ok(())
        })
    }

    pub fn fail(
        &self,
        id: Uuid,
        kind: FailureKind,
        detail: String,
    ) -> Result<DocumentRecord, StoreError> {
        self.modify(id, |record| {
            Self::transition(record, ReportStatus::Error)?;
            record.error_kind = Some(kind);
            record.error_detail = Some(detail);
            Ok(())
        })
    }

    // ── Edits ───────────────────────────────────

    /// Replace one field of a finished record.
    pub fn update_field(
        &self,
        id: Uuid,
        field: ReportField,
        value: FieldValue,
    ) -> Result<DocumentRecord, StoreError> {
        self.modify(id, |record| {
            if record.status == ReportStatus::Processing {
                return Err(StoreError::RecordBusy(id));
            }
            match (field, value) {
                (ReportField::Materials, FieldValue::Materials(lines)) => {
                    record.extracted_data.materials = lines;
                }
                (ReportField::Materials, FieldValue::Text(_)) => {
                    return Err(StoreError::FieldType {
                        field,
                        expected: "a materials array",
                    });
                }
                (_, FieldValue::Text(text)) => {
                    if let Some(slot) = record.extracted_data.text_mut(field) {
                        *slot = text;
                    }
                }
                (_, FieldValue::Materials(_)) => {
                    return Err(StoreError::FieldType {
                        field,
                        expected: "a string",
                    });
                }
            }
            Ok(())
        })
    }

    /// `update_field` addressed by the field's wire name.
    pub fn update_named_field(
        &self,
        id: Uuid,
        name: &str,
        value: FieldValue,
    ) -> Result<DocumentRecord, StoreError> {
        let field =
            ReportField::from_wire_name(name).ok_or_else(|| StoreError::UnknownField(name.to_string()))?;
        self.update_field(id, field, value)
    }

    /// Flip one checkbox option and store the re-rendered group string.
    pub fn toggle_checkbox(
        &self,
        id: Uuid,
        group: CheckboxGroup,
        option: &str,
    ) -> Result<DocumentRecord, StoreError> {
        self.modify(id, |record| {
            if record.status == ReportStatus::Processing {
                return Err(StoreError::RecordBusy(id));
            }
            let mut selection = CheckboxSelection::from_report(group, &record.extracted_data);
            selection
                .toggle(option)
                .ok_or_else(|| StoreError::UnknownOption {
                    group,
                    option: option.to_string(),
                })?;
            if let Some(slot) = record.extracted_data.text_mut(group.field()) {
                *slot = selection.render();
            }
            Ok(())
        })
    }

    /// Remove exactly the record with `id`.
    pub fn delete(&self, id: Uuid) -> Result<DocumentRecord, StoreError> {
        let mut records = self.write()?;
        let index = records
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        Ok(records.remove(index))
    }

    // ── Queries ─────────────────────────────────

    pub fn get(&self, id: Uuid) -> Result<DocumentRecord, StoreError> {
        self.read()?
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    pub fn contains(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.read()?.iter().any(|r| r.id == id))
    }

    /// All records in insertion order.
    pub fn list(&self) -> Result<Vec<DocumentRecord>, StoreError> {
        Ok(self.read()?.clone())
    }

    pub fn list_batch(&self, batch_id: Uuid) -> Result<Vec<DocumentRecord>, StoreError> {
        Ok(self
            .read()?
            .iter()
            .filter(|r| r.batch_id == batch_id)
            .cloned()
            .collect())
    }

    /// Completed records only, in insertion order.
    pub fn completed(&self) -> Result<Vec<DocumentRecord>, StoreError> {
        Ok(self
            .read()?
            .iter()
            .filter(|r| r.status == ReportStatus::Completed)
            .cloned()
            .collect())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.read()?.is_empty())
    }
}
