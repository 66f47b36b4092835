//! Document records and the structured service-report shape.
//!
//! `ReportData` field names on the wire are the extraction contract with the
//! model and with the CSV export. Renaming any `#[serde(rename)]` breaks both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ═══════════════════════════════════════════
// Lifecycle
// ═══════════════════════════════════════════

/// Lifecycle status of one uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    /// Allowed edges: `pending → processing → {completed | error}`.
    pub fn can_transition_to(&self, next: ReportStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Error)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which pipeline stage a failed record broke in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Encoding,
    Extraction,
    Parse,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Encoding => "encoding",
            Self::Extraction => "extraction",
            Self::Parse => "parse",
        }
    }
}

// ═══════════════════════════════════════════
// Structured record
// ═══════════════════════════════════════════

/// One row of the materials / spare parts table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialLine {
    #[serde(rename = "no", default)]
    pub sequence_no: String,
    #[serde(rename = "unidad", default)]
    pub unit: String,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "modelo", default)]
    pub model: String,
}

/// The normalized field set extracted from one service form.
///
/// Every field is always present; `Default` is the all-empty record shown
/// before a result arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportData {
    pub folio: String,
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "sito")]
    pub site: String,
    #[serde(rename = "cliente")]
    pub client: String,
    #[serde(rename = "idNum")]
    pub id_num: String,
    pub region: String,
    pub ticket: String,
    #[serde(rename = "tecnicos")]
    pub technicians: String,
    #[serde(rename = "horarioInicio")]
    pub start_time: String,
    #[serde(rename = "horarioFin")]
    pub end_time: String,
    /// Checkbox group, see `checkbox::CheckboxGroup::Service`.
    #[serde(rename = "servicio")]
    pub service: String,
    #[serde(rename = "falla")]
    pub fault: String,
    #[serde(rename = "condiciones")]
    pub conditions: String,
    #[serde(rename = "trabajoRealizado")]
    pub work_performed: String,
    #[serde(rename = "materiales")]
    pub materials: Vec<MaterialLine>,
    #[serde(rename = "clasificacionFalla")]
    pub fault_classification: String,
    #[serde(rename = "estadoFinal")]
    pub final_status: String,
    #[serde(rename = "observaciones")]
    pub observations: String,
}

/// Addressable fields of `ReportData`, named by their wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportField {
    Folio,
    Date,
    Site,
    Client,
    IdNum,
    Region,
    Ticket,
    Technicians,
    StartTime,
    EndTime,
    Service,
    Fault,
    Conditions,
    WorkPerformed,
    Materials,
    FaultClassification,
    FinalStatus,
    Observations,
}

impl ReportField {
    /// All fields in form order.
    pub const ALL: [ReportField; 18] = [
        Self::Folio,
        Self::Date,
        Self::Site,
        Self::Client,
        Self::IdNum,
        Self::Region,
        Self::Ticket,
        Self::Technicians,
        Self::StartTime,
        Self::EndTime,
        Self::Service,
        Self::Fault,
        Self::Conditions,
        Self::WorkPerformed,
        Self::Materials,
        Self::FaultClassification,
        Self::FinalStatus,
        Self::Observations,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Folio => "folio",
            Self::Date => "fecha",
            Self::Site => "sito",
            Self::Client => "cliente",
            Self::IdNum => "idNum",
            Self::Region => "region",
            Self::Ticket => "ticket",
            Self::Technicians => "tecnicos",
            Self::StartTime => "horarioInicio",
            Self::EndTime => "horarioFin",
            Self::Service => "servicio",
            Self::Fault => "falla",
            Self::Conditions => "condiciones",
            Self::WorkPerformed => "trabajoRealizado",
            Self::Materials => "materiales",
            Self::FaultClassification => "clasificacionFalla",
            Self::FinalStatus => "estadoFinal",
            Self::Observations => "observaciones",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.wire_name() == name)
    }

    pub fn is_text(&self) -> bool {
        !matches!(self, Self::Materials)
    }
}

impl std::fmt::Display for ReportField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A new value for one `ReportField`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Materials(Vec<MaterialLine>),
}

impl ReportData {
    /// Mutable access to a text field; `None` for the materials table.
    pub fn text_mut(&mut self, field: ReportField) -> Option<&mut String> {
        let slot = match field {
            ReportField::Folio => &mut self.folio,
            ReportField::Date => &mut self.date,
            ReportField::Site => &mut self.site,
            ReportField::Client => &mut self.client,
            ReportField::IdNum => &mut self.id_num,
            ReportField::Region => &mut self.region,
            ReportField::Ticket => &mut self.ticket,
            ReportField::Technicians => &mut self.technicians,
            ReportField::StartTime => &mut self.start_time,
            ReportField::EndTime => &mut self.end_time,
            ReportField::Service => &mut self.service,
            ReportField::Fault => &mut self.fault,
            ReportField::Conditions => &mut self.conditions,
            ReportField::WorkPerformed => &mut self.work_performed,
            ReportField::FaultClassification => &mut self.fault_classification,
            ReportField::FinalStatus => &mut self.final_status,
            ReportField::Observations => &mut self.observations,
            ReportField::Materials => return None,
        };
        Some(slot)
    }

    /// Read access to a text field; `None` for the materials table.
    pub fn text(&self, field: ReportField) -> Option<&str> {
        let value = match field {
            ReportField::Folio => &self.folio,
            ReportField::Date => &self.date,
            ReportField::Site => &self.site,
            ReportField::Client => &self.client,
            ReportField::IdNum => &self.id_num,
            ReportField::Region => &self.region,
            ReportField::Ticket => &self.ticket,
            ReportField::Technicians => &self.technicians,
            ReportField::StartTime => &self.start_time,
            ReportField::EndTime => &self.end_time,
            ReportField::Service => &self.service,
            ReportField::Fault => &self.fault,
            ReportField::Conditions => &self.conditions,
            ReportField::WorkPerformed => &self.work_performed,
            ReportField::FaultClassification => &self.fault_classification,
            ReportField::FinalStatus => &self.final_status,
            ReportField::Observations => &self.observations,
            ReportField::Materials => return None,
        };
        Some(value.as_str())
    }
}

// ═══════════════════════════════════════════
// Document record
// ═══════════════════════════════════════════

/// One uploaded form and its extraction lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub filename: String,
    pub status: ReportStatus,
    /// 1-10 legibility estimate, `0.0` until completed.
    pub confidence_score: f32,
    pub extracted_data: ReportData,
    /// `data:` URL of the original upload, kept for human verification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FailureKind>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// A fresh `pending` record with a new id and the empty default record.
    pub fn new(batch_id: Uuid, filename: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            batch_id,
            filename: filename.into(),
            status: ReportStatus::Pending,
            confidence_score: 0.0,
            extracted_data: ReportData::default(),
            source_image: None,
            error_detail: None,
            error_kind: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
