//! CSV export of completed reports.
//!
//! The output opens cleanly in spreadsheet tools: UTF-8 BOM, every data cell
//! quoted, no embedded line breaks.

use chrono::NaiveDate;
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::models::report::{DocumentRecord, ReportData, ReportStatus};

/// Byte-order mark so spreadsheet tools pick UTF-8 for accented text.
pub const UTF8_BOM: &str = "\u{FEFF}";

pub const CSV_HEADER: &[&str] = &[
    "Folio",
    "Fecha",
    "Sito",
    "Cliente",
    "ID Num",
    "Region",
    "Ticket",
    "Tecnicos",
    "Horario",
    "Servicio",
    "Trabajo Realizado",
    "Observaciones",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV buffer flush failed: {0}")]
    Flush(String),
    #[error("CSV output is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Line breaks become spaces so each record stays on one line.
fn flatten(value: &str) -> String {
    value.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

fn row_cells(data: &ReportData) -> [String; 12] {
    [
        data.folio.clone(),
        data.date.clone(),
        data.site.clone(),
        data.client.clone(),
        data.id_num.clone(),
        data.region.clone(),
        data.ticket.clone(),
        data.technicians.clone(),
        format!("{} - {}", data.start_time, data.end_time),
        data.service.clone(),
        data.work_performed.clone(),
        data.observations.clone(),
    ]
}

/// Append records to `buffer` with one quoting style.
fn write_rows<I, R>(buffer: Vec<u8>, style: QuoteStyle, rows: I) -> Result<Vec<u8>, ExportError>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(style)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(buffer);
    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Flush(e.error().to_string()))
}

/// Render `records` as CSV. Records not in `completed` are skipped.
///
/// Lines are `\n`-separated with no trailing newline.
pub fn export_csv(records: &[DocumentRecord]) -> Result<String, ExportError> {
    let buffer = write_rows(
        UTF8_BOM.as_bytes().to_vec(),
        QuoteStyle::Necessary,
        [CSV_HEADER],
    )?;
    let rows = records
        .iter()
        .filter(|r| r.status == ReportStatus::Completed)
        .map(|r| row_cells(&r.extracted_data).map(|cell| flatten(&cell)));
    let mut buffer = write_rows(buffer, QuoteStyle::Always, rows)?;

    if buffer.last() == Some(&b'\n') {
        buffer.pop();
    }
    Ok(String::from_utf8(buffer)?)
}

/// `reportes_YYYY-MM-DD.csv`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("reportes_{}.csv", date.format("%Y-%m-%d"))
}
