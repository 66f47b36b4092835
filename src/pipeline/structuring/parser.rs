use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::schema::{CONFIDENCE_KEY, MATERIALS_KEY, REQUIRED_FIELDS};
use super::StructuringError;
use crate::models::report::{MaterialLine, ReportData, ReportField};

/// Score used when the model gives no usable legibility estimate.
pub const DEFAULT_CONFIDENCE: f32 = 5.0;
pub const MIN_CONFIDENCE: f32 = 1.0;
pub const MAX_CONFIDENCE: f32 = 10.0;

/// Opening Markdown fence at the start of the reply, with an optional language tag.
static OPEN_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[A-Za-z0-9_+-]*\s*").unwrap());
/// Closing Markdown fence at the end of the reply.
static CLOSE_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*```$").unwrap());

/// A normalized extraction, ready for the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedExtraction {
    pub data: ReportData,
    pub confidence_score: f32,
    /// Required keys absent (or null) in the raw reply. Their fields are empty
    /// strings in `data`.
    pub missing_required: Vec<&'static str>,
}

/// Recover a complete `ReportData` from the model's raw reply text.
///
/// Tolerates Markdown fences and prose around the object. Every field of the
/// result is populated, whatever the reply omitted.
pub fn parse_extraction_response(raw: &str) -> Result<ParsedExtraction, StructuringError> {
    let span = extract_object_span(raw)?;

    let value: Value =
        serde_json::from_str(&span).map_err(|e| StructuringError::JsonParsing(e.to_string()))?;
    let Value::Object(object) = value else {
        return Err(StructuringError::JsonParsing(
            "top-level JSON value is not an object".into(),
        ));
    };

    let missing_required = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|key| object.get(*key).map_or(true, Value::is_null))
        .collect();

    Ok(ParsedExtraction {
        data: normalize_report(&object),
        confidence_score: normalize_confidence(object.get(CONFIDENCE_KEY)),
        missing_required,
    })
}

/// Strip the outer fence pair and return the substring from the first `{`
/// to the last `}`. Backticks inside the object are left alone.
fn extract_object_span(raw: &str) -> Result<String, StructuringError> {
    let trimmed = raw.trim();
    let opened = OPEN_FENCE_RE.replace(trimmed, "");
    let unfenced = CLOSE_FENCE_RE.replace(&opened, "");
    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(unfenced[start..=end].to_string()),
        _ => Err(StructuringError::MalformedResponse(
            "no JSON object found in reply".into(),
        )),
    }
}

fn normalize_report(object: &Map<String, Value>) -> ReportData {
    let mut data = ReportData::default();
    for field in ReportField::ALL {
        if let Some(slot) = data.text_mut(field) {
            *slot = coerce_text(object.get(field.wire_name()));
        }
    }
    data.materials = normalize_materials(object.get(MATERIALS_KEY));
    data
}

fn normalize_materials(value: Option<&Value>) -> Vec<MaterialLine> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_object)
        .map(|item| MaterialLine {
            sequence_no: coerce_text(item.get("no")),
            unit: coerce_text(item.get("unidad")),
            name: coerce_text(item.get("nombre")),
            model: coerce_text(item.get("modelo")),
        })
        .collect()
}

/// Strings kept, scalars rendered as text, anything else empty.
fn coerce_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => clean_text(s),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Legibility estimate in `[1, 10]`; missing, zero or unusable becomes 5.
pub fn normalize_confidence(value: Option<&Value>) -> f32 {
    let score = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match score {
        Some(s) if s.is_finite() && s != 0.0 => (s as f32).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE),
        _ => DEFAULT_CONFIDENCE,
    }
}

/// Line endings unified, tabs flattened, control and invisible characters
/// dropped, outer whitespace trimmed.
pub fn clean_text(input: &str) -> String {
    let unified = input.replace("\r\n", "\n").replace('\r', "\n");
    let cleaned: String = unified
        .chars()
        .filter_map(|c| match c {
            '\n' => Some('\n'),
            '\t' => Some(' '),
            c if c.is_control() || is_invisible(c) => None,
            c => Some(c),
        })
        .collect();
    cleaned.trim().to_string()
}

fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{2069}'
            | '\u{FEFF}'
    )
}
