//! Output schema requested from the model (Gemini OpenAPI subset).
//!
//! Property names are the wire names of `ReportData`. The test below pins the
//! two together.

use serde_json::{json, Value};

/// Keys the model must always return.
pub const REQUIRED_FIELDS: &[&str] = &["folio", "cliente", "trabajoRealizado", "confidenceScore"];

/// Key of the legibility estimate inside the reply object.
pub const CONFIDENCE_KEY: &str = "confidenceScore";

/// Text fields of the reply, in form order.
pub const TEXT_FIELDS: &[&str] = &[
    "folio",
    "fecha",
    "sito",
    "cliente",
    "idNum",
    "region",
    "ticket",
    "tecnicos",
    "horarioInicio",
    "horarioFin",
    "servicio",
    "falla",
    "condiciones",
    "trabajoRealizado",
    "clasificacionFalla",
    "estadoFinal",
    "observaciones",
];

pub const MATERIALS_KEY: &str = "materiales";

/// Columns of one materials row.
pub const MATERIAL_FIELDS: &[&str] = &["no", "unidad", "nombre", "modelo"];

fn string_properties(names: &[&str]) -> serde_json::Map<String, Value> {
    names
        .iter()
        .map(|name| (name.to_string(), json!({ "type": "STRING" })))
        .collect()
}

/// Build the response schema sent in `generationConfig.responseSchema`.
pub fn response_schema() -> Value {
    let mut properties = string_properties(TEXT_FIELDS);
    properties.insert(
        MATERIALS_KEY.to_string(),
        json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": Value::Object(string_properties(MATERIAL_FIELDS)),
            }
        }),
    );
    properties.insert(
        CONFIDENCE_KEY.to_string(),
        json!({
            "type": "NUMBER",
            "description": "Calidad de la imagen del 1 al 10"
        }),
    );

    json!({
        "type": "OBJECT",
        "properties": Value::Object(properties),
        "required": REQUIRED_FIELDS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::{ReportData, ReportField};

    #[test]
    fn schema_properties_match_report_data_wire_names() {
        let schema = response_schema();
        let props = schema["properties"].as_object().unwrap();
        let data = serde_json::to_value(ReportData::default()).unwrap();
        for key in data.as_object().unwrap().keys() {
            assert!(props.contains_key(key), "schema lacks {key}");
        }
        assert!(props.contains_key(CONFIDENCE_KEY));
        assert_eq!(props.len(), ReportField::ALL.len() + 1);
    }

    #[test]
    fn text_fields_cover_every_text_report_field() {
        let text: Vec<&str> = ReportField::ALL
            .iter()
            .filter(|f| f.is_text())
            .map(|f| f.wire_name())
            .collect();
        assert_eq!(text, TEXT_FIELDS);
    }

    #[test]
    fn required_fields_declared() {
        let schema = response_schema();
        assert_eq!(
            schema["required"],
            json!(["folio", "cliente", "trabajoRealizado", "confidenceScore"])
        );
    }

    #[test]
    fn materials_are_array_of_string_objects() {
        let schema = response_schema();
        let items = &schema["properties"]["materiales"]["items"];
        assert_eq!(schema["properties"]["materiales"]["type"], "ARRAY");
        assert_eq!(items["type"], "OBJECT");
        for col in MATERIAL_FIELDS {
            assert_eq!(items["properties"][*col]["type"], "STRING");
        }
    }

    #[test]
    fn confidence_is_number() {
        assert_eq!(response_schema()["properties"]["confidenceScore"]["type"], "NUMBER");
    }
}
