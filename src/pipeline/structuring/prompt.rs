//! Fixed instructions sent with every extraction request.
//!
//! The wording encodes form conventions the model cannot learn from the image
//! alone (red folio in the top-right corner, checkbox mark styles). Keep it
//! verbatim; bump `CATALOG_VERSION` on any change.

/// Version of the instruction text and output schema pair.
pub const CATALOG_VERSION: &str = "2024.1";

pub const SYSTEM_INSTRUCTION: &str = r#"
Eres un experto en digitalización de reportes técnicos manuscritos de la empresa IGLÚMEX.
Tu objetivo es realizar una transcripción 100% fiel del formulario de mantenimiento.

REGLAS DE EXTRACCIÓN:
1. **Letra Manuscrita**: Haz tu mejor esfuerzo por descifrar la letra cursiva o poco legible en las secciones de 'TRABAJO REALIZADO', 'FALLA' y 'OBSERVACIONES'.
2. **Folio**: El folio suele estar en color rojo intenso en la esquina superior derecha (Ej: IG-123456).
3. **Casillas de Verificación (Checkboxes)**: Analiza visualmente las marcas (X, V, o tachaduras) en las secciones de 'SERVICIO', 'CLASIFICACIÓN' y 'ESTADO FINAL'. Selecciona el texto de la opción marcada.
4. **Tabla de Materiales**: Extrae cada fila de la tabla. Si no hay materiales, devuelve una lista vacía.
5. **Formato de Salida**: Debes responder EXCLUSIVAMENTE con un objeto JSON válido que siga el esquema proporcionado.

No inventes datos. Si un campo es totalmente ilegible, coloca "Ilegible".
"#;

/// Text part sent alongside the document payload.
pub const USER_PROMPT: &str = "Digitaliza este reporte de mantenimiento de IGLÚMEX. Pon especial atención a la letra manuscrita y los campos marcados.";

/// Placeholder the model writes for fully illegible fields.
pub const ILLEGIBLE_MARKER: &str = "Ilegible";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_carries_form_conventions() {
        assert!(SYSTEM_INSTRUCTION.contains("color rojo intenso en la esquina superior derecha"));
        assert!(SYSTEM_INSTRUCTION.contains("(X, V, o tachaduras)"));
        assert!(SYSTEM_INSTRUCTION.contains("devuelve una lista vacía"));
        assert!(SYSTEM_INSTRUCTION.contains("EXCLUSIVAMENTE con un objeto JSON"));
    }

    #[test]
    fn illegible_marker_matches_instruction() {
        assert!(SYSTEM_INSTRUCTION.contains(&format!("\"{ILLEGIBLE_MARKER}\"")));
    }

    #[test]
    fn user_prompt_mentions_handwriting_and_marks() {
        assert!(USER_PROMPT.contains("letra manuscrita"));
        assert!(USER_PROMPT.contains("campos marcados"));
    }
}
