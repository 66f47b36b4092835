//! Typed view over the three checkbox groups of the service form.
//!
//! The record keeps each group as its wire string (`"PREVENTIVO, OTRO"`).
//! `CheckboxSelection` parses that string into a set of known options plus
//! whatever text it could not recognize, and renders it back.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::report::{ReportData, ReportField};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckboxGroup {
    #[serde(rename = "servicio")]
    Service,
    #[serde(rename = "clasificacionFalla")]
    FaultClassification,
    #[serde(rename = "estadoFinal")]
    FinalStatus,
}

const SERVICE_OPTIONS: &[&str] = &[
    "PREVENTIVO",
    "CORRECTIVO",
    "INSTALACIÓN",
    "ADICIONAL",
    "GARANTÍA",
    "OTRO",
];

const FAULT_OPTIONS: &[&str] = &[
    "ELECTRÓNICA",
    "ELÉCTRICA",
    "MECÁNICA",
    "OPERATIVA",
    "INEXISTENTE",
    "OTRO",
];

const FINAL_STATUS_OPTIONS: &[&str] = &["REPARACIÓN TOTAL", "REPARACIÓN PARCIAL", "PENDIENTE"];

impl CheckboxGroup {
    pub const ALL: [CheckboxGroup; 3] = [Self::Service, Self::FaultClassification, Self::FinalStatus];

    /// Option labels in form order.
    pub fn options(&self) -> &'static [&'static str] {
        match self {
            Self::Service => SERVICE_OPTIONS,
            Self::FaultClassification => FAULT_OPTIONS,
            Self::FinalStatus => FINAL_STATUS_OPTIONS,
        }
    }

    pub fn field(&self) -> ReportField {
        match self {
            Self::Service => ReportField::Service,
            Self::FaultClassification => ReportField::FaultClassification,
            Self::FinalStatus => ReportField::FinalStatus,
        }
    }

    pub fn wire_name(&self) -> &'static str {
        self.field().wire_name()
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|g| g.wire_name() == name)
    }

    /// Index of the option matching `text`, ignoring case and accents.
    pub fn option_index(&self, text: &str) -> Option<usize> {
        let wanted = fold(text.trim());
        self.options().iter().position(|o| fold(o) == wanted)
    }
}

impl std::fmt::Display for CheckboxGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Upper-case and strip Spanish diacritics.
fn fold(text: &str) -> String {
    text.chars()
        .flat_map(char::to_uppercase)
        .map(|c| match c {
            'Á' | 'À' | 'Ä' | 'Â' => 'A',
            'É' | 'È' | 'Ë' | 'Ê' => 'E',
            'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
            'Ó' | 'Ò' | 'Ö' | 'Ô' => 'O',
            'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
            'Ñ' => 'N',
            other => other,
        })
        .collect()
}

/// Parsed state of one checkbox group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckboxSelection {
    group: CheckboxGroup,
    selected: BTreeSet<usize>,
    /// Text the parser could not map to an option, kept verbatim.
    unrecognized: Vec<String>,
}

impl CheckboxSelection {
    pub fn empty(group: CheckboxGroup) -> Self {
        Self {
            group,
            selected: BTreeSet::new(),
            unrecognized: Vec::new(),
        }
    }

    /// Parse a wire string.
    ///
    /// Chunks are split on `,` `;` `/` and newlines; inside a chunk, words are
    /// matched greedily against the longest option label first so that
    /// multi-word labels survive whitespace separation.
    pub fn parse(group: CheckboxGroup, text: &str) -> Self {
        let mut selection = Self::empty(group);
        let max_words = group
            .options()
            .iter()
            .map(|o| o.split_whitespace().count())
            .max()
            .unwrap_or(1);

        for chunk in text.split([',', ';', '/', '\n']) {
            let words: Vec<&str> = chunk.split_whitespace().collect();
            let mut leftover: Vec<&str> = Vec::new();
            let mut i = 0;
            while i < words.len() {
                let matched = (1..=max_words.min(words.len() - i)).rev().find_map(|n| {
                    group
                        .option_index(&words[i..i + n].join(" "))
                        .map(|idx| (idx, n))
                });
                match matched {
                    Some((idx, n)) => {
                        selection.push_unrecognized(&mut leftover);
                        selection.selected.insert(idx);
                        i += n;
                    }
                    None => {
                        leftover.push(words[i]);
                        i += 1;
                    }
                }
            }
            selection.push_unrecognized(&mut leftover);
        }
        selection
    }

    /// Parse the group's current value out of a record.
    pub fn from_report(group: CheckboxGroup, data: &ReportData) -> Self {
        Self::parse(group, data.text(group.field()).unwrap_or_default())
    }

    fn push_unrecognized(&mut self, words: &mut Vec<&str>) {
        if !words.is_empty() {
            self.unrecognized.push(words.join(" "));
            words.clear();
        }
    }

    pub fn group(&self) -> CheckboxGroup {
        self.group
    }

    pub fn is_selected(&self, option: &str) -> bool {
        self.group
            .option_index(option)
            .is_some_and(|idx| self.selected.contains(&idx))
    }

    /// Selected labels in canonical form order.
    pub fn selected_labels(&self) -> Vec<&'static str> {
        let options = self.group.options();
        self.selected.iter().map(|&i| options[i]).collect()
    }

    pub fn unrecognized(&self) -> &[String] {
        &self.unrecognized
    }

    /// Flip one option. Returns the new state, or `None` when `option` is not
    /// a label of this group.
    pub fn toggle(&mut self, option: &str) -> Option<bool> {
        let idx = self.group.option_index(option)?;
        if self.selected.remove(&idx) {
            Some(false)
        } else {
            self.selected.insert(idx);
            Some(true)
        }
    }

    /// Wire form: labels then unrecognized text, joined by `", "`.
    pub fn render(&self) -> String {
        self.selected_labels()
            .into_iter()
            .map(str::to_string)
            .chain(self.unrecognized.iter().cloned())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_wire_names_match_report_fields() {
        assert_eq!(CheckboxGroup::Service.wire_name(), "servicio");
        assert_eq!(CheckboxGroup::FaultClassification.wire_name(), "clasificacionFalla");
        assert_eq!(CheckboxGroup::FinalStatus.wire_name(), "estadoFinal");
        assert_eq!(
            CheckboxGroup::from_wire_name("estadoFinal"),
            Some(CheckboxGroup::FinalStatus)
        );
        assert_eq!(CheckboxGroup::from_wire_name("falla"), None);
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&CheckboxGroup::FaultClassification).unwrap();
        assert_eq!(json, "\"clasificacionFalla\"");
    }

    #[test]
    fn parse_is_case_and_accent_insensitive() {
        let sel = CheckboxSelection::parse(CheckboxGroup::Service, "instalacion; Garantia");
        assert_eq!(sel.selected_labels(), vec!["INSTALACIÓN", "GARANTÍA"]);
        assert!(sel.unrecognized().is_empty());
    }

    #[test]
    fn parse_handles_multi_word_labels_and_whitespace_separators() {
        let sel = CheckboxSelection::parse(CheckboxGroup::FinalStatus, "reparación parcial  PENDIENTE");
        assert_eq!(sel.selected_labels(), vec!["REPARACIÓN PARCIAL", "PENDIENTE"]);

        let sel = CheckboxSelection::parse(CheckboxGroup::Service, "CORRECTIVO PREVENTIVO");
        assert_eq!(sel.render(), "PREVENTIVO, CORRECTIVO");
    }

    #[test]
    fn unrecognized_text_is_kept() {
        let sel = CheckboxSelection::parse(CheckboxGroup::FaultClassification, "MECÁNICA / fuga de gas");
        assert_eq!(sel.selected_labels(), vec!["MECÁNICA"]);
        assert_eq!(sel.unrecognized(), ["fuga de gas".to_string()]);
        assert_eq!(sel.render(), "MECÁNICA, fuga de gas");
    }

    #[test]
    fn render_uses_canonical_order_and_dedups() {
        let sel = CheckboxSelection::parse(CheckboxGroup::Service, "OTRO, preventivo, OTRO");
        assert_eq!(sel.render(), "PREVENTIVO, OTRO");
    }

    #[test]
    fn empty_string_is_empty_selection() {
        let sel = CheckboxSelection::parse(CheckboxGroup::Service, "  ");
        assert!(sel.selected_labels().is_empty());
        assert_eq!(sel.render(), "");
    }

    #[test]
    fn toggle_adds_and_removes() {
        let mut sel = CheckboxSelection::parse(CheckboxGroup::Service, "CORRECTIVO");
        assert_eq!(sel.toggle("preventivo"), Some(true));
        assert_eq!(sel.render(), "PREVENTIVO, CORRECTIVO");
        assert_eq!(sel.toggle("CORRECTIVO"), Some(false));
        assert_eq!(sel.render(), "PREVENTIVO");
        assert!(sel.is_selected("Preventivo"));
    }

    #[test]
    fn toggle_unknown_option_is_none() {
        let mut sel = CheckboxSelection::empty(CheckboxGroup::FinalStatus);
        assert_eq!(sel.toggle("TERMINADO"), None);
        assert_eq!(sel.render(), "");
    }

    #[test]
    fn from_report_reads_group_field() {
        let data = ReportData {
            final_status: "REPARACIÓN TOTAL".into(),
            ..ReportData::default()
        };
        let sel = CheckboxSelection::from_report(CheckboxGroup::FinalStatus, &data);
        assert!(sel.is_selected("reparacion total"));
        assert_eq!(sel.group(), CheckboxGroup::FinalStatus);
    }
}
