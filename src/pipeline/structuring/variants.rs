use serde::{Deserialize, Serialize};

/// Sampling temperature shared by all variants (deterministic-leaning).
pub const EXTRACTION_TEMPERATURE: f32 = 0.1;

/// Selectable extraction model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    /// Low latency.
    #[default]
    Flash,
    /// Higher accuracy on hard handwriting, with a reasoning budget.
    Pro,
}

/// Request configuration for one variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantProfile {
    pub variant: ModelVariant,
    pub model_id: &'static str,
    pub label: &'static str,
    pub temperature: f32,
    pub thinking_budget: Option<u32>,
}

/// Variant table, looked up once per request.
pub const VARIANT_PROFILES: &[VariantProfile] = &[
    VariantProfile {
        variant: ModelVariant::Flash,
        model_id: "gemini-3-flash-preview",
        label: "Flash (Rápido)",
        temperature: EXTRACTION_TEMPERATURE,
        thinking_budget: None,
    },
    VariantProfile {
        variant: ModelVariant::Pro,
        model_id: "gemini-3-pro-preview",
        label: "Pro (Inteligente)",
        temperature: EXTRACTION_TEMPERATURE,
        thinking_budget: Some(2048),
    },
];

impl ModelVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flash => "flash",
            Self::Pro => "pro",
        }
    }

    pub fn profile(&self) -> &'static VariantProfile {
        // Every variant has exactly one row; `Flash` is row 0.
        VARIANT_PROFILES
            .iter()
            .find(|p| p.variant == *self)
            .unwrap_or(&VARIANT_PROFILES[0])
    }

    pub fn model_id(&self) -> &'static str {
        self.profile().model_id
    }

    pub fn all() -> &'static [ModelVariant] {
        &[Self::Flash, Self::Pro]
    }
}

impl std::fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ModelVariant {
    type Err = String;

    /// Accepts the short name (`flash`, `pro`) or the full model id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        VARIANT_PROFILES
            .iter()
            .find(|p| p.variant.as_str() == wanted || p.model_id == wanted)
            .map(|p| p.variant)
            .ok_or_else(|| {
                format!(
                    "unknown model variant '{s}' (expected one of: {})",
                    VARIANT_PROFILES
                        .iter()
                        .map(|p| p.variant.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_profile() {
        for variant in ModelVariant::all() {
            assert_eq!(variant.profile().variant, *variant);
        }
        assert_eq!(VARIANT_PROFILES.len(), ModelVariant::all().len());
    }

    #[test]
    fn only_pro_has_thinking_budget() {
        assert_eq!(ModelVariant::Flash.profile().thinking_budget, None);
        assert_eq!(ModelVariant::Pro.profile().thinking_budget, Some(2048));
    }

    #[test]
    fn both_variants_share_low_temperature() {
        for profile in VARIANT_PROFILES {
            assert!((profile.temperature - 0.1).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn parse_short_and_full_names() {
        assert_eq!("flash".parse::<ModelVariant>().unwrap(), ModelVariant::Flash);
        assert_eq!(" PRO ".parse::<ModelVariant>().unwrap(), ModelVariant::Pro);
        assert_eq!(
            "gemini-3-pro-preview".parse::<ModelVariant>().unwrap(),
            ModelVariant::Pro
        );
    }

    #[test]
    fn parse_unknown_lists_choices() {
        let err = "ultra".parse::<ModelVariant>().unwrap_err();
        assert!(err.contains("flash, pro"), "got: {err}");
    }

    #[test]
    fn default_is_flash() {
        assert_eq!(ModelVariant::default(), ModelVariant::Flash);
        assert_eq!(ModelVariant::default().model_id(), "gemini-3-flash-preview");
    }
}
