//! Wire types for the Gemini `models/{model}:generateContent` REST call.
//!
//! Only the subset this crate sends and reads is modelled. Unknown response
//! fields are ignored.

use serde::{Deserialize, Serialize};

use super::variants::VariantProfile;

// ──────────────────────────────────────────────
// Request
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub system_instruction: Content,
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// One content part. Exactly one of `text` / `inline_data` is set on requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
    /// Set by the API on reasoning summaries; never part of the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn inline(mime_type: &str, data: &str) -> Self {
        Self {
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: data.to_string(),
            }),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Base64 without a `data:` prefix.
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub response_mime_type: &'static str,
    pub response_schema: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: u32,
}

impl GenerationConfig {
    /// JSON-mode generation settings for one variant.
    pub fn for_variant(profile: &VariantProfile, response_schema: serde_json::Value) -> Self {
        Self {
            temperature: profile.temperature,
            response_mime_type: "application/json",
            response_schema,
            thinking_config: profile
                .thinking_budget
                .map(|thinking_budget| ThinkingConfig { thinking_budget }),
        }
    }
}

// ──────────────────────────────────────────────
// Response
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated answer text of the first candidate, skipping thought parts.
    pub fn answer_text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter(|p| !p.thought.unwrap_or(false))
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Why the prompt was refused, if it was.
    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::structuring::variants::ModelVariant;

    #[test]
    fn thinking_config_only_for_budgeted_variant() {
        let flash = GenerationConfig::for_variant(ModelVariant::Flash.profile(), serde_json::json!({}));
        let json = serde_json::to_value(&flash).unwrap();
        assert!(json.get("thinkingConfig").is_none());

        let pro = GenerationConfig::for_variant(ModelVariant::Pro.profile(), serde_json::json!({}));
        let json = serde_json::to_value(&pro).unwrap();
        assert_eq!(json["thinkingConfig"]["thinkingBudget"], 2048);
        assert_eq!(json["responseMimeType"], "application/json");
    }

    #[test]
    fn parts_serialize_camel_case_and_skip_empty() {
        let inline = serde_json::to_value(Part::inline("image/png", "QUJD")).unwrap();
        assert_eq!(inline["inlineData"]["mimeType"], "image/png");
        assert!(inline.get("text").is_none());
        assert!(inline.get("thought").is_none());
    }

    #[test]
    fn answer_text_joins_parts_and_skips_thoughts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[
                {"text":"reasoning...","thought":true},
                {"text":"{\"folio\":"},
                {"text":"\"IG-1\"}"}
            ]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(response.answer_text().as_deref(), Some(r#"{"folio":"IG-1"}"#));
    }

    #[test]
    fn answer_text_none_without_candidates() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert!(response.answer_text().is_none());
        assert_eq!(response.block_reason(), Some("SAFETY"));
    }

    #[test]
    fn whitespace_only_answer_is_none() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"  \n"}]}}]}"#,
        )
        .unwrap();
        assert!(response.answer_text().is_none());
    }
}
