//! Wire types for the generateContent API.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::models::PromptKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// Single user turn asking for JSON shaped by the kind's schema.
    pub fn for_prompt(kind: PromptKind, prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.into()),
                }],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(response_schema(kind)),
                temperature: None,
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Content,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it has any.
    pub fn first_text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.candidates.first()?.finish_reason.as_deref()
    }
}

/// Structured payload of single-test and aggregate responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTestClass {
    #[serde(default)]
    pub output_test_class: String,
    #[serde(default)]
    pub output_required_class_context_paths: Vec<String>,
}

/// JSON schema the model must follow for each kind of prompt.
pub fn response_schema(kind: PromptKind) -> Value {
    match kind {
        PromptKind::Scenarios => json!({
            "type": "OBJECT",
            "properties": {
                "testScenarios": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "methodname": { "type": "STRING" },
                            "returntype": { "type": "STRING" },
                            "scenario": { "type": "STRING" }
                        },
                        "required": ["methodname", "scenario"]
                    }
                }
            },
            "required": ["testScenarios"]
        }),
        PromptKind::SingleTest => json!({
            "type": "OBJECT",
            "properties": {
                "outputTestClass": { "type": "STRING" },
                "outputRequiredClassContextPaths": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" }
                }
            },
            "required": ["outputTestClass"]
        }),
        PromptKind::AggregateTestClass => json!({
            "type": "OBJECT",
            "properties": {
                "outputTestClass": { "type": "STRING" }
            },
            "required": ["outputTestClass"]
        }),
    }
}
