//! Request and response shapes exchanged with the code generation oracle.

use serde::{Deserialize, Serialize};

use super::prompt::{PromptContext, PromptKind};

/// One oracle invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleRequest {
    pub kind: PromptKind,
    pub context: PromptContext,
}

impl OracleRequest {
    pub const fn new(kind: PromptKind, context: PromptContext) -> Self {
        Self { kind, context }
    }
}

/// What the oracle produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleResponse {
    /// Candidate source text, or raw JSON for scenario extraction
    pub text: String,

    /// Additional context identifiers the oracle asked to see
    #[serde(default)]
    pub context_paths: Vec<String>,
}

impl OracleResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context_paths: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_context_paths(mut self, paths: Vec<String>) -> Self {
        self.context_paths = paths;
        self
    }
}

/// Strip a surrounding Markdown code fence, if the whole text is fenced.
///
/// Oracles regularly wrap code in ```` ```java ```` blocks even when asked
/// for raw source.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed.to_string();
    };
    // Drop the info string (`java`, `json`, ...) on the opening line.
    let body = match body.find('\n') {
        Some(newline) if !body[..newline].contains(char::is_whitespace) => &body[newline + 1..],
        _ => body,
    };
    body.trim().to_string()
}
