use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::errors::OracleApiError;
use super::rate_limiter::TokenBucketRateLimiter;
use super::retry::RetryPolicy;
use super::types::{GenerateContentRequest, GenerateContentResponse, GeneratedTestClass};
use crate::domain::errors::DomainResult;
use crate::domain::models::{
    strip_code_fences, OracleConfig, OracleRequest, OracleResponse, PromptKind, PromptLibrary,
};
use crate::domain::ports::CodeGenerationOracle;

/// Oracle backed by the Gemini generateContent HTTP API
///
/// Prompts are rendered from the [`PromptLibrary`] here, so the services
/// only ever hand over a kind and a context map. All concurrent callers
/// share one rate limiter.
pub struct GeminiOracleClient {
    http_client: ReqwestClient,
    api_key: String,
    base_url: String,
    model: String,
    prompts: PromptLibrary,
    rate_limiter: TokenBucketRateLimiter,
    retry_policy: RetryPolicy,
}

impl GeminiOracleClient {
    /// Build a client from configuration
    ///
    /// Fails when no API key is configured or available from the
    /// environment.
    pub fn new(config: &OracleConfig, prompts: PromptLibrary) -> Result<Self> {
        let api_key = config.resolved_api_key().context(
            "No API key configured; set oracle.api_key or GEMINI_API_KEY",
        )?;

        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .tcp_nodelay(true)
            .build()
            .context("Failed to build HTTP client")?;

        info!(
            model = %config.model,
            base_url = %config.base_url,
            api_key = %redact_api_key(&api_key),
            rate_limit_rps = config.rate_limit_rps,
            "Oracle client initialized"
        );

        Ok(Self {
            http_client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            prompts,
            rate_limiter: TokenBucketRateLimiter::new(config.rate_limit_rps),
            retry_policy: RetryPolicy::new(
                config.max_retries,
                config.initial_backoff_ms,
                config.max_backoff_ms,
            ),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Send one request and map the status to a typed error
    async fn send_request(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, OracleApiError> {
        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(OracleApiError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(OracleApiError::from_status(status, body));
        }

        let body = response
            .text()
            .await
            .map_err(OracleApiError::from_transport)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Render, throttle, send with retries and return the raw model text
    pub async fn generate_text(
        &self,
        kind: PromptKind,
        prompt: &str,
    ) -> Result<String, OracleApiError> {
        let request = GenerateContentRequest::for_prompt(kind, prompt);

        self.rate_limiter.acquire().await;
        let response = self
            .retry_policy
            .execute(|| self.send_request(&request))
            .await?;

        response.first_text().ok_or_else(|| {
            OracleApiError::EmptyResponse(
                response
                    .finish_reason()
                    .unwrap_or("no candidates returned")
                    .to_string(),
            )
        })
    }
}

#[async_trait]
impl CodeGenerationOracle for GeminiOracleClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    #[instrument(skip_all, fields(kind = %request.kind, model = %self.model))]
    async fn generate(&self, request: OracleRequest) -> DomainResult<OracleResponse> {
        let prompt = self.prompts.render(request.kind, &request.context);
        debug!(prompt_chars = prompt.len(), "Sending oracle request");

        let text = self.generate_text(request.kind, &prompt).await?;
        Ok(parse_response(request.kind, &text))
    }
}

/// Interpret model text for a prompt kind
///
/// Scenario lists are passed through untouched for the extractor to parse.
/// Test class responses are unpacked from their JSON envelope; text that is
/// not valid JSON is taken as the source itself.
pub fn parse_response(kind: PromptKind, text: &str) -> OracleResponse {
    if kind == PromptKind::Scenarios {
        return OracleResponse::text(text);
    }

    match serde_json::from_str::<GeneratedTestClass>(&strip_code_fences(text)) {
        Ok(generated) if !generated.output_test_class.trim().is_empty() => {
            let paths = if kind.returns_context_paths() {
                generated.output_required_class_context_paths
            } else {
                Vec::new()
            };
            OracleResponse::text(generated.output_test_class).with_context_paths(paths)
        }
        _ => {
            debug!("Oracle response is not a JSON test class envelope; using raw text");
            OracleResponse::text(text)
        }
    }
}

/// Show only enough of a key to tell keys apart
pub fn redact_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_test_envelope() {
        let text = r#"{"outputTestClass":"class ATest {}","outputRequiredClassContextPaths":["com.acme.Money"]}"#;
        let response = parse_response(PromptKind::SingleTest, text);
        assert_eq!(response.text, "class ATest {}");
        assert_eq!(response.context_paths, vec!["com.acme.Money".to_string()]);
    }

    #[test]
    fn test_aggregate_ignores_context_paths() {
        let text = r#"{"outputTestClass":"class ATest {}","outputRequiredClassContextPaths":["x"]}"#;
        let response = parse_response(PromptKind::AggregateTestClass, text);
        assert!(response.context_paths.is_empty());
    }

    #[test]
    fn test_raw_source_is_accepted() {
        let response = parse_response(PromptKind::SingleTest, "class ATest {}");
        assert_eq!(response.text, "class ATest {}");
        assert!(response.context_paths.is_empty());
    }

    #[test]
    fn test_scenarios_pass_through() {
        let text = r#"{"testScenarios":[]}"#;
        assert_eq!(parse_response(PromptKind::Scenarios, text).text, text);
    }

    #[test]
    fn test_redact_api_key() {
        assert_eq!(redact_api_key("AIzaSyD-1234567890abcd"), "****abcd");
        assert_eq!(redact_api_key("short"), "****");
    }

    #[test]
    fn test_new_requires_api_key() {
        temp_env::with_var_unset("GEMINI_API_KEY", || {
            let result = GeminiOracleClient::new(&OracleConfig::default(), PromptLibrary::default());
            assert!(result.is_err());
        });
    }
}
