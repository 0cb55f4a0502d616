//! Turns a free-text nightly narration into a structured summary through the
//! Gemini `generateContent` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::config::Config;
use crate::models::summary::ParsedSummary;

#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("Summarization is not configured: {0}")]
    Configuration(String),

    #[error("Summarization service error ({status}): {body}")]
    Service { status: u16, body: String },

    #[error("Summarization service returned an empty response")]
    EmptyResponse,

    #[error("Summarization response did not include valid JSON: {0}")]
    MalformedResponse(String),

    #[error("Summarization request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl SummaryError {
    pub fn kind(&self) -> &'static str {
        match self {
            SummaryError::Configuration(_) => "configuration",
            SummaryError::Service { .. } => "service",
            SummaryError::EmptyResponse => "empty_response",
            SummaryError::MalformedResponse(_) => "malformed_response",
            SummaryError::Transport(_) => "transport",
        }
    }
}

/// Single request/response text generation. No retries, no streaming.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn is_configured(&self) -> bool;

    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, SummaryError>;
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn from_config(config: &Config) -> Result<Self, SummaryError> {
        let mut builder = reqwest::Client::builder();
        if config.summary_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.summary_timeout_secs));
        }
        Ok(Self {
            http: builder.build()?,
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, SummaryError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SummaryError::Configuration("GEMINI_API_KEY is not set".into()))?;

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Requesting nightly summary");

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request_body(prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status, model = %self.model, "Summarization service returned an error");
            return Err(SummaryError::Service { status, body });
        }

        let payload: Value = response.json().await?;
        Ok(response_text(&payload))
    }
}

pub fn build_prompt(date: NaiveDate, user_text: &str) -> String {
    format!(
        r#"You are the evening check-in assistant for Uplift, an app helping people with chronic fatigue and ME/CFS manage energy and avoid PEM.
Return ONLY valid JSON in the exact format below. Use the provided date in the "date" field.

Format:
{{
  "date": "YYYY-MM-DD",
  "activities": [
    {{
      "name": "brief activity name",
      "effort": [
        {{ "category": "physical|cognitive|social|sensory|emotional", "color": "green|yellow|red" }}
      ],
      "duration_minutes": null,
      "difficulty_noted": false,
      "notes": "any relevant context"
    }}
  ],
  "crash": {{ "occurred": false, "severity": null, "description": null }},
  "warning_flags": [
    {{
      "type": "pushed_through|delayed_onset|good_day_overexertion|cumulative_load|ignored_signals|rushed|symptom_increase",
      "severity": "high|medium|low",
      "description": "brief explanation of the concern",
      "related_activities": ["activity names"]
    }}
  ],
  "energy_balance": {{
    "assessment": "surplus|balanced|slight_deficit|moderate_deficit|significant_deficit",
    "current_state": "brief description of how they seem now",
    "recovery_needed": true
  }},
  "supportive_message": "1-2 sentence personalized, encouraging message"
}}

Date: {date}
User summary: {user_text}"#,
        date = date.format("%Y-%m-%d"),
        user_text = user_text,
    )
}

pub fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }]
        }]
    })
}

/// Concatenated text of the first candidate; empty when absent.
pub fn response_text(payload: &Value) -> String {
    payload["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Parses the span from the first `{` to the last `}`.
pub fn extract_json(text: &str) -> Result<Value, SummaryError> {
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Err(SummaryError::MalformedResponse(
            "response did not include a JSON object".into(),
        ));
    };
    if end < start {
        return Err(SummaryError::MalformedResponse(
            "response braces are out of order".into(),
        ));
    }
    serde_json::from_str(&text[start..=end])
        .map_err(|e| SummaryError::MalformedResponse(e.to_string()))
}

pub async fn summarize_day(
    generator: &dyn TextGenerator,
    date: NaiveDate,
    user_text: &str,
) -> Result<ParsedSummary, SummaryError> {
    if !generator.is_configured() {
        return Err(SummaryError::Configuration(
            "no summarization credential is configured".into(),
        ));
    }

    let text = generator.generate(&build_prompt(date, user_text)).await?;
    if text.is_empty() {
        return Err(SummaryError::EmptyResponse);
    }

    let raw = extract_json(&text)?;
    Ok(ParsedSummary::from_value(raw))
}

/// Generator that always answers with the same text.
#[cfg(test)]
pub struct CannedGenerator {
    pub reply: Result<String, u16>,
    pub configured: bool,
}

#[cfg(test)]
impl CannedGenerator {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            configured: true,
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            configured: true,
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            reply: Ok(String::new()),
            configured: false,
        }
    }
}

#[cfg(test)]
#[async_trait]
impl TextGenerator for CannedGenerator {
    fn is_configured(&self) -> bool {
        self.configured
    }

    fn model(&self) -> &str {
        "canned"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, SummaryError> {
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(SummaryError::Service {
                status: *status,
                body: "upstream unavailable".into(),
            }),
        }
    }
}
