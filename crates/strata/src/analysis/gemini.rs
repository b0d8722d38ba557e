//! Google Gemini `generateContent` client.

use std::{env, time::Duration};

use log::{debug, trace};
use serde::Deserialize;
use serde_json::{Value, json};
use ureq::Agent;

use super::{AnalysisError, GenerativeModel};
use crate::config::AnalysisConfig;

const SYSTEM_INSTRUCTION: &str = "You are a world-class tax structuring expert specializing in Hong Kong and international tax law. You provide precise, professional, and actionable tax advice.";

/// A [`GenerativeModel`] calling the Gemini REST API with a JSON response
/// schema matching [`AnalysisReport`](super::AnalysisReport).
#[derive(Debug, Clone)]
pub struct GeminiClient {
    endpoint: String,
    model: String,
    api_key: String,
    agent: Agent,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            agent: Agent::new_with_config(config),
        }
    }

    /// Builds a client from configuration, reading the API key from the
    /// configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::MissingApiKey`] when the variable is unset or
    /// empty.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let api_key = env::var(config.api_key_env())
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AnalysisError::MissingApiKey(config.api_key_env().to_string()))?;

        Ok(Self::new(
            config.endpoint(),
            config.model(),
            api_key,
            config.timeout(),
        ))
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

impl GenerativeModel for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, AnalysisError> {
        let url = self.url();
        debug!(url, model = self.model.as_str(); "Requesting analysis");

        let mut response = self
            .agent
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .send_json(request_body(prompt))
            .map_err(|err| AnalysisError::Transport(Box::new(err)))?;

        let status = response.status();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|err| AnalysisError::Transport(Box::new(err)))?;
        if !status.is_success() {
            return Err(AnalysisError::Status {
                status: status.as_u16(),
                body,
            });
        }
        trace!(body; "Analysis response");

        extract_text(&body)
    }
}

fn request_body(prompt: &str) -> Value {
    json!({
        "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema(),
        },
    })
}

fn response_schema() -> Value {
    let string_list = |description: &str| {
        json!({
            "type": "ARRAY",
            "items": { "type": "STRING" },
            "description": description,
        })
    };

    json!({
        "type": "OBJECT",
        "properties": {
            "investorConsiderations": string_list("Key considerations for investors in this structure."),
            "structureConsiderations": string_list("Technical tax considerations regarding the entities and their jurisdictions."),
            "downstreamImplications": string_list("Potential tax implications for distributions or exits."),
            "stepPlan": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "step": { "type": "NUMBER" },
                        "action": { "type": "STRING" },
                        "taxImpact": { "type": "STRING" },
                    },
                    "required": ["step", "action", "taxImpact"],
                },
                "description": "A step-by-step plan to implement this structure.",
            },
            "refinements": string_list("Suggested improvements based on HK tax rules."),
        },
        "required": [
            "investorConsiderations",
            "structureConsiderations",
            "downstreamImplications",
            "stepPlan",
            "refinements",
        ],
    })
}

/// Concatenates the text parts of the first candidate.
fn extract_text(body: &str) -> Result<String, AnalysisError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(AnalysisError::Parse)?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        Err(AnalysisError::EmptyResponse)
    } else {
        Ok(text)
    }
}
