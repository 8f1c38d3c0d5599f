//! Code generator boundary.
//!
//! The generator is an external collaborator; the loop only needs
//! `generate`. The HTTP implementation targets an OpenAI-style chat
//! completions endpoint. The scripted implementation is the
//! deterministic double used in tests and demos.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::GeneratorError;
use crate::feedback::RejectionFeedback;

const SYSTEM_PROMPT: &str = "You are a senior Python engineer. Write functional, \
efficient Python code that solves the user's request. Reply with the code only.";

/// One generation request: the original prompt plus, on retries,
/// structured feedback from the prior rejection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub feedback: Option<RejectionFeedback>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            feedback: None,
        }
    }
}

/// External code generator.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GeneratorError>;
}

// ── HTTP generator ──────────────────────────────────────────────────────

/// Configuration for [`HttpGenerator`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpGeneratorConfig {
    /// Full URL of a chat-completions route.
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    /// High temperature drives stochastic proposal generation, so a
    /// retry can land on a different candidate.
    pub temperature: f64,
    pub timeout_secs: u64,
}

impl Default for HttpGeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/v1/chat/completions".to_string(),
            api_key: None,
            model: "gpt-4o".to_string(),
            temperature: 0.8,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

/// Generator backed by an OpenAI-style chat completions endpoint.
pub struct HttpGenerator {
    client: reqwest::Client,
    config: HttpGeneratorConfig,
}

impl HttpGenerator {
    pub fn new(config: HttpGeneratorConfig) -> Result<Self, GeneratorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GeneratorError::Unavailable(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl CodeGenerator for HttpGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GeneratorError> {
        let mut messages = vec![
            json!({"role": "system", "content": SYSTEM_PROMPT}),
            json!({"role": "user", "content": request.prompt}),
        ];
        if let Some(feedback) = &request.feedback {
            messages.push(json!({"role": "system", "content": feedback.render()}));
        }

        let body = json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "messages": messages,
        });

        let mut call = self.client.post(&self.config.endpoint).json(&body);
        if let Some(key) = &self.config.api_key {
            call = call.bearer_auth(key);
        }

        let response = call.send().await.map_err(|e| {
            if e.is_timeout() {
                GeneratorError::Timeout
            } else {
                GeneratorError::Unavailable(e.to_string())
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(GeneratorError::Auth);
        }
        if !status.is_success() {
            return Err(GeneratorError::Unavailable(format!("status {status}")));
        }

        let decoded: ChatResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::Protocol(e.to_string()))?;

        decoded
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| GeneratorError::Protocol("response carried no choices".to_string()))
    }
}

// ── Scripted generator ──────────────────────────────────────────────────

/// Deterministic generator double: plays back a scripted sequence of
/// results and counts invocations.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, GeneratorError>>>,
    fallback: String,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    /// Play the given results in order, then keep returning `fallback`.
    pub fn sequence(
        script: Vec<Result<String, GeneratorError>>,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: fallback.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always return the same candidate.
    pub fn repeating(code: impl Into<String>) -> Self {
        Self::sequence(vec![], code)
    }

    /// Number of `generate` invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CodeGenerator for ScriptedGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        match next {
            Some(result) => result,
            None => Ok(self.fallback.clone()),
        }
    }
}
