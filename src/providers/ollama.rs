use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::app_config::TranslationServiceConfig;
use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::{api_error, request_error, Translator};

/// Ollama client used as the translation collaborator
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Model used for translation
    model: String,
    /// System prompt template with {source_language}/{target_language}
    system_prompt: String,
    /// Sampling temperature
    temperature: f32,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: Some(false),
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options = Some(GenerationOptions {
            temperature: Some(temperature),
        });
        self
    }
}

impl Ollama {
    /// Create a client from the translation service configuration
    pub fn from_config(config: &TranslationServiceConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            // Ollama speaks HTTP/1.1
            .http1_only()
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            client,
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            temperature: config.temperature,
            max_retries: config.retry_count,
            backoff_base_ms: config.retry_backoff_ms,
        })
    }

    /// Fill the system prompt template with language names
    pub fn render_system_prompt(&self, source_language: &str, target_language: &str) -> String {
        let source_name = language_utils::get_language_name(source_language)
            .unwrap_or_else(|_| source_language.to_string());
        let target_name = language_utils::get_language_name(target_language)
            .unwrap_or_else(|_| target_language.to_string());

        self.system_prompt
            .replace("{source_language}", &source_name)
            .replace("{target_language}", &target_name)
    }

    /// Generate text from the Ollama API with retry logic
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);

        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.max_retries {
            match self.client.post(&url).json(request).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let response_text = response
                            .text()
                            .await
                            .map_err(|e| request_error("translation", e))?;
                        return parse_generation(&response_text);
                    }

                    let err = api_error(response).await;
                    if status.is_server_error() {
                        // Server error - can retry
                        error!("Ollama API error: {} - attempt {}/{}", err, attempt + 1, self.max_retries + 1);
                        last_error = Some(err);
                    } else {
                        // Client error - don't retry
                        error!("Ollama API error: {}", err);
                        return Err(err);
                    }
                }
                Err(e) => {
                    // Network error - can retry
                    let err = request_error("translation", e);
                    error!("Ollama API network error: {} - attempt {}/{}", err, attempt + 1, self.max_retries + 1);
                    last_error = Some(err);
                }
            }

            attempt += 1;

            // If we have more retries left, wait with exponential backoff
            if attempt <= self.max_retries {
                let backoff_ms = self.backoff_base_ms * (1u64 << (attempt - 1).min(16));
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::RequestFailed(format!("Ollama API request failed after {} attempts", self.max_retries + 1))
        }))
    }

    /// Get the Ollama API version
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response: serde_json::Value = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| request_error("translation", e))?
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Ollama version response: {}", e)))?;

        response["version"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::ParseError("Invalid version format in response".to_string()))
    }
}

/// Parse a generate response; streamed JSONL output is concatenated
fn parse_generation(response_text: &str) -> Result<GenerationResponse, ProviderError> {
    if let Ok(parsed) = serde_json::from_str::<GenerationResponse>(response_text) {
        return Ok(parsed);
    }

    let mut combined = String::new();
    let mut model = String::new();
    let mut parsed_any = false;
    for line in response_text.lines().filter(|l| !l.trim().is_empty()) {
        let part: GenerationResponse = serde_json::from_str(line).map_err(|e| {
            let preview: String = response_text.chars().take(200).collect();
            ProviderError::ParseError(format!("Failed to parse Ollama API response: {} ({})", e, preview))
        })?;
        combined.push_str(&part.response);
        model = part.model;
        parsed_any = true;
    }

    if !parsed_any {
        return Err(ProviderError::ParseError("Empty response from Ollama API".to_string()));
    }

    Ok(GenerationResponse {
        model,
        response: combined,
        done: true,
    })
}

#[async_trait]
impl Translator for Ollama {
    async fn translate(&self, text: &str, source_language: &str, target_language: &str) -> Result<String, ProviderError> {
        let request = GenerationRequest::new(&self.model, text)
            .system(self.render_system_prompt(source_language, target_language))
            .temperature(self.temperature);

        let response = self.generate(&request).await?;
        let translated = response.response.trim().to_string();
        debug!("Translated {} chars into {} chars", text.chars().count(), translated.chars().count());
        Ok(translated)
    }
}
