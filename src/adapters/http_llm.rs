use crate::config::JudgeConfig;
use crate::domain::ports::{InferenceRequest, InferenceService};
use crate::utils::error::{JudgeError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// 透過 HTTP 呼叫推論端點，走 /api/generate 風格的 JSON 介面。
pub struct HttpLlmClient {
    endpoint: String,
    model: String,
    headers: HashMap<String, String>,
    client: Client,
}

impl HttpLlmClient {
    pub fn from_config(config: &JudgeConfig) -> Self {
        Self {
            endpoint: config.inference_endpoint().to_string(),
            model: config.model().to_string(),
            headers: config.inference.headers.clone().unwrap_or_default(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl InferenceService for HttpLlmClient {
    async fn infer(&self, request: InferenceRequest) -> Result<String> {
        debug!("Making inference request to: {}", self.endpoint);

        let body = GenerateRequest {
            model: &self.model,
            prompt: &request.user,
            system: request.system.as_deref(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        let mut http_request = self.client.post(&self.endpoint).json(&body);
        for (name, value) in &self.headers {
            http_request = http_request.header(name, value);
        }

        let response = http_request.send().await?;
        debug!("Inference response status: {}", response.status());

        if !response.status().is_success() {
            return Err(JudgeError::InferenceError {
                operation: "inference".to_string(),
                message: format!("endpoint returned HTTP {}", response.status()),
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        Ok(parsed.response)
    }
}
