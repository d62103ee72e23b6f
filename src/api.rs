use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Which prompt endpoint a form submission goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Full,
    Short,
}

impl PromptKind {
    pub fn endpoint(&self) -> &'static str {
        match self {
            PromptKind::Full => "/generate",
            PromptKind::Short => "/generate-short",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PromptKind::Full => "Generate Prompt",
            PromptKind::Short => "Short Prompt",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GenerationRequest {
    pub task: String,
    pub provider: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct GenerationResponse {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    reply: String,
}

/// Backend used by the prompt form
#[async_trait]
pub trait PromptBackend: Send + Sync {
    async fn generate(&self, kind: PromptKind, request: &GenerationRequest)
        -> Result<GenerationResponse>;
}

/// Backend used by the chat widget
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, message: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl PromptBackend for ApiClient {
    async fn generate(
        &self,
        kind: PromptKind,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse> {
        let url = self.url(kind.endpoint());
        tracing::debug!(%url, provider = %request.provider, "requesting prompt");

        let response = self.client.post(&url).json(request).send().await?;

        // The server reports failures as `{"error": ...}`, sometimes with a 500,
        // so the body is decoded regardless of status.
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, %url, "prompt endpoint returned non-success status");
        }

        let body: GenerationResponse = response
            .json()
            .await
            .with_context(|| format!("invalid JSON from {} (status {})", url, status))?;
        Ok(body)
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn chat(&self, message: &str) -> Result<String> {
        let url = self.url("/api/chat");
        tracing::debug!(%url, "sending chat message");

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("Chat request failed with status: {}", response.status()));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("chat response is missing `reply`")?;
        Ok(chat_response.reply)
    }
}
