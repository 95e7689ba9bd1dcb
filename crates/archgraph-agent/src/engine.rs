use std::time::Duration;

use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;
use thiserror::Error;

use archgraph_core::{ai_configured, AiSettings};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    #[error("AI provider is not configured (provider, model and, except for ollama, an API key are required)")]
    NotConfigured,
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("build LLM: {0}")]
    Build(String),
    #[error("chat: {0}")]
    Chat(String),
    #[error("LLM call timed out after {0}s")]
    Timeout(u64),
    #[error("LLM returned no text")]
    EmptyResponse,
    #[error("could not read operations from the reply: {0}")]
    Parse(String),
}

fn map_backend(provider: &str) -> Result<LLMBackend, AgentError> {
    match provider {
        "openai" => Ok(LLMBackend::OpenAI),
        "anthropic" => Ok(LLMBackend::Anthropic),
        "google" => Ok(LLMBackend::Google),
        "ollama" => Ok(LLMBackend::Ollama),
        "groq" => Ok(LLMBackend::Groq),
        "mistral" => Ok(LLMBackend::Mistral),
        "deepseek" => Ok(LLMBackend::DeepSeek),
        other => Err(AgentError::UnknownProvider(other.to_string())),
    }
}

/// One system + user round-trip, bounded by `settings.timeout_secs`.
pub async fn generate(
    settings: &AiSettings,
    system: &str,
    user_msg: &str,
) -> Result<String, AgentError> {
    if !ai_configured(settings) {
        return Err(AgentError::NotConfigured);
    }
    let backend = map_backend(&settings.provider)?;

    let mut builder = LLMBuilder::new()
        .backend(backend)
        .model(&settings.model)
        .system(system);

    if !settings.api_key.is_empty() {
        builder = builder.api_key(&settings.api_key);
    }

    let llm = builder.build().map_err(|e| AgentError::Build(e.to_string()))?;

    let messages = vec![ChatMessage::user().content(user_msg).build()];

    let response = tokio::time::timeout(
        Duration::from_secs(settings.timeout_secs),
        llm.chat(&messages),
    )
    .await
    .map_err(|_| AgentError::Timeout(settings.timeout_secs))?
    .map_err(|e| AgentError::Chat(e.to_string()))?;

    match response.text() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(AgentError::EmptyResponse),
    }
}
