//! The text-generation boundary.
//!
//! Everything the rest of the crate knows about the LLM is the
//! [`TextGenerator`] capability: one prompt in, free text out. Keeping the
//! boundary this narrow lets tests substitute a scripted stand-in and lets
//! callers plug in any backend without touching prompt or retry logic.
//!
//! The real implementation is [`ProviderGenerator`], which wraps any
//! `edgequake_llm::LLMProvider` (OpenAI, Anthropic, Gemini, Ollama, …).
//! [`resolve_generator`] builds one from a [`ReportConfig`].

use crate::config::ReportConfig;
use crate::error::{ReportError, ServiceError};
use async_trait::async_trait;
use edgequake_llm::{
    AnthropicProvider, ChatMessage, CompletionOptions, GeminiProvider, LLMProvider,
    OpenAIProvider, ProviderFactory,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Sampling parameters for one call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: usize,
    pub temperature: f32,
}

/// A synchronous-in-spirit text completion service: each call is awaited to
/// completion before the caller continues.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send one user-role prompt and return the reply text.
    async fn generate_text(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ServiceError>;

    /// Model identifier bound into this generator.
    fn model_name(&self) -> &str;
}

/// [`TextGenerator`] over an `edgequake_llm` provider.
pub struct ProviderGenerator {
    provider: Arc<dyn LLMProvider>,
    model: String,
}

impl ProviderGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for ProviderGenerator {
    async fn generate_text(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ServiceError> {
        let start = Instant::now();
        let messages = vec![ChatMessage::user(prompt)];
        let options = build_options(params);

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| ServiceError::Api {
                message: e.to_string(),
            })?;

        debug!(
            "{}: {} input tokens, {} output tokens, {:?}",
            self.model,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        if response.content.trim().is_empty() {
            return Err(ServiceError::EmptyReply);
        }
        Ok(response.content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Build `CompletionOptions` from the call parameters.
fn build_options(params: &GenerationParams) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(params.temperature),
        max_tokens: Some(params.max_tokens),
        ..Default::default()
    }
}

/// Environment variable holding the API key for a provider, or `None` for
/// local providers that need no credential.
pub fn credential_env_var(provider: &str) -> Option<&'static str> {
    match provider.to_ascii_lowercase().as_str() {
        "anthropic" => Some("ANTHROPIC_API_KEY"),
        "openai" => Some("OPENAI_API_KEY"),
        "gemini" => Some("GEMINI_API_KEY"),
        "mistral" => Some("MISTRAL_API_KEY"),
        "openrouter" => Some("OPENROUTER_API_KEY"),
        "xai" => Some("XAI_API_KEY"),
        // ollama, lmstudio and unknown names: let the factory decide.
        _ => None,
    }
}

/// Build a provider around an explicitly passed key.
///
/// Only the hosted providers whose constructors take a key are accepted;
/// the rest read their settings from the environment.
pub fn provider_with_key(
    provider: &str,
    api_key: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ReportError> {
    let llm: Arc<dyn LLMProvider> = match provider.to_ascii_lowercase().as_str() {
        "anthropic" => Arc::new(AnthropicProvider::new(api_key).with_model(model)),
        "openai" => Arc::new(OpenAIProvider::new(api_key).with_model(model)),
        "gemini" => Arc::new(GeminiProvider::new(api_key).with_model(model)),
        other => {
            return Err(ReportError::InvalidConfig(format!(
                "an explicit API key is not supported for provider '{other}'; \
                 configure it through its environment variables instead"
            )))
        }
    };
    Ok(llm)
}

/// Resolve the text generator, from most-specific to least-specific.
///
/// 1. **Injected generator** (`config.generator`) — used as-is.
/// 2. **Explicit key** (`config.api_key`) — handed to the provider's own
///    constructor via [`provider_with_key`].
/// 3. **Environment** — the provider's key variable must be set and
///    non-empty, then [`ProviderFactory::create_llm_provider`] builds it.
///
/// A missing credential is fatal: [`ReportError::MissingCredential`].
pub fn resolve_generator(config: &ReportConfig) -> Result<Arc<dyn TextGenerator>, ReportError> {
    if let Some(ref generator) = config.generator {
        return Ok(Arc::clone(generator));
    }

    let provider = config.provider_name.as_str();

    if let Some(ref key) = config.api_key {
        if key.trim().is_empty() {
            return Err(ReportError::MissingCredential {
                provider: provider.to_string(),
                env_var: credential_env_var(provider).unwrap_or("API key").to_string(),
            });
        }
        let llm = provider_with_key(provider, key.trim(), &config.model)?;
        info!("Using provider {} with explicit key, model {}", provider, config.model);
        return Ok(Arc::new(ProviderGenerator::new(llm, &config.model)));
    }

    if let Some(var) = credential_env_var(provider) {
        let present = std::env::var(var).map(|v| !v.trim().is_empty()).unwrap_or(false);
        if !present {
            return Err(ReportError::MissingCredential {
                provider: provider.to_string(),
                env_var: var.to_string(),
            });
        }
    }

    let llm = ProviderFactory::create_llm_provider(provider, &config.model).map_err(|e| {
        ReportError::ProviderNotConfigured {
            provider: provider.to_string(),
            hint: format!("{e}"),
        }
    })?;
    info!("Using provider {} with model {}", provider, config.model);
    Ok(Arc::new(ProviderGenerator::new(llm, &config.model)))
}
