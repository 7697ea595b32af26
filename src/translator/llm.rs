//! Translation through an edgequake-llm chat provider.
//!
//! Each chunk becomes one chat request: the system message carries the
//! translation rules from [`crate::prompts`], the user message carries the
//! chunk verbatim.

use super::Translator;
use crate::error::TranslationError;
use crate::prompts::translation_prompt;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

/// Model used when a provider is named without a model.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Translator backed by an LLM chat provider.
pub struct LlmTranslator {
    provider: Arc<dyn LLMProvider>,
    label: String,
    temperature: f32,
    max_tokens: usize,
}

impl LlmTranslator {
    /// Wrap an already constructed provider.
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
            temperature: 0.1,
            // A 4500-character chunk rarely exceeds ~2500 output tokens;
            // the headroom covers scripts that tokenise poorly.
            max_tokens: 8192,
        }
    }

    /// Resolve a provider, from most-specific to least-specific.
    ///
    /// 1. **Named provider** (`provider`) with `model` or [`DEFAULT_MODEL`].
    /// 2. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
    /// 3. **OpenAI** when `OPENAI_API_KEY` is set.
    /// 4. **Full auto-detection** via [`ProviderFactory::from_env`].
    pub fn resolve(provider: Option<&str>, model: Option<&str>) -> Result<Self, TranslationError> {
        if let Some(name) = provider {
            let model = model.unwrap_or(DEFAULT_MODEL);
            return create_provider(name, model);
        }

        if let (Ok(prov), Ok(env_model)) = (
            std::env::var("EDGEQUAKE_LLM_PROVIDER"),
            std::env::var("EDGEQUAKE_MODEL"),
        ) {
            if !prov.is_empty() && !env_model.is_empty() {
                return create_provider(&prov, &env_model);
            }
        }

        if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
            if !openai_key.is_empty() {
                return create_provider("openai", model.unwrap_or(DEFAULT_MODEL));
            }
        }

        let (llm_provider, _embedding) =
            ProviderFactory::from_env().map_err(|e| TranslationError::ProviderNotConfigured {
                provider: "auto".to_string(),
                hint: format!(
                    "No LLM provider could be auto-detected from environment.\n\
                    Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                    Error: {}",
                    e
                ),
            })?;

        Ok(Self::new(llm_provider, "llm:auto"))
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.max_tokens = n;
        self
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

fn create_provider(name: &str, model: &str) -> Result<LlmTranslator, TranslationError> {
    let provider = ProviderFactory::create_llm_provider(name, model).map_err(|e| {
        TranslationError::ProviderNotConfigured {
            provider: name.to_string(),
            hint: format!("{e}"),
        }
    })?;
    Ok(LlmTranslator::new(provider, format!("llm:{name}/{model}")))
}

#[async_trait]
impl Translator for LlmTranslator {
    fn name(&self) -> &str {
        &self.label
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationError> {
        let messages = vec![
            ChatMessage::system(translation_prompt(source, target)),
            ChatMessage::user(text),
        ];

        let response = self
            .provider
            .chat(&messages, Some(&self.options()))
            .await
            .map_err(|e| TranslationError::Transport(format!("{e}")))?;

        debug!(
            "{}: {} input tokens, {} output tokens",
            self.label, response.prompt_tokens, response.completion_tokens
        );

        Ok(strip_outer_fence(&response.content))
    }
}

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\n(.*)\n```\s*$").unwrap());

/// Remove a code fence wrapping the whole reply; models add one despite the prompt.
fn strip_outer_fence(reply: &str) -> String {
    match RE_OUTER_FENCE.captures(reply.trim()) {
        Some(caps) => caps[1].to_string(),
        None => reply.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outer_fence_is_stripped() {
        assert_eq!(strip_outer_fence("```text\nBonjour\n```"), "Bonjour");
        assert_eq!(strip_outer_fence("```\nHallo\nWelt\n```\n"), "Hallo\nWelt");
    }

    #[test]
    fn unfenced_reply_is_untouched() {
        assert_eq!(strip_outer_fence("Hola mundo\n\n"), "Hola mundo\n\n");
    }

    #[test]
    fn inner_fence_is_kept() {
        let reply = "Texte\n```\ncode\n```\nSuite";
        assert_eq!(strip_outer_fence(reply), reply);
    }
}
