//! Google Translate via the public `translate_a/single` endpoint.
//!
//! This is the keyless endpoint used by browser extensions (`client=gtx`).
//! The response is a nested JSON array whose first element lists translated
//! segments; each segment's first element is the translated text:
//!
//! ```text
//! [[["Bonjour le monde","Hello world",null,null,10]],null,"en",…]
//! ```

use super::Translator;
use crate::error::TranslationError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Public endpoint queried by [`GoogleTranslator::new`].
pub const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Translator backed by the public Google Translate endpoint.
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleTranslator {
    /// Create a translator whose HTTP requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, TranslationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pdf2tex/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TranslationError::Transport(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }

    /// Point the translator at a different endpoint (proxies, mirrors, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    fn name(&self) -> &str {
        "google"
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationError> {
        debug!("google: {} chars {} → {}", text.chars().count(), source, target);

        // The text goes in the form body: a 4500-character chunk can exceed
        // URL length limits once percent-encoded.
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("client", "gtx"), ("sl", source), ("tl", target), ("dt", "t")])
            .form(&[("q", text)])
            .send()
            .await
            .map_err(|e| TranslationError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TranslationError::RateLimited {
                translator: self.name().to_string(),
            });
        }
        if status == StatusCode::BAD_REQUEST {
            return Err(TranslationError::UnsupportedLanguage {
                translator: self.name().to_string(),
                source_lang: source.to_string(),
                target_lang: target.to_string(),
            });
        }
        if !status.is_success() {
            return Err(TranslationError::Transport(format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TranslationError::Transport(e.to_string()))?;
        parse_response(&body)
    }
}

/// Concatenate the translated segments of a `gtx` response body.
pub fn parse_response(body: &str) -> Result<String, TranslationError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| TranslationError::InvalidResponse(format!("not JSON: {e}")))?;

    let segments = match value.get(0) {
        Some(Value::Array(segments)) => segments,
        // Empty input yields `[null, null, "en", …]`.
        Some(Value::Null) => return Ok(String::new()),
        _ => {
            return Err(TranslationError::InvalidResponse(
                "missing segment list".to_string(),
            ))
        }
    };

    let mut out = String::new();
    for segment in segments {
        match segment.get(0) {
            Some(Value::String(s)) => out.push_str(s),
            Some(Value::Null) | None => {}
            Some(other) => {
                return Err(TranslationError::InvalidResponse(format!(
                    "unexpected segment {other}"
                )))
            }
        }
    }
    Ok(out)
}
