//! Translation collaborators.
//!
//! The translation stage talks to the outside world only through the
//! [`Translator`] trait. A translator is constructed explicitly, once per
//! run, from [`crate::config::ConversionConfig`] (or handed in pre-built),
//! and shared by every chunk task through an `Arc`.
//!
//! | Backend | Type | Needs |
//! |---------|------|-------|
//! | [`TranslatorBackend::Google`] | [`GoogleTranslator`] | network access |
//! | [`TranslatorBackend::Llm`] | [`LlmTranslator`] | an edgequake-llm provider key |

pub mod google;
pub mod llm;

use crate::config::{ConversionConfig, TranslatorBackend};
use crate::error::TranslationError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub use google::GoogleTranslator;
pub use llm::LlmTranslator;

/// A service that translates one chunk of text.
///
/// Implementations must be `Send + Sync`: chunks of a run are translated
/// concurrently through the same instance.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Short identifier used in logs and error messages, e.g. `"google"`.
    fn name(&self) -> &str;

    /// Translate `text` from `source` (`"auto"` to detect) into `target`.
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationError>;
}

/// Build the translator for a run.
///
/// A pre-built `config.translator` wins; otherwise the configured backend is
/// instantiated with the run's timeout.
pub fn create_translator(
    config: &ConversionConfig,
) -> Result<Arc<dyn Translator>, TranslationError> {
    if let Some(ref translator) = config.translator {
        return Ok(Arc::clone(translator));
    }

    match config.translator_backend {
        TranslatorBackend::Google => {
            let timeout = Duration::from_secs(config.chunk_timeout_secs.max(1));
            Ok(Arc::new(GoogleTranslator::new(timeout)?))
        }
        TranslatorBackend::Llm {
            ref provider,
            ref model,
        } => Ok(Arc::new(LlmTranslator::resolve(
            provider.as_deref(),
            model.as_deref(),
        )?)),
    }
}
