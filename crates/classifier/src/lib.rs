mod backend;

use beacon_core::{classify_fallback, Classification};
use tracing::warn;

pub use backend::{BackendError, GeminiBackend};

/// Which path produced a classification. Making the two outcomes explicit
/// keeps the "classification never fails" contract structural: every code
/// path ends in one of these variants, there is no error to propagate.
#[derive(Debug, Clone)]
pub enum ClassificationOutcome {
    Backend(Classification),
    Fallback(Classification),
}

impl ClassificationOutcome {
    pub fn classification(&self) -> &Classification {
        match self {
            Self::Backend(classification) | Self::Fallback(classification) => classification,
        }
    }

    pub fn into_classification(self) -> Classification {
        match self {
            Self::Backend(classification) | Self::Fallback(classification) => classification,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Free-text triage classifier with a primary external-backend path and a
/// deterministic keyword fallback.
pub struct CrisisClassifier {
    backend: Option<GeminiBackend>,
}

impl CrisisClassifier {
    pub fn new(backend: Option<GeminiBackend>) -> Self {
        Self { backend }
    }

    /// Configure from `GEMINI_API_KEY` / `BEACON_MODEL`; no key means the
    /// fallback path handles every report.
    pub fn from_env() -> Self {
        let backend = std::env::var("GEMINI_API_KEY").ok().map(|api_key| {
            let model = std::env::var("BEACON_MODEL").ok();
            GeminiBackend::new(api_key, model)
        });

        if backend.is_none() {
            warn!("no GEMINI_API_KEY configured, classification runs keyword-only");
        }

        Self { backend }
    }

    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub fn backend_configured(&self) -> bool {
        self.backend.is_some()
    }

    /// Classify a report. Any backend failure (transport, status, malformed
    /// reply) is recovered locally by the keyword fallback and never
    /// surfaced to the caller.
    pub async fn classify(&self, text: &str, country: &str) -> ClassificationOutcome {
        if let Some(backend) = &self.backend {
            match backend.classify(text, country).await {
                Ok(classification) => return ClassificationOutcome::Backend(classification),
                Err(error) => {
                    warn!(%error, "backend classification failed, using keyword fallback");
                }
            }
        }

        ClassificationOutcome::Fallback(classify_fallback(text, country))
    }
}
