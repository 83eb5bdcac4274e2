use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use beacon_catalog::{HelplineDirectory, ProtocolCatalog};
use beacon_classifier::{ClassificationOutcome, CrisisClassifier};
use beacon_core::{compose_response, Case, Classification, ProtocolRecord};
use beacon_observability::AppMetrics;
use beacon_storage::CaseStore;
use serde::Serialize;
use tracing::{info, instrument};

pub const DEFAULT_COUNTRY: &str = beacon_catalog::DEFAULT_COUNTRY;

/// Result of handling one crisis report end to end.
#[derive(Debug, Clone, Serialize)]
pub struct CrisisOutcome {
    pub case_id: String,
    pub classification: Classification,
    pub response_text: String,
    pub fallback_used: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub protocols_loaded: usize,
    pub active_cases: usize,
    pub backend_configured: bool,
}

/// Orchestrates the triage pipeline: classify, match a protocol, look up
/// helplines, record the case, compose the reply.
pub struct CrisisCoordinator {
    classifier: CrisisClassifier,
    protocols: Arc<ProtocolCatalog>,
    helplines: Arc<HelplineDirectory>,
    store: Arc<CaseStore>,
    metrics: Arc<AppMetrics>,
}

impl CrisisCoordinator {
    pub fn new(
        classifier: CrisisClassifier,
        protocols: Arc<ProtocolCatalog>,
        helplines: Arc<HelplineDirectory>,
        store: Arc<CaseStore>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            classifier,
            protocols,
            helplines,
            store,
            metrics,
        }
    }

    /// Load catalogs from `data_root`, open the case store at `cases_file`,
    /// and wire everything together.
    pub fn bootstrap(
        data_root: impl AsRef<Path>,
        cases_file: impl AsRef<Path>,
        classifier: CrisisClassifier,
        metrics: Arc<AppMetrics>,
    ) -> Result<Self> {
        let data_root = data_root.as_ref();
        let protocols = Arc::new(ProtocolCatalog::load(
            data_root.join("crisis_protocols.json"),
        )?);
        let helplines = Arc::new(HelplineDirectory::load(data_root.join("helplines.json"))?);
        let store = Arc::new(CaseStore::open(cases_file.as_ref()));

        Ok(Self::new(classifier, protocols, helplines, store, metrics))
    }

    /// Handle a crisis report end to end. Never rejects input: text with no
    /// recognizable crisis degrades to `other`/`low` and is still tracked.
    #[instrument(skip(self, text))]
    pub async fn handle_report(&self, text: &str, country: &str) -> CrisisOutcome {
        let started = Instant::now();
        self.metrics.inc_report();

        let outcome = self.classifier.classify(text, country).await;
        let fallback_used = outcome.is_fallback();
        if fallback_used {
            self.metrics.inc_fallback_classification();
        }
        let classification = outcome.into_classification();

        let protocol = self.protocols.best_match(&classification);
        if protocol.is_some() {
            self.metrics.inc_protocol_match();
        }

        let helplines = self.helplines.lookup(&classification);

        let receipt = self.store.create(text, classification.clone(), protocol);
        if !receipt.persisted {
            self.metrics.inc_persistence_failure();
        }

        let response_text = compose_response(&classification, protocol, &helplines, &receipt.case);

        self.metrics.observe_latency(started.elapsed());
        info!(
            case_id = %receipt.case.id,
            category = classification.category.as_code(),
            severity = classification.severity.as_code(),
            fallback_used,
            protocol_id = receipt.case.protocol_id.as_deref().unwrap_or("none"),
            "crisis report handled"
        );

        CrisisOutcome {
            case_id: receipt.case.id,
            classification,
            response_text,
            fallback_used,
        }
    }

    /// Classification without side effects; used by the evaluation harness.
    pub async fn classify(&self, text: &str, country: &str) -> ClassificationOutcome {
        self.classifier.classify(text, country).await
    }

    /// Protocol retrieval without side effects; used by the evaluation
    /// harness.
    pub fn match_protocol(&self, classification: &Classification) -> Option<ProtocolRecord> {
        self.protocols.best_match(classification).cloned()
    }

    pub fn get_case(&self, case_id: &str) -> Option<Case> {
        self.store.get(case_id)
    }

    pub fn list_cases(&self) -> Vec<Case> {
        self.store.list()
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            protocols_loaded: self.protocols.stats().total,
            active_cases: self.store.active_count(),
            backend_configured: self.classifier.backend_configured(),
        }
    }

    pub fn protocol_catalog(&self) -> &ProtocolCatalog {
        &self.protocols
    }

    pub fn helpline_directory(&self) -> &HelplineDirectory {
        &self.helplines
    }
}
