use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use beacon_core::{Case, CaseStatus, Classification, ProtocolRecord};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

const CASE_FILE_VERSION: &str = "1.0";

/// Persisted document: the full case set plus bookkeeping metadata.
/// Rewritten in full on every creation, read in full at startup.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CaseFile {
    #[serde(default)]
    cases: Vec<Case>,
    #[serde(default)]
    metadata: CaseFileMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
struct CaseFileMetadata {
    total_cases: u64,
    last_updated: DateTime<Utc>,
    version: String,
}

impl Default for CaseFileMetadata {
    fn default() -> Self {
        Self {
            total_cases: 0,
            last_updated: Utc::now(),
            version: CASE_FILE_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    cases: Vec<Case>,
    counter: u64,
}

/// Owner of all case records and of the monotonic case counter.
///
/// Counter increment, insert, and persistence run as one mutex-guarded
/// critical section so concurrent callers cannot interleave the three
/// steps. Persistence is a full-file rewrite with no atomic rename;
/// cross-process writers can still tear the file.
pub struct CaseStore {
    inner: Mutex<StoreInner>,
    path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct CreateReceipt {
    pub case: Case,
    pub persisted: bool,
}

impl CreateReceipt {
    pub fn case_id(&self) -> &str {
        &self.case.id
    }
}

impl CaseStore {
    /// Open the store at `path`, restoring any previously persisted cases.
    /// A missing or corrupt file means no prior state; never an error.
    ///
    /// The counter is restored as the larger of the persisted metadata
    /// count and the highest case id actually present, so stale metadata
    /// can never regress the counter into reissuing an id.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let inner = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<CaseFile>(&raw) {
                Ok(file) => {
                    let max_id = file
                        .cases
                        .iter()
                        .filter_map(|case| case_number(&case.id))
                        .max()
                        .unwrap_or(0);
                    StoreInner {
                        counter: file.metadata.total_cases.max(max_id),
                        cases: file.cases,
                    }
                }
                Err(parse_error) => {
                    warn!(path = %path.display(), error = %parse_error, "case file unreadable, starting with no prior state");
                    StoreInner::default()
                }
            },
            Err(io_error) => {
                if io_error.kind() != ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %io_error, "case file could not be read, starting with no prior state");
                }
                StoreInner::default()
            }
        };

        Self {
            inner: Mutex::new(inner),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Allocate the next case id, record the case with a severity-derived
    /// follow-up timestamp, and synchronously persist the whole case set.
    ///
    /// A persistence failure is logged and swallowed: the in-memory case
    /// stays authoritative and creation is never rolled back.
    pub fn create(
        &self,
        input_text: &str,
        classification: Classification,
        protocol: Option<&ProtocolRecord>,
    ) -> CreateReceipt {
        let now = Utc::now();
        let follow_up_at = now + classification.severity.follow_up_offset();

        let mut inner = self.inner.lock();
        inner.counter += 1;
        let case = Case {
            id: format!("CASE-{:05}", inner.counter),
            created_at: now,
            input_text: input_text.to_string(),
            classification,
            protocol_id: protocol.map(|record| record.id.clone()),
            status: CaseStatus::Active,
            follow_up_at,
        };
        inner.cases.push(case.clone());

        let persisted = match self.persist_locked(&inner) {
            Ok(()) => true,
            Err(persist_error) => {
                error!(path = %self.path.display(), error = %persist_error, "failed persisting case file, in-memory state remains authoritative");
                false
            }
        };

        CreateReceipt { case, persisted }
    }

    pub fn get(&self, case_id: &str) -> Option<Case> {
        self.inner
            .lock()
            .cases
            .iter()
            .find(|case| case.id == case_id)
            .cloned()
    }

    /// All cases in insertion order.
    pub fn list(&self) -> Vec<Case> {
        self.inner.lock().cases.clone()
    }

    pub fn active_count(&self) -> usize {
        self.inner
            .lock()
            .cases
            .iter()
            .filter(|case| case.status == CaseStatus::Active)
            .count()
    }

    /// Reserved status transition: mark a case closed. Returns false for an
    /// unknown id.
    pub fn close(&self, case_id: &str) -> bool {
        let mut inner = self.inner.lock();
        let Some(case) = inner.cases.iter_mut().find(|case| case.id == case_id) else {
            return false;
        };
        case.status = CaseStatus::Closed;

        if let Err(persist_error) = self.persist_locked(&inner) {
            error!(path = %self.path.display(), error = %persist_error, "failed persisting case file after status transition");
        }
        true
    }

    fn persist_locked(&self, inner: &StoreInner) -> Result<()> {
        let file = CaseFile {
            cases: inner.cases.clone(),
            metadata: CaseFileMetadata {
                total_cases: inner.counter,
                last_updated: Utc::now(),
                version: CASE_FILE_VERSION.to_string(),
            },
        };

        let payload = serde_json::to_string_pretty(&file)?;
        std::fs::write(&self.path, payload)
            .with_context(|| format!("failed writing case file at {}", self.path.display()))?;
        Ok(())
    }
}

fn case_number(case_id: &str) -> Option<u64> {
    case_id.strip_prefix("CASE-")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::{Category, Severity};

    fn classification(severity: Severity) -> Classification {
        Classification {
            category: Category::MedicalEmergency,
            severity,
            keywords: vec!["chest pain".to_string()],
            confidence: 0.75,
            reasoning: "test".to_string(),
            country: "USA".to_string(),
        }
    }

    #[test]
    fn case_ids_are_strictly_increasing() {
        let dir = tempfile::tempdir().unwrap();
        let store = CaseStore::open(dir.path().join("cases.json"));

        let ids: Vec<String> = (0..3)
            .map(|_| {
                store
                    .create("chest pain", classification(Severity::Critical), None)
                    .case.id
            })
            .collect();

        assert_eq!(ids, ["CASE-00001", "CASE-00002", "CASE-00003"]);
    }

    #[test]
    fn follow_up_offset_matches_severity_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = CaseStore::open(dir.path().join("cases.json"));

        let receipt = store.create("disaster", classification(Severity::High), None);
        let case = store.get(&receipt.case.id).unwrap();
        assert_eq!(case.follow_up_at - case.created_at, chrono::Duration::hours(6));
    }

    #[test]
    fn round_trip_restores_cases_and_continues_counter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.json");

        {
            let store = CaseStore::open(&path);
            store.create("first", classification(Severity::Critical), None);
            store.create("second", classification(Severity::Low), None);
        }

        let reloaded = CaseStore::open(&path);
        let cases = reloaded.list();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].id, "CASE-00001");
        assert_eq!(cases[1].id, "CASE-00002");
        assert_eq!(cases[1].classification.severity, Severity::Low);

        let receipt = reloaded.create("third", classification(Severity::Medium), None);
        assert_eq!(receipt.case.id, "CASE-00003");
    }

    #[test]
    fn stale_metadata_cannot_regress_the_counter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.json");

        {
            let store = CaseStore::open(&path);
            store.create("first", classification(Severity::Critical), None);
            store.create("second", classification(Severity::Critical), None);
        }

        // Simulate a partial write that lost the metadata update.
        let raw = std::fs::read_to_string(&path).unwrap();
        let mut doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        doc["metadata"]["total_cases"] = serde_json::json!(0);
        std::fs::write(&path, doc.to_string()).unwrap();

        let reloaded = CaseStore::open(&path);
        let receipt = reloaded.create("third", classification(Severity::Critical), None);
        assert_eq!(receipt.case.id, "CASE-00003");
    }

    #[test]
    fn corrupt_file_means_no_prior_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = CaseStore::open(&path);
        assert!(store.list().is_empty());
        let receipt = store.create("first", classification(Severity::Critical), None);
        assert_eq!(receipt.case.id, "CASE-00001");
    }

    #[test]
    fn persistence_failure_never_rolls_back_creation() {
        let dir = tempfile::tempdir().unwrap();
        let store = CaseStore::open(dir.path().join("missing-dir").join("cases.json"));

        let receipt = store.create("chest pain", classification(Severity::Critical), None);
        assert!(!receipt.persisted);
        assert_eq!(receipt.case.id, "CASE-00001");
        assert!(store.get("CASE-00001").is_some());
    }

    #[test]
    fn close_transitions_status_and_active_count() {
        let dir = tempfile::tempdir().unwrap();
        let store = CaseStore::open(dir.path().join("cases.json"));

        let receipt = store.create("panic", classification(Severity::Medium), None);
        assert_eq!(store.active_count(), 1);

        assert!(store.close(&receipt.case.id));
        assert_eq!(store.active_count(), 0);
        assert_eq!(
            store.get(&receipt.case.id).unwrap().status,
            CaseStatus::Closed
        );
        assert!(!store.close("CASE-99999"));
    }
}
