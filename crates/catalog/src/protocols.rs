use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use beacon_core::{Category, Classification, ProtocolRecord};
use serde::Deserialize;
use tracing::warn;

/// On-disk shape of `crisis_protocols.json`: one bucket per category, each
/// an ordered list of records. Bucket order doubles as match priority.
#[derive(Debug, Default, Deserialize)]
struct ProtocolFile {
    #[serde(default)]
    medical_emergencies: Vec<ProtocolRecord>,
    #[serde(default)]
    mental_health_crises: Vec<ProtocolRecord>,
    #[serde(default)]
    disaster_emergencies: Vec<ProtocolRecord>,
}

/// Read-only in-memory index of category -> protocol records, loaded once
/// at startup and shared across all requests.
#[derive(Debug, Default)]
pub struct ProtocolCatalog {
    medical: Vec<ProtocolRecord>,
    mental_health: Vec<ProtocolRecord>,
    disaster: Vec<ProtocolRecord>,
}

#[derive(Debug, Clone, Copy)]
pub struct CatalogStats {
    pub total: usize,
    pub medical: usize,
    pub mental_health: usize,
    pub disaster: usize,
}

impl ProtocolCatalog {
    /// Load from `crisis_protocols.json`. A missing file degrades to an
    /// empty catalog; a present but unreadable file is a startup error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "crisis protocols file not found, starting with empty catalog");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading protocol catalog at {}", path.display()))?;
        let file: ProtocolFile = serde_json::from_str(&raw)
            .with_context(|| format!("failed parsing protocol catalog at {}", path.display()))?;

        Ok(Self {
            medical: file.medical_emergencies,
            mental_health: file.mental_health_crises,
            disaster: file.disaster_emergencies,
        })
    }

    pub fn bucket(&self, category: Category) -> Option<&[ProtocolRecord]> {
        match category {
            Category::MedicalEmergency => Some(&self.medical),
            Category::MentalHealthCrisis => Some(&self.mental_health),
            Category::DisasterEmergency => Some(&self.disaster),
            Category::Other => None,
        }
    }

    /// Select the protocol with the largest case-insensitive keyword overlap
    /// against the classification.
    ///
    /// Committed tie-break rule: a stable scan with a strict greater-than
    /// comparison, so the first record reaching the maximum score wins and
    /// bucket order acts as an implicit priority. A bucket where every
    /// record scores zero yields no match at all.
    pub fn best_match(&self, classification: &Classification) -> Option<&ProtocolRecord> {
        let bucket = self.bucket(classification.category)?;

        let user_keywords: HashSet<String> = classification
            .keywords
            .iter()
            .map(|keyword| keyword.to_lowercase())
            .collect();

        let mut best_match = None;
        let mut best_score = 0usize;

        for record in bucket {
            let overlap = record
                .keywords
                .iter()
                .filter(|keyword| user_keywords.contains(&keyword.to_lowercase()))
                .count();

            if overlap > best_score {
                best_score = overlap;
                best_match = Some(record);
            }
        }

        best_match
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            total: self.medical.len() + self.mental_health.len() + self.disaster.len(),
            medical: self.medical.len(),
            mental_health: self.mental_health.len(),
            disaster: self.disaster.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stats().total == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::{ProtocolSteps, Severity};
    use std::io::Write;

    fn record(id: &str, keywords: &[&str]) -> ProtocolRecord {
        ProtocolRecord {
            id: id.to_string(),
            name: id.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            severity: "critical".to_string(),
            source: "test".to_string(),
            protocol: ProtocolSteps {
                immediate_actions: vec!["act".to_string()],
                do_not: Vec::new(),
                during: None,
                after: None,
            },
        }
    }

    fn classification(category: Category, keywords: &[&str]) -> Classification {
        Classification {
            category,
            severity: Severity::Critical,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            confidence: 0.75,
            reasoning: "test".to_string(),
            country: "USA".to_string(),
        }
    }

    fn catalog() -> ProtocolCatalog {
        ProtocolCatalog {
            medical: vec![
                record("cardiac_emergency", &["chest pain", "heart attack", "breathing"]),
                record("choking", &["choking", "airway blocked"]),
            ],
            mental_health: vec![record("panic_attack", &["panic attack", "panic", "anxiety"])],
            disaster: Vec::new(),
        }
    }

    #[test]
    fn picks_record_with_largest_overlap() {
        let catalog = catalog();
        let c = classification(Category::MedicalEmergency, &["chest pain", "breathing"]);
        let matched = catalog.best_match(&c).unwrap();
        assert_eq!(matched.id, "cardiac_emergency");
    }

    #[test]
    fn overlap_is_case_insensitive() {
        let catalog = catalog();
        let c = classification(Category::MedicalEmergency, &["Chest Pain"]);
        assert_eq!(catalog.best_match(&c).unwrap().id, "cardiac_emergency");
    }

    #[test]
    fn zero_overlap_everywhere_yields_no_match() {
        let catalog = catalog();
        let c = classification(Category::MedicalEmergency, &["snake bite"]);
        assert!(catalog.best_match(&c).is_none());
    }

    #[test]
    fn ties_break_to_the_earlier_bucket_entry() {
        let catalog = ProtocolCatalog {
            medical: vec![
                record("first", &["bleeding"]),
                record("second", &["bleeding"]),
            ],
            mental_health: Vec::new(),
            disaster: Vec::new(),
        };
        let c = classification(Category::MedicalEmergency, &["bleeding"]);
        assert_eq!(catalog.best_match(&c).unwrap().id, "first");
    }

    #[test]
    fn other_category_has_no_bucket() {
        let catalog = catalog();
        let c = classification(Category::Other, &["anything"]);
        assert!(catalog.best_match(&c).is_none());
    }

    #[test]
    fn matching_is_idempotent() {
        let catalog = catalog();
        let c = classification(Category::MentalHealthCrisis, &["panic attack", "panic"]);
        let first = catalog.best_match(&c).map(|r| r.id.clone());
        let second = catalog.best_match(&c).map(|r| r.id.clone());
        assert_eq!(first, second);
        assert_eq!(first.as_deref(), Some("panic_attack"));
    }

    #[test]
    fn missing_file_loads_as_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = ProtocolCatalog::load(dir.path().join("nope.json")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn loads_buckets_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crisis_protocols.json");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(
            f,
            r#"{{
                "medical_emergencies": [{{
                    "id": "stroke",
                    "name": "Stroke Response",
                    "keywords": ["stroke"],
                    "severity": "critical",
                    "source": "test",
                    "protocol": {{"immediate_actions": ["Call emergency services"], "do_not": []}}
                }}]
            }}"#
        )
        .unwrap();

        let catalog = ProtocolCatalog::load(&path).unwrap();
        assert_eq!(catalog.stats().total, 1);
        assert_eq!(catalog.stats().medical, 1);
        assert_eq!(catalog.stats().mental_health, 0);
    }
}
