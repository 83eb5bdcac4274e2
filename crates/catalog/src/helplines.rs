use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use beacon_core::{Category, Classification, EmergencyContacts, HelplineSet};
use serde::Deserialize;
use tracing::warn;

/// Entry used when a requested country is absent from the directory.
pub const DEFAULT_COUNTRY: &str = "USA";

#[derive(Debug, Default, Deserialize)]
struct HelplineFile {
    #[serde(default)]
    global_helplines: GlobalHelplines,
}

#[derive(Debug, Default, Deserialize)]
struct GlobalHelplines {
    #[serde(default)]
    emergency_services: HashMap<String, EmergencyContacts>,
    #[serde(default)]
    mental_health: HashMap<String, Vec<String>>,
}

/// Read-only country -> emergency contact directory with a default-country
/// fallback.
#[derive(Debug, Default)]
pub struct HelplineDirectory {
    emergency_services: HashMap<String, EmergencyContacts>,
    mental_health: HashMap<String, Vec<String>>,
}

impl HelplineDirectory {
    /// Load from `helplines.json`. A missing file degrades to an empty
    /// directory; a present but unreadable file is a startup error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "helplines file not found, starting with empty directory");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading helpline directory at {}", path.display()))?;
        let file: HelplineFile = serde_json::from_str(&raw)
            .with_context(|| format!("failed parsing helpline directory at {}", path.display()))?;

        Ok(Self {
            emergency_services: file.global_helplines.emergency_services,
            mental_health: file.global_helplines.mental_health,
        })
    }

    /// Resolve contacts for a classification's country, falling back to the
    /// default country when absent. `crisis_support` is only populated for
    /// mental-health classifications.
    pub fn lookup(&self, classification: &Classification) -> HelplineSet {
        let country = classification.country.as_str();

        let emergency_services = self
            .emergency_services
            .get(country)
            .or_else(|| self.emergency_services.get(DEFAULT_COUNTRY))
            .cloned();

        let crisis_support = if classification.category == Category::MentalHealthCrisis {
            self.mental_health
                .get(country)
                .or_else(|| self.mental_health.get(DEFAULT_COUNTRY))
                .cloned()
        } else {
            None
        };

        HelplineSet {
            emergency_services,
            crisis_support,
        }
    }

    pub fn countries_supported(&self) -> usize {
        self.emergency_services.len()
    }
}
