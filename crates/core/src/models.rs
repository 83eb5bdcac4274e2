use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    MedicalEmergency,
    MentalHealthCrisis,
    DisasterEmergency,
    Other,
}

impl Category {
    pub fn as_code(self) -> &'static str {
        match self {
            Self::MedicalEmergency => "medical_emergency",
            Self::MentalHealthCrisis => "mental_health_crisis",
            Self::DisasterEmergency => "disaster_emergency",
            Self::Other => "other",
        }
    }

    pub fn banner_label(self) -> &'static str {
        match self {
            Self::MedicalEmergency => "MEDICAL EMERGENCY",
            Self::MentalHealthCrisis => "MENTAL HEALTH CRISIS",
            Self::DisasterEmergency => "DISASTER EMERGENCY",
            Self::Other => "GENERAL DISTRESS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_code(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Committed follow-up schedule: how long after case creation a
    /// follow-up should be recorded for each severity tier.
    pub fn follow_up_offset(self) -> Duration {
        match self {
            Self::Critical => Duration::hours(2),
            Self::High => Duration::hours(6),
            Self::Medium => Duration::days(1),
            Self::Low => Duration::days(3),
        }
    }
}

/// Structured triage result for one report. Built fresh per request by
/// either classification path and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub severity: Severity,
    pub keywords: Vec<String>,
    pub confidence: f64,
    pub reasoning: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolSteps {
    #[serde(default)]
    pub immediate_actions: Vec<String>,
    #[serde(default)]
    pub do_not: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub during: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<Vec<String>>,
}

/// One entry of the static response knowledge base. Loaded once at startup
/// and shared read-only; identity is `id`, unique within its category bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub severity: String,
    pub source: String,
    pub protocol: ProtocolSteps,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmergencyContacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suicide_prevention: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crisis_text: Option<String>,
}

/// Per-request helpline lookup result. `crisis_support` is only populated
/// for mental-health classifications.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HelplineSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_services: Option<EmergencyContacts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crisis_support: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Active,
    Closed,
}

/// A tracked crisis case. Created exactly once by the case store; the only
/// permitted mutation afterwards is a status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub input_text: String,
    pub classification: Classification,
    pub protocol_id: Option<String>,
    pub status: CaseStatus,
    pub follow_up_at: DateTime<Utc>,
}
