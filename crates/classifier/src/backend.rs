use std::time::Duration;

use beacon_core::{Category, Classification, Severity};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("http transport failure: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned status {0}")]
    Status(u16),
    #[error("backend reply carried no candidate text")]
    EmptyReply,
    #[error("backend reply was not a valid classification document: {0}")]
    MalformedReply(#[from] serde_json::Error),
}

/// Classification client for the Google generative-language API. Every
/// deviation from the strict reply contract is an error; the caller decides
/// what recovery looks like.
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

/// The structured document the instruction template demands from the model.
/// Unknown category or severity values fail deserialization, which is the
/// intended treatment of shape deviations.
#[derive(Debug, Deserialize)]
struct BackendClassification {
    category: Category,
    severity: Severity,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    reasoning: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>, model: Option<String>) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        model: Option<String>,
        base_url: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url,
        }
    }

    pub async fn classify(&self, text: &str, country: &str) -> Result<Classification, BackendError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": classification_prompt(text) }] }]
        });

        let response = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status().as_u16()));
        }

        let reply: GenerateContentResponse = response.json().await?;
        let candidate_text = reply
            .candidates
            .first()
            .and_then(|candidate| candidate.content.parts.first())
            .map(|part| part.text.as_str())
            .ok_or(BackendError::EmptyReply)?;

        parse_reply(candidate_text, country)
    }
}

/// Fixed instruction template: category, severity, keywords, confidence and
/// reasoning in a strict JSON shape, anchored with few-shot examples.
fn classification_prompt(user_input: &str) -> String {
    format!(
        r#"You are a crisis classification expert. Analyze the following crisis report and classify it.

User Report: "{user_input}"

Classify this crisis into ONE of these categories:
1. medical_emergency (heart attack, stroke, severe bleeding, choking, etc.)
2. mental_health_crisis (panic attack, suicidal thoughts, PTSD, severe anxiety)
3. disaster_emergency (earthquake, flood, fire, hurricane, etc.)
4. other (general distress, non-emergency)

Also assess severity:
- critical (immediate life threat, requires emergency services NOW)
- high (serious situation, needs urgent attention)
- medium (concerning but not immediately life-threatening)
- low (general support needed)

Respond in this EXACT JSON format:
{{
    "category": "medical_emergency|mental_health_crisis|disaster_emergency|other",
    "severity": "critical|high|medium|low",
    "keywords": ["keyword1", "keyword2"],
    "confidence": 0.0-1.0,
    "reasoning": "brief explanation"
}}

Examples:

Input: "My father is having chest pain and can't breathe"
Output: {{"category": "medical_emergency", "severity": "critical", "keywords": ["chest pain", "breathing difficulty"], "confidence": 0.95, "reasoning": "Potential cardiac emergency"}}

Input: "I'm feeling really anxious and having panic attacks"
Output: {{"category": "mental_health_crisis", "severity": "medium", "keywords": ["anxiety", "panic attacks"], "confidence": 0.90, "reasoning": "Panic attack symptoms"}}

Input: "Earthquake just hit, building shaking"
Output: {{"category": "disaster_emergency", "severity": "high", "keywords": ["earthquake", "building shaking"], "confidence": 0.98, "reasoning": "Active seismic event"}}

Now classify this:
Input: "{user_input}"
Output:"#
    )
}

fn parse_reply(raw: &str, country: &str) -> Result<Classification, BackendError> {
    let cleaned = strip_code_fences(raw.trim());
    let parsed: BackendClassification = serde_json::from_str(cleaned)?;

    Ok(Classification {
        category: parsed.category,
        severity: parsed.severity,
        keywords: parsed.keywords,
        confidence: parsed.confidence.clamp(0.0, 1.0),
        reasoning: parsed.reasoning,
        country: country.to_string(),
    })
}

/// Models often wrap the JSON document in a markdown code block; unwrap the
/// first fenced segment and drop an optional `json` language tag.
fn strip_code_fences(raw: &str) -> &str {
    if !raw.starts_with("```") {
        return raw;
    }

    let mut segments = raw.split("```");
    segments.next();
    let inner = segments.next().unwrap_or(raw);
    inner.strip_prefix("json").unwrap_or(inner).trim()
}
