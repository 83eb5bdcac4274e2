use crate::models::{Category, Classification, Severity};

/// One ordered bucket of the deterministic fallback vocabulary.
///
/// The list order below is the committed matching priority: medical first,
/// then mental health, then disaster. The first bucket with at least one
/// substring hit in the lowercased input wins outright; there is no scoring
/// across buckets.
pub struct LexiconEntry {
    pub category: Category,
    pub severity: Severity,
    pub reasoning: &'static str,
    pub phrases: &'static [&'static str],
}

pub const FALLBACK_LEXICON: &[LexiconEntry] = &[
    LexiconEntry {
        category: Category::MedicalEmergency,
        severity: Severity::Critical,
        reasoning: "Keyword-based medical classification",
        phrases: &[
            "chest pain",
            "heart attack",
            "stroke",
            "bleeding",
            "choking",
            "breathing",
            "unconscious",
            "seizure",
            "broken bone",
        ],
    },
    LexiconEntry {
        category: Category::MentalHealthCrisis,
        severity: Severity::Medium,
        reasoning: "Keyword-based mental health classification",
        phrases: &[
            "suicide",
            "kill myself",
            "panic attack",
            "panic",
            "anxiety",
            "anxious",
            "depressed",
            "depression",
            "self-harm",
            "ptsd",
            "trauma",
            "want to die",
            "overwhelmed",
            "stressed",
            "mental health",
            "nervous",
            "worried",
            "don't want to live",
            "no reason to live",
            "hopeless",
        ],
    },
    LexiconEntry {
        category: Category::DisasterEmergency,
        severity: Severity::High,
        reasoning: "Keyword-based disaster classification",
        phrases: &[
            "earthquake",
            "flood",
            "fire",
            "hurricane",
            "tornado",
            "tsunami",
            "explosion",
            "building collapse",
        ],
    },
];

/// Any of these phrases escalates a mental-health fallback match to critical,
/// regardless of which other phrases were hit.
pub const SUICIDAL_IDEATION_PHRASES: &[&str] = &[
    "suicide",
    "kill myself",
    "end it all",
    "want to die",
    "no reason to live",
    "don't want to live",
    "hopeless",
];

/// Calibration constants, not statistical estimates.
pub const FALLBACK_MATCH_CONFIDENCE: f64 = 0.75;
pub const FALLBACK_OTHER_CONFIDENCE: f64 = 0.5;

/// Deterministic keyword classification. Never fails; input with no lexicon
/// hit degrades to `other`/`low` with an empty keyword set.
pub fn classify_fallback(text: &str, country: &str) -> Classification {
    let lower = text.to_lowercase();

    for entry in FALLBACK_LEXICON {
        let keywords: Vec<String> = entry
            .phrases
            .iter()
            .filter(|phrase| lower.contains(**phrase))
            .map(|phrase| (*phrase).to_string())
            .collect();

        if keywords.is_empty() {
            continue;
        }

        let severity = if entry.category == Category::MentalHealthCrisis
            && SUICIDAL_IDEATION_PHRASES
                .iter()
                .any(|phrase| lower.contains(phrase))
        {
            Severity::Critical
        } else {
            entry.severity
        };

        return Classification {
            category: entry.category,
            severity,
            keywords,
            confidence: FALLBACK_MATCH_CONFIDENCE,
            reasoning: entry.reasoning.to_string(),
            country: country.to_string(),
        };
    }

    Classification {
        category: Category::Other,
        severity: Severity::Low,
        keywords: Vec::new(),
        confidence: FALLBACK_OTHER_CONFIDENCE,
        reasoning: "No specific crisis keywords detected".to_string(),
        country: country.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medical_keywords_classify_critical() {
        let result = classify_fallback(
            "My father is having severe chest pain and difficulty breathing",
            "USA",
        );
        assert_eq!(result.category, Category::MedicalEmergency);
        assert_eq!(result.severity, Severity::Critical);
        assert!(result.keywords.contains(&"chest pain".to_string()));
        assert!(result.keywords.contains(&"breathing".to_string()));
    }

    #[test]
    fn medical_bucket_wins_over_later_buckets() {
        // "bleeding" (medical) and "fire" (disaster) both hit; medical is
        // checked first and wins without cross-bucket scoring.
        let result = classify_fallback("bleeding badly after the fire", "USA");
        assert_eq!(result.category, Category::MedicalEmergency);
    }

    #[test]
    fn suicidal_phrases_escalate_to_critical() {
        let result = classify_fallback("I feel hopeless and don't want to live anymore", "USA");
        assert_eq!(result.category, Category::MentalHealthCrisis);
        assert_eq!(result.severity, Severity::Critical);
    }

    #[test]
    fn panic_attack_stays_medium() {
        let result = classify_fallback("I'm having a panic attack and can't calm down", "USA");
        assert_eq!(result.category, Category::MentalHealthCrisis);
        assert_eq!(result.severity, Severity::Medium);
        assert!(result.keywords.contains(&"panic attack".to_string()));
    }

    #[test]
    fn disaster_keywords_classify_high() {
        let result = classify_fallback("Earthquake just hit, building is shaking", "IN");
        assert_eq!(result.category, Category::DisasterEmergency);
        assert_eq!(result.severity, Severity::High);
        assert_eq!(result.country, "IN");
    }

    #[test]
    fn unmatched_input_degrades_to_other_low() {
        let result = classify_fallback("just checking in, nothing is wrong", "USA");
        assert_eq!(result.category, Category::Other);
        assert_eq!(result.severity, Severity::Low);
        assert!(result.keywords.is_empty());
        assert_eq!(result.confidence, FALLBACK_OTHER_CONFIDENCE);
    }

    #[test]
    fn empty_input_degrades_to_other_low() {
        let result = classify_fallback("", "USA");
        assert_eq!(result.category, Category::Other);
        assert_eq!(result.severity, Severity::Low);
    }
}
