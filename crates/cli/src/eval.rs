//! Scores the keyword classification and protocol retrieval paths against a
//! small gold dataset, and checks that follow-up scheduling stays consistent
//! across severities.

use beacon_agents::{CrisisCoordinator, DEFAULT_COUNTRY};

struct GoldItem {
    input: &'static str,
    expected_category: &'static str,
    expected_severity: &'static str,
    expected_protocol_id: &'static str,
}

const GOLD_DATASET: &[GoldItem] = &[
    GoldItem {
        input: "My father is having severe chest pain and difficulty breathing",
        expected_category: "medical_emergency",
        expected_severity: "critical",
        expected_protocol_id: "cardiac_emergency",
    },
    GoldItem {
        input: "I want to kill myself, I can't take it anymore",
        expected_category: "mental_health_crisis",
        expected_severity: "critical",
        expected_protocol_id: "suicidal_thoughts",
    },
    GoldItem {
        input: "I'm having a panic attack, my heart is racing",
        expected_category: "mental_health_crisis",
        expected_severity: "medium",
        expected_protocol_id: "panic_attack",
    },
    GoldItem {
        input: "Earthquake just hit, building is shaking violently",
        expected_category: "disaster_emergency",
        expected_severity: "high",
        expected_protocol_id: "earthquake",
    },
    GoldItem {
        input: "Someone is choking and can't breathe",
        expected_category: "medical_emergency",
        expected_severity: "critical",
        expected_protocol_id: "choking",
    },
    GoldItem {
        input: "I think my mother is having a stroke, her face is drooping",
        expected_category: "medical_emergency",
        expected_severity: "critical",
        expected_protocol_id: "stroke",
    },
    GoldItem {
        input: "Fire in the building, smoke everywhere",
        expected_category: "disaster_emergency",
        expected_severity: "critical",
        expected_protocol_id: "fire",
    },
    GoldItem {
        input: "Feeling extremely anxious and overwhelmed with studies",
        expected_category: "mental_health_crisis",
        expected_severity: "medium",
        expected_protocol_id: "panic_attack",
    },
    GoldItem {
        input: "Severe bleeding from a deep cut on my arm",
        expected_category: "medical_emergency",
        expected_severity: "high",
        expected_protocol_id: "severe_bleeding",
    },
    GoldItem {
        input: "Flash flood warning, water rising in hostel",
        expected_category: "disaster_emergency",
        expected_severity: "high",
        expected_protocol_id: "flood",
    },
];

struct ItemResult {
    input: &'static str,
    category_correct: bool,
    severity_correct: bool,
    protocol_correct: bool,
}

pub struct EvalMetrics {
    pub total: usize,
    pub category_accuracy: f64,
    pub severity_accuracy: f64,
    pub protocol_precision: f64,
    results: Vec<ItemResult>,
}

impl EvalMetrics {
    pub fn overall_accuracy(&self) -> f64 {
        (self.category_accuracy + self.severity_accuracy + self.protocol_precision) / 3.0
    }
}

pub async fn evaluate_classification(agent: &CrisisCoordinator) -> EvalMetrics {
    let mut category_hits = 0;
    let mut severity_hits = 0;
    let mut protocol_hits = 0;
    let mut results = Vec::with_capacity(GOLD_DATASET.len());

    for item in GOLD_DATASET {
        let classification = agent
            .classify(item.input, DEFAULT_COUNTRY)
            .await
            .into_classification();
        let protocol = agent.match_protocol(&classification);

        let category_correct = classification.category.as_code() == item.expected_category;
        let severity_correct = classification.severity.as_code() == item.expected_severity;
        let protocol_correct = protocol
            .map(|record| record.id == item.expected_protocol_id)
            .unwrap_or(false);

        category_hits += category_correct as usize;
        severity_hits += severity_correct as usize;
        protocol_hits += protocol_correct as usize;

        results.push(ItemResult {
            input: item.input,
            category_correct,
            severity_correct,
            protocol_correct,
        });
    }

    let total = GOLD_DATASET.len();
    EvalMetrics {
        total,
        category_accuracy: category_hits as f64 / total as f64,
        severity_accuracy: severity_hits as f64 / total as f64,
        protocol_precision: protocol_hits as f64 / total as f64,
        results,
    }
}

/// Files one report per severity and checks the scheduled follow-up times
/// are distinct.
pub async fn evaluate_follow_up_consistency(agent: &CrisisCoordinator) -> bool {
    let reports = [
        "Severe chest pain and trouble breathing",
        "Earthquake hit the neighborhood",
        "Having a panic attack right now",
        "General question about staying prepared",
    ];

    for report in reports {
        agent.handle_report(report, DEFAULT_COUNTRY).await;
    }

    let cases = agent.list_cases();
    let mut times: Vec<_> = cases.iter().map(|case| case.follow_up_at).collect();
    times.sort();
    times.dedup();
    times.len() == cases.len()
}

pub async fn run(agent: &CrisisCoordinator) {
    println!("Running evaluation suite...\n");

    let metrics = evaluate_classification(agent).await;
    let follow_up_consistent = evaluate_follow_up_consistency(agent).await;

    println!("{}", "=".repeat(80));
    println!("CRISIS TRIAGE EVALUATION RESULTS");
    println!("{}\n", "=".repeat(80));

    println!("{:<30} {:<10}", "Metric", "Score");
    println!("{}", "-".repeat(40));
    println!(
        "{:<30} {:>6.2}%",
        "Category classification",
        metrics.category_accuracy * 100.0
    );
    println!(
        "{:<30} {:>6.2}%",
        "Severity classification",
        metrics.severity_accuracy * 100.0
    );
    println!(
        "{:<30} {:>6.2}%",
        "Protocol retrieval precision",
        metrics.protocol_precision * 100.0
    );
    println!(
        "{:<30} {:>6.2}%",
        "Overall accuracy",
        metrics.overall_accuracy() * 100.0
    );
    println!(
        "{:<30} {}",
        "Follow-up consistency",
        if follow_up_consistent { "pass" } else { "FAIL" }
    );

    println!("\n{:<55} {:<9} {:<9} {:<9}", "Input", "Category", "Severity", "Protocol");
    println!("{}", "-".repeat(82));
    for result in &metrics.results {
        let mut input = result.input.to_string();
        if input.len() > 50 {
            input.truncate(50);
            input.push_str("...");
        }
        println!(
            "{:<55} {:<9} {:<9} {:<9}",
            input,
            mark(result.category_correct),
            mark(result.severity_correct),
            mark(result.protocol_correct),
        );
    }

    println!("\n{}", "=".repeat(80));
    println!(
        "Evaluation complete over {} samples. Overall score: {:.1}%",
        metrics.total,
        metrics.overall_accuracy() * 100.0
    );
}

fn mark(correct: bool) -> &'static str {
    if correct {
        "ok"
    } else {
        "MISS"
    }
}
