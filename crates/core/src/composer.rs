use crate::models::{Case, Classification, HelplineSet, ProtocolRecord};

const MAX_IMMEDIATE_ACTIONS: usize = 6;
const MAX_DO_NOT_WARNINGS: usize = 4;

const DISCLAIMER: &str = "IMPORTANT: This is an automated triage assistant. Always call emergency \
services for life-threatening situations.\nThis system provides guidance but does NOT replace \
professional medical or crisis intervention.";

/// Assemble the final textual payload for a handled report. Pure and
/// deterministic: same inputs, same string.
pub fn compose_response(
    classification: &Classification,
    protocol: Option<&ProtocolRecord>,
    helplines: &HelplineSet,
    case: &Case,
) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} DETECTED - {} SEVERITY\n",
        classification.category.banner_label(),
        classification.severity.as_code().to_uppercase()
    ));
    out.push_str(&"=".repeat(70));
    out.push_str("\n\n");

    if let Some(record) = protocol {
        if !record.protocol.immediate_actions.is_empty() {
            out.push_str("IMMEDIATE ACTIONS:\n");
            for (index, action) in record
                .protocol
                .immediate_actions
                .iter()
                .take(MAX_IMMEDIATE_ACTIONS)
                .enumerate()
            {
                out.push_str(&format!("{}. {}\n", index + 1, action));
            }
            out.push('\n');
        }
    }

    if let Some(contacts) = &helplines.emergency_services {
        out.push_str("EMERGENCY CONTACTS:\n");
        if let Some(number) = &contacts.emergency {
            out.push_str(&format!("   Emergency Services: {number}\n"));
        }
        if let Some(number) = &contacts.suicide_prevention {
            out.push_str(&format!("   Suicide Prevention: {number}\n"));
        }
        if let Some(number) = &contacts.crisis_text {
            out.push_str(&format!("   Crisis Text Line: {number}\n"));
        }
        out.push('\n');
    }

    if let Some(record) = protocol {
        out.push_str(&format!("Protocol: {}\n", record.name));
        out.push_str(&format!("Source: {}\n\n", record.source));

        if !record.protocol.do_not.is_empty() {
            out.push_str("DO NOT:\n");
            for warning in record.protocol.do_not.iter().take(MAX_DO_NOT_WARNINGS) {
                out.push_str(&format!("   x {warning}\n"));
            }
            out.push('\n');
        }
    }

    out.push_str(&format!("Case ID: {}\n", case.id));
    out.push_str(&format!(
        "Follow-up scheduled: {}\n",
        case.follow_up_at.format("%Y-%m-%d %H:%M UTC")
    ));
    out.push_str(&format!(
        "Confidence: {:.0}%\n\n",
        classification.confidence * 100.0
    ));

    out.push_str(DISCLAIMER);
    out.push('\n');

    out
}
