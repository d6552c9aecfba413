//! JSON report formatter.
//!
//! Machine-readable rendering of the gap report for CI pipelines.

use serde::Serialize;

use super::formatter::OutputFormatter;
use crate::analyzer::GapReport;
use crate::iam::EffectivePermissionSet;

#[derive(Serialize)]
struct JsonReport<'a> {
    principal: &'a str,
    generated_at: String,
    verdicts: Vec<JsonVerdict<'a>>,
    unmapped_types: Vec<String>,
    discarded_blocks: usize,
    effective_policies: Vec<JsonPolicy<'a>>,
}

#[derive(Serialize)]
struct JsonVerdict<'a> {
    action: &'a str,
    verdict: &'static str,
}

#[derive(Serialize)]
struct JsonPolicy<'a> {
    name: &'a str,
    provenance: String,
}

pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &GapReport, effective: &EffectivePermissionSet) -> String {
        let document = JsonReport {
            principal: &report.principal_arn,
            generated_at: report.generated_at.to_rfc3339(),
            verdicts: report
                .verdicts
                .iter()
                .map(|(action, verdict)| JsonVerdict {
                    action,
                    verdict: verdict.as_str(),
                })
                .collect(),
            unmapped_types: report.unmapped_types.iter().map(|u| u.label()).collect(),
            discarded_blocks: report.discarded_blocks,
            effective_policies: effective
                .documents
                .iter()
                .map(|d| JsonPolicy {
                    name: &d.name,
                    provenance: d.provenance.describe(),
                })
                .collect(),
        };

        serde_json::to_string_pretty(&document).expect("JSON serialization should not fail")
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}
