//! Plain text report formatter.
//!
//! Renders the verdict table, the effective policy listing with
//! provenance, and the completeness caveats as human-readable text.

use std::fmt::Write;

use colored::Colorize;

use super::formatter::OutputFormatter;
use crate::analyzer::GapReport;
use crate::iam::{EffectivePermissionSet, Verdict};

pub struct PlainFormatter {
    pub use_color: bool,
}

impl PlainFormatter {
    fn verdict_tag(&self, verdict: Verdict) -> String {
        let tag = format!("{:<13}", verdict.as_str().to_uppercase());
        if !self.use_color {
            return tag;
        }
        match verdict {
            Verdict::Allowed => tag.green().to_string(),
            Verdict::Denied => tag.red().bold().to_string(),
            Verdict::Indeterminate => tag.yellow().to_string(),
        }
    }
}

impl OutputFormatter for PlainFormatter {
    fn format(&self, report: &GapReport, effective: &EffectivePermissionSet) -> String {
        let mut out = String::new();

        writeln!(out, "Principal: {}", report.principal_arn).unwrap();
        writeln!(out).unwrap();

        // Effective policies, sorted for stable output.
        writeln!(out, "Effective policies ({}):", effective.len()).unwrap();
        let mut documents: Vec<_> = effective.documents.iter().collect();
        documents.sort_by(|a, b| (&a.name, a.provenance.describe()).cmp(&(&b.name, b.provenance.describe())));
        for document in documents {
            writeln!(
                out,
                "  {:<32} {}",
                document.name,
                document.provenance.describe()
            )
            .unwrap();
        }
        writeln!(out).unwrap();

        let (allowed, denied, indeterminate) = report.verdict_counts();
        writeln!(
            out,
            "Required actions ({}): {} allowed, {} denied, {} indeterminate",
            report.verdicts.len(),
            allowed,
            denied,
            indeterminate
        )
        .unwrap();
        for (action, verdict) in &report.verdicts {
            writeln!(out, "  {} {}", self.verdict_tag(*verdict), action).unwrap();
        }

        if report.has_caveats() {
            writeln!(out).unwrap();
            writeln!(out, "Caveats (requirement set may be incomplete):").unwrap();
            if report.discarded_blocks > 0 {
                writeln!(
                    out,
                    "  - {} malformed block(s) discarded during parsing",
                    report.discarded_blocks
                )
                .unwrap();
            }
            if !report.unmapped_types.is_empty() {
                let labels: Vec<String> = report
                    .unmapped_types
                    .iter()
                    .map(|u| u.label())
                    .collect();
                writeln!(out, "  - no action mapping for: {}", labels.join(", ")).unwrap();
            }
        }

        out
    }

    fn extension(&self) -> &'static str {
        "txt"
    }
}
