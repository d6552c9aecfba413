//! Output formatter trait and factory.

use crate::analyzer::GapReport;
use crate::cli::OutputFormat;
use crate::iam::EffectivePermissionSet;

/// Formats a gap report (plus the aggregated policy listing) into the
/// final output string.
pub trait OutputFormatter {
    fn format(&self, report: &GapReport, effective: &EffectivePermissionSet) -> String;

    /// File extension used when writing to a file.
    fn extension(&self) -> &'static str;
}

/// Creates the formatter for the given output format.
///
/// `use_color` only affects the plain formatter; structured formats are
/// never colored.
pub fn create_formatter(format: OutputFormat, use_color: bool) -> Box<dyn OutputFormatter> {
    use super::json::JsonFormatter;
    use super::plain::PlainFormatter;

    match format {
        OutputFormat::Plain => Box::new(PlainFormatter { use_color }),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}
