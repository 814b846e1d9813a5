use miette::{GraphicalReportHandler, GraphicalTheme, LabeledSpan, NamedSource, Report, miette};
use no_color::is_no_color;

use crate::RelverError;

const SOURCE_NAME: &str = "git describe --dirty";

/// Represents an error report that can either be a simple string or a detailed report with source code.
#[derive(Debug)]
pub enum ErrorReport {
    /// A simple string representation of the error
    String(String),
    /// A report pointing into the output of git describe
    Report(Report),
}

/// Builds a report for an error, labelling the offending part of the git describe output.
pub fn build_report(error: &RelverError) -> ErrorReport {
    let (description, range, label) = match error {
        RelverError::InvalidRelease {
            release,
            description,
        } => {
            let range = if description.starts_with(release.as_str()) {
                0..release.len()
            } else {
                0..description.len()
            };
            (description, range, "not a PEP440 release")
        }
        RelverError::UnparsableDescription(description) => {
            (description, 0..description.len(), "unexpected output")
        }
        _ => return ErrorReport::String(error.to_string()),
    };
    if description.is_empty() {
        return ErrorReport::String(error.to_string());
    }

    let source = NamedSource::new(SOURCE_NAME, description.clone());
    let report = miette!(labels = vec![LabeledSpan::at(range, label)], "{error}")
        .with_source_code(source);
    ErrorReport::Report(report)
}

/// Renders a report to a string using the graphical report handler.
pub fn render_report<W>(writer: &mut W, report: &Report) -> std::fmt::Result
where
    W: std::fmt::Write,
{
    let theme = if is_no_color() {
        GraphicalTheme::none()
    } else {
        GraphicalTheme::ascii()
    };
    GraphicalReportHandler::new_themed(theme).render_report(writer, report.as_ref())
}
