mod json;
mod terminal;

pub use json::JsonReporter;
pub use terminal::TerminalReporter;

use crate::analysis::{Analysis, DependencyInfo};
use crate::graph::{ClassName, ReferenceKind};
use miette::Result;
use std::path::PathBuf;
use std::str::FromStr;

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" | "text" => Ok(ReportFormat::Terminal),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unknown report format: {}", other)),
        }
    }
}

/// Reporter for dependency usage results
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self { format, output_path }
    }

    /// Report the whole analysis
    pub fn report(&self, analysis: &Analysis) -> Result<()> {
        match self.format {
            ReportFormat::Terminal => TerminalReporter::new().report(analysis),
            ReportFormat::Json => JsonReporter::new(self.output_path.clone()).report(analysis),
        }
    }

    /// Report the detail of one dependency
    pub fn explain(&self, analysis: &Analysis, info: &DependencyInfo<'_>) -> Result<()> {
        match self.format {
            ReportFormat::Terminal => {
                TerminalReporter::new().explain(analysis, info);
                Ok(())
            }
            ReportFormat::Json => JsonReporter::new(self.output_path.clone()).explain(analysis, info),
        }
    }
}

/// Project classes referencing `class`, with how they reference it
pub(crate) fn project_referrers<'a>(
    analysis: &'a Analysis,
    class: &str,
) -> Vec<(&'a ClassName, ReferenceKind)> {
    let project = analysis.session.project_classes();
    analysis
        .session
        .graph()
        .referrers_of(class)
        .into_iter()
        .filter(|(referrer, _)| project.contains(*referrer))
        .collect()
}
