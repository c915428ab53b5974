use super::project_referrers;
use crate::analysis::{Analysis, DependencyInfo, UsageResult};
use crate::artifact::{ArtifactCoordinate, DependencyCategory};
use colored::Colorize;
use miette::Result;
use std::collections::BTreeSet;

/// Terminal reporter with colored output
pub struct TerminalReporter {
    /// Show per-artifact class counts
    show_counts: bool,
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self { show_counts: true }
    }

    pub fn with_counts(mut self, show: bool) -> Self {
        self.show_counts = show;
        self
    }

    pub fn report(&self, analysis: &Analysis) -> Result<()> {
        print!("{}", self.render(analysis));
        Ok(())
    }

    /// The full report as printed
    pub fn render(&self, analysis: &Analysis) -> String {
        let result = &analysis.result;
        let mut out = String::new();

        out.push('\n');
        if result.has_unused() {
            out.push_str(&format!(
                "{}\n",
                format!("Found {} unused declared dependencies:", result.unused_count())
                    .yellow()
                    .bold()
            ));
        } else {
            out.push_str(&format!("{}\n", "No unused dependencies found!".green().bold()));
        }
        out.push('\n');

        for category in DependencyCategory::ALL {
            self.render_bucket(&mut out, result, category, false);
            self.render_bucket(&mut out, result, category, true);
        }

        if !result.ignored.is_empty() {
            out.push_str(&format!("{}\n", "Ignored dependencies".cyan().bold()));
            for coordinate in &result.ignored {
                out.push_str(&format!("  {} {}\n", "~".cyan(), coordinate));
            }
            out.push('\n');
        }

        for pattern in &result.unmatched_ignore_patterns {
            out.push_str(&format!(
                "{} ignore pattern '{}' matched no dependency\n",
                "warning:".yellow().bold(),
                pattern
            ));
        }
        for (class, owners) in &result.ambiguous_classes {
            let owners: Vec<String> = owners.iter().map(ToString::to_string).collect();
            out.push_str(&format!(
                "{} {} is packaged by {}\n",
                "note:".blue().bold(),
                class,
                owners.join(", ")
            ));
        }
        for warning in analysis.session.warnings() {
            out.push_str(&format!(
                "{} skipped {}: {}\n",
                "warning:".yellow().bold(),
                warning.location,
                warning.message
            ));
        }

        self.render_summary(&mut out, analysis);
        out
    }

    fn render_bucket(
        &self,
        out: &mut String,
        result: &UsageResult,
        category: DependencyCategory,
        used: bool,
    ) {
        let bucket: &BTreeSet<ArtifactCoordinate> = if used {
            result.used(category)
        } else {
            result.unused(category)
        };
        if bucket.is_empty() {
            return;
        }

        let title = format!("{} {} dependencies", if used { "Used" } else { "Unused" }, category);
        let title = if used { title.green().bold() } else { title.red().bold() };
        out.push_str(&format!("{}\n", title));

        for coordinate in bucket {
            let ignored = result.ignored.contains(coordinate);
            let marker = if ignored {
                "~".cyan()
            } else if used {
                "✓".green()
            } else {
                "✗".red()
            };
            let counts = match result.artifacts.get(coordinate) {
                Some(usage) if self.show_counts => format!(
                    " ({}/{} classes)",
                    usage.used_type_count(),
                    usage.all_type_count()
                )
                .dimmed()
                .to_string(),
                _ => String::new(),
            };
            let note = if ignored { " (ignored)".cyan().to_string() } else { String::new() };
            out.push_str(&format!("  {} {}{}{}\n", marker, coordinate, counts, note));
        }
        out.push('\n');
    }

    fn render_summary(&self, out: &mut String, analysis: &Analysis) {
        let result = &analysis.result;
        let stats = analysis.session.stats();

        out.push_str(&format!("{}\n", "─".repeat(60).dimmed()));
        let parts = [
            format!("{} used", result.used_count()).green().to_string(),
            format!("{} unused", result.unused_count()).red().to_string(),
            format!("{} ignored", result.ignored.len()).cyan().to_string(),
        ];
        out.push_str(&format!("Summary: {}\n", parts.join(", ")));
        out.push_str(&format!(
            "{}\n",
            format!(
                "Scanned {} classes ({} fields, {} methods), skipped {}",
                stats.classes, stats.fields, stats.methods, stats.skipped
            )
            .dimmed()
        ));
    }

    /// Print the detail of one dependency
    pub fn explain(&self, analysis: &Analysis, info: &DependencyInfo<'_>) {
        print!("{}", self.render_explain(analysis, info));
    }

    pub fn render_explain(&self, analysis: &Analysis, info: &DependencyInfo<'_>) -> String {
        let mut out = String::new();
        let status = if info.ignored {
            "ignored".cyan().bold()
        } else if info.used {
            "used".green().bold()
        } else {
            "unused".red().bold()
        };
        out.push_str(&format!(
            "{} [{}] {}\n",
            info.coordinate.to_string().bold(),
            info.category,
            status
        ));
        out.push_str(&format!(
            "  {} of {} classes used\n",
            info.usage.used_type_count(),
            info.usage.all_type_count()
        ));

        for class in &info.usage.used_types {
            out.push_str(&format!("  {} {}\n", "→".dimmed(), class));
            for (referrer, kind) in project_referrers(analysis, class.as_str()) {
                out.push_str(&format!(
                    "      {} {} ({})\n",
                    "from".dimmed(),
                    referrer,
                    kind.display_name().dimmed()
                ));
            }
        }
        out
    }
}
