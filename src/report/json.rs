use super::project_referrers;
use crate::analysis::{Analysis, DependencyInfo, ScanStats, ScanWarning};
use crate::artifact::{ArtifactCoordinate, DependencyCategory};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// JSON reporter for programmatic output
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, analysis: &Analysis) -> Result<()> {
        let json = Self::render(analysis)?;
        self.emit(&json)
    }

    pub fn explain(&self, analysis: &Analysis, info: &DependencyInfo<'_>) -> Result<()> {
        let json = serde_json::to_string_pretty(&JsonDependency::new(analysis, info)).into_diagnostic()?;
        self.emit(&json)
    }

    pub fn render(analysis: &Analysis) -> Result<String> {
        serde_json::to_string_pretty(&JsonReport::from_analysis(analysis)).into_diagnostic()
    }

    fn emit(&self, json: &str) -> Result<()> {
        if let Some(path) = &self.output_path {
            std::fs::write(path, json).into_diagnostic()?;
            println!("Report written to: {}", path.display());
        } else {
            println!("{}", json);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    version: &'static str,
    used_direct: &'a BTreeSet<ArtifactCoordinate>,
    unused_direct: &'a BTreeSet<ArtifactCoordinate>,
    used_inherited: &'a BTreeSet<ArtifactCoordinate>,
    unused_inherited: &'a BTreeSet<ArtifactCoordinate>,
    used_transitive: &'a BTreeSet<ArtifactCoordinate>,
    unused_transitive: &'a BTreeSet<ArtifactCoordinate>,
    ignored: &'a BTreeSet<ArtifactCoordinate>,
    artifacts: BTreeMap<&'a ArtifactCoordinate, JsonArtifact>,
    ambiguous_classes: Vec<JsonAmbiguousClass<'a>>,
    unmatched_ignore_patterns: &'a [String],
    warnings: &'a [ScanWarning],
    stats: ScanStats,
}

#[derive(Serialize)]
struct JsonArtifact {
    category: Option<DependencyCategory>,
    ignored: bool,
    all_type_count: usize,
    used_type_count: usize,
}

#[derive(Serialize)]
struct JsonAmbiguousClass<'a> {
    class: &'a str,
    artifacts: &'a BTreeSet<ArtifactCoordinate>,
}

#[derive(Serialize)]
struct JsonDependency<'a> {
    coordinate: &'a ArtifactCoordinate,
    category: DependencyCategory,
    used: bool,
    ignored: bool,
    all_type_count: usize,
    used_types: Vec<JsonUsedType<'a>>,
}

#[derive(Serialize)]
struct JsonUsedType<'a> {
    class: &'a str,
    referenced_by: Vec<JsonReferrer<'a>>,
}

#[derive(Serialize)]
struct JsonReferrer<'a> {
    class: &'a str,
    kind: &'static str,
}

impl<'a> JsonReport<'a> {
    fn from_analysis(analysis: &'a Analysis) -> Self {
        let result = &analysis.result;
        let artifacts = result
            .artifacts
            .iter()
            .map(|(coordinate, usage)| {
                let artifact = JsonArtifact {
                    category: usage.category,
                    ignored: usage.ignored,
                    all_type_count: usage.all_type_count(),
                    used_type_count: usage.used_type_count(),
                };
                (coordinate, artifact)
            })
            .collect();
        let ambiguous_classes = result
            .ambiguous_classes
            .iter()
            .map(|(class, artifacts)| JsonAmbiguousClass {
                class: class.as_str(),
                artifacts,
            })
            .collect();

        Self {
            version: "1.0",
            used_direct: &result.used_direct,
            unused_direct: &result.unused_direct,
            used_inherited: &result.used_inherited,
            unused_inherited: &result.unused_inherited,
            used_transitive: &result.used_transitive,
            unused_transitive: &result.unused_transitive,
            ignored: &result.ignored,
            artifacts,
            ambiguous_classes,
            unmatched_ignore_patterns: &result.unmatched_ignore_patterns,
            warnings: analysis.session.warnings(),
            stats: analysis.session.stats(),
        }
    }
}

impl<'a> JsonDependency<'a> {
    fn new(analysis: &'a Analysis, info: &DependencyInfo<'a>) -> Self {
        let used_types = info
            .usage
            .used_types
            .iter()
            .map(|class| JsonUsedType {
                class: class.as_str(),
                referenced_by: project_referrers(analysis, class.as_str())
                    .into_iter()
                    .map(|(referrer, kind)| JsonReferrer {
                        class: referrer.as_str(),
                        kind: kind.display_name(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            coordinate: info.coordinate,
            category: info.category,
            used: info.used,
            ignored: info.ignored,
            all_type_count: info.usage.all_type_count(),
            used_types,
        }
    }
}
