// Per-analysis mutable state: reference graph, visit counters, warnings

use crate::artifact::Artifact;
use crate::discovery::{ClassEntry, ClassFileSource, SourceError};
use crate::error::AnalysisError;
use crate::graph::{ClassName, GraphBuilder, ReferenceGraph};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Visit counters of one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Classes parsed successfully
    pub classes: usize,
    pub fields: usize,
    pub methods: usize,

    /// Class files that could not be parsed
    pub skipped: usize,
}

/// A class file skipped because it could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanWarning {
    /// `source!entry`
    pub location: String,
    pub message: String,
}

/// Everything one analysis accumulates while scanning
///
/// Two sessions never share state, so independent analyses can run side by
/// side in one process.
#[derive(Debug, Default)]
pub struct AnalysisSession {
    graph: ReferenceGraph,
    builder: GraphBuilder,
    project_classes: BTreeSet<ClassName>,
    stats: ScanStats,
    warnings: Vec<ScanWarning>,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builder(builder: GraphBuilder) -> Self {
        Self {
            builder,
            ..Self::default()
        }
    }

    /// Scan the project's own compiled classes
    ///
    /// Every output must exist; a missing one fails the analysis.
    pub fn scan_project<P: AsRef<Path>>(&mut self, outputs: &[P]) -> Result<usize, AnalysisError> {
        let total = self.scan_outputs(outputs, true)?;
        info!("Scanned {} project classes", total);
        Ok(total)
    }

    /// Scan the project's compiled test classes
    ///
    /// Output locations that do not exist are skipped; a build without test
    /// sources has no test output directory.
    pub fn scan_test_outputs<P: AsRef<Path>>(
        &mut self,
        outputs: &[P],
    ) -> Result<usize, AnalysisError> {
        let total = self.scan_outputs(outputs, false)?;
        info!("Scanned {} project test classes", total);
        Ok(total)
    }

    fn scan_outputs<P: AsRef<Path>>(
        &mut self,
        outputs: &[P],
        required: bool,
    ) -> Result<usize, AnalysisError> {
        let mut total = 0;
        for output in outputs {
            let path = output.as_ref();
            if !path.exists() {
                if required {
                    return Err(AnalysisError::MissingProjectOutput {
                        path: path.to_path_buf(),
                    });
                }
                debug!("Skipping missing test output {}", path.display());
                continue;
            }
            let source = ClassFileSource::from_path(path);
            let entries = source.read_classes().map_err(|err| match err {
                SourceError::Io(source) => AnalysisError::ProjectOutput {
                    path: path.to_path_buf(),
                    source,
                },
                SourceError::Zip(source) => AnalysisError::ProjectArchive {
                    path: path.to_path_buf(),
                    source,
                },
            })?;
            total += self.scan_entries(&path.display().to_string(), &entries, true);
        }
        Ok(total)
    }

    /// Scan the classes of every dependency into the graph
    pub fn scan_dependencies(&mut self, artifacts: &[Artifact]) -> Result<usize, AnalysisError> {
        let mut total = 0;
        for artifact in artifacts {
            let source = ClassFileSource::from_path(&artifact.path);
            let entries = source.read_classes().map_err(|err| match err {
                SourceError::Io(source) => AnalysisError::ArtifactUnreadable {
                    coordinate: artifact.coordinate.to_string(),
                    path: artifact.path.clone(),
                    source,
                },
                SourceError::Zip(source) => AnalysisError::ArtifactCorrupt {
                    coordinate: artifact.coordinate.to_string(),
                    path: artifact.path.clone(),
                    source,
                },
            })?;
            total += self.scan_entries(&artifact.coordinate.to_string(), &entries, false);
        }
        info!("Scanned {} dependency classes", total);
        Ok(total)
    }

    /// Parse class entries and merge them into the graph
    ///
    /// Returns the number of classes merged. Entries that fail to parse are
    /// counted as skipped and recorded as warnings.
    pub fn scan_entries(&mut self, source: &str, entries: &[ClassEntry], project: bool) -> usize {
        let (visited, failures) = self.builder.build_into(&mut self.graph, source, entries);

        for class in &visited {
            self.stats.classes += 1;
            self.stats.fields += class.field_count;
            self.stats.methods += class.method_count;
            if project {
                self.project_classes.insert(class.name.clone());
            }
        }
        for failure in failures {
            warn!("Skipping {}: {}", failure.location, failure.error);
            self.stats.skipped += 1;
            self.warnings.push(ScanWarning {
                location: failure.location,
                message: failure.error.to_string(),
            });
        }
        visited.len()
    }

    /// Classes the project's own classes reference directly
    pub fn referenced_classes(&self) -> BTreeSet<ClassName> {
        self.graph.reachable_from(&self.project_classes)
    }

    pub fn graph(&self) -> &ReferenceGraph {
        &self.graph
    }

    pub fn project_classes(&self) -> &BTreeSet<ClassName> {
        &self.project_classes
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    /// Back to an empty session, keeping the builder settings
    pub fn clear(&mut self) {
        self.graph.clear();
        self.project_classes.clear();
        self.stats = ScanStats::default();
        self.warnings.clear();
    }
}
