// Dependency usage analysis

mod classifier;
mod ignore;
mod result;
mod session;

pub use classifier::{DeclaredDependencies, UsageClassifier};
pub use ignore::{resolve_ignored, IgnoredDependencies, PatternSet};
pub use result::{ArtifactUsage, DependencyInfo, UsageResult};
pub use session::{AnalysisSession, ScanStats, ScanWarning};

use crate::artifact::{Artifact, ArtifactIndex, DependencyCategory};
use crate::error::AnalysisError;
use crate::graph::{ClassName, GraphBuilder};
use std::path::PathBuf;
use tracing::info;

/// A dependency together with how it was declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredArtifact {
    pub artifact: Artifact,
    pub category: DependencyCategory,
}

/// Everything one analysis run needs
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Main output directories or JARs
    pub outputs: Vec<PathBuf>,

    /// Test output directories or JARs
    pub test_outputs: Vec<PathBuf>,

    pub dependencies: Vec<DeclaredArtifact>,

    /// Regex patterns over dependency coordinates
    pub ignored_dependencies: Vec<String>,

    pub extra_classes: Vec<String>,

    /// Regex patterns over class names
    pub ignored_classes: Vec<String>,

    /// Also merge dependency classes into the reference graph
    pub scan_dependency_classes: bool,

    pub parallel: bool,
}

impl Default for AnalysisRequest {
    fn default() -> Self {
        Self {
            outputs: Vec::new(),
            test_outputs: Vec::new(),
            dependencies: Vec::new(),
            ignored_dependencies: Vec::new(),
            extra_classes: Vec::new(),
            ignored_classes: Vec::new(),
            scan_dependency_classes: true,
            parallel: true,
        }
    }
}

/// A finished analysis
#[derive(Debug)]
pub struct Analysis {
    pub result: UsageResult,
    pub session: AnalysisSession,
}

/// Runs the whole pipeline: index, scan, classify
pub struct DependencyAnalyzer {
    request: AnalysisRequest,
}

impl DependencyAnalyzer {
    pub fn new(request: AnalysisRequest) -> Self {
        Self { request }
    }

    pub fn run(&self) -> Result<Analysis, AnalysisError> {
        let request = &self.request;

        // patterns first: a typo should fail before any scanning
        let ignored_dependency_patterns = PatternSet::compile(&request.ignored_dependencies)?;
        let ignored_class_patterns = PatternSet::compile(&request.ignored_classes)?;

        let artifacts: Vec<Artifact> = request
            .dependencies
            .iter()
            .map(|declared| declared.artifact.clone())
            .collect();
        let index = ArtifactIndex::build_with(&artifacts, request.parallel)?;

        let builder = GraphBuilder::new().parallel(request.parallel);
        let mut session = AnalysisSession::with_builder(builder);
        info!("Scanning project classes...");
        session.scan_project(&request.outputs)?;
        session.scan_test_outputs(&request.test_outputs)?;
        if request.scan_dependency_classes {
            info!("Scanning dependency classes...");
            session.scan_dependencies(&artifacts)?;
        }

        let referenced = session.referenced_classes();
        info!("Project references {} classes", referenced.len());

        let ignored = resolve_ignored(&ignored_dependency_patterns, index.artifacts());
        let declared: DeclaredDependencies = request
            .dependencies
            .iter()
            .map(|d| (d.artifact.coordinate.clone(), d.category))
            .collect();

        let mut result = UsageClassifier::new(&index)
            .extra_classes(request.extra_classes.iter().map(ClassName::new))
            .ignored_classes(ignored_class_patterns)
            .ignored_artifacts(ignored.artifacts)
            .classify(&referenced, &declared);
        result.unmatched_ignore_patterns = ignored.unmatched_patterns;

        info!(
            "{} of {} declared dependencies unused",
            result.unused_count(),
            declared.len()
        );
        Ok(Analysis { result, session })
    }
}
