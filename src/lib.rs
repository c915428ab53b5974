//! depclean - Find declared but unused Java dependencies
//!
//! This library reads compiled JVM classes and reports which of a project's
//! declared dependencies its bytecode actually uses.
//!
//! # Architecture
//!
//! The analysis pipeline consists of:
//! 1. **Artifact Indexing** - List the classes every dependency JAR packages
//! 2. **Class Parsing** - Extract the classes each compiled class refers to
//! 3. **Graph Building** - Merge those references into a class reference graph
//! 4. **Reachability** - Collect the classes project classes reference directly
//! 5. **Classification** - Split declared dependencies into used and unused
//! 6. **Reporting** - Output results in various formats

pub mod analysis;
pub mod artifact;
pub mod bytecode;
pub mod config;
pub mod discovery;
pub mod error;
pub mod graph;
pub mod report;

pub use analysis::{Analysis, AnalysisRequest, AnalysisSession, DependencyAnalyzer, UsageResult};
pub use artifact::{Artifact, ArtifactCoordinate, ArtifactIndex, DependencyCategory, Scope};
pub use bytecode::{ClassStructureVisitor, ConstantPoolScanner};
pub use config::Config;
pub use error::{AnalysisError, ClassFileError, LookupError};
pub use graph::{ClassName, ReferenceGraph, ReferenceKind};
pub use report::{ReportFormat, Reporter};
