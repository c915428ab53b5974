//! Error types for the analysis pipeline
//!
//! Three tiers: [`ClassFileError`] is local to one class file and never aborts
//! a run, [`AnalysisError`] aborts the whole analysis, and [`LookupError`] is
//! local to a query made against a finished result.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// A single class file could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassFileError {
    #[error("invalid class file magic 0x{0:08X}")]
    BadMagic(u32),

    #[error("class file truncated at offset {offset} (wanted {wanted} more bytes)")]
    UnexpectedEof { offset: usize, wanted: usize },

    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownConstantTag { tag: u8, index: u16 },

    #[error("constant pool index {index} does not hold a {expected} entry")]
    BadConstantIndex { index: u16, expected: &'static str },

    #[error("malformed descriptor or signature '{0}'")]
    MalformedSignature(String),

    #[error("unsupported opcode 0x{opcode:02x} at bytecode offset {offset}")]
    UnsupportedOpcode { opcode: u8, offset: usize },

    #[error("malformed {0} attribute")]
    MalformedAttribute(&'static str),
}

/// Fatal failure: the analysis produces no result
#[derive(Error, Debug, Diagnostic)]
pub enum AnalysisError {
    #[error("failed to read artifact {coordinate} at {path}")]
    #[diagnostic(
        code(depclean::artifact_unreadable),
        help("check that the dependency was resolved and the file exists")
    )]
    ArtifactUnreadable {
        coordinate: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact {coordinate} at {path} is not a valid archive")]
    #[diagnostic(
        code(depclean::artifact_corrupt),
        help("an unreadable archive cannot be assumed empty; re-download the artifact")
    )]
    ArtifactCorrupt {
        coordinate: String,
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("failed to enumerate project output {path}")]
    #[diagnostic(code(depclean::project_output))]
    ProjectOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("project output {path} does not exist")]
    #[diagnostic(
        code(depclean::missing_project_output),
        help("build the project first or fix `project.outputs`")
    )]
    MissingProjectOutput { path: PathBuf },

    #[error("project output {path} is not a valid archive")]
    #[diagnostic(code(depclean::project_archive))]
    ProjectArchive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("invalid pattern '{pattern}'")]
    #[diagnostic(code(depclean::invalid_pattern))]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A per-dependency query against a finished result failed
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("'{0}' is not a coordinate (expected group:artifact:version)")]
    #[diagnostic(code(depclean::invalid_coordinate))]
    InvalidCoordinate(String),

    #[error("no declared dependency matches '{0}'")]
    #[diagnostic(code(depclean::unknown_dependency))]
    UnknownDependency(String),
}
