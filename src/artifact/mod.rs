//! Library artifacts and their coordinates

mod index;

pub use index::ArtifactIndex;

use crate::error::LookupError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::str::FromStr;

/// `group:artifact:version`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactCoordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl ArtifactCoordinate {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
        }
    }

    /// Parse `group:artifact:version` or `group:artifact:version:scope`
    pub fn parse_with_scope(raw: &str) -> Result<(Self, Option<Scope>), LookupError> {
        let invalid = || LookupError::InvalidCoordinate(raw.to_string());
        let parts: Vec<&str> = raw.trim().split(':').collect();
        if parts.iter().any(|part| part.is_empty()) {
            return Err(invalid());
        }
        match parts.as_slice() {
            [group, artifact, version] => Ok((Self::new(*group, *artifact, *version), None)),
            [group, artifact, version, scope] => {
                let scope = scope.parse().map_err(|_| invalid())?;
                Ok((Self::new(*group, *artifact, *version), Some(scope)))
            }
            _ => Err(invalid()),
        }
    }

    /// `group:artifact`
    pub fn key(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }
}

impl fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

impl FromStr for ArtifactCoordinate {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_scope(s).map(|(coordinate, _)| coordinate)
    }
}

impl TryFrom<String> for ArtifactCoordinate {
    type Error = LookupError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ArtifactCoordinate> for String {
    fn from(coordinate: ArtifactCoordinate) -> Self {
        coordinate.to_string()
    }
}

/// Maven dependency scope
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Compile,
    Provided,
    Runtime,
    Test,
    System,
    Import,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Compile => "compile",
            Scope::Provided => "provided",
            Scope::Runtime => "runtime",
            Scope::Test => "test",
            Scope::System => "system",
            Scope::Import => "import",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compile" => Ok(Scope::Compile),
            "provided" => Ok(Scope::Provided),
            "runtime" => Ok(Scope::Runtime),
            "test" => Ok(Scope::Test),
            "system" => Ok(Scope::System),
            "import" => Ok(Scope::Import),
            other => Err(format!("unknown scope: {}", other)),
        }
    }
}

/// How a dependency came to be on the project's class path
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyCategory {
    /// Declared by the project itself
    Direct,

    /// Declared by a parent build configuration
    Inherited,

    /// Required only by another dependency
    Transitive,
}

impl DependencyCategory {
    pub const ALL: [DependencyCategory; 3] = [
        DependencyCategory::Direct,
        DependencyCategory::Inherited,
        DependencyCategory::Transitive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyCategory::Direct => "direct",
            DependencyCategory::Inherited => "inherited",
            DependencyCategory::Transitive => "transitive",
        }
    }
}

impl fmt::Display for DependencyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved dependency with its backing JAR or class directory
///
/// Equality, hashing and ordering only look at the coordinate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub coordinate: ArtifactCoordinate,
    #[serde(default)]
    pub scope: Scope,
    pub path: PathBuf,
}

impl Artifact {
    pub fn new(coordinate: ArtifactCoordinate, scope: Scope, path: impl Into<PathBuf>) -> Self {
        Self {
            coordinate,
            scope,
            path: path.into(),
        }
    }

    /// Strings ignore patterns are matched against
    pub fn match_keys(&self) -> [String; 3] {
        [
            self.coordinate.key(),
            self.coordinate.to_string(),
            format!("{}:{}", self.coordinate, self.scope),
        ]
    }
}

impl PartialEq for Artifact {
    fn eq(&self, other: &Self) -> bool {
        self.coordinate == other.coordinate
    }
}

impl Eq for Artifact {}

impl Hash for Artifact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.coordinate.hash(state);
    }
}

impl PartialOrd for Artifact {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Artifact {
    fn cmp(&self, other: &Self) -> Ordering {
        self.coordinate.cmp(&other.coordinate)
    }
}

impl Borrow<ArtifactCoordinate> for Artifact {
    fn borrow(&self) -> &ArtifactCoordinate {
        &self.coordinate
    }
}
