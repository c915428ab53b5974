// Regex pattern sets for ignored dependencies and ignored classes

use crate::artifact::{Artifact, ArtifactCoordinate};
use crate::error::AnalysisError;
use regex::Regex;
use std::collections::BTreeSet;
use tracing::warn;

/// Patterns that must match a whole string, not a substring
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<(String, Regex)>,
}

impl PatternSet {
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self, AnalysisError> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(&format!("^(?:{})$", pattern))
                    .map(|regex| (pattern.to_string(), regex))
                    .map_err(|source| AnalysisError::InvalidPattern {
                        pattern: pattern.to_string(),
                        source,
                    })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|(_, regex)| regex.is_match(text))
    }

    /// Indices of the patterns matching `text`
    fn matching<'a>(&'a self, text: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.patterns
            .iter()
            .enumerate()
            .filter(move |(_, (_, regex))| regex.is_match(text))
            .map(|(i, _)| i)
    }
}

/// Dependencies selected by ignore patterns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoredDependencies {
    pub artifacts: BTreeSet<ArtifactCoordinate>,

    /// Patterns that selected no dependency at all
    pub unmatched_patterns: Vec<String>,
}

/// Match `patterns` against `group:artifact`, `group:artifact:version` and
/// `group:artifact:version:scope` of every artifact
pub fn resolve_ignored<'a, I>(patterns: &PatternSet, artifacts: I) -> IgnoredDependencies
where
    I: IntoIterator<Item = &'a Artifact>,
{
    let mut hits = vec![false; patterns.len()];
    let mut ignored = BTreeSet::new();

    for artifact in artifacts {
        for key in artifact.match_keys() {
            for i in patterns.matching(&key) {
                hits[i] = true;
                ignored.insert(artifact.coordinate.clone());
            }
        }
    }

    let unmatched_patterns: Vec<String> = patterns
        .patterns
        .iter()
        .zip(hits)
        .filter(|(_, hit)| !hit)
        .map(|((pattern, _), _)| pattern.clone())
        .collect();
    for pattern in &unmatched_patterns {
        warn!("Ignore pattern '{}' matches no dependency", pattern);
    }

    IgnoredDependencies {
        artifacts: ignored,
        unmatched_patterns,
    }
}
