// Partitioning of declared dependencies into used and unused

use super::ignore::PatternSet;
use super::result::{ArtifactUsage, UsageResult};
use crate::artifact::{ArtifactCoordinate, ArtifactIndex, DependencyCategory};
use crate::graph::ClassName;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Declared dependencies by category
///
/// A dependency is in at most one category. When the same coordinate is
/// declared twice the first category in direct, inherited, transitive order
/// wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredDependencies {
    categories: BTreeMap<ArtifactCoordinate, DependencyCategory>,
}

impl DeclaredDependencies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, coordinate: ArtifactCoordinate, category: DependencyCategory) {
        self.categories
            .entry(coordinate)
            .and_modify(|existing| *existing = (*existing).min(category))
            .or_insert(category);
    }

    pub fn category_of(&self, coordinate: &ArtifactCoordinate) -> Option<DependencyCategory> {
        self.categories.get(coordinate).copied()
    }

    pub fn members(&self, category: DependencyCategory) -> impl Iterator<Item = &ArtifactCoordinate> {
        self.categories
            .iter()
            .filter(move |(_, c)| **c == category)
            .map(|(coordinate, _)| coordinate)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ArtifactCoordinate, DependencyCategory)> {
        self.categories.iter().map(|(c, category)| (c, *category))
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl FromIterator<(ArtifactCoordinate, DependencyCategory)> for DeclaredDependencies {
    fn from_iter<I: IntoIterator<Item = (ArtifactCoordinate, DependencyCategory)>>(iter: I) -> Self {
        let mut declared = Self::new();
        for (coordinate, category) in iter {
            declared.insert(coordinate, category);
        }
        declared
    }
}

/// Maps referenced classes back to artifacts and splits each category
pub struct UsageClassifier<'a> {
    index: &'a ArtifactIndex,
    extra_classes: BTreeSet<ClassName>,
    ignored_classes: PatternSet,
    ignored_artifacts: BTreeSet<ArtifactCoordinate>,
}

impl<'a> UsageClassifier<'a> {
    pub fn new(index: &'a ArtifactIndex) -> Self {
        Self {
            index,
            extra_classes: BTreeSet::new(),
            ignored_classes: PatternSet::default(),
            ignored_artifacts: BTreeSet::new(),
        }
    }

    /// Classes counted as referenced although no bytecode mentions them
    pub fn extra_classes<I: IntoIterator<Item = ClassName>>(mut self, classes: I) -> Self {
        self.extra_classes.extend(classes);
        self
    }

    /// Referenced classes matching these patterns are dropped
    pub fn ignored_classes(mut self, patterns: PatternSet) -> Self {
        self.ignored_classes = patterns;
        self
    }

    /// Dependencies always treated as used
    pub fn ignored_artifacts<I: IntoIterator<Item = ArtifactCoordinate>>(mut self, artifacts: I) -> Self {
        self.ignored_artifacts.extend(artifacts);
        self
    }

    pub fn classify(&self, referenced: &BTreeSet<ClassName>, declared: &DeclaredDependencies) -> UsageResult {
        let used_classes: BTreeSet<ClassName> = referenced
            .iter()
            .chain(self.extra_classes.iter())
            .filter(|class| !self.ignored_classes.is_match(class.as_str()))
            .filter(|class| self.index.owns(class.as_str()))
            .cloned()
            .collect();

        // duplicate classes credit every owner
        let mut used_artifacts = BTreeSet::new();
        let mut ambiguous_classes = BTreeMap::new();
        for class in &used_classes {
            if let Some(owners) = self.index.artifacts_of(class.as_str()) {
                used_artifacts.extend(owners.iter().cloned());
                if owners.len() > 1 {
                    ambiguous_classes.insert(class.clone(), owners.clone());
                }
            }
        }

        let mut result = UsageResult {
            used_classes,
            ambiguous_classes,
            ..Default::default()
        };

        for (coordinate, category) in declared.iter() {
            let ignored = self.ignored_artifacts.contains(coordinate);
            let used = ignored || used_artifacts.contains(coordinate);
            debug!(
                "{} ({}): {}",
                coordinate,
                category,
                if ignored { "ignored" } else if used { "used" } else { "unused" }
            );
            result.bucket_mut(category, used).insert(coordinate.clone());
            if ignored {
                result.ignored.insert(coordinate.clone());
            }
        }

        let indexed = self.index.artifacts().map(|artifact| &artifact.coordinate);
        let declared_only = declared.iter().map(|(coordinate, _)| coordinate);
        for coordinate in indexed.chain(declared_only) {
            if result.artifacts.contains_key(coordinate) {
                continue;
            }
            let all_types = self.index.classes_of(coordinate).cloned().unwrap_or_default();
            let used_types = all_types.intersection(&result.used_classes).cloned().collect();
            let usage = ArtifactUsage {
                category: declared.category_of(coordinate),
                ignored: self.ignored_artifacts.contains(coordinate),
                all_types,
                used_types,
            };
            result.artifacts.insert(coordinate.clone(), usage);
        }

        result
    }
}
