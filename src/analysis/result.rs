// Classification outcome: six buckets plus per-artifact detail

use crate::artifact::{ArtifactCoordinate, DependencyCategory};
use crate::error::LookupError;
use crate::graph::ClassName;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Class usage of one artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactUsage {
    /// Declared category, `None` when the artifact is only on the class path
    pub category: Option<DependencyCategory>,

    /// Selected by an ignore pattern
    pub ignored: bool,

    /// Every class the artifact packages
    pub all_types: BTreeSet<ClassName>,

    /// The subset the project uses
    pub used_types: BTreeSet<ClassName>,
}

impl ArtifactUsage {
    pub fn all_type_count(&self) -> usize {
        self.all_types.len()
    }

    pub fn used_type_count(&self) -> usize {
        self.used_types.len()
    }

    /// Share of the artifact's classes in use, 0.0 for an empty artifact
    pub fn usage_ratio(&self) -> f64 {
        if self.all_types.is_empty() {
            0.0
        } else {
            self.used_types.len() as f64 / self.all_types.len() as f64
        }
    }
}

/// Detail for one declared dependency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyInfo<'a> {
    pub coordinate: &'a ArtifactCoordinate,
    pub category: DependencyCategory,
    pub used: bool,
    pub ignored: bool,
    pub usage: &'a ArtifactUsage,
}

/// Used and unused declared dependencies, per category
///
/// Within a category the used and unused sets are disjoint and together hold
/// every dependency declared in that category. Ignored dependencies sit in the
/// used set and are listed again in `ignored`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageResult {
    pub used_direct: BTreeSet<ArtifactCoordinate>,
    pub unused_direct: BTreeSet<ArtifactCoordinate>,
    pub used_inherited: BTreeSet<ArtifactCoordinate>,
    pub unused_inherited: BTreeSet<ArtifactCoordinate>,
    pub used_transitive: BTreeSet<ArtifactCoordinate>,
    pub unused_transitive: BTreeSet<ArtifactCoordinate>,

    /// Dependencies kept because an ignore pattern selected them
    pub ignored: BTreeSet<ArtifactCoordinate>,

    /// Referenced classes that some artifact packages
    pub used_classes: BTreeSet<ClassName>,

    /// Used classes packaged by more than one artifact
    pub ambiguous_classes: BTreeMap<ClassName, BTreeSet<ArtifactCoordinate>>,

    /// Ignore patterns that matched no dependency
    pub unmatched_ignore_patterns: Vec<String>,

    pub artifacts: BTreeMap<ArtifactCoordinate, ArtifactUsage>,
}

impl UsageResult {
    pub fn used(&self, category: DependencyCategory) -> &BTreeSet<ArtifactCoordinate> {
        match category {
            DependencyCategory::Direct => &self.used_direct,
            DependencyCategory::Inherited => &self.used_inherited,
            DependencyCategory::Transitive => &self.used_transitive,
        }
    }

    pub fn unused(&self, category: DependencyCategory) -> &BTreeSet<ArtifactCoordinate> {
        match category {
            DependencyCategory::Direct => &self.unused_direct,
            DependencyCategory::Inherited => &self.unused_inherited,
            DependencyCategory::Transitive => &self.unused_transitive,
        }
    }

    pub(crate) fn bucket_mut(
        &mut self,
        category: DependencyCategory,
        used: bool,
    ) -> &mut BTreeSet<ArtifactCoordinate> {
        match (category, used) {
            (DependencyCategory::Direct, true) => &mut self.used_direct,
            (DependencyCategory::Direct, false) => &mut self.unused_direct,
            (DependencyCategory::Inherited, true) => &mut self.used_inherited,
            (DependencyCategory::Inherited, false) => &mut self.unused_inherited,
            (DependencyCategory::Transitive, true) => &mut self.used_transitive,
            (DependencyCategory::Transitive, false) => &mut self.unused_transitive,
        }
    }

    /// Number of declared dependencies found unused, all categories
    /// Used dependencies, not counting the ignored ones
    pub fn used_count(&self) -> usize {
        DependencyCategory::ALL
            .iter()
            .flat_map(|category| self.used(*category))
            .filter(|coordinate| !self.ignored.contains(*coordinate))
            .count()
    }

    pub fn unused_count(&self) -> usize {
        self.unused_direct.len() + self.unused_inherited.len() + self.unused_transitive.len()
    }

    pub fn has_unused(&self) -> bool {
        self.unused_count() > 0
    }

    /// Classes no project class uses, over every indexed artifact
    pub fn unused_classes(&self) -> BTreeSet<&ClassName> {
        self.artifacts
            .values()
            .flat_map(|usage| usage.all_types.difference(&usage.used_types))
            .collect()
    }

    /// Look up one declared dependency by `group:artifact:version`
    pub fn dependency_info(&self, coordinate: &str) -> Result<DependencyInfo<'_>, LookupError> {
        let parsed: ArtifactCoordinate = coordinate.parse()?;
        let unknown = || LookupError::UnknownDependency(coordinate.to_string());

        let (coordinate, usage) = self.artifacts.get_key_value(&parsed).ok_or_else(unknown)?;
        let category = usage.category.ok_or_else(unknown)?;
        Ok(DependencyInfo {
            coordinate,
            category,
            used: self.used(category).contains(coordinate),
            ignored: usage.ignored,
            usage,
        })
    }
}
