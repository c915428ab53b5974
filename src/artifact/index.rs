// Artifact -> classes and class -> artifacts maps

use super::{Artifact, ArtifactCoordinate};
use crate::discovery::{ClassFileSource, SourceError};
use crate::error::AnalysisError;
use crate::graph::ClassName;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Which classes every artifact packages, and the inverse
#[derive(Debug, Clone, Default)]
pub struct ArtifactIndex {
    classes: BTreeMap<Artifact, BTreeSet<ClassName>>,
    owners: BTreeMap<ClassName, BTreeSet<ArtifactCoordinate>>,
}

impl ArtifactIndex {
    /// List the classes of every artifact in parallel
    ///
    /// An artifact whose archive cannot be read fails the whole build: an
    /// empty class list would make it look unused.
    pub fn build(artifacts: &[Artifact]) -> Result<Self, AnalysisError> {
        Self::build_with(artifacts, true)
    }

    pub fn build_with(artifacts: &[Artifact], parallel: bool) -> Result<Self, AnalysisError> {
        info!("Indexing {} artifacts...", artifacts.len());
        let list = |artifact: &Artifact| list_classes(artifact).map(|names| (artifact.clone(), names));
        let listed: Vec<(Artifact, BTreeSet<ClassName>)> = if parallel {
            artifacts.par_iter().map(list).collect::<Result<_, _>>()?
        } else {
            artifacts.iter().map(list).collect::<Result<_, _>>()?
        };

        let index = Self::from_entries(listed);
        info!(
            "Indexed {} classes across {} artifacts",
            index.class_count(),
            index.len()
        );
        Ok(index)
    }

    /// Build from known class lists, without touching the file system
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Artifact, BTreeSet<ClassName>)>,
    {
        let mut index = Self::default();
        for (artifact, names) in entries {
            for name in &names {
                index
                    .owners
                    .entry(name.clone())
                    .or_default()
                    .insert(artifact.coordinate.clone());
            }
            index.classes.entry(artifact).or_default().extend(names);
        }
        index
    }

    /// Classes packaged by an artifact
    pub fn classes_of(&self, coordinate: &ArtifactCoordinate) -> Option<&BTreeSet<ClassName>> {
        self.classes.get(coordinate)
    }

    /// Artifacts packaging a class
    pub fn artifacts_of(&self, class: &str) -> Option<&BTreeSet<ArtifactCoordinate>> {
        self.owners.get(class)
    }

    pub fn owns(&self, class: &str) -> bool {
        self.owners.contains_key(class)
    }

    pub fn artifact(&self, coordinate: &ArtifactCoordinate) -> Option<&Artifact> {
        self.classes.get_key_value(coordinate).map(|(artifact, _)| artifact)
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.classes.keys()
    }

    /// Classes packaged by more than one artifact
    pub fn duplicates(&self) -> impl Iterator<Item = (&ClassName, &BTreeSet<ArtifactCoordinate>)> {
        self.owners.iter().filter(|(_, owners)| owners.len() > 1)
    }

    /// Number of artifacts
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Number of distinct class names
    pub fn class_count(&self) -> usize {
        self.owners.len()
    }
}

fn list_classes(artifact: &Artifact) -> Result<BTreeSet<ClassName>, AnalysisError> {
    let source = ClassFileSource::from_path(&artifact.path);
    let names = source.class_names().map_err(|err| match err {
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
    debug!("{}: {} classes", artifact.coordinate, names.len());
    Ok(names)
}
