// Configuration loader

use crate::analysis::{AnalysisRequest, DeclaredArtifact};
use crate::artifact::{Artifact, ArtifactCoordinate, DependencyCategory, Scope};
use crate::error::LookupError;
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a depclean run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the project's compiled classes are
    pub project: ProjectConfig,

    /// Resolved dependencies with their category and backing file
    pub dependencies: Vec<DependencyConfig>,

    /// Regex patterns over `group:artifact[:version[:scope]]`; matching
    /// dependencies are never reported unused
    pub ignored_dependencies: Vec<String>,

    /// Dependencies of these scopes are left out of the analysis
    pub ignored_scopes: Vec<Scope>,

    /// Classes used through means invisible in bytecode
    pub extra_classes: Vec<String>,

    /// Regex patterns over class names never counted as used
    pub ignored_classes: Vec<String>,

    pub analysis: AnalysisConfig,

    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Main output directories or JARs
    pub outputs: Vec<PathBuf>,

    /// Test output directories or JARs
    pub test_outputs: Vec<PathBuf>,

    /// Scan test outputs too
    pub include_tests: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyConfig {
    /// `group:artifact:version`, optionally followed by `:scope`
    pub coordinate: String,

    /// Overrides a scope given in the coordinate
    #[serde(default)]
    pub scope: Option<Scope>,

    #[serde(default = "default_category")]
    pub category: DependencyCategory,

    /// JAR or class directory
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Merge dependency classes into the reference graph
    pub scan_dependency_classes: bool,

    /// Parse classes on all cores
    pub parallel: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: terminal, json
    pub format: String,
}

fn default_category() -> DependencyCategory {
    DependencyCategory::Direct
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            outputs: vec![PathBuf::from("target/classes")],
            test_outputs: vec![PathBuf::from("target/test-classes")],
            include_tests: true,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            scan_dependency_classes: true,
            parallel: true,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "terminal".to_string(),
        }
    }
}

impl DependencyConfig {
    pub fn to_artifact(&self) -> Result<Artifact, LookupError> {
        let (coordinate, scope) = ArtifactCoordinate::parse_with_scope(&self.coordinate)?;
        let scope = self.scope.or(scope).unwrap_or_default();
        Ok(Artifact::new(coordinate, scope, self.path.clone()))
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    ///
    /// Relative paths in the file are taken relative to the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let mut config: Config = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config")?,
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config")?,
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    config
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")?
                }
            }
        };

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(project_root: &Path) -> Result<Self> {
        let default_names = [
            ".depclean.yml",
            ".depclean.yaml",
            ".depclean.toml",
            "depclean.yml",
            "depclean.yaml",
            "depclean.toml",
        ];

        for name in &default_names {
            let path = project_root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        // No config file found, use defaults
        let mut config = Self::default();
        config.resolve_paths(project_root);
        Ok(config)
    }

    /// Make every relative path absolute against `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        self.project.outputs.iter_mut().for_each(resolve);
        self.project.test_outputs.iter_mut().for_each(resolve);
        self.dependencies.iter_mut().map(|d| &mut d.path).for_each(resolve);
    }

    /// Whether a dependency of this scope takes part in the analysis
    pub fn includes_scope(&self, scope: Scope) -> bool {
        !self.ignored_scopes.contains(&scope)
    }

    /// Turn the configuration into an analysis request
    ///
    /// Fails on the first dependency whose coordinate does not parse.
    pub fn to_request(&self) -> Result<AnalysisRequest, LookupError> {
        let mut dependencies = Vec::with_capacity(self.dependencies.len());
        for dependency in &self.dependencies {
            let artifact = dependency.to_artifact()?;
            if self.includes_scope(artifact.scope) {
                dependencies.push(DeclaredArtifact {
                    artifact,
                    category: dependency.category,
                });
            }
        }

        Ok(AnalysisRequest {
            outputs: self.project.outputs.clone(),
            test_outputs: if self.project.include_tests {
                self.project.test_outputs.clone()
            } else {
                Vec::new()
            },
            dependencies,
            ignored_dependencies: self.ignored_dependencies.clone(),
            extra_classes: self.extra_classes.clone(),
            ignored_classes: self.ignored_classes.clone(),
            scan_dependency_classes: self.analysis.scan_dependency_classes,
            parallel: self.analysis.parallel,
        })
    }
}
