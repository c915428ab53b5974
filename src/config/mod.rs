mod loader;

pub use loader::{AnalysisConfig, Config, DependencyConfig, ProjectConfig, ReportConfig};
