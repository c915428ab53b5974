use clap::Parser;
use colored::Colorize;
use miette::Result;
use std::path::PathBuf;
use tracing::info;

use depclean::analysis::DependencyAnalyzer;
use depclean::config::Config;
use depclean::report::{ReportFormat, Reporter};

/// depclean - Find declared but unused Java dependencies from bytecode
#[derive(Parser, Debug)]
#[command(name = "depclean")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the project directory to analyze
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dependency patterns to ignore, regex over group:artifact[:version[:scope]]
    /// (can be specified multiple times)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Output format (overrides the config file)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file (for json format)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show which classes of one dependency are used, and from where
    #[arg(long, value_name = "COORDINATE")]
    explain: Option<String>,

    /// Exit with an error when a declared dependency is unused
    #[arg(long)]
    fail_if_unused: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Terminal,
    Json,
}

impl OutputFormat {
    fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Terminal => "terminal",
            OutputFormat::Json => "json",
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    info!("depclean v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config(&cli)?;

    run_analysis(&config, &cli)
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        // Try to load from default locations
        Config::from_default_locations(&cli.path)?
    };

    // Override with CLI arguments
    if !cli.ignore.is_empty() {
        config.ignored_dependencies.extend(cli.ignore.clone());
    }
    if let Some(format) = cli.format {
        config.report.format = format.as_str().to_string();
    }

    Ok(config)
}

fn run_analysis(config: &Config, cli: &Cli) -> Result<()> {
    use std::time::Instant;

    let start_time = Instant::now();

    let format: ReportFormat = config
        .report
        .format
        .parse()
        .map_err(|err: String| miette::miette!("Invalid report.format in config: {}", err))?;

    let request = config.to_request()?;
    if request.dependencies.is_empty() {
        println!("{}", "No dependencies declared.".yellow());
        return Ok(());
    }

    let analysis = DependencyAnalyzer::new(request).run()?;
    let reporter = Reporter::new(format, cli.output.clone());

    if let Some(coordinate) = &cli.explain {
        let info = analysis.result.dependency_info(coordinate)?;
        return reporter.explain(&analysis, &info);
    }

    reporter.report(&analysis)?;
    info!("Analysis completed in {:.2?}", start_time.elapsed());

    if cli.fail_if_unused && analysis.result.has_unused() {
        miette::bail!(
            "{} declared dependencies are unused",
            analysis.result.unused_count()
        );
    }

    Ok(())
}
