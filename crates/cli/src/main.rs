use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use envrec_cli::pipeline;
use envrec_cli::{LogOptions, LogSession, Settings, DEFAULT_LOG_DIR};
use envrec_environments::RandomSource;
use envrec_eval::{QueryStrategy, ScoringMode};
use envrec_search::FORMAT_FIELD;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "envrec")]
#[command(
    about = "Recommends emulation environments for identified disk images",
    long_about = None
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: ./envrec.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// Root directory of the dated log files
    #[arg(long, global = true, default_value = DEFAULT_LOG_DIR)]
    log_dir: PathBuf,

    /// Log to stderr only
    #[arg(long, global = true)]
    no_log_file: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape readable/writable formats of applications into the catalog
    Scrape(ScrapeArgs),

    /// List applications that read or write a format
    Lookup(LookupArgs),

    /// Build reference and random environments, vectors and bulk files
    Build(BuildArgs),

    /// Load the generated bulk files into the search service
    Load(LoadArgs),

    /// Score environments against the identified test images
    Evaluate(EvaluateArgs),

    /// Build, reload and evaluate in one go
    Run(RunArgs),

    /// Run a single match query against the keyword collection
    Query(QueryArgs),

    /// Delete a collection from the search service
    #[command(name = "delete-index")]
    DeleteIndex(DeleteIndexArgs),
}

#[derive(Args)]
struct ScrapeArgs {
    /// Catalog file to write (default: configured catalog path)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Application tags to scrape (default: members of the reference environments)
    #[arg(long, value_delimiter = ',')]
    tags: Vec<String>,
}

#[derive(Args)]
struct LookupArgs {
    /// Format tag, e.g. Q123
    format: String,

    /// Ask the knowledge graph instead of the local catalog
    #[arg(long)]
    remote: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    ObservedFormats,
    CatalogApplications,
}

impl From<SourceArg> for RandomSource {
    fn from(value: SourceArg) -> Self {
        match value {
            SourceArg::ObservedFormats => RandomSource::ObservedFormats,
            SourceArg::CatalogApplications => RandomSource::CatalogApplications,
        }
    }
}

#[derive(Args, Clone)]
struct BuildArgs {
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// JSON definitions replacing the built-in reference environments
    #[arg(long)]
    reference_envs: Option<PathBuf>,

    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long)]
    work_dir: Option<PathBuf>,

    #[arg(long)]
    random_count: Option<usize>,

    /// Formats (or applications) per random environment
    #[arg(long)]
    sample_size: Option<usize>,

    #[arg(long, value_enum)]
    source: Option<SourceArg>,

    /// Seed for reproducible random environments
    #[arg(long)]
    seed: Option<u64>,
}

impl BuildArgs {
    fn apply(&self, settings: &mut Settings) {
        let paths = &mut settings.paths;
        if let Some(catalog) = &self.catalog {
            paths.catalog = catalog.clone();
        }
        if let Some(reference) = &self.reference_envs {
            paths.reference_envs = Some(reference.clone());
        }
        if let Some(dir) = &self.data_dir {
            paths.data_dir = dir.clone();
        }
        if let Some(dir) = &self.work_dir {
            paths.work_dir = dir.clone();
        }
        let sampling = &mut settings.sampling;
        if let Some(count) = self.random_count {
            sampling.random_count = count;
        }
        if let Some(size) = self.sample_size {
            sampling.sample_size = size;
        }
        if let Some(source) = self.source {
            sampling.source = source.into();
        }
        if self.seed.is_some() {
            sampling.seed = self.seed;
        }
    }
}

#[derive(Args)]
struct LoadArgs {
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Delete both collections before loading
    #[arg(long)]
    reset: bool,
}

#[derive(Args, Clone)]
struct ScoringArgs {
    /// Query strategies (repeatable; default from config)
    #[arg(long = "strategy")]
    strategies: Vec<QueryStrategy>,

    /// winner_take_all | cumulative
    #[arg(long)]
    scoring: Option<ScoringMode>,

    /// Directory for summary files (default: work dir)
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

impl ScoringArgs {
    fn resolve(&self, settings: &Settings) -> (Vec<QueryStrategy>, ScoringMode, PathBuf) {
        let strategies = if self.strategies.is_empty() {
            settings.evaluation.strategies.clone()
        } else {
            self.strategies.clone()
        };
        let scoring = self.scoring.unwrap_or(settings.evaluation.scoring);
        let out_dir = self
            .out_dir
            .clone()
            .unwrap_or_else(|| settings.paths.work_dir.clone());
        (strategies, scoring, out_dir)
    }
}

#[derive(Args)]
struct EvaluateArgs {
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long)]
    work_dir: Option<PathBuf>,

    #[command(flatten)]
    scoring: ScoringArgs,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    build: BuildArgs,

    #[command(flatten)]
    scoring: ScoringArgs,
}

#[derive(Args)]
struct QueryArgs {
    term: String,

    #[arg(long, default_value = FORMAT_FIELD)]
    field: String,
}

#[derive(Args)]
struct DeleteIndexArgs {
    name: String,
}

fn print_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    print_stdout(&serde_json::to_string_pretty(value).context("Failed to serialize output")?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let session = LogSession::init(&LogOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        log_dir: (!cli.no_log_file).then(|| cli.log_dir.clone()),
    })?;
    if let Some(path) = session.path() {
        log::debug!("Logging to {}", path.display());
    }

    let result = run(cli).await;
    if let Err(err) = &result {
        log::error!("{err:#}");
    }
    session.finish();
    result
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Scrape(args) => {
            let out = args.out.unwrap_or_else(|| settings.paths.catalog.clone());
            let catalog = pipeline::scrape(&settings, &args.tags, &out).await?;
            log::info!("{} applications written to {}", catalog.len(), out.display());
        }
        Commands::Lookup(args) => {
            let users = pipeline::lookup(&settings, &args.format, args.remote).await?;
            print_json(&users)?;
        }
        Commands::Build(args) => {
            args.apply(&mut settings);
            let report = pipeline::build(&settings)?;
            print_json(&report)?;
        }
        Commands::Load(args) => {
            if let Some(dir) = args.work_dir {
                settings.paths.work_dir = dir;
            }
            let report = pipeline::load(&settings, args.reset).await?;
            print_json(&report)?;
        }
        Commands::Evaluate(args) => {
            if let Some(dir) = args.data_dir {
                settings.paths.data_dir = dir;
            }
            if let Some(dir) = args.work_dir {
                settings.paths.work_dir = dir;
            }
            let (strategies, scoring, out_dir) = args.scoring.resolve(&settings);
            let summaries = pipeline::evaluate(&settings, &strategies, scoring, &out_dir).await?;
            log::info!("{} summaries written to {}", summaries.len(), out_dir.display());
        }
        Commands::Run(args) => {
            args.build.apply(&mut settings);
            let report = pipeline::build(&settings)?;
            log::info!(
                "Built {} reference and {} random environments",
                report.reference,
                report.random
            );
            pipeline::load(&settings, true).await?;
            let (strategies, scoring, out_dir) = args.scoring.resolve(&settings);
            pipeline::evaluate(&settings, &strategies, scoring, &out_dir).await?;
        }
        Commands::Query(args) => {
            let hits = pipeline::query_term(&settings, &args.field, &args.term).await?;
            print_json(&hits)?;
        }
        Commands::DeleteIndex(args) => {
            let deleted = pipeline::delete_index(&settings, &args.name).await?;
            if !deleted {
                log::warn!("Index {} was not deleted", args.name);
            }
        }
    }
    Ok(())
}
