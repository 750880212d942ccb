//! `ghost-kitchen` command-line front end.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ghost_kitchen::{
    BrandTemplate, LoadOptions, OutputFormat, RunOptions, SiteTemplate, init_setup,
    load_simulation_setup, run_with, validate_setup,
};

#[derive(Parser)]
#[command(name = "ghost-kitchen", version, about = "Ghost-kitchen network digital twin")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation and write snapshots
    Run(RunArgs),
    /// Load a setup and build the engine without running it
    Validate(ValidateArgs),
    /// Write a template setup directory
    Init(InitArgs),
}

#[derive(Debug, Args)]
struct SetupArgs {
    /// Working directory holding the setup; `snapshots/` and `routing/` live beside it.
    #[arg(short, long, default_value = ".ghost-kitchen")]
    working_directory: PathBuf,

    /// Setup directory, if not the working directory itself.
    #[arg(long)]
    setup: Option<PathBuf>,
}

impl SetupArgs {
    fn setup_dir(&self) -> PathBuf {
        self.setup.clone().unwrap_or_else(|| self.working_directory.clone())
    }
}

#[derive(Debug, Args)]
struct RunArgs {
    #[command(flatten)]
    setup: SetupArgs,

    /// Ticks to simulate.
    #[arg(short, long, default_value_t = 100)]
    duration: u64,

    /// Snapshot directory [default: <working-directory>/snapshots].
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Road network directory [default: <working-directory>/routing].
    #[arg(long)]
    routing: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = FormatArg::Parquet)]
    format: FormatArg,

    /// Override the seed from simulation.json.
    #[arg(long)]
    seed: Option<u64>,

    /// Validate and build the engine, but run no ticks and write nothing.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    #[command(flatten)]
    setup: SetupArgs,

    /// Road network directory [default: <working-directory>/routing].
    #[arg(long)]
    routing: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct InitArgs {
    /// Directory to create the setup in.
    #[arg(short, long, default_value = ".ghost-kitchen")]
    working_directory: PathBuf,

    #[arg(long, value_enum, value_delimiter = ',', default_values_t = [SiteArg::Amsterdam, SiteArg::London])]
    sites: Vec<SiteArg>,

    #[arg(long, value_enum, value_delimiter = ',', default_values_t = [BrandArg::Asian, BrandArg::FastFood, BrandArg::Mexican])]
    brands: Vec<BrandArg>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Parquet,
    Csv,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Parquet => OutputFormat::Parquet,
            FormatArg::Csv => OutputFormat::Csv,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
enum SiteArg {
    Amsterdam,
    Berlin,
    London,
}

impl From<SiteArg> for SiteTemplate {
    fn from(value: SiteArg) -> Self {
        match value {
            SiteArg::Amsterdam => SiteTemplate::Amsterdam,
            SiteArg::Berlin => SiteTemplate::Berlin,
            SiteArg::London => SiteTemplate::London,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
enum BrandArg {
    Asian,
    FastFood,
    Mexican,
}

impl From<BrandArg> for BrandTemplate {
    fn from(value: BrandArg) -> Self {
        match value {
            BrandArg::Asian => BrandTemplate::Asian,
            BrandArg::FastFood => BrandTemplate::FastFood,
            BrandArg::Mexican => BrandTemplate::Mexican,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Validate(args) => validate(args),
        Commands::Init(args) => init(args),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let dir = args.setup.setup_dir();
    let setup = load_simulation_setup(&dir, &LoadOptions::new())
        .with_context(|| format!("loading setup from {}", dir.display()))?;

    let wd = &args.setup.working_directory;
    let routing = routing_dir(args.routing, wd);
    let options = RunOptions {
        duration: args.duration,
        output_location: args.output.unwrap_or_else(|| wd.join("snapshots")),
        routing_location: routing,
        format: args.format.into(),
        seed: args.seed,
        dry_run: args.dry_run,
    };
    let report = run_with(Arc::new(setup), &options).context("simulation failed")?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn validate(args: ValidateArgs) -> Result<()> {
    let dir = args.setup.setup_dir();
    let routing = routing_dir(args.routing, &args.setup.working_directory);
    let report = validate_setup(&dir, routing.as_deref())
        .with_context(|| format!("setup in {} is invalid", dir.display()))?;
    info!(
        sites = report.sites,
        kitchens = report.kitchens,
        stations = report.stations,
        brands = report.brands,
        menu_items = report.menu_items,
        router = report.router,
        "setup valid"
    );
    Ok(())
}

/// An explicit routing directory, else `<wd>/routing` when it exists.
fn routing_dir(explicit: Option<PathBuf>, wd: &Path) -> Option<PathBuf> {
    explicit.or_else(|| {
        let default = wd.join("routing");
        default.is_dir().then_some(default)
    })
}

fn init(args: InitArgs) -> Result<()> {
    let sites: Vec<SiteTemplate> = args.sites.into_iter().map(Into::into).collect();
    let brands: Vec<BrandTemplate> = args.brands.into_iter().map(Into::into).collect();
    init_setup(&args.working_directory, &sites, &brands)
        .with_context(|| format!("initialising {}", args.working_directory.display()))?;
    println!("setup written to {}", args.working_directory.display());
    Ok(())
}
