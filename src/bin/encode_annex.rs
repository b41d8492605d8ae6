use std::process::ExitCode;

use clap::{ArgAction, Parser};
use miette::IntoDiagnostic;

use encode_annex::annex::SystemRunner;
use encode_annex::app::App;
use encode_annex::config::{DEFAULT_HOST, RunSettings, Verbosity};
use encode_annex::credentials;
use encode_annex::domain::ExperimentId;
use encode_annex::encode::EncodeHttpClient;
use encode_annex::error::AnnexError;
use encode_annex::metadata::AllowList;
use encode_annex::output::{JsonOutput, OutputMode, TextOutput};
use encode_annex::repository;

#[derive(Parser)]
#[command(name = "encode-annex")]
#[command(about = "Initialize a git-annex repository with ENCODE Project experiments")]
#[command(version, author)]
struct Cli {
    #[arg(help = "experiment IDs to download")]
    experiments: Vec<String>,

    #[arg(short, long, help = "initialize directory if needed")]
    init: bool,

    #[arg(short, long, help = "directory to download things into [default: current directory]")]
    destination: Option<String>,

    #[arg(long, help = "don't automatically download files")]
    fast: bool,

    #[arg(long, default_value = DEFAULT_HOST, help = "which ENCODE host to connect to")]
    host: String,

    #[arg(short, long, action = ArgAction::Count, help = "increase logging (-v info, -vv debug)")]
    verbose: u8,

    #[arg(long, help = "report debug messages")]
    debug: bool,

    #[arg(long, help = "print the run summary as JSON")]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<AnnexError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &AnnexError) -> u8 {
    match error {
        AnnexError::DestinationMissing(_)
        | AnnexError::NotGitRepository(_)
        | AnnexError::NotAnnexRepository(_) => 1,
        AnnexError::InvalidExperimentId(_)
        | AnnexError::InvalidHost(_)
        | AnnexError::InvalidDestination(_) => 2,
        AnnexError::EncodeHttp(_)
        | AnnexError::EncodeStatus { .. }
        | AnnexError::NotAnExperiment { .. } => 3,
        AnnexError::CommandSpawn { .. } | AnnexError::CommandFailed { .. } => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();
    let verbosity = Verbosity::from_flags(cli.verbose, cli.debug);

    tracing_subscriber::fmt()
        .with_env_filter(verbosity.env_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let experiments = cli
        .experiments
        .iter()
        .map(|value| value.parse::<ExperimentId>())
        .collect::<Result<Vec<_>, _>>()?;
    let settings = RunSettings::resolve(cli.destination.as_deref(), &cli.host, cli.fast, verbosity)?;

    let runner = SystemRunner::new();
    repository::verify(&settings.destination, cli.init, &runner)?;

    let auth = credentials::lookup(&settings.host)?;
    let client = EncodeHttpClient::new(&settings.host, auth)?;
    let app = App::new(client, runner, AllowList::encode(), settings);
    let summary = app.run(&experiments)?;

    match output_mode {
        OutputMode::Json => JsonOutput::print_summary(&summary).into_diagnostic()?,
        OutputMode::Text => TextOutput::print_summary(&summary).into_diagnostic()?,
    }
    Ok(())
}
