use crate::{
    commands::{Commands, Inputs},
    error::CliError,
    output::ValidationReport,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use engine_config::settings::SettingsOverrides;
use engine_processing::store::registry::LoadMode;
use engine_runtime::{request::ResultsRequest, session::Session};
use model::records::field::StoreKind;
use std::{fs::OpenOptions, path::PathBuf, sync::Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "crowdctl",
    version = "0.1.0",
    about = "Crowdsourcing marketplace administration tool"
)]
struct Cli {
    #[arg(long, default_value = "crowdctl.toml", help = "Settings file path")]
    config: PathBuf,

    #[arg(long, help = "Log every call instead of sending it")]
    dry: bool,

    #[arg(long, help = "Use the sandbox marketplace")]
    sandbox: bool,

    #[arg(long, help = "Also append logs to this file")]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = init_logging(cli.log_file.as_deref()) {
        eprintln!("{err}");
        std::process::exit(ExitCode::GeneralError.as_i32());
    }

    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let code = match run(cli, &shutdown).await {
        Ok(()) if shutdown.is_shutdown_requested() => {
            warn!("Interrupted; records not yet sent were skipped");
            ExitCode::ShutdownRequested
        }
        Ok(()) => ExitCode::Success,
        Err(CliError::RecordsFailed(n)) => {
            error!("{n} record(s) failed");
            ExitCode::RecordsFailed
        }
        Err(err) => {
            error!("{err}");
            ExitCode::GeneralError
        }
    };
    std::process::exit(code.as_i32());
}

fn init_logging(log_file: Option<&str>) -> Result<(), CliError> {
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|err| CliError::Logging(err.to_string()))
}

async fn run(cli: Cli, shutdown: &ShutdownCoordinator) -> Result<(), CliError> {
    let overrides = SettingsOverrides {
        dry: cli.dry,
        sandbox: cli.sandbox,
    };
    let mut session = Session::open(&cli.config, overrides)?;
    if cli.command.is_remote() {
        session.connect_remote()?;
    }

    match cli.command {
        Commands::Validate { inputs, output } => {
            load_inputs(&mut session, &inputs)?;
            let report = ValidationReport::from_store(session.registry().results()?);
            match output {
                Some(path) => output::write_report(&report, path).await?,
                None => output::print_report(&report),
            }
        }
        Commands::Approve { inputs, feedback } => {
            load_inputs(&mut session, &inputs)?;
            let summary = session
                .batch(shutdown.cancel_token())
                .approve_reject(feedback.as_deref())
                .await?;
            finish(&[summary])?;
        }
        Commands::Bonus { inputs, reason } => {
            load_inputs(&mut session, &inputs)?;
            let summary = session
                .batch(shutdown.cancel_token())
                .grant_bonus(&reason)
                .await?;
            finish(&[summary])?;
        }
        Commands::Qualify { inputs } => {
            load_inputs(&mut session, &inputs)?;
            let summary = session
                .batch(shutdown.cancel_token())
                .assign_qualification()
                .await?;
            finish(&[summary])?;
        }
        Commands::Results {
            inputs,
            approve,
            bonus,
            qualify,
            reason,
            feedback,
        } => {
            let request = ResultsRequest {
                approve,
                bonus,
                qualify,
                reason,
                feedback,
            };
            request.validate()?;
            load_inputs(&mut session, &inputs)?;
            let summaries = session
                .batch(shutdown.cancel_token())
                .process_results(&request)
                .await?;
            finish(&summaries)?;
        }
        Commands::Notify {
            workers,
            subject,
            message,
        } => {
            let summary = session
                .batch(shutdown.cancel_token())
                .notify(&workers, &subject, &message)
                .await?;
            finish(&[summary])?;
        }
        Commands::ExtendHit {
            hit_id,
            assignments,
            seconds,
        } => {
            let hit_id = resolve_hit_id(&session, hit_id)?;
            let reply = session
                .batch(shutdown.cancel_token())
                .extend_hit(&hit_id, assignments, seconds)
                .await?;
            output::print_reply(reply)?;
        }
        Commands::ExpireHit { hit_id } => {
            let hit_id = resolve_hit_id(&session, hit_id)?;
            let reply = session
                .batch(shutdown.cancel_token())
                .expire_hit(&hit_id)
                .await?;
            output::print_reply(reply)?;
        }
        Commands::SearchHits => {
            let reply = session.batch(shutdown.cancel_token()).search_hits().await?;
            output::print_reply(reply)?;
        }
        Commands::SearchQualifications { query } => {
            let reply = session
                .batch(shutdown.cancel_token())
                .search_qualification_types(&query)
                .await?;
            output::print_reply(reply)?;
        }
        Commands::Balance => {
            let reply = session
                .batch(shutdown.cancel_token())
                .account_balance()
                .await?;
            output::print_reply(reply)?;
        }
        Commands::CreateHit { params } => {
            let source = tokio::fs::read_to_string(&params).await?;
            let params: serde_json::Value = serde_json::from_str(&source)?;
            let reply = session
                .batch(shutdown.cancel_token())
                .create_hit(params)
                .await?;
            output::print_reply(reply)?;
        }
    }

    info!("Dispatcher totals: {:?}", session.metrics());
    Ok(())
}

/// Loads the reference list first so results are cross-checked on insert.
fn load_inputs(session: &mut Session, inputs: &Inputs) -> Result<(), CliError> {
    if let Some(reference) = &inputs.reference {
        let report = session.load(StoreKind::Reference, reference, LoadMode::default())?;
        info!("{report}");
    }
    let report = session.load(StoreKind::Results, &inputs.results, LoadMode::default())?;
    info!("{report}");
    Ok(())
}

fn resolve_hit_id(session: &Session, hit_id: Option<String>) -> Result<String, CliError> {
    hit_id
        .or_else(|| session.settings().hit_id.clone())
        .ok_or_else(|| CliError::MissingArgument("--hit-id (or HITId in the settings)".into()))
}

fn finish(summaries: &[engine_runtime::summary::BatchSummary]) -> Result<(), CliError> {
    match output::print_summaries(summaries) {
        0 => Ok(()),
        failed => Err(CliError::RecordsFailed(failed)),
    }
}
