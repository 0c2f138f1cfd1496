//! Argument parsing, error mapping and command dispatch.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use vidsync_app::{AppError, WorkflowController, WorkflowError, build_workflow, init_telemetry};
use vidsync_config::{AppConfig, ConfigError};
use vidsync_telemetry::GlobalContextGuard;

use crate::commands;
use crate::prompt::TerminalPrompt;

/// Parse the process arguments, run the selected command and return the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    match execute(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn execute(cli: Cli) -> CliResult<()> {
    let config = load_config(cli.config.as_deref())?;
    init_telemetry(&config).map_err(CliError::failure)?;
    let _context = GlobalContextGuard::new(cli.command.label());
    info!(command = cli.command.label(), "vidsync command started");

    let prompt = Arc::new(TerminalPrompt::stdin(cli.yes));
    let workflow =
        build_workflow(&config, prompt.clone(), prompt).map_err(CliError::failure)?;
    let outcome = dispatch(&cli.command, &workflow, cli.output).await;
    if cli.metrics {
        eprint!("{}", commands::metrics_report(&workflow)?);
    }
    outcome
}

pub(crate) async fn dispatch(
    command: &Command,
    workflow: &WorkflowController,
    output: OutputFormat,
) -> CliResult<()> {
    match command {
        Command::List => commands::handle_list(workflow, output).await,
        Command::Mirror => commands::handle_mirror(workflow).await,
        Command::Delete => commands::handle_delete(workflow).await,
        Command::Sync => commands::handle_sync(workflow).await,
    }
}

fn load_config(path: Option<&std::path::Path>) -> CliResult<AppConfig> {
    vidsync_config::load(path).map_err(|err| match err {
        ConfigError::InvalidField {
            field,
            reason,
            value,
        } => CliError::validation(match value {
            Some(value) => format!("invalid configuration field {field} ({reason}): {value}"),
            None => format!("invalid configuration field {field} ({reason})"),
        }),
        other => CliError::failure(other),
    })
}

#[derive(Parser)]
#[command(
    name = "vidsync",
    about = "Mirror videos from shared storage into a private directory"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "VIDSYNC_CONFIG",
        help = "JSON configuration file; VIDSYNC_* variables override its values"
    )]
    config: Option<PathBuf>,
    #[arg(
        long,
        short = 'y',
        global = true,
        help = "Answer yes to permission and deletion prompts"
    )]
    yes: bool,
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for the record listing"
    )]
    output: OutputFormat,
    #[arg(
        long,
        global = true,
        help = "Print workflow counters in Prometheus text format to stderr on exit"
    )]
    metrics: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    /// Enumerate videos in shared storage.
    List,
    /// Enumerate, then copy every video into private storage.
    Mirror,
    /// Enumerate, then delete every video from shared storage.
    Delete,
    /// Mirror, then delete the originals when every copy succeeded.
    Sync,
}

impl Command {
    const fn label(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Mirror => "mirror",
            Self::Delete => "delete",
            Self::Sync => "sync",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, ValueEnum, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) fn workflow(error: WorkflowError) -> Self {
        match error {
            WorkflowError::PermissionDenied { capability } => {
                Self::validation(format!("permission not granted: {capability}"))
            }
            WorkflowError::Busy => Self::failure(AppError::workflow("cli.dispatch", error)),
        }
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}
