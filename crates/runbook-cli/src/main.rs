mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, generate::GenerateOptions, ParamArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "runbook",
    about = "Checklist playbooks with gated command generation: a task's commands unlock once its inputs are marked done",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .runbook/)
    #[arg(long, global = true, env = "RUNBOOK_ROOT")]
    root: Option<PathBuf>,

    /// Playbook to load instead of the configured one
    #[arg(long, global = true, env = "RUNBOOK_PLAYBOOK")]
    playbook: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config and starter playbook if missing
    Init,

    /// List tasks in playbook order with their readiness
    Tasks {
        #[command(flatten)]
        params: ParamArgs,
    },

    /// List the execution modes of a task
    Modes {
        task: String,
    },

    /// Show a task: metadata, notes, readiness
    Show {
        task: String,
        #[command(flatten)]
        params: ParamArgs,
    },

    /// Check whether a task's required artifacts are done (exit 1 when blocked)
    Check {
        task: String,
        #[command(flatten)]
        params: ParamArgs,
    },

    /// Print a task's commands with parameters substituted
    Generate {
        task: String,
        /// Mode to generate (default: the task's first mode)
        #[arg(long, short = 'm')]
        mode: Option<String>,
        /// Print only the commands, newline-joined
        #[arg(long)]
        plain: bool,
        #[command(flatten)]
        params: ParamArgs,
    },

    /// Mark a task's produced artifacts as done in the active scope
    Done {
        task: String,
        #[command(flatten)]
        params: ParamArgs,
    },

    /// List the artifacts recorded as done in the active scope
    Completed {
        #[command(flatten)]
        params: ParamArgs,
    },

    /// Forget every completion in the active scope
    Reset {
        #[command(flatten)]
        params: ParamArgs,
    },

    /// Inspect and validate .runbook/config.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let playbook = cli.playbook.as_deref();
    let json = cli.json;

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Tasks { params } => cmd::tasks::list(&root, playbook, &params, json),
        Commands::Modes { task } => cmd::tasks::modes(&root, playbook, &task, json),
        Commands::Show { task, params } => cmd::show::show(&root, playbook, &task, &params, json),
        Commands::Check { task, params } => {
            cmd::show::check(&root, playbook, &task, &params, json)
        }
        Commands::Generate {
            task,
            mode,
            plain,
            params,
        } => {
            let opts = GenerateOptions {
                task_id: &task,
                mode: mode.as_deref(),
                plain,
            };
            cmd::generate::run(&root, playbook, opts, &params, json)
        }
        Commands::Done { task, params } => cmd::record::done(&root, playbook, &task, &params, json),
        Commands::Completed { params } => cmd::scope::completed(&root, &params, json),
        Commands::Reset { params } => cmd::scope::reset(&root, &params, json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
