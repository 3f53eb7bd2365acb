//! # corral
//!
//! Corral CLI binary — wires the session store, the tmux and git adapters,
//! the hook reconciler, and the migration engine behind one command surface.
//!
//! Logs go to stderr; stdout carries command output only (the reconcile id,
//! list rows, migration summaries).

#![deny(unsafe_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use corral_core::Session;
use corral_git::{GitCli, Vcs};
use corral_hooks::{AgentEvent, StateReconciler};
use corral_migrate::{MigrationEngine, MigrationReport};
use corral_mux::{Multiplexer, TmuxMultiplexer};
use corral_settings::CorralSettings;
use corral_store::sqlite::ConnectionConfig;
use corral_store::{SessionStore, StoreConfig};
use tracing_subscriber::EnvFilter;

/// Corral session wrangler.
#[derive(Parser, Debug)]
#[command(name = "corral", about = "Manage agent sessions backed by tmux, git worktrees, and SQLite")]
struct Cli {
    /// State-root directory (overrides the settings file).
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Move sessions and their filesystem state to another state root.
    Migrate {
        /// Source state root.
        #[arg(long)]
        from: PathBuf,

        /// Destination state root.
        #[arg(long)]
        to: PathBuf,

        /// Move every session of this repository, plus its shared checkout.
        #[arg(long, conflicts_with = "session", required_unless_present = "session")]
        repo: Option<String>,

        /// Move the named session (repeatable).
        #[arg(long = "session")]
        session: Vec<String>,

        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Apply an agent lifecycle event from a hook callback.
    Hook {
        /// Wire event name (finished, needs-input, initialized, submitted, exited).
        event: String,

        /// Session the event belongs to.
        #[arg(long)]
        session: String,

        /// Execution id to stamp (falls back to the environment, then the stored id).
        #[arg(long)]
        execution_id: Option<String>,
    },

    /// Re-anchor stored state to tmux reality and print a fresh execution id.
    Reconcile,

    /// List sessions in display order.
    List {
        /// Include archived sessions.
        #[arg(long)]
        archived: bool,
    },

    /// Provision a session record.
    Add {
        /// Unique session name (also the tmux session name).
        name: String,

        /// Human-facing display name (defaults to the name).
        #[arg(long)]
        display_name: Option<String>,

        /// Shared checkout root.
        #[arg(long)]
        repo_path: Option<String>,

        /// This session's working tree.
        #[arg(long)]
        worktree_path: Option<String>,

        /// Branch checked out in the working tree.
        #[arg(long)]
        branch: Option<String>,

        /// Short repository identifier, e.g. "owner/repo".
        #[arg(long)]
        repo_info: Option<String>,

        /// Clone URL or path the checkout came from.
        #[arg(long)]
        repo_source: Option<String>,
    },

    /// Remove a session record.
    Delete {
        /// Session to remove.
        name: String,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_state_root(cli_override: Option<&Path>, settings: &CorralSettings) -> PathBuf {
    cli_override.map_or_else(|| settings.state_root(), Path::to_path_buf)
}

fn store_config(settings: &CorralSettings) -> StoreConfig {
    StoreConfig {
        connection: ConnectionConfig {
            pool_size: settings.store.pool_size,
            busy_timeout_ms: settings.store.busy_timeout_ms,
            cache_size_kib: settings.store.cache_size_kib,
        },
        retry: settings.store.retry.clone(),
    }
}

fn open_store(state_root: &Path, settings: &CorralSettings) -> Result<SessionStore> {
    SessionStore::open(state_root, &store_config(settings))
        .with_context(|| format!("failed to open store at {}", state_root.display()))
}

fn tmux(settings: &CorralSettings) -> Arc<dyn Multiplexer> {
    Arc::new(TmuxMultiplexer::new(settings.tmux.bin.clone()))
}

fn describe_selection(repo: Option<&str>, sessions: &[String]) -> String {
    match repo {
        Some(info) => format!("repository {info}"),
        None => format!("{} session(s)", sessions.len()),
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    let _ = std::io::stdin()
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn print_report(report: &MigrationReport) {
    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    println!("moved {} session(s)", report.moved.len());
}

async fn run_migrate(
    settings: &CorralSettings,
    from: PathBuf,
    to: PathBuf,
    repo: Option<String>,
    sessions: Vec<String>,
    yes: bool,
) -> Result<()> {
    if !yes {
        let prompt = format!(
            "Move {} from {} to {}? [y/N] ",
            describe_selection(repo.as_deref(), &sessions),
            from.display(),
            to.display()
        );
        if !confirm(&prompt)? {
            println!("aborted");
            return Ok(());
        }
    }

    let source = open_store(&from, settings)?;
    let dest = open_store(&to, settings)?;
    let vcs: Arc<dyn Vcs> = Arc::new(GitCli::new(settings.git.bin.clone()));
    let engine = MigrationEngine::new(source, from, dest, to, tmux(settings), vcs);

    let report = match repo {
        Some(repo_info) => engine.migrate_repo(&repo_info).await,
        None => engine.migrate_sessions(&sessions).await,
    }
    .context("migration failed")?;

    print_report(&report);
    Ok(())
}

fn run_hook(
    state_root: &Path,
    settings: &CorralSettings,
    event: &str,
    session: &str,
    flag_id: Option<&str>,
) -> Result<()> {
    let Ok(event) = event.parse::<AgentEvent>() else {
        tracing::warn!(event, session, "ignoring unrecognized hook event");
        return Ok(());
    };

    let store = Arc::new(open_store(state_root, settings)?);
    let stored = store.get(session).ok().map(|s| s.execution_id);
    let execution_id = corral_hooks::resolve_from_env(flag_id, stored.as_deref());

    let reconciler = StateReconciler::new(store, tmux(settings));
    reconciler
        .apply_event(session, event, &execution_id)
        .with_context(|| format!("failed to apply {event} to {session}"))?;
    Ok(())
}

async fn run_reconcile(state_root: &Path, settings: &CorralSettings) -> Result<()> {
    let store = Arc::new(open_store(state_root, settings)?);
    let reconciler = StateReconciler::new(store, tmux(settings));
    let id = reconciler
        .startup()
        .await
        .context("startup reconciliation failed")?;
    println!("{id}");
    Ok(())
}

fn run_list(state_root: &Path, settings: &CorralSettings, archived: bool) -> Result<()> {
    let store = open_store(state_root, settings)?;
    for session in store.list(archived)? {
        println!("{}\t{}\t{}", session.name, session.state, session.display_name);
    }
    Ok(())
}

fn run_add(state_root: &Path, settings: &CorralSettings, session: &Session) -> Result<()> {
    let store = open_store(state_root, settings)?;
    let added = store
        .add(session)
        .with_context(|| format!("failed to add session {}", session.name))?;
    println!("added {} at position {}", added.name, added.position);
    Ok(())
}

fn run_delete(state_root: &Path, settings: &CorralSettings, name: &str) -> Result<()> {
    let store = open_store(state_root, settings)?;
    store
        .delete(name)
        .with_context(|| format!("failed to delete session {name}"))?;
    println!("deleted {name}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Settings load silently falls back to defaults; logging is not up yet.
    let settings = corral_settings::load_settings().unwrap_or_default();
    init_logging(&settings.logging.level);

    let state_root = resolve_state_root(args.state_dir.as_deref(), &settings);

    match args.command {
        Command::Migrate {
            from,
            to,
            repo,
            session,
            yes,
        } => run_migrate(&settings, from, to, repo, session, yes).await,
        Command::Hook {
            event,
            session,
            execution_id,
        } => run_hook(
            &state_root,
            &settings,
            &event,
            &session,
            execution_id.as_deref(),
        ),
        Command::Reconcile => run_reconcile(&state_root, &settings).await,
        Command::List { archived } => run_list(&state_root, &settings, archived),
        Command::Add {
            name,
            display_name,
            repo_path,
            worktree_path,
            branch,
            repo_info,
            repo_source,
        } => {
            let mut session = Session::new(name);
            if let Some(v) = display_name {
                session.display_name = v;
            }
            if let Some(v) = repo_path {
                session.repo_path = v;
            }
            if let Some(v) = worktree_path {
                session.worktree_path = v;
            }
            if let Some(v) = branch {
                session.branch_name = v;
            }
            if let Some(v) = repo_info {
                session.repo_info = v;
            }
            if let Some(v) = repo_source {
                session.repo_source = v;
            }
            run_add(&state_root, &settings, &session)
        }
        Command::Delete { name } => run_delete(&state_root, &settings, &name),
    }
}
