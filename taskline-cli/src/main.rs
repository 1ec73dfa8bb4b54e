//! Taskline CLI - synced to-dos in your terminal

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use taskline_core::config::Config;
use taskline_core::{IdentityProvider, SessionState, TasklineContext};

mod auth;
mod list;
mod output;

/// Taskline - synced to-dos in your terminal
#[derive(Parser)]
#[command(name = "tk", version, about, long_about = None)]
struct Cli {
    /// Run against the in-memory demo backend instead of Firebase
    #[arg(long)]
    demo: bool,

    /// Taskline directory (settings live here)
    #[arg(long, env = "TASKLINE_DIR")]
    dir: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn taskline_dir(arg: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = arg {
        return Ok(dir);
    }
    Ok(dirs::home_dir()
        .context("Could not find home directory")?
        .join(".taskline"))
}

async fn run(cli: Cli) -> Result<()> {
    let dir = taskline_dir(cli.dir)?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create taskline directory: {:?}", dir))?;

    let mut config = Config::load(&dir)?;
    if cli.demo {
        config.demo_mode = true;
    }
    if !config.demo_mode && config.firebase.api_key.is_empty() {
        anyhow::bail!(
            "No Firebase settings configured. Add them to {:?} or run with --demo.",
            dir.join("settings.json")
        );
    }

    let ctx = TasklineContext::new(config)?;
    let mut gate = ctx.session_gate();

    loop {
        match gate.state().clone() {
            // A neutral wait indicator and nothing else until the provider
            // reports the current identity.
            SessionState::Resolving => {
                let spinner = ProgressBar::new_spinner();
                spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
                spinner.set_message("Resolving session...");
                spinner.enable_steady_tick(Duration::from_millis(120));
                let resolved = gate.next_change().await.is_some();
                spinner.finish_and_clear();
                if !resolved {
                    anyhow::bail!("Identity provider went away while resolving the session");
                }
            }
            SessionState::Anonymous => match auth::run(&ctx).await? {
                auth::AuthOutcome::Submitted => {
                    let _ = gate.next_change().await;
                }
                auth::AuthOutcome::Quit => return Ok(()),
            },
            SessionState::Authenticated(identity) => {
                match list::run(&ctx, &identity).await? {
                    list::ListOutcome::Logout => {
                        if let Err(err) = ctx.identity_provider.clear_session().await {
                            tracing::warn!(%err, "sign-out request failed");
                        }
                        let _ = gate.next_change().await;
                        output::success("Signed out.");
                    }
                    list::ListOutcome::Quit => return Ok(()),
                }
            }
        }
    }
}
