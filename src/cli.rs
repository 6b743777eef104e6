use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::output::TerminalSink;
use crate::providers::{BuildSource, BuildStatusClient};
use crate::repo::{GitCli, RepoResolver, SourceControl};
use crate::status::{
    AnimationConfig, MemorySink, StatusController, StatusSink, TriggerEvent, View, ViewId,
    FRAMES, FRAME_INTERVAL_MS, STATUS_BAR_KEY,
};

#[derive(Parser)]
#[command(name = "travis-status")]
#[command(author, version, about = "Travis CI build status for the branch of a file", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Travis API token
    #[arg(short, long, global = true, env = "TRAVIS_API_TOKEN")]
    token: Option<String>,

    /// Query the private (travis-ci.com) endpoint
    #[arg(long, global = true)]
    private: bool,

    /// Repository slug, instead of `git config travis.slug`
    #[arg(short, long, global = true)]
    repo: Option<String>,

    /// API base URL, overrides --private
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Settings file (TOML, JSON or YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the build status once
    Status {
        #[arg(short, long)]
        file: PathBuf,

        /// Host event to replay for the file
        #[arg(short, long, value_enum, default_value_t = TriggerEvent::Loaded)]
        event: TriggerEvent,
    },
    /// Keep a live status line, refreshed on an interval
    Watch {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value_t = 30)]
        interval: u64,

        /// Milliseconds between frames of the "building" animation
        #[arg(long, default_value_t = FRAME_INTERVAL_MS)]
        frame_ms: u64,
    },
}

impl Cli {
    /// Flags act as the view-level settings layer.
    fn overrides(&self) -> Settings {
        Settings {
            travis_private_projects: self.private.then_some(true),
            travis_api_token: self.token.clone(),
            travis_project_repo: self.repo.clone(),
            travis_api_url: self.api_url.clone(),
        }
    }

    fn view(&self, file: &Path, sink: Arc<dyn StatusSink>) -> Result<View> {
        let file = std::fs::canonicalize(file)
            .with_context(|| format!("Failed to resolve file: {}", file.display()))?;
        Ok(View::new(ViewId(1), Some(file), sink).with_settings(self.overrides()))
    }

    fn controller(&self) -> Result<StatusController<GitCli, BuildStatusClient>> {
        let global = Settings::load(self.config.as_deref())?;
        Ok(StatusController::new(
            RepoResolver::new(GitCli),
            BuildStatusClient::new()?,
            global,
        ))
    }

    async fn execute_status(&self, file: &Path, event: TriggerEvent) -> Result<()> {
        let sink = Arc::new(MemorySink::default());
        let view = self.view(file, Arc::clone(&sink) as Arc<dyn StatusSink>)?;
        let mut controller = self.controller()?;

        controller.handle(event, &view).await;

        let line = controller
            .building_label(view.id)
            .map(|label| format!("{label}..."))
            .or_else(|| sink.get(STATUS_BAR_KEY));

        controller.handle(TriggerEvent::Closed, &view).await;

        match line {
            Some(line) => println!("{line}"),
            None => info!("No build status for {}", file.display()),
        }

        Ok(())
    }

    async fn execute_watch(&self, file: &Path, interval: u64, frame_ms: u64) -> Result<()> {
        let animation = AnimationConfig::new(
            FRAMES.iter().map(ToString::to_string).collect(),
            Duration::from_millis(frame_ms),
            "",
        )?;
        let view = self.view(file, Arc::new(TerminalSink::stderr()))?;
        let mut controller = self.controller()?.with_animation(animation);

        info!("Watching {} every {interval}s", file.display());

        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Unable to listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
        };
        watch(
            &mut controller,
            &view,
            Duration::from_secs(interval.max(1)),
            shutdown,
        )
        .await;
        eprintln!();

        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Status { file, event } => self.execute_status(file, *event).await,
            Commands::Watch {
                file,
                interval,
                frame_ms,
            } => self.execute_watch(file, *interval, *frame_ms).await,
        }
    }
}

/// Refresh `view` with `Opened`, then `Activated` every `period`, until
/// `shutdown` resolves; then close the view.
///
/// `shutdown` is created once and polled ahead of the ticker, so a signal
/// raised while a refresh is in flight ends the loop right after it.
async fn watch<S, B>(
    controller: &mut StatusController<S, B>,
    view: &View,
    period: Duration,
    shutdown: impl Future<Output = ()>,
) where
    S: SourceControl,
    B: BuildSource,
{
    let mut ticker = tokio::time::interval(period);
    let mut event = TriggerEvent::Opened;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => break,
            _ = ticker.tick() => {
                controller.handle(event, view).await;
                event = TriggerEvent::Activated;
            }
        }
    }

    controller.handle(TriggerEvent::Closed, view).await;
}
