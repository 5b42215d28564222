use std::future::Future;

use anyhow::Context;
use chrono::Utc;
use engine_logging::{engine_info, engine_warn};
use postgrab_core::RunSummary;
use postgrab_engine::{
    ensure_output_dir, write_summary_report, DownloadOrchestrator, HttpMediaSource,
    SessionManager, WorkItemSource,
};
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, InputMode};
use crate::prompt::TerminalPrompt;

/// Runs one batch as described by the command line.
///
/// Errors returned here are fatal for the whole run. Per-post failures end up
/// in the returned summary instead. A Ctrl-C at any point after startup ends
/// the run with an interrupted summary.
pub async fn execute(cli: &Cli) -> anyhow::Result<RunSummary> {
    let stop = CancellationToken::new();
    spawn_interrupt_watcher(stop.clone());

    let mode = cli.input_mode().context(
        "one of --target, --shortcode, --post-url or --shortcodes-file is required",
    )?;

    ensure_output_dir(&cli.directory)
        .with_context(|| format!("cannot use output directory {}", cli.directory.display()))?;

    let source =
        HttpMediaSource::new(cli.source_settings()).context("invalid media gateway settings")?;

    // Inputs that need no session are opened first so a bad path fails
    // before the password prompt.
    let opened = match &mode {
        InputMode::Shortcode(code) => Some(WorkItemSource::direct(code)),
        InputMode::PostUrl(url) => Some(WorkItemSource::from_url(url)),
        InputMode::ShortcodesFile(path) => Some(WorkItemSource::from_file(path)?),
        InputMode::Profile(_) => None,
    };

    // The prompt itself blocks; a Ctrl-C typed there takes effect once the
    // line is read.
    let sessions = SessionManager::new(&source, &TerminalPrompt);
    let login = sessions.authenticate(cli.username.as_deref());
    let Some(session) = until_stopped(&stop, login).await else {
        return Ok(finish(cli, &mode, interrupted_before_start()));
    };
    let session = session?;

    let mut items = match (&mode, opened) {
        (InputMode::Profile(name), _) => {
            let listing =
                WorkItemSource::from_profile(&source, &session, name, cli.list_options());
            match until_stopped(&stop, listing).await {
                Some(items) => items?,
                None => return Ok(finish(cli, &mode, interrupted_before_start())),
            }
        }
        (_, Some(items)) => items,
        (_, None) => anyhow::bail!("no input to download from"),
    };

    let orchestrator = DownloadOrchestrator::new(&source, &session, cli.directory.clone())
        .with_stop_token(stop);
    let summary = orchestrator.run(&mut items, cli.count).await;

    Ok(finish(cli, &mode, summary))
}

/// Resolves to `None` as soon as a stop is requested, dropping `work`.
async fn until_stopped<T>(stop: &CancellationToken, work: impl Future<Output = T>) -> Option<T> {
    tokio::select! {
        biased;
        _ = stop.cancelled() => None,
        out = work => if stop.is_cancelled() { None } else { Some(out) },
    }
}

fn interrupted_before_start() -> RunSummary {
    let mut summary = RunSummary::new();
    summary.mark_interrupted();
    summary
}

fn finish(cli: &Cli, mode: &InputMode, summary: RunSummary) -> RunSummary {
    if !summary.interrupted() {
        match mode {
            InputMode::Profile(name) => engine_info!(
                "Successfully downloaded {} posts from @{}",
                summary.succeeded(),
                name
            ),
            InputMode::ShortcodesFile(_) => engine_info!("All shortcodes processed."),
            InputMode::Shortcode(_) | InputMode::PostUrl(_) => {}
        }
    }
    engine_info!(
        "Run finished: attempted {}, succeeded {}, failed {}",
        summary.attempted(),
        summary.succeeded(),
        summary.failed()
    );

    if let Some(path) = &cli.summary_json {
        match write_summary_report(path, &summary, &Utc::now().to_rfc3339()) {
            Ok(written) => engine_info!("Summary written to {}", written.display()),
            Err(err) => engine_warn!("Could not write summary report: {}", err),
        }
    }
    summary
}

fn spawn_interrupt_watcher(stop: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            engine_warn!("Stop requested, finishing the current post...");
            stop.cancel();
        }
    });
}
