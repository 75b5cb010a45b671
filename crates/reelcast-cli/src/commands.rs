//! CLI command implementations

use crate::output::{self, CatalogRow, OutputFormat};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use reelcast_core::{
    Catalog, ContentRef, HeadlessEngineFactory, HeadlessSurface, HttpCatalogClient,
    PlaybackEvent, PlaybackSession, PlaybackStatus, PlayerConfig, RenderingSurface,
    SessionSnapshot, SourceResolver,
};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;

fn content_ref(id: &str, live: bool) -> ContentRef {
    if live {
        ContentRef::live(id)
    } else {
        ContentRef::vod(id)
    }
}

/// List videos and live streams
pub async fn list(config: &PlayerConfig, format: &str) -> anyhow::Result<()> {
    let mut catalog = Catalog::new(HttpCatalogClient::from_config(config)?);

    // Live streams are listed even when the video listing fails.
    let video_error = catalog.refresh().await.err();

    let rows: Vec<CatalogRow> = catalog
        .videos()
        .iter()
        .map(|name| CatalogRow::new(&ContentRef::vod(name.as_str())))
        .chain(catalog.live().iter().map(|name| CatalogRow::new(&ContentRef::live(name.as_str()))))
        .collect();

    match OutputFormat::from(format) {
        OutputFormat::Json | OutputFormat::Table => println!("{}", output::format_catalog(&rows, format)),
        OutputFormat::Text => {
            println!("Available Videos:");
            if catalog.videos().is_empty() {
                println!("  No videos yet. Upload to get started.");
            }
            for name in catalog.videos() {
                println!("  {}", name);
            }

            println!("\nLive Streams:");
            if catalog.live().is_empty() {
                println!("  No live streams active.");
            }
            for name in catalog.live() {
                println!("  {} {}", style("●").red(), name);
            }
        }
    }

    if let Some(e) = video_error {
        anyhow::bail!("Error: {}", e.user_message());
    }
    Ok(())
}

/// Upload a file and optionally play it
pub async fn upload(
    config: &PlayerConfig,
    file: &Path,
    play_after: bool,
    timeout: u64,
    format: &str,
) -> anyhow::Result<()> {
    let mut catalog = Catalog::new(HttpCatalogClient::from_config(config)?);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(format!("Uploading & converting {}...", file.display()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = catalog.upload_and_select(file).await;
    spinner.finish_and_clear();
    let receipt = result?;

    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", output::format_output(&receipt, format)),
        _ => println!(
            "{} Uploaded \"{}\" successfully. Processing completed.",
            style("✓").green(),
            receipt.video
        ),
    }

    if play_after {
        if let Some(selection) = catalog.selection().cloned() {
            let ok = play_content(config, selection, timeout, false, format).await?;
            if !ok {
                anyhow::bail!("Playback of \"{}\" failed", receipt.video);
            }
        }
    }

    Ok(())
}

/// Print the manifest URL for an identifier
pub fn resolve(config: &PlayerConfig, id: &str, live: bool, format: &str) -> anyhow::Result<()> {
    let content = content_ref(id, live);
    let url = SourceResolver::new(config.api_base_url.clone()).resolve(&content)?;

    match OutputFormat::from(format) {
        OutputFormat::Json => println!(
            "{}",
            output::format_output(&serde_json::json!({ "content": content, "url": url }), format)
        ),
        _ => println!("{}", url),
    }
    Ok(())
}

/// Run a headless session for an identifier
pub async fn play(
    config: &PlayerConfig,
    id: &str,
    live: bool,
    timeout: u64,
    follow: bool,
    format: &str,
) -> anyhow::Result<bool> {
    play_content(config, content_ref(id, live), timeout, follow, format).await
}

/// Drive a headless session, printing every status change.
///
/// Returns `true` once playback starts (or, with `follow`, when the time
/// limit passes without a failure).
async fn play_content(
    config: &PlayerConfig,
    content: ContentRef,
    timeout: u64,
    follow: bool,
    format: &str,
) -> anyhow::Result<bool> {
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let factory = HeadlessEngineFactory::new(client, tx);
    let mut session = PlaybackSession::from_config(config, Box::new(factory), HeadlessSurface::new());

    tracing::debug!(session = %session.id(), content = %content, "Starting headless session");
    session.start(content)?;
    report(&session.snapshot(), format);

    let interrupt = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Interrupted, stopping session");
    };
    let ok = drive(&mut session, &mut rx, Duration::from_secs(timeout), follow, format, interrupt).await;

    session.stop();
    Ok(ok)
}

/// Feed engine events into `session` until it plays, fails, times out or
/// `interrupt` completes.
async fn drive<S: RenderingSurface>(
    session: &mut PlaybackSession<S>,
    rx: &mut mpsc::UnboundedReceiver<PlaybackEvent>,
    timeout: Duration,
    follow: bool,
    format: &str,
    interrupt: impl Future<Output = ()>,
) -> bool {
    let mut last = session.snapshot();
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline, interrupt);

    loop {
        if session.status().is_failed() {
            return false;
        }
        if !follow && *session.status() == PlaybackStatus::Playing {
            return true;
        }

        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { return false };
                session.handle_event(event);

                let snapshot = session.snapshot();
                if snapshot != last {
                    report(&snapshot, format);
                    last = snapshot;
                }
            }
            _ = &mut deadline => {
                if !follow {
                    eprintln!("Timed out after {}s in state {}", timeout.as_secs(), session.status());
                }
                return follow;
            }
            _ = &mut interrupt => {
                return !session.status().is_failed();
            }
        }
    }
}

fn report(snapshot: &SessionSnapshot, format: &str) {
    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", output::format_snapshot(snapshot)),
        _ => {
            let status = match &snapshot.status {
                PlaybackStatus::Playing => style(snapshot.status.to_string()).green(),
                PlaybackStatus::Recovering(_) => style(snapshot.status.to_string()).yellow(),
                PlaybackStatus::Failed(_) => style(snapshot.status.to_string()).red().bold(),
                _ => style(snapshot.status.to_string()).cyan(),
            };
            match &snapshot.message {
                Some(message) => println!(
                    "[{}] {} - {}",
                    chrono::Utc::now().format("%H:%M:%S"),
                    status,
                    message
                ),
                None => println!("[{}] {}", chrono::Utc::now().format("%H:%M:%S"), status),
            }
        }
    }
}
