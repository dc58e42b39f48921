//! `PhishWatch` - keeps an inbox annotated with phishing verdicts.

mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use phishwatch_annotate::{Annotator, AnnotatorTask, InboxRow, PlainPage, RowKeys, Timing};
use phishwatch_core::{
    ApiClient, HostContext, PollState, Poller, PollerHandle, Settings, SnapshotStore, StatusPanel,
    VerdictReport,
};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{CliOptions, Command};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "phishwatch=info,phishwatch_core=info,phishwatch_annotate=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run().await {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let Some(CliOptions { config, command }) =
        cli::parse_args(std::env::args().skip(1).collect()).map_err(anyhow::Error::msg)?
    else {
        return Ok(());
    };

    let settings_path = config.unwrap_or_else(Settings::default_path);
    let settings = Settings::load(&settings_path)
        .await
        .with_context(|| format!("loading settings from {}", settings_path.display()))?;
    debug!(api_url = %settings.api_url, "Settings loaded");

    let store = open_store(&settings).await?;
    let panel = StatusPanel::new(store.clone());

    match command {
        Command::Status => println!("{}", panel.load().await?),
        Command::Clear => println!("{}", panel.clear_cache().await?),
        Command::TestApi => {
            let client = ApiClient::new(&settings.api_url, settings.fetch_timeout())?;
            println!("{}", panel.test_connection(&client).await?);
        }
        Command::Show { email_id } => match panel.find(&email_id).await? {
            Some(verdict) => println!("{}", VerdictReport::new(&verdict)),
            None => println!("No verdict cached for {email_id}"),
        },
        Command::Refresh => {
            let client = ApiClient::new(&settings.api_url, settings.fetch_timeout())?;
            let poller = Poller::new(client, store.clone(), HostContext::new())
                .with_fetch_timeout(settings.fetch_timeout());
            println!("{}", panel.refresh_once(&poller).await?);
        }
        Command::Annotate { rows } => {
            let mut page = read_page(&rows).await?;
            let report = Annotator::from_store(&store).await?.scan(&mut page);
            print_rows(&page);
            println!(
                "\n{} rows: {} safe, {} flagged, {} unknown",
                report.candidates,
                report.safe,
                report.flagged(),
                report.unknown
            );
        }
        Command::Watch { rows } => watch(&settings, store, rows.as_deref()).await?,
    }

    Ok(())
}

async fn open_store(settings: &Settings) -> anyhow::Result<SnapshotStore> {
    let path = settings.database_path();
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(SnapshotStore::new(&path.to_string_lossy()).await?)
}

async fn read_page(path: &Path) -> anyhow::Result<PlainPage> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(PlainPage::from_json(&text)?)
}

fn print_rows(page: &PlainPage) {
    for row in page.rows.iter().filter(|r| r.is_candidate()) {
        let keys = RowKeys::extract(row);
        let label = keys
            .id
            .or(keys.sender)
            .or(keys.subject)
            .unwrap_or_else(|| "-".to_string());
        if let Some(badge) = row.badge() {
            println!(
                "{:<11} {:<40} {}",
                badge.indicator.label(),
                label,
                badge.tooltip.as_deref().unwrap_or("")
            );
        }
    }
}

async fn watch(settings: &Settings, store: SnapshotStore, rows: Option<&Path>) -> anyhow::Result<()> {
    let context = HostContext::new();
    let client = ApiClient::new(&settings.api_url, settings.fetch_timeout())?;
    let poller = Arc::new(
        Poller::new(client, store.clone(), context.clone())
            .with_fetch_timeout(settings.fetch_timeout()),
    );
    let (handle, commands) = PollerHandle::channel();
    let mut state = poller.watch_state();

    let annotating = match rows {
        Some(path) => {
            let page = read_page(path).await?;
            let annotator = Annotator::from_store(&store).await?;
            let timing = Timing {
                settle_delay: settings.settle_delay(),
                scroll_debounce: settings.scroll_debounce(),
            };
            let (scrolls, scroll_rx) = mpsc::channel(16);
            let task = AnnotatorTask::new(page, annotator, timing, context.clone());
            Some((
                scrolls,
                tokio::spawn(task.run(poller.subscribe(), scroll_rx)),
            ))
        }
        None => None,
    };

    let polling = {
        let poller = Arc::clone(&poller);
        let interval = settings.refresh_interval();
        tokio::spawn(async move { poller.run(interval, commands).await })
    };

    info!(api_url = %settings.api_url, "Watching; press Ctrl-C to stop");
    let panel = StatusPanel::new(store).with_poller(handle);

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Interrupted, shutting down");
                break;
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                if matches!(current, PollState::Updated | PollState::Stale) {
                    println!("{}\n", panel.load().await?);
                }
            }
        }
    }

    context.tear_down();
    polling.await?;

    if let Some((scrolls, task)) = annotating {
        drop(scrolls);
        let task = task.await?;
        print_rows(task.page());
        info!(scans = task.scan_count(), "Annotator stopped");
    }

    Ok(())
}
