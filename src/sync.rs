//! Sync cycle orchestration and the watch loop.
//!
//! Ties the pipeline together: the watcher and a periodic tick feed the
//! coalescer, the coalescer runs [`SyncCycle`], and each cycle assembles a
//! snapshot from scratch (schema best-effort, then file aggregation) and
//! pushes it to the assistant. A cycle always reflects the filesystem at
//! its own start time — never the state at the original trigger.

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use crate::aggregate;
use crate::assistant::AssistantClient;
use crate::coalesce::{Coalescer, SyncAction, Trigger};
use crate::config::Config;
use crate::schema;
use crate::snapshot::Snapshot;
use crate::watcher;

/// Fixed wall-clock cadence for the periodic re-sync trigger. Keeps the
/// remote schema fresh even when no files change.
pub const RESYNC_INTERVAL: Duration = Duration::from_secs(30);

/// Assemble a snapshot reflecting the filesystem as of now.
///
/// The schema fetch is best-effort: a connection or query failure is logged
/// and the payload ships without a schema block, rather than blocking
/// instruction updates on database availability. An unsupported URL scheme
/// or an empty catalog likewise just omits the block.
pub async fn build_snapshot(config: &Config) -> Result<Snapshot> {
    let schema_dump = match &config.database {
        Some(db) => match schema::dump_schema(&db.url).await {
            Ok(Some(dump)) if !dump.trim().is_empty() => Some(dump),
            Ok(Some(_)) => {
                tracing::debug!("database has no user tables, omitting schema block");
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "schema fetch failed, proceeding without schema block");
                None
            }
        },
        None => None,
    };

    let file_blocks = aggregate::collect(&config.watch.targets).await?;

    Ok(Snapshot::new(
        config.preamble.clone(),
        schema_dump,
        file_blocks,
    ))
}

/// One full sync attempt: fresh snapshot, then remote push.
pub struct SyncCycle {
    config: Config,
    client: AssistantClient,
}

impl SyncCycle {
    pub fn new(config: Config, client: AssistantClient) -> Self {
        Self { config, client }
    }

    pub async fn push_once(&self) -> Result<()> {
        let snapshot = build_snapshot(&self.config).await?;
        let payload = snapshot.render();
        tracing::info!(
            files = snapshot.file_count(),
            bytes = payload.len(),
            schema = snapshot.schema_dump.is_some(),
            "updating assistant instructions"
        );
        self.client.update_instructions(&payload).await?;
        tracing::info!("assistant updated");
        Ok(())
    }
}

#[async_trait]
impl SyncAction for SyncCycle {
    async fn run_sync(&self) -> Result<()> {
        self.push_once().await
    }
}

/// The long-running watch pipeline. Returns only on SIGINT (immediately,
/// without draining an in-flight sync) or a broken event channel.
pub async fn run_watch(config: Config) -> Result<()> {
    let client = AssistantClient::new(&config.assistant, &config.network)?;
    let throttle = Duration::from_millis(config.watch.throttle_ms);
    let targets = config.watch.targets.clone();

    let coalescer = Coalescer::new(throttle, SyncCycle::new(config, client));

    let (tx, mut rx) = watcher::channel();
    let _watcher = watcher::spawn(&targets, tx)?;

    // The interval's immediate first tick doubles as the startup sync.
    let mut tick = tokio::time::interval(RESYNC_INTERVAL);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(event) => coalescer.trigger(Trigger::File(event)),
                    None => anyhow::bail!("watch event channel closed"),
                }
            }
            _ = tick.tick() => {
                coalescer.trigger(Trigger::Tick);
            }
            _ = &mut ctrl_c => {
                tracing::info!("interrupted, exiting");
                return Ok(());
            }
        }
    }
}
