//! Poll loop orchestration
//!
//! One logical thread drives the whole cycle: fetch head, compute the
//! confirmed target, walk the new range in bounded windows, decode,
//! correlate, resolve, notify, and advance the cursor after each window.
//! Chain errors pause until the next scheduled tick (the durable cursor
//! makes the retry idempotent); a cursor save failure is fatal.

mod correlator;
mod cursor;

pub use correlator::{
    notification_key, Correlator, EventGroup, NotificationKey, DEFAULT_INDEX_CAPACITY,
};
pub use cursor::{CursorError, CursorStore, DEFAULT_CURSOR_PATH};

use crate::chain::{decode_log, ChainError, ChainReader, RegistryEvent};
use crate::metadata::MetadataResolver;
use crate::notify::{render, Alert, AlertKind, MessageTemplates, TelegramNotifier};
use alloy::rpc::types::Log;
use tokio::time::{interval, Duration};
use tokio_util::sync::CancellationToken;

/// Watcher loop configuration
#[derive(Debug, Clone)]
pub struct WatcherLoopConfig {
    pub confirmations: u64,
    pub poll_interval_secs: u64,
    pub batch_size: u64,
    /// Watch from this block, ignoring any stored cursor
    pub start_block: Option<u64>,
}

impl Default for WatcherLoopConfig {
    fn default() -> Self {
        Self {
            confirmations: 3,
            poll_interval_secs: 15,
            batch_size: 200,
            start_block: None,
        }
    }
}

/// Result of a single poll cycle
#[derive(Debug, Clone, Default)]
pub struct PollReport {
    /// Events decoded from the fetched range
    pub decoded: usize,
    /// Notifications delivered
    pub notified: usize,
    /// Notifications the channel rejected (dropped, not retried)
    pub dropped: usize,
    /// Cursor position after the cycle
    pub last_block: Option<u64>,
}

/// Errors that can end a poll cycle
#[derive(Debug)]
pub enum CycleError {
    /// Chain RPC failure; the next scheduled cycle is the retry
    Chain(ChainError),
    /// Cursor persistence failure; fatal, progress without durability
    /// risks unbounded reprocessing
    Cursor(CursorError),
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleError::Chain(e) => write!(f, "Chain error: {}", e),
            CycleError::Cursor(e) => write!(f, "Cursor error: {}", e),
        }
    }
}

impl std::error::Error for CycleError {}

/// Compute the next fetch range given the cursor, the head and the
/// confirmation margin. Returns `None` when no new block is confirmed yet.
pub fn confirmed_range(last_processed: u64, head: u64, confirmations: u64) -> Option<(u64, u64)> {
    let target = head.saturating_sub(confirmations);
    if target <= last_processed {
        return None;
    }
    Some((last_processed + 1, target))
}

/// Decode a batch of fetched logs in order, skipping unrecognized entries
/// silently and malformed ones with a warning. A single bad entry never
/// aborts the batch.
pub fn decode_batch(logs: &[Log]) -> Vec<RegistryEvent> {
    let mut events = Vec::new();

    for log in logs {
        let tx_hash = log.transaction_hash.unwrap_or_default();
        let block_number = log.block_number.unwrap_or_default();
        let log_index = log.log_index.unwrap_or_default();

        match decode_log(&log.inner, tx_hash, block_number, log_index) {
            Ok(Some(event)) => {
                tracing::info!(
                    kind = event.kind(),
                    block = block_number,
                    tx = %tx_hash,
                    "Registry event"
                );
                events.push(event);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(block = block_number, tx = %tx_hash, error = %e, "Skipping malformed event");
            }
        }
    }

    events
}

/// Registry watcher: owns the reader, correlator, resolver, cursor store
/// and notifier, and drives them on a fixed interval.
pub struct Watcher {
    reader: ChainReader,
    resolver: MetadataResolver,
    notifier: TelegramNotifier,
    templates: MessageTemplates,
    correlator: Correlator,
    cursor_store: CursorStore,
    config: WatcherLoopConfig,
    last_processed: Option<u64>,
    cancel_token: CancellationToken,
}

impl Watcher {
    /// Create a watcher. The stored cursor is loaded here; a configured
    /// start block takes precedence over it.
    pub fn new(
        reader: ChainReader,
        resolver: MetadataResolver,
        notifier: TelegramNotifier,
        templates: MessageTemplates,
        cursor_store: CursorStore,
        config: WatcherLoopConfig,
    ) -> Self {
        let last_processed = match config.start_block {
            Some(start) => {
                tracing::info!(start_block = start, "Start block override set, ignoring stored cursor");
                Some(start.saturating_sub(1))
            }
            None => cursor_store.load(),
        };

        match last_processed {
            Some(block) => tracing::info!(last_block = block, "Resuming after block"),
            None => tracing::info!("No stored cursor, starting from the current head"),
        }

        Self {
            reader,
            resolver,
            notifier,
            templates,
            correlator: Correlator::new(),
            cursor_store,
            config,
            last_processed,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Get cancellation token for graceful shutdown
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Run the polling loop until cancelled. An in-progress cycle always
    /// completes (and persists its cursor) before shutdown.
    pub async fn run(mut self) -> Result<(), CycleError> {
        tracing::info!(
            registry = %self.reader.registry_address(),
            interval_secs = self.config.poll_interval_secs,
            confirmations = self.config.confirmations,
            "Starting registry watcher"
        );

        let mut poll_interval = interval(Duration::from_secs(self.config.poll_interval_secs));

        loop {
            tokio::select! {
                _ = poll_interval.tick() => {
                    match self.poll_once().await {
                        Ok(report) if report.decoded > 0 => {
                            tracing::info!(
                                decoded = report.decoded,
                                notified = report.notified,
                                dropped = report.dropped,
                                last_block = report.last_block,
                                "Cycle complete"
                            );
                        }
                        Ok(report) => {
                            tracing::debug!(last_block = report.last_block, "No new events");
                        }
                        Err(CycleError::Chain(e)) => {
                            tracing::warn!(error = %e, "Poll failed, retrying next cycle");
                        }
                        Err(e @ CycleError::Cursor(_)) => {
                            tracing::error!(error = %e, "Cannot persist cursor, shutting down");
                            return Err(e);
                        }
                    }
                }
                _ = self.cancel_token.cancelled() => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
            }
        }

        tracing::info!(last_block = self.last_processed, "Watcher stopped");
        Ok(())
    }

    /// Perform one poll cycle: fetch the confirmed range in bounded
    /// windows, process each window and advance the cursor behind it.
    pub async fn poll_once(&mut self) -> Result<PollReport, CycleError> {
        let head = self.reader.head_block().await.map_err(CycleError::Chain)?;

        let last = match self.last_processed {
            Some(block) => block,
            None => {
                // First run: prime the cursor just below the confirmed head
                // so watching begins with the next confirmed block.
                let primed = head.saturating_sub(self.config.confirmations);
                self.cursor_store.save(primed).map_err(CycleError::Cursor)?;
                self.last_processed = Some(primed);
                tracing::info!(last_block = primed, "Cursor primed at the confirmed head");
                primed
            }
        };

        let mut report = PollReport {
            last_block: Some(last),
            ..Default::default()
        };

        let (from, to) = match confirmed_range(last, head, self.config.confirmations) {
            Some(range) => range,
            None => return Ok(report),
        };

        tracing::debug!(from, to, head, "Polling confirmed range");

        // The cursor advances window by window, so a crash mid-catch-up
        // resumes from the last completed window rather than `from`.
        for (window_from, window_to) in crate::chain::split_ranges(from, to, self.config.batch_size)
        {
            let logs = self
                .reader
                .fetch_logs(window_from, window_to)
                .await
                .map_err(CycleError::Chain)?;

            let events = decode_batch(&logs);
            report.decoded += events.len();

            let (notified, dropped) = self.process_events(events).await;
            report.notified += notified;
            report.dropped += dropped;

            self.cursor_store
                .save(window_to)
                .map_err(CycleError::Cursor)?;
            self.last_processed = Some(window_to);
            report.last_block = Some(window_to);
        }

        Ok(report)
    }

    /// Correlate one window's events into logical occurrences, resolve
    /// their metadata and deliver one notification per unseen occurrence.
    async fn process_events(&mut self, events: Vec<RegistryEvent>) -> (usize, usize) {
        // Associations are recorded first so a dispute in the same window
        // as its originating request still correlates.
        self.correlator.record_associations(&events);

        let mut notified = 0;
        let mut dropped = 0;

        for group in Correlator::group(events) {
            if self.correlator.is_seen(&group.key) {
                tracing::debug!(key = ?group.key, "Already notified, skipping");
                continue;
            }

            let (kind, market) = match &group.representative {
                RegistryEvent::NewItem(e) => (
                    AlertKind::Submission,
                    self.resolver.resolve_submission(e.item_id, &e.data).await,
                ),
                RegistryEvent::RequestSubmitted(e) => (
                    AlertKind::Submission,
                    self.resolver.resolve_item(Some(e.item_id)).await,
                ),
                RegistryEvent::Dispute(e) => {
                    let item_id = self.correlator.item_for_dispute(e);
                    if item_id.is_none() {
                        tracing::warn!(
                            dispute = %e.dispute_id,
                            "Dispute origin not found, sending degraded notification"
                        );
                    }
                    (AlertKind::Dispute, self.resolver.resolve_item(item_id).await)
                }
            };

            let alert = Alert {
                kind,
                market,
                tx_hash: group.representative.tx_hash(),
                block_number: group.representative.block_number(),
            };

            // A delivery failure does not roll back the seen mark: the
            // occurrence is dropped rather than retried.
            self.correlator.mark_seen(group.key);

            let message = render(&alert, &self.templates);
            match self.notifier.send(&message).await {
                Ok(()) => {
                    tracing::info!(tx = %alert.tx_hash, block = alert.block_number, "Notification sent");
                    notified += 1;
                }
                Err(e) => {
                    tracing::error!(tx = %alert.tx_hash, error = %e, "Notification dropped");
                    dropped += 1;
                }
            }
        }

        (notified, dropped)
    }
}
