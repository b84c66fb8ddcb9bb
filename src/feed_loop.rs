use std::{sync::Arc, time::Duration};

use anyhow::Result;
use time::OffsetDateTime;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    recovery::{Dispatcher, RecoveryFeed},
};

/// Periodic driver for the feed: refreshes on the configured interval,
/// logs the dashboard summary, and (when enabled) dispatches due actions.
///
/// A failed refresh keeps the previous in-memory set visible; the loop
/// logs the error and waits for the next tick. Cancelling the token tears
/// the loop down without leaking the timer.
pub async fn run(
    config: &Config,
    feed: Arc<RecoveryFeed>,
    dispatcher: Option<Arc<Dispatcher>>,
    shutdown: CancellationToken,
) -> Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_secs(
        config.feed.refresh_interval_minutes.max(1) * 60,
    ));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!(target: "feed_loop", "feed_loop_shutdown");
                return Ok(());
            }
            _ = ticker.tick() => {
                tick(&feed, dispatcher.as_deref()).await;
            }
        }
    }
}

async fn tick(feed: &RecoveryFeed, dispatcher: Option<&Dispatcher>) {
    match feed.refresh().await {
        Ok(outcome) => {
            if outcome.skipped > 0 {
                tracing::warn!(
                    target: "feed_loop",
                    skipped = outcome.skipped,
                    "refresh_skipped_malformed_records"
                );
            }
        }
        Err(err) => {
            // Stale data stays visible; the held set is untouched.
            tracing::error!(target: "feed_loop", error = %err, "refresh_failed");
        }
    }

    let summary = feed.summary().await;
    tracing::info!(
        target: "feed_loop",
        total = summary.total,
        pending = summary.pending,
        abandoned = summary.abandoned,
        recovered = summary.recovered,
        expired = summary.expired,
        at_stake_revenue = summary.at_stake_revenue,
        recovered_revenue = summary.recovered_revenue,
        "feed_summary"
    );

    if let Some(dispatcher) = dispatcher {
        let report = dispatcher.dispatch_due(OffsetDateTime::now_utc()).await;
        tracing::info!(
            target: "feed_loop",
            sent = report.sent,
            failed = report.failed,
            skipped = report.skipped,
            "dispatch_pass_complete"
        );
    }
}
