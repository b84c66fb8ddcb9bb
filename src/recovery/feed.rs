use std::{collections::HashMap, sync::Arc};

use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::recovery::{
    error::{RecoveryError, invalid_input, not_found},
    planner::RecoveryPolicy,
    ports::CartSourcePort,
    status::{resolve_outlook, summarize},
    types::{AbandonedCart, CartOutlook, FeedSummary, RefreshOutcome},
};

/// Owns the working set of cart records. All mutations go through this
/// type and are serialized behind one async mutex, so a refresh can never
/// silently drop an attempt or recovery recorded concurrently.
///
/// Every other component gets an owned snapshot; nothing reaches back into
/// this storage.
pub struct RecoveryFeed {
    source: Arc<dyn CartSourcePort>,
    policy: RecoveryPolicy,
    fetch_limit: usize,
    carts: Mutex<HashMap<String, AbandonedCart>>,
}

impl RecoveryFeed {
    pub fn new(source: Arc<dyn CartSourcePort>, policy: RecoveryPolicy, fetch_limit: usize) -> Self {
        Self {
            source,
            policy,
            fetch_limit,
            carts: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &RecoveryPolicy {
        &self.policy
    }

    /// Re-pulls carts from the source and merges them into the held set.
    ///
    /// The fetch happens outside the lock; only the merge holds it, so
    /// concurrent refreshes and mutations interleave safely. A failed
    /// fetch returns the error and leaves the previous set untouched.
    /// Malformed records are skipped and counted, never fatal to the batch.
    pub async fn refresh(&self) -> Result<RefreshOutcome, RecoveryError> {
        let raw_records = self.source.fetch_abandoned_carts(self.fetch_limit).await?;

        let mut incoming = Vec::with_capacity(raw_records.len());
        let mut skipped = 0usize;
        for record in raw_records {
            match record.into_cart() {
                Ok(cart) => incoming.push(cart),
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(
                        target: "recovery::feed",
                        error = %err,
                        "refresh_skipped_record"
                    );
                }
            }
        }

        let loaded = incoming.len();
        let mut carts = self.carts.lock().await;
        for cart in incoming {
            match carts.remove(&cart.id) {
                Some(existing) => {
                    let merged = merge_preserving_engagement(existing, cart);
                    carts.insert(merged.id.clone(), merged);
                }
                None => {
                    carts.insert(cart.id.clone(), cart);
                }
            }
        }
        let held = carts.len();
        drop(carts);

        tracing::info!(
            target: "recovery::feed",
            loaded,
            skipped,
            held,
            "refresh_complete"
        );
        Ok(RefreshOutcome {
            loaded,
            skipped,
            held,
        })
    }

    /// Records that a message was dispatched to the shopper: bumps the
    /// attempt counter and stamps `last_contacted`. Attempts count
    /// dispatch, not confirmed delivery.
    pub async fn record_contact_attempt(&self, cart_id: &str) -> Result<u32, RecoveryError> {
        let mut carts = self.carts.lock().await;
        let cart = carts
            .get_mut(cart_id)
            .ok_or_else(|| not_found(format!("cart '{cart_id}' is not in the feed")))?;
        if cart.recovered {
            return Err(invalid_input(format!(
                "cart '{cart_id}' is already recovered; no further contact"
            )));
        }

        cart.contact_attempts += 1;
        cart.last_contacted = Some(OffsetDateTime::now_utc());
        let attempts = cart.contact_attempts;
        drop(carts);

        tracing::info!(
            target: "recovery::feed",
            cart_id = %cart_id,
            attempts,
            "contact_attempt_recorded"
        );
        Ok(attempts)
    }

    /// Marks a cart as converted. Idempotent: a second call leaves the
    /// terminal state (including `recovered_at`) untouched and succeeds.
    /// Confirmation back to the source is best effort and never undoes
    /// the local mutation.
    pub async fn mark_recovered(
        &self,
        cart_id: &str,
        revenue: Option<f64>,
    ) -> Result<(), RecoveryError> {
        {
            let mut carts = self.carts.lock().await;
            let cart = carts
                .get_mut(cart_id)
                .ok_or_else(|| not_found(format!("cart '{cart_id}' is not in the feed")))?;
            if cart.recovered {
                return Ok(());
            }
            cart.recovered = true;
            cart.recovered_at = Some(OffsetDateTime::now_utc());
            cart.recovery_revenue = revenue.or(Some(cart.cart_total));
        }

        if let Err(err) = self.source.mark_cart_recovered(cart_id).await {
            tracing::warn!(
                target: "recovery::feed",
                cart_id = %cart_id,
                error = %err,
                "source_recovery_confirmation_failed"
            );
        }

        tracing::info!(
            target: "recovery::feed",
            cart_id = %cart_id,
            revenue = ?revenue,
            "cart_marked_recovered"
        );
        Ok(())
    }

    /// Cloned view of the held set, newest abandonment first.
    pub async fn snapshot(&self) -> Vec<AbandonedCart> {
        let carts = self.carts.lock().await;
        let mut snapshot: Vec<AbandonedCart> = carts.values().cloned().collect();
        snapshot.sort_by(|a, b| b.abandoned_at.cmp(&a.abandoned_at));
        snapshot
    }

    pub async fn outlook(&self, cart_id: &str) -> Result<CartOutlook, RecoveryError> {
        let carts = self.carts.lock().await;
        let cart = carts
            .get(cart_id)
            .ok_or_else(|| not_found(format!("cart '{cart_id}' is not in the feed")))?;
        Ok(resolve_outlook(cart, &self.policy, OffsetDateTime::now_utc()))
    }

    pub async fn summary(&self) -> FeedSummary {
        let carts = self.carts.lock().await;
        summarize(carts.values(), &self.policy, OffsetDateTime::now_utc())
    }
}

/// The source owns the commerce facts; the feed owns the engagement
/// history. A re-pull refreshes the former and must never roll back the
/// latter.
fn merge_preserving_engagement(existing: AbandonedCart, incoming: AbandonedCart) -> AbandonedCart {
    AbandonedCart {
        // abandoned_at is immutable for the record's lifetime; keep the
        // instant we first saw.
        abandoned_at: existing.abandoned_at,
        last_contacted: match (existing.last_contacted, incoming.last_contacted) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        },
        contact_attempts: existing.contact_attempts.max(incoming.contact_attempts),
        recovered: existing.recovered || incoming.recovered,
        recovered_at: existing.recovered_at.or(incoming.recovered_at),
        recovery_revenue: existing.recovery_revenue.or(incoming.recovery_revenue),
        ..incoming
    }
}
