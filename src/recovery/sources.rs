use std::{
    path::PathBuf,
    sync::Mutex,
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::recovery::{
    error::{RecoveryError, invalid_input, refresh_failure},
    ports::CartSourcePort,
    types::{AbandonedCart, CartChannel, CartItem},
};

/// The loosely typed shape the external platform hands back. Everything is
/// optional here; `into_cart` decides what is actually required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCartRecord {
    #[serde(alias = "cartId")]
    pub id: Option<String>,
    #[serde(alias = "customerName")]
    pub customer_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub items: Vec<RawCartItem>,
    #[serde(alias = "cartTotal", alias = "totalPrice")]
    pub cart_total: Option<f64>,
    pub currency: Option<String>,
    #[serde(alias = "cartSource")]
    pub cart_source: Option<CartChannel>,
    #[serde(alias = "abandonmentReason")]
    pub abandonment_reason: Option<String>,
    /// RFC 3339 instant the checkout was abandoned.
    #[serde(alias = "abandonedAt", alias = "createdAt")]
    pub abandoned_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCartItem {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<u32>,
    pub image: Option<String>,
    pub variant: Option<String>,
}

impl RawCartRecord {
    /// Maps the raw record into the engine's cart shape, rejecting records
    /// the engine cannot act on. Rejections are skipped (and counted)
    /// during a refresh; they never fail the batch.
    pub fn into_cart(self) -> Result<AbandonedCart, RecoveryError> {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| invalid_input("cart record is missing an id"))?;
        let customer_name = self
            .customer_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| invalid_input(format!("cart '{id}' is missing a customer name")))?;

        let email = self.email.filter(|e| !e.trim().is_empty());
        let phone = self.phone.filter(|p| !p.trim().is_empty());
        if email.is_none() && phone.is_none() {
            return Err(invalid_input(format!(
                "cart '{id}' has no email and no phone, nothing to contact"
            )));
        }

        let cart_total = self
            .cart_total
            .ok_or_else(|| invalid_input(format!("cart '{id}' is missing a total")))?;
        if !cart_total.is_finite() || cart_total < 0.0 {
            return Err(invalid_input(format!(
                "cart '{id}' has an unusable total {cart_total}"
            )));
        }

        let abandoned_at_raw = self
            .abandoned_at
            .ok_or_else(|| invalid_input(format!("cart '{id}' is missing abandoned_at")))?;
        let abandoned_at =
            OffsetDateTime::parse(&abandoned_at_raw, &Rfc3339).map_err(|err| {
                invalid_input(format!(
                    "cart '{id}' has unparseable abandoned_at '{abandoned_at_raw}': {err}"
                ))
            })?;

        let items = self
            .items
            .into_iter()
            .map(|item| CartItem {
                name: item.name.unwrap_or_else(|| "item".to_string()),
                price: item.price.unwrap_or(0.0),
                quantity: item.quantity.unwrap_or(1),
                image: item.image,
                variant: item.variant,
            })
            .collect();

        Ok(AbandonedCart {
            id,
            customer_name,
            email,
            phone,
            items,
            cart_total,
            currency: self.currency.unwrap_or_else(|| "USD".to_string()),
            cart_source: self.cart_source.unwrap_or_default(),
            abandonment_reason: self.abandonment_reason,
            abandoned_at,
            last_contacted: None,
            contact_attempts: 0,
            recovered: false,
            recovered_at: None,
            recovery_revenue: None,
        })
    }
}

/// Pushable cart source for tests and local runs. Batches are replayed on
/// every fetch; `fail_next_fetch` injects one refresh failure.
#[derive(Debug, Default)]
pub struct InMemoryCartSource {
    records: Mutex<Vec<RawCartRecord>>,
    fail_next_fetch: AtomicBool,
    recovered_ids: Mutex<Vec<String>>,
}

impl InMemoryCartSource {
    pub fn new(records: Vec<RawCartRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn push(&self, record: RawCartRecord) {
        lock_ignoring_poison(&self.records).push(record);
    }

    pub fn replace_all(&self, records: Vec<RawCartRecord>) {
        *lock_ignoring_poison(&self.records) = records;
    }

    pub fn fail_next_fetch(&self) {
        self.fail_next_fetch.store(true, Ordering::SeqCst);
    }

    /// Ids the feed confirmed back as recovered, in call order.
    pub fn recovered_ids(&self) -> Vec<String> {
        lock_ignoring_poison(&self.recovered_ids).clone()
    }
}

#[async_trait]
impl CartSourcePort for InMemoryCartSource {
    async fn fetch_abandoned_carts(
        &self,
        limit: usize,
    ) -> Result<Vec<RawCartRecord>, RecoveryError> {
        if self.fail_next_fetch.swap(false, Ordering::SeqCst) {
            return Err(refresh_failure("cart source unavailable (injected)"));
        }
        let mut records = lock_ignoring_poison(&self.records).clone();
        records.truncate(limit);
        Ok(records)
    }

    async fn mark_cart_recovered(&self, cart_id: &str) -> Result<bool, RecoveryError> {
        lock_ignoring_poison(&self.recovered_ids).push(cart_id.to_string());
        Ok(true)
    }
}

/// Reads raw cart records from a JSON5 fixture file. Seed data for the
/// binary; a real platform client implements the same port.
#[derive(Debug, Clone)]
pub struct FixtureCartSource {
    path: PathBuf,
}

impl FixtureCartSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl CartSourcePort for FixtureCartSource {
    async fn fetch_abandoned_carts(
        &self,
        limit: usize,
    ) -> Result<Vec<RawCartRecord>, RecoveryError> {
        let content = std::fs::read_to_string(&self.path).map_err(|err| {
            refresh_failure(format!(
                "failed to read cart fixture '{}': {err}",
                self.path.display()
            ))
        })?;
        let mut records: Vec<RawCartRecord> = json5::from_str(&content).map_err(|err| {
            refresh_failure(format!(
                "failed to parse cart fixture '{}': {err}",
                self.path.display()
            ))
        })?;
        records.truncate(limit);
        Ok(records)
    }

    async fn mark_cart_recovered(&self, cart_id: &str) -> Result<bool, RecoveryError> {
        tracing::info!(
            target: "recovery::source",
            cart_id = %cart_id,
            "fixture_source_mark_recovered"
        );
        Ok(true)
    }
}

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
