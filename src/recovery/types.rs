use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A single line item frozen into a cart snapshot. Never mutated after the
/// snapshot is taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub variant: Option<String>,
}

/// Where the shopper abandoned the checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartChannel {
    Web,
    Mobile,
    App,
}

impl Default for CartChannel {
    fn default() -> Self {
        Self::Web
    }
}

/// The central record of the engine. `abandoned_at` is immutable for the
/// lifetime of the record; `contact_attempts` only ever increases; once
/// `recovered` is set the record is terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbandonedCart {
    pub id: String,
    pub customer_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub items: Vec<CartItem>,
    pub cart_total: f64,
    pub currency: String,
    #[serde(default)]
    pub cart_source: CartChannel,
    #[serde(default)]
    pub abandonment_reason: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub abandoned_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_contacted: Option<OffsetDateTime>,
    #[serde(default)]
    pub contact_attempts: u32,
    #[serde(default)]
    pub recovered: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub recovered_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub recovery_revenue: Option<f64>,
}

impl AbandonedCart {
    /// Hours elapsed since abandonment. Negative when the caller's clock
    /// sits behind `abandoned_at`; callers treat that as "just abandoned".
    pub fn hours_since_abandonment(&self, now: OffsetDateTime) -> f64 {
        (now - self.abandoned_at).as_seconds_f64() / 3600.0
    }

    /// Hours since the last contact attempt, or `f64::INFINITY` when the
    /// shopper has never been contacted.
    pub fn hours_since_last_contact(&self, now: OffsetDateTime) -> f64 {
        match self.last_contacted {
            Some(last) => (now - last).as_seconds_f64() / 3600.0,
            None => f64::INFINITY,
        }
    }
}

/// How soon a cart should be re-contacted. Ordered so tiers compare:
/// `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

/// Outbound contact channels the planner can pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactChannel {
    Email,
    Whatsapp,
    Sms,
}

/// A scheduled re-contact decision. Nothing is sent until a dispatcher
/// acts on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedAction {
    pub channel: ContactChannel,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_at: OffsetDateTime,
    pub draft_message: String,
}

/// Externally visible lifecycle label, derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    Recovered,
    Expired,
    Pending,
    Abandoned,
}

/// Everything a caller needs to render or act on one cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartOutlook {
    pub status: CartStatus,
    pub urgency: Urgency,
    pub recovery_probability: u8,
    pub next_action: Option<PlannedAction>,
}

/// Aggregate counts over the held set, for the dashboard row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedSummary {
    pub total: usize,
    pub pending: usize,
    pub abandoned: usize,
    pub recovered: usize,
    pub expired: usize,
    pub recovered_revenue: f64,
    pub at_stake_revenue: f64,
}

/// What a single refresh did to the held set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshOutcome {
    /// Records accepted from the source in this pull.
    pub loaded: usize,
    /// Malformed records skipped in this pull.
    pub skipped: usize,
    /// Carts held after the merge.
    pub held: usize,
}
