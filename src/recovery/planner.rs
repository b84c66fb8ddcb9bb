use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::recovery::{
    classify::classify_urgency,
    draft::{default_strategy_for, draft_message},
    types::{AbandonedCart, ContactChannel, PlannedAction, Urgency},
};

fn default_attempt_cap() -> u32 {
    3
}

fn default_expiry_hours() -> f64 {
    168.0
}

/// The configured knobs of the scheduling rules. Everything else in the
/// planner is fixed behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecoveryPolicy {
    /// Contact attempts after which a cart is never scheduled again.
    #[serde(default = "default_attempt_cap")]
    pub attempt_cap: u32,
    /// Age past which a cart counts as expired, in hours.
    #[serde(default = "default_expiry_hours")]
    pub expiry_hours: f64,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            attempt_cap: default_attempt_cap(),
            expiry_hours: default_expiry_hours(),
        }
    }
}

/// Minimum wait before the next contact, keyed by urgency and whether the
/// shopper has been contacted before.
fn backoff_hours(urgency: Urgency, first_contact: bool) -> f64 {
    match (urgency, first_contact) {
        (Urgency::High, true) => 1.0,
        (Urgency::High, false) => 6.0,
        (Urgency::Medium, true) => 6.0,
        (Urgency::Medium, false) => 24.0,
        (Urgency::Low, true) => 24.0,
        (Urgency::Low, false) => 48.0,
    }
}

/// Decides whether, when, and over which channel to re-contact a shopper.
///
/// Returns `None` for terminal carts (recovered, expired, attempt cap
/// reached), for carts with no reachable channel, and for follow-ups still
/// inside their backoff window. The returned action carries a draft
/// message in the urgency-keyed default tone.
pub fn plan_next_action(
    cart: &AbandonedCart,
    policy: &RecoveryPolicy,
    now: OffsetDateTime,
) -> Option<PlannedAction> {
    if cart.recovered {
        return None;
    }
    if cart.contact_attempts >= policy.attempt_cap {
        return None;
    }
    if cart.hours_since_abandonment(now) > policy.expiry_hours {
        return None;
    }

    let channel = select_channel(cart)?;

    let urgency = classify_urgency(cart, now);
    let first_contact = cart.contact_attempts == 0;
    let delay_hours = backoff_hours(urgency, first_contact);

    // Follow-ups are due, not fired immediately: the backoff interval must
    // have elapsed since the last contact. First contacts are never
    // contacted yet, so hours_since_last_contact is infinite there.
    if cart.hours_since_last_contact(now) < delay_hours {
        return None;
    }

    let draft = draft_message(cart, channel, Some(default_strategy_for(urgency)), now);

    Some(PlannedAction {
        channel,
        scheduled_at: now + Duration::seconds_f64(delay_hours * 3600.0),
        draft_message: draft.message,
    })
}

/// WhatsApp converts best on the very first touch when we have a phone
/// number; everything after that falls back to email.
fn select_channel(cart: &AbandonedCart) -> Option<ContactChannel> {
    let has_phone = cart.phone.as_deref().is_some_and(|p| !p.trim().is_empty());
    let has_email = cart.email.as_deref().is_some_and(|e| !e.trim().is_empty());

    if has_phone && cart.contact_attempts == 0 {
        Some(ContactChannel::Whatsapp)
    } else if has_email {
        Some(ContactChannel::Email)
    } else {
        None
    }
}
