use time::OffsetDateTime;

use crate::recovery::types::{AbandonedCart, Urgency};

/// Classifies how soon a cart should be re-contacted.
///
/// Total over every well-formed cart: first matching rule wins, and the
/// final arm catches everything else. High-value carts and very fresh
/// abandonments are worth chasing immediately; stale low-value carts can
/// wait for the slow lane.
pub fn classify_urgency(cart: &AbandonedCart, now: OffsetDateTime) -> Urgency {
    let hours = cart.hours_since_abandonment(now);

    if cart.cart_total > 200.0 || hours < 2.0 {
        Urgency::High
    } else if cart.cart_total > 50.0 || hours < 24.0 {
        Urgency::Medium
    } else {
        Urgency::Low
    }
}
