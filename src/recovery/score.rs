use time::OffsetDateTime;

use crate::recovery::types::{AbandonedCart, CartChannel};

const BASE_SCORE: i64 = 50;

/// Heuristic 0-100 estimate of how likely a re-contact converts this cart.
///
/// Additive model: every factor adjusts the base independently, and the
/// sum is clamped at the end. The output is a ranking signal, not a
/// calibrated probability.
pub fn score_recovery(cart: &AbandonedCart, now: OffsetDateTime) -> u8 {
    let mut score = BASE_SCORE;

    // Cart value.
    if cart.cart_total > 200.0 {
        score += 20;
    } else if cart.cart_total > 100.0 {
        score += 10;
    } else if cart.cart_total < 50.0 {
        score -= 10;
    }

    // Freshness. A clock behind `abandoned_at` lands in the `< 1` arm,
    // which is the right answer for a just-abandoned cart.
    let hours = cart.hours_since_abandonment(now);
    if hours < 1.0 {
        score += 15;
    } else if hours < 6.0 {
        score += 10;
    } else if hours < 24.0 {
        score += 5;
    } else if hours > 72.0 {
        score -= 20;
    }

    // Item count.
    if cart.items.len() > 3 {
        score += 10;
    } else if cart.items.len() == 1 {
        score -= 5;
    }

    // Each prior attempt burns goodwill. Linear, uncapped below the clamp.
    score -= 5 * i64::from(cart.contact_attempts);

    if cart.cart_source == CartChannel::Mobile {
        score -= 5;
    }

    if let Some(reason) = &cart.abandonment_reason {
        let reason = reason.to_lowercase();
        if reason.contains("shipping") {
            score += 10;
        }
        if reason.contains("payment") {
            score -= 5;
        }
        if reason.contains("error") || reason.contains("technical") {
            score -= 10;
        }
    }

    score.clamp(0, 100) as u8
}
