use time::OffsetDateTime;

use crate::recovery::{
    classify::classify_urgency,
    planner::{RecoveryPolicy, plan_next_action},
    score::score_recovery,
    types::{AbandonedCart, CartOutlook, CartStatus, FeedSummary},
};

/// Derives the externally visible label for one cart. This is the single
/// place that decides the status; it composes the classifier, scorer and
/// planner instead of restating their rules.
///
/// Resolution order: `Recovered` wins outright, then `Expired`, then
/// `Pending` when an action is currently due, else `Abandoned` (exists,
/// but mid-backoff or out of channels).
pub fn resolve_outlook(
    cart: &AbandonedCart,
    policy: &RecoveryPolicy,
    now: OffsetDateTime,
) -> CartOutlook {
    let urgency = classify_urgency(cart, now);
    let recovery_probability = score_recovery(cart, now);
    let next_action = plan_next_action(cart, policy, now);

    let status = if cart.recovered {
        CartStatus::Recovered
    } else if cart.hours_since_abandonment(now) > policy.expiry_hours {
        CartStatus::Expired
    } else if next_action.is_some() {
        CartStatus::Pending
    } else {
        CartStatus::Abandoned
    };

    CartOutlook {
        status,
        urgency,
        recovery_probability,
        next_action,
    }
}

/// Folds per-cart outlooks into the dashboard counters.
pub fn summarize<'a, I>(carts: I, policy: &RecoveryPolicy, now: OffsetDateTime) -> FeedSummary
where
    I: IntoIterator<Item = &'a AbandonedCart>,
{
    let mut summary = FeedSummary::default();

    for cart in carts {
        summary.total += 1;
        match resolve_outlook(cart, policy, now).status {
            CartStatus::Recovered => {
                summary.recovered += 1;
                summary.recovered_revenue += cart.recovery_revenue.unwrap_or(cart.cart_total);
            }
            CartStatus::Expired => summary.expired += 1,
            CartStatus::Pending => {
                summary.pending += 1;
                summary.at_stake_revenue += cart.cart_total;
            }
            CartStatus::Abandoned => {
                summary.abandoned += 1;
                summary.at_stake_revenue += cart.cart_total;
            }
        }
    }

    summary
}
