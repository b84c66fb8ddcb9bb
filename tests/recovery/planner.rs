use recart::recovery::{ContactChannel, RecoveryPolicy, plan_next_action};
use time::Duration;

use crate::support::{cart_abandoned_hours_ago, fixed_now};

#[test]
fn given_attempt_cap_reached_when_planned_then_no_action_regardless_of_urgency() {
    let now = fixed_now();
    let mut cart = cart_abandoned_hours_ago(now, 0.5);
    cart.cart_total = 500.0;
    cart.phone = Some("+15550100".to_string());
    cart.contact_attempts = 3;

    assert_eq!(plan_next_action(&cart, &RecoveryPolicy::default(), now), None);
}

#[test]
fn given_cart_older_than_expiry_window_when_planned_then_no_action() {
    let now = fixed_now();
    let mut cart = cart_abandoned_hours_ago(now, 240.0);
    cart.cart_total = 500.0;

    assert_eq!(plan_next_action(&cart, &RecoveryPolicy::default(), now), None);
}

#[test]
fn given_recovered_cart_when_planned_then_no_action() {
    let now = fixed_now();
    let mut cart = cart_abandoned_hours_ago(now, 1.0);
    cart.recovered = true;

    assert_eq!(plan_next_action(&cart, &RecoveryPolicy::default(), now), None);
}

#[test]
fn given_no_email_and_no_phone_when_planned_then_no_action_regardless_of_timing() {
    let now = fixed_now();
    let mut cart = cart_abandoned_hours_ago(now, 1.0);
    cart.email = None;
    cart.phone = None;

    assert_eq!(plan_next_action(&cart, &RecoveryPolicy::default(), now), None);
}

#[test]
fn given_phone_and_first_attempt_when_planned_then_whatsapp_is_preferred() {
    let now = fixed_now();
    let mut cart = cart_abandoned_hours_ago(now, 1.0);
    cart.phone = Some("+15550100".to_string());

    let action =
        plan_next_action(&cart, &RecoveryPolicy::default(), now).expect("action should be planned");
    assert_eq!(action.channel, ContactChannel::Whatsapp);
}

#[test]
fn given_phone_but_prior_attempt_when_planned_then_email_takes_over() {
    let now = fixed_now();
    let mut cart = cart_abandoned_hours_ago(now, 30.0);
    cart.cart_total = 250.0;
    cart.phone = Some("+15550100".to_string());
    cart.contact_attempts = 1;
    cart.last_contacted = Some(now - Duration::hours(8));

    let action =
        plan_next_action(&cart, &RecoveryPolicy::default(), now).expect("action should be planned");
    assert_eq!(action.channel, ContactChannel::Email);
}

#[test]
fn given_follow_up_inside_backoff_window_when_planned_then_action_is_suppressed() {
    let now = fixed_now();
    // High urgency follow-up needs 6 hours since the last contact.
    let mut cart = cart_abandoned_hours_ago(now, 4.0);
    cart.cart_total = 250.0;
    cart.contact_attempts = 1;
    cart.last_contacted = Some(now - Duration::hours(2));

    assert_eq!(plan_next_action(&cart, &RecoveryPolicy::default(), now), None);
}

#[test]
fn given_high_value_half_hour_old_cart_when_planned_then_whatsapp_in_about_an_hour() {
    let now = fixed_now();
    let mut cart = cart_abandoned_hours_ago(now, 0.5);
    cart.cart_total = 250.0;
    cart.phone = Some("+15550100".to_string());

    let action =
        plan_next_action(&cart, &RecoveryPolicy::default(), now).expect("action should be planned");
    assert_eq!(action.channel, ContactChannel::Whatsapp);
    assert_eq!(action.scheduled_at, now + Duration::hours(1));
    assert!(!action.draft_message.is_empty());
}

#[test]
fn given_stale_cheap_cart_past_low_backoff_when_planned_then_email_follow_up_is_due() {
    let now = fixed_now();
    let mut cart = cart_abandoned_hours_ago(now, 120.0);
    cart.cart_total = 30.0;
    cart.contact_attempts = 2;
    cart.last_contacted = Some(now - Duration::hours(50));

    // Low urgency follow-up requires 48 hours; 50 have elapsed.
    let action =
        plan_next_action(&cart, &RecoveryPolicy::default(), now).expect("action should be planned");
    assert_eq!(action.channel, ContactChannel::Email);
    assert_eq!(action.scheduled_at, now + Duration::hours(48));
}

#[test]
fn given_tighter_policy_when_planned_then_custom_cap_is_honored() {
    let now = fixed_now();
    let mut cart = cart_abandoned_hours_ago(now, 1.0);
    cart.contact_attempts = 1;
    cart.last_contacted = Some(now - Duration::hours(12));

    let policy = RecoveryPolicy {
        attempt_cap: 1,
        ..RecoveryPolicy::default()
    };
    assert_eq!(plan_next_action(&cart, &policy, now), None);
}
