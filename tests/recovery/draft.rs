use recart::recovery::{CartChannel, ContactChannel, DraftStrategy, draft_all, draft_message};

use crate::support::{cart_abandoned_hours_ago, fixed_now};

#[test]
fn given_no_strategy_when_drafted_then_personal_is_used() {
    let now = fixed_now();
    let cart = cart_abandoned_hours_ago(now, 12.0);

    let draft = draft_message(&cart, ContactChannel::Email, None, now);
    assert_eq!(draft.strategy, DraftStrategy::Personal);
}

#[test]
fn given_plain_cart_when_drafted_then_base_confidence_applies() {
    let now = fixed_now();
    let cart = cart_abandoned_hours_ago(now, 12.0);

    let draft = draft_message(&cart, ContactChannel::Email, Some(DraftStrategy::Urgent), now);
    assert!((draft.confidence - 0.92).abs() < 1e-9);
}

#[test]
fn given_every_bonus_when_drafted_then_confidence_caps_at_098() {
    let now = fixed_now();
    let mut cart = cart_abandoned_hours_ago(now, 12.0);
    cart.cart_total = 300.0;
    cart.cart_source = CartChannel::Mobile;
    cart.abandonment_reason = Some("shipping cost".to_string());

    // 0.92 + 0.05 + 0.03 + 0.02 overflows the cap.
    let draft = draft_message(&cart, ContactChannel::Email, Some(DraftStrategy::Urgent), now);
    assert!((draft.confidence - 0.98).abs() < 1e-9);
}

#[test]
fn given_email_channel_when_drafted_then_copy_is_multi_line_with_sign_off() {
    let now = fixed_now();
    let cart = cart_abandoned_hours_ago(now, 12.0);

    let draft = draft_message(&cart, ContactChannel::Email, None, now);
    assert!(draft.message.contains('\n'));
    assert!(draft.message.contains("Ada"));
    assert!(draft.message.contains("The team"));
}

#[test]
fn given_whatsapp_channel_when_drafted_then_copy_is_short_and_has_emoji() {
    let now = fixed_now();
    let cart = cart_abandoned_hours_ago(now, 12.0);

    let draft = draft_message(&cart, ContactChannel::Whatsapp, None, now);
    assert!(!draft.message.contains('\n'));
    assert!(draft.message.chars().any(|c| !c.is_ascii()));
    assert!(draft.message.contains("Ada"));
}

#[test]
fn given_sms_channel_when_drafted_then_copy_is_short_plain_text() {
    let now = fixed_now();
    let cart = cart_abandoned_hours_ago(now, 12.0);

    let draft = draft_message(&cart, ContactChannel::Sms, None, now);
    assert!(!draft.message.contains('\n'));
    assert!(draft.message.is_ascii());
}

#[test]
fn given_offer_strategy_when_drafted_then_suggested_offer_is_present() {
    let now = fixed_now();
    let cart = cart_abandoned_hours_ago(now, 12.0);

    let draft = draft_message(&cart, ContactChannel::Email, Some(DraftStrategy::Offer), now);
    assert!(draft.suggested_offer.is_some());

    let mut shipping = cart.clone();
    shipping.abandonment_reason = Some("Shipping cost too high".to_string());
    let draft = draft_message(&shipping, ContactChannel::Email, Some(DraftStrategy::Offer), now);
    assert_eq!(
        draft.suggested_offer.as_deref(),
        Some("free shipping on this order")
    );
}

#[test]
fn given_bulk_draft_when_requested_then_all_strategies_come_back_ranked() {
    let now = fixed_now();
    let cart = cart_abandoned_hours_ago(now, 12.0);

    let drafts = draft_all(&cart, ContactChannel::Email, now);
    assert_eq!(drafts.len(), 4);
    for pair in drafts.windows(2) {
        assert!(pair[0].confidence >= pair[1].confidence);
    }
    // With no bonuses the base order holds.
    assert_eq!(drafts[0].strategy, DraftStrategy::Urgent);
    assert_eq!(drafts[3].strategy, DraftStrategy::Offer);
}
