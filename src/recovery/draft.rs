use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::recovery::{
    classify::classify_urgency,
    types::{AbandonedCart, CartChannel, ContactChannel, Urgency},
};

const CONFIDENCE_CAP: f64 = 0.98;
const HIGH_VALUE_THRESHOLD: f64 = 200.0;

/// Tone the generated copy takes. `Personal` is the default when an
/// operator does not pick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStrategy {
    Urgent,
    Personal,
    Offer,
    Assistance,
}

impl DraftStrategy {
    pub const ALL: [DraftStrategy; 4] = [
        DraftStrategy::Urgent,
        DraftStrategy::Personal,
        DraftStrategy::Offer,
        DraftStrategy::Assistance,
    ];

    fn base_confidence(self) -> f64 {
        match self {
            DraftStrategy::Urgent => 0.92,
            DraftStrategy::Personal => 0.85,
            DraftStrategy::Offer => 0.79,
            DraftStrategy::Assistance => 0.83,
        }
    }

    fn reasoning(self) -> &'static str {
        match self {
            DraftStrategy::Urgent => "Scarcity framing converts best while the cart is still warm.",
            DraftStrategy::Personal => "A low-pressure personal nudge works across most segments.",
            DraftStrategy::Offer => "A concrete incentive moves price-sensitive shoppers.",
            DraftStrategy::Assistance => {
                "Leading with help recovers shoppers who hit friction at checkout."
            }
        }
    }
}

impl Default for DraftStrategy {
    fn default() -> Self {
        Self::Personal
    }
}

/// One generated message plus the metadata an operator ranks it by.
/// Drafting is pure text generation; nothing here sends anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDraft {
    pub message: String,
    pub strategy: DraftStrategy,
    pub confidence: f64,
    pub reasoning: String,
    pub suggested_offer: Option<String>,
    pub timing: String,
}

/// Strategy the planner falls back to when none is requested.
pub fn default_strategy_for(urgency: Urgency) -> DraftStrategy {
    match urgency {
        Urgency::High => DraftStrategy::Urgent,
        Urgency::Medium | Urgency::Low => DraftStrategy::Personal,
    }
}

/// Produces channel-appropriate copy for one strategy.
pub fn draft_message(
    cart: &AbandonedCart,
    channel: ContactChannel,
    strategy: Option<DraftStrategy>,
    now: OffsetDateTime,
) -> MessageDraft {
    let strategy = strategy.unwrap_or_default();
    let urgency = classify_urgency(cart, now);

    MessageDraft {
        message: render(cart, channel, strategy),
        strategy,
        confidence: confidence_for(cart, strategy),
        reasoning: strategy.reasoning().to_string(),
        suggested_offer: suggested_offer(cart, strategy),
        timing: timing_for(urgency).to_string(),
    }
}

/// All four strategies for one cart, ranked by descending confidence, so
/// the operator picks from a sorted list instead of a single draft.
pub fn draft_all(
    cart: &AbandonedCart,
    channel: ContactChannel,
    now: OffsetDateTime,
) -> Vec<MessageDraft> {
    let mut drafts: Vec<MessageDraft> = DraftStrategy::ALL
        .into_iter()
        .map(|strategy| draft_message(cart, channel, Some(strategy), now))
        .collect();
    drafts.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    drafts
}

fn confidence_for(cart: &AbandonedCart, strategy: DraftStrategy) -> f64 {
    let mut confidence = strategy.base_confidence();
    if cart.cart_total > HIGH_VALUE_THRESHOLD {
        confidence += 0.05;
    }
    if cart.cart_source == CartChannel::Mobile {
        confidence += 0.03;
    }
    if cart.abandonment_reason.is_some() {
        confidence += 0.02;
    }
    confidence.min(CONFIDENCE_CAP)
}

fn timing_for(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::High => "send within the next hour",
        Urgency::Medium => "send within 6 hours",
        Urgency::Low => "send within 24 hours",
    }
}

fn suggested_offer(cart: &AbandonedCart, strategy: DraftStrategy) -> Option<String> {
    match strategy {
        DraftStrategy::Offer => {
            let shipping_complaint = cart
                .abandonment_reason
                .as_deref()
                .is_some_and(|reason| reason.to_lowercase().contains("shipping"));
            if shipping_complaint {
                Some("free shipping on this order".to_string())
            } else {
                Some("10% off when completed within 24 hours".to_string())
            }
        }
        DraftStrategy::Urgent if cart.cart_total > HIGH_VALUE_THRESHOLD => {
            Some("complimentary express shipping".to_string())
        }
        _ => None,
    }
}

fn first_name(cart: &AbandonedCart) -> &str {
    cart.customer_name
        .split_whitespace()
        .next()
        .unwrap_or("there")
}

fn item_summary(cart: &AbandonedCart) -> String {
    match cart.items.as_slice() {
        [] => "your items".to_string(),
        [only] => only.name.clone(),
        [first, rest @ ..] => format!("{} and {} more", first.name, rest.len()),
    }
}

fn render(cart: &AbandonedCart, channel: ContactChannel, strategy: DraftStrategy) -> String {
    match channel {
        ContactChannel::Email => render_email(cart, strategy),
        ContactChannel::Whatsapp => render_whatsapp(cart, strategy),
        ContactChannel::Sms => render_sms(cart, strategy),
    }
}

fn render_email(cart: &AbandonedCart, strategy: DraftStrategy) -> String {
    let name = first_name(cart);
    let items = item_summary(cart);
    let total = format!("{} {:.2}", cart.currency, cart.cart_total);
    match strategy {
        DraftStrategy::Urgent => format!(
            "Hi {name},\n\nYour cart with {items} is about to expire and stock is \
             running low. Your order total of {total} is reserved for the next few \
             hours only.\n\nComplete your checkout now to keep your items.\n\nBest,\nThe team"
        ),
        DraftStrategy::Personal => format!(
            "Hi {name},\n\nWe noticed you left {items} in your cart. No rush at \
             all; your selection ({total}) is saved and waiting whenever you're \
             ready.\n\nAnything we can help with?\n\nWarmly,\nThe team"
        ),
        DraftStrategy::Offer => format!(
            "Hi {name},\n\nStill thinking about {items}? Finish your {total} order \
             in the next 24 hours and we'll sweeten the deal for you.\n\nYour \
             discount is applied automatically at checkout.\n\nBest,\nThe team"
        ),
        DraftStrategy::Assistance => format!(
            "Hi {name},\n\nIt looks like something got in the way of completing \
             your order for {items}. If checkout gave you trouble, reply to this \
             email and a real person will sort it out.\n\nHere to help,\nThe team"
        ),
    }
}

fn render_whatsapp(cart: &AbandonedCart, strategy: DraftStrategy) -> String {
    let name = first_name(cart);
    let items = item_summary(cart);
    match strategy {
        DraftStrategy::Urgent => {
            format!("⏰ {name}, your cart with {items} expires soon! Tap to finish checkout 🛒")
        }
        DraftStrategy::Personal => {
            format!("Hey {name} 👋 you left {items} in your cart. It's saved whenever you're ready!")
        }
        DraftStrategy::Offer => {
            format!("🎁 {name}, complete your order of {items} today and a surprise discount is on us!")
        }
        DraftStrategy::Assistance => {
            format!("Hi {name}, trouble at checkout with {items}? Reply here and we'll fix it 🙌")
        }
    }
}

fn render_sms(cart: &AbandonedCart, strategy: DraftStrategy) -> String {
    let name = first_name(cart);
    let items = item_summary(cart);
    match strategy {
        DraftStrategy::Urgent => {
            format!("{name}, your cart with {items} expires soon. Finish checkout to keep it.")
        }
        DraftStrategy::Personal => {
            format!("Hi {name}, {items} is still in your cart. Saved whenever you're ready.")
        }
        DraftStrategy::Offer => {
            format!("{name}, finish your order of {items} today and a discount applies at checkout.")
        }
        DraftStrategy::Assistance => {
            format!("Hi {name}, checkout trouble with {items}? Reply HELP and we'll sort it.")
        }
    }
}
