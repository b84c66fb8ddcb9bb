use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::recovery::{
    error::{RecoveryError, invalid_input, not_found, send_failure},
    feed::RecoveryFeed,
    planner::plan_next_action,
    ports::{SendAdapterPort, SendReceipt},
    types::{AbandonedCart, ContactChannel, PlannedAction},
};

/// Outcome of one dispatch pass over the feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Executes planned actions: routes the draft to the channel's adapter and
/// reports the attempt back into the feed.
///
/// Attempt accounting follows dispatch, not delivery: a send that left the
/// adapter counts even when confirmation never arrives, while one the
/// adapter rejected outright does not.
pub struct Dispatcher {
    feed: Arc<RecoveryFeed>,
    adapters: HashMap<ContactChannel, Arc<dyn SendAdapterPort>>,
}

impl Dispatcher {
    pub fn new(feed: Arc<RecoveryFeed>) -> Self {
        Self {
            feed,
            adapters: HashMap::new(),
        }
    }

    pub fn with_adapter(mut self, channel: ContactChannel, adapter: Arc<dyn SendAdapterPort>) -> Self {
        self.adapters.insert(channel, adapter);
        self
    }

    /// Plans every non-terminal cart in the feed and sends whatever is due.
    pub async fn dispatch_due(&self, now: OffsetDateTime) -> DispatchReport {
        let mut report = DispatchReport::default();

        for cart in self.feed.snapshot().await {
            let Some(action) = plan_next_action(&cart, self.feed.policy(), now) else {
                report.skipped += 1;
                continue;
            };
            match self.execute(&cart, &action).await {
                Ok(receipt) => {
                    report.sent += 1;
                    tracing::info!(
                        target: "recovery::dispatch",
                        cart_id = %cart.id,
                        channel = ?action.channel,
                        message_id = %receipt.message_id,
                        "action_dispatched"
                    );
                }
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(
                        target: "recovery::dispatch",
                        cart_id = %cart.id,
                        channel = ?action.channel,
                        error = %err,
                        "action_dispatch_failed"
                    );
                }
            }
        }

        report
    }

    /// Sends the currently due action for one cart, for callers driving a
    /// single "contact now" button. `InvalidInput` when nothing is due.
    pub async fn dispatch_one(
        &self,
        cart_id: &str,
        now: OffsetDateTime,
    ) -> Result<SendReceipt, RecoveryError> {
        let cart = self
            .feed
            .snapshot()
            .await
            .into_iter()
            .find(|cart| cart.id == cart_id)
            .ok_or_else(|| not_found(format!("cart '{cart_id}' is not in the feed")))?;

        let action = plan_next_action(&cart, self.feed.policy(), now)
            .ok_or_else(|| invalid_input(format!("no action is due for cart '{cart_id}'")))?;

        self.execute(&cart, &action).await
    }

    async fn execute(
        &self,
        cart: &AbandonedCart,
        action: &PlannedAction,
    ) -> Result<SendReceipt, RecoveryError> {
        let adapter = self.adapters.get(&action.channel).ok_or_else(|| {
            send_failure(format!("no adapter configured for {:?}", action.channel))
        })?;

        let destination = destination_for(cart, action.channel).ok_or_else(|| {
            send_failure(format!(
                "cart '{}' has no destination for {:?}",
                cart.id, action.channel
            ))
        })?;

        match adapter.send(&destination, &action.draft_message).await {
            Ok(receipt) => {
                self.feed.record_contact_attempt(&cart.id).await?;
                Ok(receipt)
            }
            Err(err) => {
                if err.dispatched() {
                    self.feed.record_contact_attempt(&cart.id).await?;
                }
                Err(send_failure(format!(
                    "send to cart '{}' over {:?} failed: {err}",
                    cart.id, action.channel
                )))
            }
        }
    }
}

fn destination_for(cart: &AbandonedCart, channel: ContactChannel) -> Option<String> {
    match channel {
        ContactChannel::Email => cart.email.clone(),
        ContactChannel::Whatsapp | ContactChannel::Sms => cart.phone.clone(),
    }
}
