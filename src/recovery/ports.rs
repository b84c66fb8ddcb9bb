use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::recovery::{error::RecoveryError, sources::RawCartRecord};

/// The external checkout platform the feed pulls from. Returns loosely
/// typed records; the feed maps and validates them into `AbandonedCart`.
#[async_trait]
pub trait CartSourcePort: Send + Sync {
    async fn fetch_abandoned_carts(&self, limit: usize)
    -> Result<Vec<RawCartRecord>, RecoveryError>;

    /// Best-effort confirmation that a cart converted. Returns whether the
    /// source acknowledged it.
    async fn mark_cart_recovered(&self, cart_id: &str) -> Result<bool, RecoveryError>;
}

/// What an adapter reports back after accepting a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    pub message_id: String,
    pub status: String,
}

/// Adapter-boundary failure. The split matters to attempt accounting:
/// a message that left the adapter counts as a contact attempt even when
/// delivery is never confirmed; one the adapter rejected does not.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SendError {
    #[error("send dispatched but timed out awaiting confirmation: {0}")]
    TimedOutAfterDispatch(String),
    #[error("send rejected before dispatch: {0}")]
    Rejected(String),
}

impl SendError {
    /// Whether the message actually left the adapter.
    pub fn dispatched(&self) -> bool {
        matches!(self, SendError::TimedOutAfterDispatch(_))
    }
}

/// Delivers channel messages to shoppers. One adapter per channel; the
/// dispatcher routes by the planned action's channel.
#[async_trait]
pub trait SendAdapterPort: Send + Sync {
    async fn send(&self, destination: &str, message: &str) -> Result<SendReceipt, SendError>;
}

/// Logs instead of sending. Wired in when no real adapter is configured,
/// so dispatch runs can be exercised end to end without contacting anyone.
#[derive(Debug, Default)]
pub struct DryRunSendAdapter;

#[async_trait]
impl SendAdapterPort for DryRunSendAdapter {
    async fn send(&self, destination: &str, message: &str) -> Result<SendReceipt, SendError> {
        let message_id = Uuid::now_v7().to_string();
        tracing::info!(
            target: "recovery::send",
            destination = %destination,
            message_id = %message_id,
            chars = message.len(),
            "dry_run_send"
        );
        Ok(SendReceipt {
            message_id,
            status: "dry-run".to_string(),
        })
    }
}
