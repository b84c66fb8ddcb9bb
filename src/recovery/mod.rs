pub mod classify;
pub mod dispatch;
pub mod draft;
pub mod error;
pub mod feed;
pub mod planner;
pub mod ports;
pub mod score;
pub mod sources;
pub mod status;
pub mod types;

pub use classify::classify_urgency;
pub use dispatch::{DispatchReport, Dispatcher};
pub use draft::{DraftStrategy, MessageDraft, draft_all, draft_message};
pub use error::{RecoveryError, RecoveryErrorKind};
pub use feed::RecoveryFeed;
pub use planner::{RecoveryPolicy, plan_next_action};
pub use ports::{CartSourcePort, DryRunSendAdapter, SendAdapterPort, SendError, SendReceipt};
pub use score::score_recovery;
pub use sources::{FixtureCartSource, InMemoryCartSource, RawCartItem, RawCartRecord};
pub use status::{resolve_outlook, summarize};
pub use types::{
    AbandonedCart, CartChannel, CartItem, CartOutlook, CartStatus, ContactChannel, FeedSummary,
    PlannedAction, RefreshOutcome, Urgency,
};
