use std::sync::Arc;

use recart::recovery::{
    CartSourcePort, InMemoryCartSource, RawCartRecord, RecoveryError, RecoveryErrorKind,
    RecoveryFeed, RecoveryPolicy,
};
use time::OffsetDateTime;

use crate::support::raw_record;

fn feed_with(records: Vec<RawCartRecord>) -> (Arc<InMemoryCartSource>, RecoveryFeed) {
    let source = Arc::new(InMemoryCartSource::new(records));
    let feed = RecoveryFeed::new(
        Arc::clone(&source) as Arc<dyn CartSourcePort>,
        RecoveryPolicy::default(),
        50,
    );
    (source, feed)
}

fn kind(err: RecoveryError) -> RecoveryErrorKind {
    err.kind
}

#[tokio::test]
async fn given_valid_and_malformed_records_when_refreshed_then_bad_ones_are_skipped_and_counted() {
    let now = OffsetDateTime::now_utc();
    let mut nameless = raw_record("cart-bad", 1.0, now);
    nameless.customer_name = None;
    let mut unreachable = raw_record("cart-unreachable", 1.0, now);
    unreachable.email = None;
    unreachable.phone = None;

    let (_, feed) = feed_with(vec![
        raw_record("cart-1", 1.0, now),
        nameless,
        raw_record("cart-2", 3.0, now),
        unreachable,
    ]);

    let outcome = feed.refresh().await.expect("refresh should succeed");
    assert_eq!(outcome.loaded, 2);
    assert_eq!(outcome.skipped, 2);
    assert_eq!(outcome.held, 2);
    assert_eq!(feed.snapshot().await.len(), 2);
}

#[tokio::test]
async fn given_source_failure_when_refreshed_then_previous_set_survives() {
    let now = OffsetDateTime::now_utc();
    let (source, feed) = feed_with(vec![raw_record("cart-1", 1.0, now)]);

    feed.refresh().await.expect("first refresh should succeed");
    assert_eq!(feed.snapshot().await.len(), 1);

    source.fail_next_fetch();
    let err = feed.refresh().await.expect_err("second refresh should fail");
    assert_eq!(kind(err), RecoveryErrorKind::RefreshFailure);

    // Stale but displayed: the held set is untouched.
    assert_eq!(feed.snapshot().await.len(), 1);
}

#[tokio::test]
async fn given_local_mutations_when_source_repulls_same_carts_then_engagement_survives_the_merge() {
    let now = OffsetDateTime::now_utc();
    let (_, feed) = feed_with(vec![raw_record("cart-1", 1.0, now)]);
    feed.refresh().await.expect("refresh should succeed");

    feed.record_contact_attempt("cart-1")
        .await
        .expect("attempt should record");
    feed.mark_recovered("cart-1", Some(99.0))
        .await
        .expect("recovery should record");

    // The source still reports the cart as abandoned with zero attempts.
    feed.refresh().await.expect("re-refresh should succeed");

    let snapshot = feed.snapshot().await;
    let cart = snapshot
        .iter()
        .find(|cart| cart.id == "cart-1")
        .expect("cart should still be held");
    assert_eq!(cart.contact_attempts, 1);
    assert!(cart.last_contacted.is_some());
    assert!(cart.recovered);
    assert_eq!(cart.recovery_revenue, Some(99.0));
}

#[tokio::test]
async fn given_unknown_cart_id_when_mutated_then_not_found_is_reported() {
    let now = OffsetDateTime::now_utc();
    let (_, feed) = feed_with(vec![raw_record("cart-1", 1.0, now)]);
    feed.refresh().await.expect("refresh should succeed");

    let err = feed
        .record_contact_attempt("cart-ghost")
        .await
        .expect_err("unknown id should fail");
    assert_eq!(kind(err), RecoveryErrorKind::NotFound);

    let err = feed
        .mark_recovered("cart-ghost", None)
        .await
        .expect_err("unknown id should fail");
    assert_eq!(kind(err), RecoveryErrorKind::NotFound);
}

#[tokio::test]
async fn given_contact_attempts_when_recorded_then_counter_rises_and_timestamp_moves() {
    let now = OffsetDateTime::now_utc();
    let (_, feed) = feed_with(vec![raw_record("cart-1", 1.0, now)]);
    feed.refresh().await.expect("refresh should succeed");

    assert_eq!(feed.record_contact_attempt("cart-1").await.expect("ok"), 1);
    assert_eq!(feed.record_contact_attempt("cart-1").await.expect("ok"), 2);

    let snapshot = feed.snapshot().await;
    assert_eq!(snapshot[0].contact_attempts, 2);
    assert!(snapshot[0].last_contacted.is_some());
}

#[tokio::test]
async fn given_recovered_cart_when_marked_again_then_terminal_state_is_unchanged_without_error() {
    let now = OffsetDateTime::now_utc();
    let (source, feed) = feed_with(vec![raw_record("cart-1", 1.0, now)]);
    feed.refresh().await.expect("refresh should succeed");

    feed.mark_recovered("cart-1", Some(120.0))
        .await
        .expect("first mark should succeed");
    let first = feed.snapshot().await[0].clone();

    feed.mark_recovered("cart-1", Some(999.0))
        .await
        .expect("second mark should be a no-op");
    let second = feed.snapshot().await[0].clone();

    assert!(second.recovered);
    assert_eq!(second.recovered_at, first.recovered_at);
    assert_eq!(second.recovery_revenue, Some(120.0));
    // Confirmation went back to the source exactly once.
    assert_eq!(source.recovered_ids(), vec!["cart-1".to_string()]);
}

#[tokio::test]
async fn given_recovered_cart_when_attempt_is_recorded_then_terminal_state_rejects_it() {
    let now = OffsetDateTime::now_utc();
    let (_, feed) = feed_with(vec![raw_record("cart-1", 1.0, now)]);
    feed.refresh().await.expect("refresh should succeed");
    feed.mark_recovered("cart-1", None)
        .await
        .expect("mark should succeed");

    let err = feed
        .record_contact_attempt("cart-1")
        .await
        .expect_err("terminal cart should reject contact");
    assert_eq!(kind(err), RecoveryErrorKind::InvalidInput);
}

#[tokio::test]
async fn given_fresh_cart_when_outlook_is_read_then_it_is_pending_with_an_action() {
    let now = OffsetDateTime::now_utc();
    let (_, feed) = feed_with(vec![raw_record("cart-1", 1.0, now)]);
    feed.refresh().await.expect("refresh should succeed");

    let outlook = feed.outlook("cart-1").await.expect("outlook should resolve");
    assert_eq!(outlook.status, recart::recovery::CartStatus::Pending);
    assert!(outlook.next_action.is_some());

    let summary = feed.summary().await;
    assert_eq!(summary.total, 1);
    assert_eq!(summary.pending, 1);
}

#[tokio::test]
async fn given_concurrent_refreshes_when_run_then_the_held_set_stays_consistent() {
    let now = OffsetDateTime::now_utc();
    let (_, feed) = feed_with(vec![raw_record("cart-1", 1.0, now), raw_record("cart-2", 2.0, now)]);
    let feed = Arc::new(feed);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let feed = Arc::clone(&feed);
            tokio::spawn(async move { feed.refresh().await })
        })
        .collect();
    for handle in handles {
        handle
            .await
            .expect("task should not panic")
            .expect("refresh should succeed");
    }

    assert_eq!(feed.snapshot().await.len(), 2);
}
