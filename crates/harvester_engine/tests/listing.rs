mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{numbered_listing, test_settings, ScriptedSession, LISTING_URL};
use harvester_engine::{ListingScan, ListingScanner, RenderSession, ScanStop, SelectorTable};

async fn scan(session: &ScriptedSession, target: usize, max_iterations: usize) -> ListingScan {
    common::init_logging();
    let selectors = Arc::new(SelectorTable::compile(&test_settings().profile).unwrap());
    let scanner = ListingScanner::new(selectors, Duration::ZERO);
    let handle = session.open_context().await.unwrap();
    session.navigate(handle, LISTING_URL).await.unwrap();
    scanner
        .scan(session, handle, target, max_iterations)
        .await
        .expect("scan ok")
}

#[tokio::test]
async fn stops_when_target_is_visible() {
    let session = ScriptedSession::new(vec![
        numbered_listing(10),
        numbered_listing(20),
        numbered_listing(30),
        numbered_listing(40),
    ]);

    let result = scan(&session, 25, 10).await;
    assert_eq!(result.stop, ScanStop::TargetReached);
    assert_eq!(result.iterations, 3);
    assert_eq!(result.discovered, 30);
    assert_eq!(session.stats(|s| s.scrolls), 3);
}

#[tokio::test]
async fn stops_when_count_stalls() {
    let session = ScriptedSession::new(vec![
        numbered_listing(10),
        numbered_listing(15),
        numbered_listing(15),
        numbered_listing(40),
    ]);

    let result = scan(&session, 30, 10).await;
    assert_eq!(result.stop, ScanStop::Stalled);
    assert_eq!(result.iterations, 3);
    assert_eq!(result.discovered, 15);
}

#[tokio::test]
async fn never_exceeds_iteration_budget() {
    let steps = (1..=20).map(|n| numbered_listing(n * 5)).collect();
    let session = ScriptedSession::new(steps);

    let result = scan(&session, 1000, 4).await;
    assert_eq!(result.stop, ScanStop::IterationLimit);
    assert_eq!(result.iterations, 4);
    assert_eq!(result.discovered, 20);
    assert_eq!(session.stats(|s| s.scrolls), 4);
}

#[tokio::test]
async fn zero_iterations_snapshots_current_page() {
    let session = ScriptedSession::new(vec![numbered_listing(7), numbered_listing(14)]);

    let result = scan(&session, 30, 0).await;
    assert_eq!(result.iterations, 0);
    assert_eq!(result.discovered, 7);
    assert_eq!(session.stats(|s| s.scrolls), 0);
    assert!(result.snapshot.contains("Question 6?"));
}

#[tokio::test]
async fn empty_listing_stalls_after_one_cycle() {
    let session = ScriptedSession::new(vec![numbered_listing(0)]);

    let result = scan(&session, 30, 5).await;
    assert_eq!(result.stop, ScanStop::Stalled);
    assert_eq!(result.iterations, 1);
    assert_eq!(result.discovered, 0);
}
