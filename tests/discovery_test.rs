mod common;

use common::{at, hit, TestHarness};
use tubedigest::workers::{CycleReport, WorkerKind};
use tubedigest_common::Stage;
use tubedigest_db::models::NewContent;
use tubedigest_db::pool::get_conn;
use tubedigest_db::queries::contents;

#[tokio::test]
async fn repeated_cycles_store_each_video_once() {
    let h = TestHarness::new();
    h.add_channel("UC1", None);
    h.metadata
        .add_upload("UC1", hit("v1", "First", at(1, 10)), "PT31M");
    h.metadata
        .add_upload("UC1", hit("v2", "Second", at(2, 10)), "PT2H");

    let first = h.run(WorkerKind::Discovery).await.unwrap();
    let second = h.run(WorkerKind::Discovery).await.unwrap();

    assert_eq!(
        first,
        CycleReport {
            selected: 1,
            completed: 1,
            skipped: 0,
            failed: 0
        }
    );
    assert_eq!(second.completed, 1);

    let stored = h.all_contents();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|c| c.stage == Stage::Discovered));
    assert_eq!(h.channel("UC1").last_published_at, Some(at(2, 10)));
}

#[tokio::test]
async fn exactly_thirty_minutes_is_not_long_enough() {
    let h = TestHarness::new();
    h.add_channel("UC1", None);
    h.metadata
        .add_upload("UC1", hit("edge", "Edge", at(1, 10)), "PT30M");
    h.metadata
        .add_upload("UC1", hit("over", "Over", at(1, 11)), "PT30M1S");

    h.run(WorkerKind::Discovery).await.unwrap();

    assert!(h.content("edge").is_none());
    assert!(h.content("over").is_some());
    assert_eq!(h.channel("UC1").last_published_at, Some(at(1, 11)));
}

#[tokio::test]
async fn watermark_never_moves_backward() {
    let h = TestHarness::new();
    h.add_channel("UC1", None);
    h.metadata
        .add_upload("UC1", hit("new", "New", at(5, 10)), "PT1H");
    h.run(WorkerKind::Discovery).await.unwrap();

    // A late, older item committed directly must not pull the watermark back.
    let conn = get_conn(&h.db).unwrap();
    let commit = contents::commit_discovery(
        &conn,
        "UC1",
        &[NewContent {
            video_id: "old".into(),
            title: "Old".into(),
            length: std::time::Duration::from_secs(3600),
            published_at: at(1, 10),
        }],
    )
    .unwrap();
    drop(conn);

    assert_eq!(commit.inserted, 1);
    assert_eq!(commit.watermark, Some(at(5, 10)));
    assert_eq!(h.channel("UC1").last_published_at, Some(at(5, 10)));
}

#[tokio::test]
async fn keyword_filter_limits_titles() {
    let h = TestHarness::new();
    h.add_channel("UC1", Some("interview; debate"));
    h.metadata
        .add_upload("UC1", hit("i", "Long INTERVIEW with a guest", at(1, 10)), "PT1H");
    h.metadata
        .add_upload("UC1", hit("m", "Music marathon", at(1, 11)), "PT3H");

    h.run(WorkerKind::Discovery).await.unwrap();

    assert!(h.content("i").is_some());
    assert!(h.content("m").is_none());
    assert_eq!(h.channel("UC1").last_published_at, Some(at(1, 10)));
}

#[tokio::test]
async fn inactive_channels_are_not_searched() {
    let h = TestHarness::new();
    h.add_channel("UC1", None);
    {
        let conn = get_conn(&h.db).unwrap();
        tubedigest_db::queries::channels::update_channel(&conn, "UC1", "Paused", 0, None)
            .unwrap();
    }
    h.metadata
        .add_upload("UC1", hit("v1", "First", at(1, 10)), "PT1H");

    let report = h.run(WorkerKind::Discovery).await.unwrap();

    assert_eq!(report.selected, 0);
    assert!(h.metadata.searches.lock().unwrap().is_empty());
    assert!(h.all_contents().is_empty());
}

#[tokio::test]
async fn failing_channel_does_not_block_others() {
    let h = TestHarness::new();
    h.add_channel("UCa", None);
    h.add_channel("UCb", None);
    *h.metadata.fail_search.lock().unwrap() = Some("UCa".into());
    h.metadata
        .add_upload("UCa", hit("a1", "A", at(1, 10)), "PT1H");
    h.metadata
        .add_upload("UCb", hit("b1", "B", at(1, 10)), "PT1H");

    let report = h.run(WorkerKind::Discovery).await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.completed, 1);
    assert!(h.content("a1").is_none());
    assert!(h.content("b1").is_some());
    assert_eq!(h.channel("UCa").last_published_at, None);
}

#[tokio::test]
async fn malformed_duration_skips_the_channel_for_the_cycle() {
    let h = TestHarness::new();
    h.add_channel("UC1", None);
    h.metadata
        .add_upload("UC1", hit("ok", "Fine", at(1, 10)), "PT1H");
    h.metadata
        .add_upload("UC1", hit("bad", "Broken", at(1, 11)), "P1D");

    let report = h.run(WorkerKind::Discovery).await.unwrap();

    assert_eq!(report.failed, 1);
    assert!(h.all_contents().is_empty());
    assert_eq!(h.channel("UC1").last_published_at, None);
}
