mod common;

use std::sync::atomic::Ordering;

use assert_matches::assert_matches;
use common::{at, hit, TestHarness, TranslatorBehavior};
use tubedigest::workers::WorkerKind;
use tubedigest_common::{Error, Stage};

async fn transcribed(h: &TestHarness, ids: &[&str]) {
    h.add_channel("UC1", None);
    for (day, id) in ids.iter().enumerate() {
        h.metadata
            .add_upload("UC1", hit(id, "Episode", at(day as u32 + 1, 8)), "PT1H");
    }
    h.run(WorkerKind::Discovery).await.unwrap();
    h.run(WorkerKind::Transcription).await.unwrap();
    assert!(h.all_contents().iter().all(|c| c.stage == Stage::Transcribed));
}

async fn summarized(h: &TestHarness, ids: &[&str]) {
    transcribed(h, ids).await;
    h.run(WorkerKind::Summarization).await.unwrap();
    assert!(h.all_contents().iter().all(|c| c.stage == Stage::Summarized));
}

#[tokio::test]
async fn answer_without_participant_line_fails_only_that_item() {
    let h = TestHarness::new();
    transcribed(&h, &["first", "second"]).await;
    h.summarizer
        .queued
        .lock()
        .unwrap()
        .push_back("A single line with no break".to_string());

    let report = h.run(WorkerKind::Summarization).await.unwrap();

    assert_eq!(report.selected, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.completed, 1);
    assert_eq!(h.summarizer.calls.load(Ordering::SeqCst), 2);

    let first = h.content("first").unwrap();
    assert_eq!(first.stage, Stage::Transcribed);
    assert!(first.summary_primary.is_none());
    assert!(first.additional_notes.is_none());

    let second = h.content("second").unwrap();
    assert_eq!(second.stage, Stage::Summarized);
    assert_eq!(second.additional_notes.as_deref(), Some("Alice Smith, Bob Jones"));

    // The failed item is picked up again once the answer is well formed.
    let retry = h.run(WorkerKind::Summarization).await.unwrap();
    assert_eq!(retry.selected, 1);
    assert_eq!(retry.completed, 1);
    assert_eq!(h.content("first").unwrap().stage, Stage::Summarized);
}

#[tokio::test]
async fn empty_summary_body_is_rejected() {
    let h = TestHarness::new();
    transcribed(&h, &["only"]).await;
    *h.summarizer.response.lock().unwrap() = "Alice Smith\n   \n".to_string();

    let report = h.run(WorkerKind::Summarization).await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(h.content("only").unwrap().stage, Stage::Transcribed);
}

#[tokio::test]
async fn failed_translation_batch_leaves_items_summarized() {
    let h = TestHarness::new();
    summarized(&h, &["a", "b", "c"]).await;
    *h.translator.behavior.lock().unwrap() = TranslatorBehavior::Fail;

    let report = h.run(WorkerKind::Translation).await.unwrap();

    assert_eq!(report.selected, 3);
    assert_eq!(report.failed, 3);
    assert_eq!(report.completed, 0);
    assert_eq!(h.translator.calls.load(Ordering::SeqCst), 1);
    for item in h.all_contents() {
        assert_eq!(item.stage, Stage::Summarized);
        assert!(item.summary_translated.is_none());
    }

    *h.translator.behavior.lock().unwrap() = TranslatorBehavior::Tag;
    let retry = h.run(WorkerKind::Translation).await.unwrap();
    assert_eq!(retry.completed, 3);
    assert!(h.all_contents().iter().all(|c| c.stage == Stage::Translated));
}

#[tokio::test]
async fn short_translation_batch_stores_nothing() {
    let h = TestHarness::new();
    summarized(&h, &["a", "b"]).await;
    *h.translator.behavior.lock().unwrap() = TranslatorBehavior::DropLast;

    let result = h.run(WorkerKind::Translation).await;

    assert_matches!(result, Err(Error::Format(ref message)) if message.contains("expected 2"));
    for item in h.all_contents() {
        assert_eq!(item.stage, Stage::Summarized, "{} advanced", item.video_id);
        assert!(item.summary_translated.is_none());
    }
}
