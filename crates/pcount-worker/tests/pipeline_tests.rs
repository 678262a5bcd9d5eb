// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the consume -> count -> publish -> settle pipeline.
//!
//! Each test builds an isolated TestHarness with mock adapters.

use std::time::Duration;

use pcount_config::FailurePolicy;
use pcount_core::types::{CountItem, CountingResult, Disposition};
use pcount_test_utils::{
    tagged_pixels, MockFaceDetector, MockImageSource, MockPublisher, TestHarness,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn two_photo_harness() -> TestHarness {
    TestHarness::builder()
        .with_images(
            MockImageSource::new()
                .with_image("u1", tagged_pixels(1))
                .with_image("u2", tagged_pixels(2)),
        )
        .with_detector(MockFaceDetector::new().with_faces(tagged_pixels(1), 2))
        .build()
}

// ---- Reference scenario ----

#[tokio::test]
async fn two_photos_yield_two_and_zero_people() {
    let harness = two_photo_harness();

    let (disposition, published) = harness
        .process(
            json!({
                "lectureId": "L1",
                "photos": [{"id": "p1", "url": "u1"}, {"id": "p2", "url": "u2"}]
            })
            .to_string(),
        )
        .await
        .unwrap();

    assert_eq!(disposition, Disposition::Ack);
    assert_eq!(
        published,
        vec![CountingResult {
            lecture_id: "L1".into(),
            people_counting_items: vec![
                CountItem {
                    image_id: "p1".into(),
                    number_of_people: 2
                },
                CountItem {
                    image_id: "p2".into(),
                    number_of_people: 0
                },
            ],
        }]
    );
}

#[tokio::test]
async fn empty_photos_publishes_empty_result() {
    let harness = TestHarness::builder().build();

    let (disposition, published) = harness
        .process(r#"{"lectureId":"L2","photos":[]}"#)
        .await
        .unwrap();

    assert_eq!(disposition, Disposition::Ack);
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].lecture_id, "L2");
    assert!(published[0].people_counting_items.is_empty());
    assert!(harness.images.calls().is_empty());
    assert_eq!(harness.detector.call_count(), 0);
}

// ---- Failure policy ----

#[tokio::test]
async fn malformed_messages_are_acked_and_not_counted() {
    let harness = two_photo_harness();

    for payload in [
        r#"{"photos":[]}"#,
        r#"{"lectureId":"L1"}"#,
        r#"{"lectureId":"L1","photos":[{"id":"p1"}]}"#,
        "not json at all",
    ] {
        harness.queue.push(payload).await;
    }
    let stats = harness.drain().await.unwrap();

    assert_eq!(stats.handled, 4);
    assert_eq!(stats.acked, 4);
    assert!(harness.images.calls().is_empty());
    assert!(harness.publisher.published().is_empty());
}

#[tokio::test]
async fn engine_failure_is_acked_by_default() {
    let harness = TestHarness::builder()
        .with_images(MockImageSource::new().failing_on("u1"))
        .build();

    let (disposition, published) = harness
        .process(r#"{"lectureId":"L1","photos":[{"id":"p1","url":"u1"}]}"#)
        .await
        .unwrap();

    assert_eq!(disposition, Disposition::Ack);
    assert!(published.is_empty());
}

#[tokio::test]
async fn engine_failure_is_dead_lettered_when_configured() {
    let harness = TestHarness::builder()
        .with_images(MockImageSource::new().failing_on("u1"))
        .with_failure_policy(FailurePolicy::DeadLetter)
        .build();

    let (disposition, published) = harness
        .process(r#"{"lectureId":"L1","photos":[{"id":"p1","url":"u1"}]}"#)
        .await
        .unwrap();

    assert_eq!(disposition, Disposition::Reject);
    assert!(published.is_empty());
}

#[tokio::test]
async fn publish_failure_is_acked_by_default() {
    let harness = TestHarness::builder()
        .with_publisher(MockPublisher::failing())
        .build();

    let (disposition, published) = harness
        .process(r#"{"lectureId":"L1","photos":[]}"#)
        .await
        .unwrap();

    assert_eq!(disposition, Disposition::Ack);
    assert!(published.is_empty());
    assert_eq!(harness.publisher.attempts(), 1);
    assert_eq!(harness.queue.pending_count().await, 0);
}

#[tokio::test]
async fn publish_failure_is_dead_lettered_when_configured() {
    let harness = TestHarness::builder()
        .with_publisher(MockPublisher::failing())
        .with_failure_policy(FailurePolicy::DeadLetter)
        .build();

    let (disposition, _) = harness
        .process(r#"{"lectureId":"L1","photos":[]}"#)
        .await
        .unwrap();

    assert_eq!(disposition, Disposition::Reject);
    assert_eq!(harness.publisher.attempts(), 1);
}

#[tokio::test]
async fn failing_publish_does_not_block_next_request() {
    let harness = TestHarness::builder()
        .with_publisher(MockPublisher::new().failing_for("A"))
        .build();
    let a = harness.queue.push(r#"{"lectureId":"A","photos":[]}"#).await;
    let b = harness.queue.push(r#"{"lectureId":"B","photos":[]}"#).await;

    let stats = tokio::time::timeout(Duration::from_secs(5), harness.drain())
        .await
        .expect("a failing request must not be redelivered forever")
        .unwrap();

    assert_eq!(stats.handled, 2);
    assert_eq!(stats.requeued, 0);
    assert_eq!(
        harness.queue.settled().await,
        vec![(a, Disposition::Ack), (b, Disposition::Ack)]
    );
    assert_eq!(harness.publisher.attempts(), 2);
    let lectures: Vec<String> = harness
        .publisher
        .published()
        .into_iter()
        .map(|r| r.lecture_id)
        .collect();
    assert_eq!(lectures, vec!["B"]);
}

// ---- Loop behavior ----

#[tokio::test]
async fn deliveries_are_handled_in_order_and_settled_once() {
    let harness = two_photo_harness();

    let mut tags = Vec::new();
    for lecture in ["A", "B", "C"] {
        tags.push(
            harness
                .queue
                .push_json(json!({"lectureId": lecture, "photos": [{"id": "p", "url": "u1"}]}))
                .await,
        );
    }
    let stats = harness.drain().await.unwrap();

    assert_eq!(stats.handled, 3);
    let settled: Vec<u64> = harness
        .queue
        .settled()
        .await
        .into_iter()
        .map(|(tag, _)| tag)
        .collect();
    assert_eq!(settled, tags);

    let lectures: Vec<String> = harness
        .publisher
        .published()
        .into_iter()
        .map(|r| r.lecture_id)
        .collect();
    assert_eq!(lectures, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn cancellation_stops_idle_worker() {
    let harness = TestHarness::builder().build();
    let cancel = CancellationToken::new();

    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        stopper.cancel();
    });

    let stats = tokio::time::timeout(Duration::from_secs(5), harness.run(cancel))
        .await
        .expect("worker should stop after cancellation")
        .unwrap();
    assert_eq!(stats.handled, 0);
    assert!(harness.queue.is_shut_down().await);
}

#[tokio::test]
async fn drained_worker_shuts_consumer_down() {
    let harness = TestHarness::builder().build();
    harness.queue.push(r#"{"lectureId":"L1","photos":[]}"#).await;

    harness.drain().await.unwrap();

    assert!(harness.queue.is_shut_down().await);
}

#[tokio::test]
async fn cancelled_worker_leaves_pending_deliveries_untouched() {
    let harness = two_photo_harness();
    harness.queue.push(r#"{"lectureId":"L1","photos":[]}"#).await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let stats = harness.run(cancel).await.unwrap();

    assert_eq!(stats.handled, 0);
    assert_eq!(harness.queue.pending_count().await, 1);
    assert!(harness.queue.settled().await.is_empty());
}

#[tokio::test]
async fn concurrent_fetch_gives_same_result_as_sequential() {
    let images = || {
        MockImageSource::new()
            .with_image("u1", tagged_pixels(1))
            .with_delay("u1", Duration::from_millis(30))
            .with_image("u2", tagged_pixels(2))
            .with_image("u3", tagged_pixels(3))
    };
    let detector = || {
        MockFaceDetector::new()
            .with_faces(tagged_pixels(1), 4)
            .with_faces(tagged_pixels(3), 1)
    };
    let payload = r#"{"lectureId":"L","photos":[
        {"id":"a","url":"u1"},{"id":"b","url":"u2"},{"id":"c","url":"u3"}]}"#;

    let sequential = TestHarness::builder()
        .with_images(images())
        .with_detector(detector())
        .build();
    let concurrent = TestHarness::builder()
        .with_images(images())
        .with_detector(detector())
        .with_fetch_concurrency(3)
        .build();

    let (_, seq) = sequential.process(payload).await.unwrap();
    let (_, conc) = concurrent.process(payload).await.unwrap();
    assert_eq!(seq, conc);
}
