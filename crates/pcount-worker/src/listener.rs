// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The request listener: decode, count, publish, and decide how the
//! delivery is settled.
//!
//! All failure policy for one message lives here so the engine stays free
//! of it:
//!
//! | outcome                  | log   | disposition                          |
//! |--------------------------|-------|--------------------------------------|
//! | malformed payload        | warn  | `Ack`                                |
//! | fetch/detection/other    | error | `Ack`, or `Reject` (dead letter)     |
//! | published                | info  | `Ack`                                |
//! | publish failed           | error | `Err(Publish)`, settled by the worker |
//!
//! The worker settles a publish failure exactly like an engine failure, so
//! no outcome ever puts a request back on the queue.

use std::time::Instant;

use pcount_core::error::PcountError;
use pcount_core::types::Disposition;
use tracing::{debug, error, info, warn};

use crate::codec::decode_request;
use crate::context::WorkerContext;

/// Handles one raw request payload.
///
/// Returns the disposition for the delivery. A publish failure is not
/// absorbed: it is returned as `Err` and the caller settles the delivery
/// with [`WorkerContext::failure_disposition`].
pub async fn handle_request(
    payload: &[u8],
    ctx: &WorkerContext,
) -> Result<Disposition, PcountError> {
    let request = match decode_request(payload) {
        Ok(request) => request,
        Err(e) => {
            warn!(
                error = %e,
                payload = %String::from_utf8_lossy(payload),
                "cannot decode counting request, dropping message"
            );
            pcount_prometheus::record_request("decode_failed");
            return Ok(Disposition::Ack);
        }
    };

    let lecture_id = request.lecture_id.clone();
    let photos = request.photos.len();
    debug!(lecture_id = %lecture_id, photos, "counting request decoded");

    let started = Instant::now();
    let outcome = ctx.engine.count(request).await;
    pcount_prometheus::record_request_duration(started.elapsed().as_secs_f64());

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            let disposition = ctx.failure_disposition();
            error!(
                error = %e,
                kind = e.kind(),
                lecture_id = %lecture_id,
                payload = %String::from_utf8_lossy(payload),
                disposition = %disposition,
                "error while counting people"
            );
            pcount_prometheus::record_request("engine_failed");
            return Ok(disposition);
        }
    };

    if let Err(e) = ctx.publisher.publish(&result).await {
        pcount_prometheus::record_request("publish_failed");
        return Err(e);
    }

    info!(lecture_id = %lecture_id, photos, "counting result published");
    pcount_prometheus::record_request("published");
    Ok(Disposition::Ack)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pcount_core::types::{CountItem, CountingResult};
    use pcount_test_utils::{tagged_pixels, MockFaceDetector, MockImageSource, MockPublisher};
    use tracing_test::traced_test;

    use pcount_config::FailurePolicy;

    use super::*;
    use crate::engine::CountingEngine;

    fn context(
        images: MockImageSource,
        detector: MockFaceDetector,
        publisher: Arc<MockPublisher>,
    ) -> WorkerContext {
        let engine = CountingEngine::new(Arc::new(images), Arc::new(detector));
        WorkerContext::new(Arc::new(engine), publisher)
    }

    #[tokio::test]
    async fn publishes_result_and_acks() {
        let publisher = Arc::new(MockPublisher::new());
        let ctx = context(
            MockImageSource::new()
                .with_image("u1", tagged_pixels(1))
                .with_image("u2", tagged_pixels(2)),
            MockFaceDetector::new().with_faces(tagged_pixels(1), 2),
            publisher.clone(),
        );

        let payload = br#"{"lectureId":"L1","photos":[{"id":"p1","url":"u1"},{"id":"p2","url":"u2"}]}"#;
        let disposition = handle_request(payload, &ctx).await.unwrap();

        assert_eq!(disposition, Disposition::Ack);
        assert_eq!(
            publisher.published(),
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
    #[traced_test]
    async fn malformed_payload_is_logged_and_acked_without_counting() {
        let images = MockImageSource::new();
        let publisher = Arc::new(MockPublisher::new());
        let ctx = context(images, MockFaceDetector::new(), publisher.clone());

        let disposition = handle_request(br#"{"photos":[]}"#, &ctx).await.unwrap();

        assert_eq!(disposition, Disposition::Ack);
        assert!(publisher.published().is_empty());
        assert!(logs_contain("cannot decode counting request"));
        assert!(logs_contain(r#"{"photos":[]}"#));
    }

    #[tokio::test]
    #[traced_test]
    async fn engine_failure_is_logged_with_payload_and_acked() {
        let publisher = Arc::new(MockPublisher::new());
        let ctx = context(
            MockImageSource::new().failing_on("broken"),
            MockFaceDetector::new(),
            publisher.clone(),
        );

        let payload = br#"{"lectureId":"L7","photos":[{"id":"p1","url":"broken"}]}"#;
        let disposition = handle_request(payload, &ctx).await.unwrap();

        assert_eq!(disposition, Disposition::Ack);
        assert!(publisher.published().is_empty());
        assert!(logs_contain("error while counting people"));
        assert!(logs_contain("L7"));
        assert!(logs_contain("broken"));
    }

    #[tokio::test]
    async fn engine_failure_is_rejected_under_dead_letter_policy() {
        let publisher = Arc::new(MockPublisher::new());
        let ctx = context(
            MockImageSource::new().failing_on("broken"),
            MockFaceDetector::new(),
            publisher.clone(),
        )
        .with_failure_policy(FailurePolicy::DeadLetter);

        let payload = br#"{"lectureId":"L7","photos":[{"id":"p1","url":"broken"}]}"#;
        let disposition = handle_request(payload, &ctx).await.unwrap();

        assert_eq!(disposition, Disposition::Reject);
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn decode_failure_is_acked_even_under_dead_letter_policy() {
        let ctx = context(
            MockImageSource::new(),
            MockFaceDetector::new(),
            Arc::new(MockPublisher::new()),
        )
        .with_failure_policy(FailurePolicy::DeadLetter);

        let disposition = handle_request(b"{", &ctx).await.unwrap();
        assert_eq!(disposition, Disposition::Ack);
    }

    #[tokio::test]
    async fn publish_failure_propagates() {
        let publisher = Arc::new(MockPublisher::failing());
        let ctx = context(
            MockImageSource::new(),
            MockFaceDetector::new(),
            publisher.clone(),
        );

        let err = handle_request(br#"{"lectureId":"L1","photos":[]}"#, &ctx)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "publish");
        assert_eq!(publisher.attempts(), 1);
    }

    #[tokio::test]
    async fn third_of_five_fetch_failure_never_publishes() {
        let images = MockImageSource::new()
            .with_image("u1", tagged_pixels(1))
            .with_image("u2", tagged_pixels(2))
            .failing_on("u3")
            .with_image("u4", tagged_pixels(4))
            .with_image("u5", tagged_pixels(5));
        let detector = Arc::new(MockFaceDetector::new());
        let publisher = Arc::new(MockPublisher::new());
        let engine = CountingEngine::new(Arc::new(images), detector.clone());
        let ctx = WorkerContext::new(Arc::new(engine), publisher.clone());

        let payload = br#"{"lectureId":"L1","photos":[
            {"id":"p1","url":"u1"},{"id":"p2","url":"u2"},{"id":"p3","url":"u3"},
            {"id":"p4","url":"u4"},{"id":"p5","url":"u5"}]}"#;
        handle_request(payload, &ctx).await.unwrap();

        assert_eq!(detector.call_count(), 0);
        assert_eq!(publisher.attempts(), 0);
    }
}
