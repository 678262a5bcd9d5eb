// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property tests: the engine preserves length, order, identity, and counts.

use std::sync::Arc;

use pcount_core::types::{CountingRequest, PhotoReference};
use pcount_test_utils::{tagged_pixels, MockFaceDetector, MockImageSource};
use pcount_worker::CountingEngine;
use proptest::prelude::*;

fn run(request: CountingRequest, faces: &[usize], concurrency: usize) -> Vec<(String, usize)> {
    let mut images = MockImageSource::new();
    let mut detector = MockFaceDetector::new();
    for (i, count) in faces.iter().enumerate() {
        images = images.with_image(&format!("u{i}"), tagged_pixels(i as u32));
        detector = detector.with_faces(tagged_pixels(i as u32), *count);
    }
    let engine = CountingEngine::new(Arc::new(images), Arc::new(detector))
        .with_fetch_concurrency(concurrency);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let lecture_id = request.lecture_id.clone();
    let result = rt.block_on(engine.count(request)).unwrap();
    assert_eq!(result.lecture_id, lecture_id);
    result
        .people_counting_items
        .into_iter()
        .map(|item| (item.image_id, item.number_of_people))
        .collect()
}

proptest! {
    #[test]
    fn items_match_photos_one_to_one(
        lecture_id in ".{0,12}",
        ids in proptest::collection::vec("[a-z0-9]{1,6}", 0..12),
        faces_seed in proptest::collection::vec(0usize..8, 12),
        concurrency in 1usize..5,
    ) {
        let faces = &faces_seed[..ids.len()];
        let request = CountingRequest {
            lecture_id,
            photos: ids
                .iter()
                .enumerate()
                .map(|(i, id)| PhotoReference { id: id.clone(), url: format!("u{i}") })
                .collect(),
        };

        let items = run(request, faces, concurrency);

        prop_assert_eq!(items.len(), ids.len());
        for (i, (image_id, count)) in items.iter().enumerate() {
            prop_assert_eq!(image_id, &ids[i]);
            prop_assert_eq!(*count, faces[i]);
        }
    }
}
