// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The counting engine: fetches every photo of a request, runs face
//! detection on each, and assembles one count per photo in input order.

use std::sync::Arc;

use futures::{StreamExt, TryStreamExt};
use pcount_core::error::PcountError;
use pcount_core::types::{CountItem, CountingRequest, CountingResult, PhotoReference, PixelData};
use pcount_core::{FaceDetector, ImageSource};
use tracing::{debug, instrument};

/// Turns a [`CountingRequest`] into a [`CountingResult`].
///
/// Holds no state between requests. Any fetch or detection failure aborts
/// the whole request; there is no partial result.
pub struct CountingEngine {
    images: Arc<dyn ImageSource>,
    detector: Arc<dyn FaceDetector>,
    fetch_concurrency: usize,
}

impl CountingEngine {
    /// Creates an engine that fetches photos one at a time.
    pub fn new(images: Arc<dyn ImageSource>, detector: Arc<dyn FaceDetector>) -> Self {
        Self {
            images,
            detector,
            fetch_concurrency: 1,
        }
    }

    /// Allows up to `n` photo fetches in flight. Values below 1 are treated as 1.
    pub fn with_fetch_concurrency(mut self, n: usize) -> Self {
        self.fetch_concurrency = n.max(1);
        self
    }

    pub fn fetch_concurrency(&self) -> usize {
        self.fetch_concurrency
    }

    /// Counts faces in every photo of `request`.
    ///
    /// All photos are fetched before any detection runs. Detection then
    /// walks the photos in input order, so item `i` always describes
    /// `request.photos[i]`.
    #[instrument(
        name = "count",
        skip_all,
        fields(lecture_id = %request.lecture_id, photos = request.photos.len())
    )]
    pub async fn count(&self, request: CountingRequest) -> Result<CountingResult, PcountError> {
        let pixels = self.fetch_all(&request.photos).await?;
        debug!(fetched = pixels.len(), "all photos fetched");

        let mut items = Vec::with_capacity(request.photos.len());
        for (photo, pixels) in request.photos.into_iter().zip(&pixels) {
            let faces = self.detector.detect(pixels).await?;
            debug!(image_id = %photo.id, faces = faces.len(), "faces detected");
            pcount_prometheus::record_faces(faces.len());
            items.push(CountItem {
                image_id: photo.id,
                number_of_people: faces.len(),
            });
        }

        Ok(CountingResult {
            lecture_id: request.lecture_id,
            people_counting_items: items,
        })
    }

    async fn fetch_all(&self, photos: &[PhotoReference]) -> Result<Vec<PixelData>, PcountError> {
        if self.fetch_concurrency == 1 {
            let mut pixels = Vec::with_capacity(photos.len());
            for photo in photos {
                pixels.push(self.fetch_one(photo).await?);
            }
            return Ok(pixels);
        }

        // `buffered` yields in input order regardless of completion order.
        futures::stream::iter(photos)
            .map(|photo| self.fetch_one(photo))
            .buffered(self.fetch_concurrency)
            .try_collect()
            .await
    }

    async fn fetch_one(&self, photo: &PhotoReference) -> Result<PixelData, PcountError> {
        let pixels = self.images.fetch(&photo.url).await?;
        debug!(
            image_id = %photo.id,
            width = pixels.width(),
            height = pixels.height(),
            "photo fetched"
        );
        Ok(pixels)
    }
}
