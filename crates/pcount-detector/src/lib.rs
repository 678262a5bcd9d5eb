// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Face detector backed by the `rustface` crate (SeetaFace engine).
//!
//! The model is read once at startup from `detector.model_path`. Each
//! detection builds a fresh detector from the shared model, because a
//! rustface detector is stateful and not `Sync`.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use image::RgbImage;
use tracing::{debug, info};

use pcount_config::model::DetectorConfig;
use pcount_core::traits::adapter::PluginAdapter;
use pcount_core::traits::detector::FaceDetector;
use pcount_core::types::{AdapterType, BoundingBox, HealthStatus, PixelData};
use pcount_core::PcountError;

/// Tunables applied to every detector built from the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorTuning {
    pub min_face_size: u32,
    pub score_threshold: f64,
    pub pyramid_scale_factor: f32,
    pub slide_window_step: u32,
}

impl From<&DetectorConfig> for DetectorTuning {
    fn from(config: &DetectorConfig) -> Self {
        Self {
            min_face_size: config.min_face_size,
            score_threshold: config.score_threshold,
            pyramid_scale_factor: config.pyramid_scale_factor,
            slide_window_step: config.slide_window_step,
        }
    }
}

pub struct RustfaceDetector {
    model: Arc<rustface::Model>,
    tuning: DetectorTuning,
}

impl RustfaceDetector {
    /// Load the model named in `config` and apply its tunables.
    pub fn from_config(config: &DetectorConfig) -> Result<Self, PcountError> {
        let path = Path::new(&config.model_path);
        let file = File::open(path).map_err(|e| {
            PcountError::Config(format!(
                "cannot open face model {}: {e}",
                path.display()
            ))
        })?;
        let detector = Self::from_reader(BufReader::new(file), DetectorTuning::from(config))?;
        info!(model_path = %path.display(), "face model loaded");
        Ok(detector)
    }

    /// Read a SeetaFace model from any reader.
    pub fn from_reader<R: Read>(reader: R, tuning: DetectorTuning) -> Result<Self, PcountError> {
        let model = rustface::read_model(reader)
            .map_err(|e| PcountError::Config(format!("invalid face model: {e}")))?;
        Ok(Self {
            model: Arc::new(model),
            tuning,
        })
    }

    pub fn tuning(&self) -> DetectorTuning {
        self.tuning
    }
}

/// Convert RGB pixel data to the 8-bit luma plane rustface expects.
pub fn to_grayscale(pixels: &PixelData) -> Result<image::GrayImage, PcountError> {
    if pixels.is_empty() {
        return Err(PcountError::detection(format!(
            "cannot detect faces in an empty {}x{} image",
            pixels.width(),
            pixels.height()
        )));
    }
    let rgb = RgbImage::from_raw(pixels.width(), pixels.height(), pixels.rgb().to_vec())
        .ok_or_else(|| PcountError::detection("pixel buffer does not match dimensions"))?;
    Ok(image::imageops::grayscale(&rgb))
}

fn run_detection(
    model: &rustface::Model,
    tuning: DetectorTuning,
    gray: &image::GrayImage,
) -> Vec<BoundingBox> {
    let mut detector = rustface::create_detector_with_model(model.clone());
    detector.set_min_face_size(tuning.min_face_size);
    detector.set_score_thresh(tuning.score_threshold);
    detector.set_pyramid_scale_factor(tuning.pyramid_scale_factor);
    detector.set_slide_window_step(tuning.slide_window_step, tuning.slide_window_step);

    let (width, height) = gray.dimensions();
    detector
        .detect(&rustface::ImageData::new(gray.as_raw(), width, height))
        .iter()
        .map(|face| {
            let bbox = face.bbox();
            BoundingBox {
                top: bbox.y(),
                left: bbox.x(),
                bottom: bbox.y() + bbox.height() as i32,
                right: bbox.x() + bbox.width() as i32,
                confidence: Some(face.score()),
            }
        })
        .collect()
}

#[async_trait]
impl PluginAdapter for RustfaceDetector {
    fn name(&self) -> &str {
        "rustface"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::FaceDetector
    }

    async fn health_check(&self) -> Result<HealthStatus, PcountError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PcountError> {
        Ok(())
    }
}

#[async_trait]
impl FaceDetector for RustfaceDetector {
    async fn detect(&self, pixels: &PixelData) -> Result<Vec<BoundingBox>, PcountError> {
        let gray = to_grayscale(pixels)?;
        let model = Arc::clone(&self.model);
        let tuning = self.tuning;

        let faces = tokio::task::spawn_blocking(move || run_detection(&model, tuning, &gray))
            .await
            .map_err(|e| PcountError::Detection {
                message: format!("detection task failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        debug!(faces = faces.len(), "faces detected");
        Ok(faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(model_path: &str) -> DetectorConfig {
        DetectorConfig {
            model_path: model_path.to_string(),
            ..DetectorConfig::default()
        }
    }

    /// A real model, when `PCOUNT_TEST_MODEL` points at one.
    fn real_detector() -> Option<RustfaceDetector> {
        let path = std::env::var("PCOUNT_TEST_MODEL").ok()?;
        Some(RustfaceDetector::from_config(&config(&path)).unwrap())
    }

    #[test]
    fn missing_model_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.bin");

        let err = RustfaceDetector::from_config(&config(path.to_str().unwrap()))
            .err()
            .unwrap();

        assert_eq!(err.kind(), "config");
        assert!(err.to_string().contains("absent.bin"));
    }

    #[test]
    fn truncated_model_is_config_error() {
        let tuning = DetectorTuning::from(&DetectorConfig::default());
        let err = RustfaceDetector::from_reader(std::io::empty(), tuning)
            .err()
            .unwrap();
        assert!(err.to_string().contains("invalid face model"));
    }

    #[test]
    fn tuning_follows_config() {
        let cfg = DetectorConfig {
            min_face_size: 40,
            score_threshold: 3.5,
            pyramid_scale_factor: 0.5,
            slide_window_step: 2,
            ..DetectorConfig::default()
        };
        let tuning = DetectorTuning::from(&cfg);
        assert_eq!(tuning.min_face_size, 40);
        assert_eq!(tuning.slide_window_step, 2);
        assert!((tuning.score_threshold - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn grayscale_rejects_empty_image() {
        let empty = PixelData::new(0, 10, Vec::new()).unwrap();
        let err = to_grayscale(&empty).unwrap_err();
        assert_eq!(err.kind(), "detection");
        assert!(err.to_string().contains("0x10"));
    }

    #[test]
    fn grayscale_keeps_dimensions() {
        let pixels = PixelData::new(2, 2, vec![255; 12]).unwrap();
        let gray = to_grayscale(&pixels).unwrap();
        assert_eq!(gray.dimensions(), (2, 2));
        assert!(gray.as_raw().iter().all(|&v| v == 255));
    }

    #[tokio::test]
    async fn blank_image_has_no_faces() {
        let Some(detector) = real_detector() else {
            return;
        };
        let blank = PixelData::new(64, 64, vec![128; 64 * 64 * 3]).unwrap();
        assert!(detector.detect(&blank).await.unwrap().is_empty());
    }
}
