// ============================================================
// Layer 4 — Face Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<AnnotatedFace>
// into device-ready tensors.
//
// How batching works here:
//   Input:  Vec of N raw annotated faces
//   Output: FaceBatch with an image tensor [N, 1, S, S] and a
//           keypoint tensor [N, 136], where S is the crop size
//
// Preprocessing runs INSIDE batch(): each face is rescaled,
// cropped and normalised at batch time. With augmentation on,
// the crop origin is redrawn every call, so every epoch trains
// on fresh windows of the same faces.

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::preprocessor::Preprocessor;
use crate::domain::keypoints::FLAT_LEN;
use crate::domain::sample::AnnotatedFace;

// ─── FaceBatch ────────────────────────────────────────────────────────────────
/// A batch of preprocessed faces ready for the model forward pass.
///
/// B is the Burn Backend (e.g. NdArray, Wgpu), generic so the
/// same batcher works on any device.
#[derive(Debug, Clone)]
pub struct FaceBatch<B: Backend> {
    /// Normalised grayscale crops, shape [batch_size, 1, S, S]
    pub images: Tensor<B, 4>,

    /// Normalised target keypoints, shape [batch_size, 136]
    pub keypoints: Tensor<B, 2>,
}

// ─── FaceBatcher ──────────────────────────────────────────────────────────────
/// The batcher struct holds the target device plus the
/// preprocessing settings shared by every item in a batch.
#[derive(Clone, Debug)]
pub struct FaceBatcher<B: Backend> {
    /// The device to create tensors on
    pub device: B::Device,

    /// Rescale/crop/normalise settings
    preprocessor: Preprocessor,

    /// Random crops when true (training); centre crops when
    /// false (validation)
    augment: bool,
}

impl<B: Backend> FaceBatcher<B> {
    pub fn new(device: B::Device, preprocessor: Preprocessor, augment: bool) -> Self {
        Self {
            device,
            preprocessor,
            augment,
        }
    }
}

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
// The DataLoader calls .batch(items) with each mini-batch of faces.
impl<B: Backend> Batcher<AnnotatedFace, FaceBatch<B>> for FaceBatcher<B> {
    /// Convert a Vec of raw faces into a single FaceBatch.
    ///
    /// Steps:
    ///   1. Preprocess every face (rescale, crop, normalise)
    ///   2. Concatenate all pixel buffers into one flat Vec
    ///   3. Reshape to [batch_size, 1, S, S]
    ///   4. Same flatten-and-reshape for the keypoint targets
    fn batch(&self, items: Vec<AnnotatedFace>) -> FaceBatch<B> {
        let batch_size = items.len();
        let size       = self.preprocessor.crop_size();

        let mut pixels_flat    = Vec::with_capacity(batch_size * size * size);
        let mut keypoints_flat = Vec::with_capacity(batch_size * FLAT_LEN);

        for face in &items {
            let sample = self.preprocessor.prepare(face, self.augment);
            pixels_flat.extend_from_slice(&sample.pixels);
            keypoints_flat.extend_from_slice(&sample.keypoints);
        }

        let images = Tensor::<B, 1>::from_floats(pixels_flat.as_slice(), &self.device)
            .reshape([batch_size, 1, size, size]);

        let keypoints = Tensor::<B, 1>::from_floats(keypoints_flat.as_slice(), &self.device)
            .reshape([batch_size, FLAT_LEN]);

        FaceBatch { images, keypoints }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::keypoints::KeypointSet;
    use burn::backend::NdArray;
    use image::{GrayImage, Luma};

    fn face(side: u32, value: u8) -> AnnotatedFace {
        let image = GrayImage::from_pixel(side, side, Luma([value]));
        let flat: Vec<f32> = (0..FLAT_LEN).map(|i| 100.0 + (i % 10) as f32).collect();
        AnnotatedFace::new("f.png", image, KeypointSet::from_flat(&flat).unwrap())
    }

    #[test]
    fn test_batch_tensor_shapes() {
        let batcher =
            FaceBatcher::<NdArray>::new(Default::default(), Preprocessor::new(12, 8), false);
        let batch = batcher.batch(vec![face(24, 10), face(30, 240)]);

        assert_eq!(batch.images.dims(), [2, 1, 8, 8]);
        assert_eq!(batch.keypoints.dims(), [2, FLAT_LEN]);
    }

    #[test]
    fn test_pixel_values_survive_batching() {
        // A constant gray-128 image batches to tensor values ~0.5
        let batcher =
            FaceBatcher::<NdArray>::new(Default::default(), Preprocessor::new(12, 8), false);
        let batch = batcher.batch(vec![face(24, 128)]);

        let values = batch.images.into_data().to_vec::<f32>().unwrap();
        assert_eq!(values.len(), 64);
        let expected = 128.0 / 255.0;
        for v in values {
            assert!((v - expected).abs() < 1e-2);
        }
    }

    #[test]
    fn test_single_item_batch() {
        let batcher =
            FaceBatcher::<NdArray>::new(Default::default(), Preprocessor::new(16, 16), true);
        let batch = batcher.batch(vec![face(20, 50)]);

        assert_eq!(batch.images.dims(), [1, 1, 16, 16]);
        assert_eq!(batch.keypoints.dims(), [1, FLAT_LEN]);
    }
}
