// ============================================================
// Layer 4 — Face Preprocessor
// ============================================================
// Turns a raw AnnotatedFace into the fixed-size normalised
// buffers the networks consume.
//
// Steps (applied in order):
//   1. Rescale so the SHORTER image side equals rescale_size,
//      preserving aspect ratio; keypoints scale by the same
//      per-axis factors.
//   2. Crop a crop_size × crop_size window. The origin is
//      random while augmenting (training) and centred
//      otherwise (validation, inference); keypoints shift by
//      the crop origin.
//   3. Normalise: pixels map from [0, 255] to [0, 1] and
//      keypoints map to roughly [-1, 1] via (v - 100) / 50.
//
// denormalize_keypoints() inverts step 3, mapping network
// output back to crop pixel coordinates.

use image::{imageops, GrayImage};
use rand::Rng;

use crate::domain::keypoints::KeypointSet;
use crate::domain::sample::AnnotatedFace;

/// Centre of the keypoint normalisation: (v - CENTER) / SCALE.
pub const KEYPOINT_CENTER: f32 = 100.0;

/// Scale of the keypoint normalisation.
pub const KEYPOINT_SCALE: f32 = 50.0;

/// One fully preprocessed example, ready to become a tensor.
#[derive(Debug, Clone)]
pub struct FaceSample {
    /// size × size pixel values in [0, 1], row-major
    pub pixels: Vec<f32>,

    /// The 136 normalised keypoint values (x0, y0, x1, y1, ...)
    pub keypoints: Vec<f32>,

    /// Side length of the square crop
    pub size: usize,
}

/// Rescales, crops and normalises face images.
///
/// Invariant: rescale_size >= crop_size, so the crop window
/// always fits inside the rescaled image. The training config
/// validates this before a Preprocessor is built.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    /// Target length of the shorter image side after rescaling
    rescale_size: u32,

    /// Side length of the square crop fed to the network
    crop_size: u32,
}

impl Preprocessor {
    pub fn new(rescale_size: u32, crop_size: u32) -> Self {
        Self {
            rescale_size,
            crop_size,
        }
    }

    /// Side length of the crops this preprocessor produces.
    pub fn crop_size(&self) -> usize {
        self.crop_size as usize
    }

    /// Preprocess one annotated face. With `augment` set the crop
    /// origin is drawn fresh each call, so repeated passes over
    /// the same face see different windows.
    pub fn prepare(&self, face: &AnnotatedFace, augment: bool) -> FaceSample {
        // ── Step 1: Rescale image and keypoints together ─────────────────────
        let (w, h) = face.image.dimensions();
        let resized = self.rescale(&face.image);
        let (new_w, new_h) = resized.dimensions();
        let keypoints = face
            .keypoints
            .scaled(new_w as f32 / w as f32, new_h as f32 / h as f32);

        // ── Step 2: Crop, shifting keypoints by the crop origin ──────────────
        let (left, top) = self.crop_origin(new_w, new_h, augment);
        let crop =
            imageops::crop_imm(&resized, left, top, self.crop_size, self.crop_size).to_image();
        let keypoints = keypoints.translated(-(left as f32), -(top as f32));

        // ── Step 3: Normalise both buffers ───────────────────────────────────
        FaceSample {
            pixels:    normalized_pixels(&crop),
            keypoints: normalized_keypoints(&keypoints),
            size:      self.crop_size as usize,
        }
    }

    /// Preprocess a bare image for inference: rescale, centre
    /// crop, normalise. Returns the pixel buffer and its side
    /// length.
    pub fn prepare_pixels(&self, image: &GrayImage) -> (Vec<f32>, usize) {
        let resized = self.rescale(image);
        let (new_w, new_h) = resized.dimensions();
        let (left, top) = self.crop_origin(new_w, new_h, false);
        let crop =
            imageops::crop_imm(&resized, left, top, self.crop_size, self.crop_size).to_image();
        (normalized_pixels(&crop), self.crop_size as usize)
    }

    fn rescale(&self, image: &GrayImage) -> GrayImage {
        let (w, h) = image.dimensions();
        let (new_w, new_h) = rescaled_dims(w, h, self.rescale_size);
        imageops::resize(image, new_w, new_h, imageops::FilterType::Triangle)
    }

    /// Top-left corner of the crop window. Random within bounds
    /// when augmenting, centred otherwise.
    fn crop_origin(&self, width: u32, height: u32, augment: bool) -> (u32, u32) {
        let max_dx = width - self.crop_size;
        let max_dy = height - self.crop_size;

        if augment {
            let mut rng = rand::thread_rng();
            (rng.gen_range(0..=max_dx), rng.gen_range(0..=max_dy))
        } else {
            (max_dx / 2, max_dy / 2)
        }
    }
}

/// Map network output back into crop pixel coordinates.
/// Returns None unless `values` holds exactly 136 entries.
pub fn denormalize_keypoints(values: &[f32]) -> Option<KeypointSet> {
    let flat: Vec<f32> = values
        .iter()
        .map(|v| v * KEYPOINT_SCALE + KEYPOINT_CENTER)
        .collect();
    KeypointSet::from_flat(&flat)
}

/// New dimensions with the shorter side scaled to `target` and
/// the aspect ratio preserved.
fn rescaled_dims(width: u32, height: u32, target: u32) -> (u32, u32) {
    if width <= height {
        let new_h = (height as f32 * target as f32 / width as f32).round() as u32;
        (target, new_h)
    } else {
        let new_w = (width as f32 * target as f32 / height as f32).round() as u32;
        (new_w, target)
    }
}

/// Row-major pixel values mapped from [0, 255] to [0.0, 1.0].
fn normalized_pixels(image: &GrayImage) -> Vec<f32> {
    image.as_raw().iter().map(|&p| p as f32 / 255.0).collect()
}

/// Flat keypoints mapped into the network's target range.
fn normalized_keypoints(keypoints: &KeypointSet) -> Vec<f32> {
    keypoints
        .to_flat()
        .iter()
        .map(|v| (v - KEYPOINT_CENTER) / KEYPOINT_SCALE)
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::keypoints::FLAT_LEN;
    use image::Luma;

    fn face_with_constant_keypoint(w: u32, h: u32, x: f32, y: f32) -> AnnotatedFace {
        let image = GrayImage::from_pixel(w, h, Luma([200u8]));
        let mut flat = Vec::with_capacity(FLAT_LEN);
        for _ in 0..FLAT_LEN / 2 {
            flat.push(x);
            flat.push(y);
        }
        AnnotatedFace::new("test.png", image, KeypointSet::from_flat(&flat).unwrap())
    }

    #[test]
    fn test_rescaled_dims_scales_shorter_side() {
        // Portrait: width is shorter
        assert_eq!(rescaled_dims(100, 200, 50), (50, 100));
        // Landscape: height is shorter
        assert_eq!(rescaled_dims(200, 100, 50), (100, 50));
        // Square stays square
        assert_eq!(rescaled_dims(80, 80, 50), (50, 50));
        // Upscaling is allowed
        assert_eq!(rescaled_dims(10, 20, 40), (40, 80));
    }

    #[test]
    fn test_center_crop_keypoint_arithmetic() {
        // 40x20 image rescaled to 20x10, then an 8x8 centre crop
        // at origin (6, 1). A keypoint at (20, 10) scales to
        // (10, 5) and shifts to (4, 4).
        let face = face_with_constant_keypoint(40, 20, 20.0, 10.0);
        let pre = Preprocessor::new(10, 8);
        let sample = pre.prepare(&face, false);

        assert_eq!(sample.size, 8);
        assert_eq!(sample.pixels.len(), 64);
        assert_eq!(sample.keypoints.len(), FLAT_LEN);

        let expected = (4.0 - KEYPOINT_CENTER) / KEYPOINT_SCALE;
        assert!((sample.keypoints[0] - expected).abs() < 1e-6);
        assert!((sample.keypoints[1] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_pixels_normalised_to_unit_range() {
        let face = face_with_constant_keypoint(30, 30, 15.0, 15.0);
        let pre = Preprocessor::new(12, 8);
        let sample = pre.prepare(&face, false);

        let expected = 200.0 / 255.0;
        for &p in &sample.pixels {
            assert!((p - expected).abs() < 1e-2);
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_augmented_crop_stays_in_bounds() {
        let face = face_with_constant_keypoint(64, 48, 30.0, 20.0);
        let pre = Preprocessor::new(16, 8);

        for _ in 0..20 {
            let sample = pre.prepare(&face, true);
            assert_eq!(sample.pixels.len(), 64);
            assert_eq!(sample.keypoints.len(), FLAT_LEN);
            for &p in &sample.pixels {
                assert!((0.0..=1.0).contains(&p));
            }
        }
    }

    #[test]
    fn test_prepare_pixels_matches_crop_size() {
        let image = GrayImage::from_pixel(25, 40, Luma([128u8]));
        let pre = Preprocessor::new(20, 16);
        let (pixels, size) = pre.prepare_pixels(&image);

        assert_eq!(size, 16);
        assert_eq!(pixels.len(), 16 * 16);
        for &p in &pixels {
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_denormalize_inverts_normalisation() {
        let flat: Vec<f32> = (0..FLAT_LEN).map(|i| 80.0 + i as f32).collect();
        let set = KeypointSet::from_flat(&flat).unwrap();

        let normalised = normalized_keypoints(&set);
        let restored = denormalize_keypoints(&normalised).unwrap();

        for (orig, back) in set.points().iter().zip(restored.points()) {
            assert!((orig.x - back.x).abs() < 1e-4);
            assert!((orig.y - back.y).abs() < 1e-4);
        }
    }

    #[test]
    fn test_denormalize_rejects_wrong_length() {
        assert!(denormalize_keypoints(&[0.0; 10]).is_none());
    }
}
