// ============================================================
// Layer 3 — AnnotatedFace Domain Type
// ============================================================
// Represents one training example as loaded from disk:
// a grayscale face image together with its 68 annotated
// landmarks, both still in the ORIGINAL image coordinate
// space. Rescaling, cropping and normalisation happen later
// in the data layer. The domain type stays raw.

use image::GrayImage;

use crate::domain::keypoints::KeypointSet;

/// A face image plus its ground-truth landmarks.
#[derive(Debug, Clone)]
pub struct AnnotatedFace {
    /// The image file name, kept so warnings and errors
    /// can name the offending file
    pub source: String,

    /// 8-bit single-channel pixel buffer
    pub image: GrayImage,

    /// The 68 annotated landmarks, in pixel coordinates
    /// of `image` (not yet normalised)
    pub keypoints: KeypointSet,
}

impl AnnotatedFace {
    pub fn new(source: impl Into<String>, image: GrayImage, keypoints: KeypointSet) -> Self {
        Self {
            source: source.into(),
            image,
            keypoints,
        }
    }
}
