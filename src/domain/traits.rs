// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between layers are traits, so the application
// layer programs against behaviour instead of concrete types:
//   - KeypointCsvLoader implements SampleSource
//   - PredictUseCase implements KeypointPredictor
// A different dataset format or model family slots in by
// implementing the same trait.

use anyhow::Result;
use std::path::Path;

use crate::domain::keypoints::KeypointSet;
use crate::domain::sample::AnnotatedFace;

// ─── SampleSource ─────────────────────────────────────────────────────────────
/// Any component that can load annotated faces from a source.
///
/// Implementations:
///   - KeypointCsvLoader → CSV manifest + image directory
pub trait SampleSource {
    /// Load every well-formed sample the source holds.
    /// Individual bad entries are skipped; an unusable source
    /// (e.g. missing manifest) is an error.
    fn load_all(&self) -> Result<Vec<AnnotatedFace>>;
}

// ─── KeypointPredictor ────────────────────────────────────────────────────────
/// Any component that can locate facial landmarks in an image.
///
/// Implementations:
///   - PredictUseCase → runs the trained network
pub trait KeypointPredictor {
    /// Predict the 68 landmarks for the face image at `image_path`.
    /// Coordinates are in the model's crop pixel space.
    fn predict_keypoints(&self, image_path: &Path) -> Result<KeypointSet>;
}
