// ============================================================
// Layer 2 — Predict Use Case
// ============================================================
// Thin orchestration around the inferencer: open the image,
// run the model, hand back domain keypoints.

use anyhow::{Context, Result};
use std::path::Path;

use crate::domain::keypoints::KeypointSet;
use crate::domain::traits::KeypointPredictor;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::Inferencer;

pub struct PredictUseCase {
    inferencer: Inferencer,
}

impl PredictUseCase {
    /// Rebuild the trained model from the checkpoint directory.
    pub fn new(checkpoint_dir: String) -> Result<Self> {
        let ckpt       = CheckpointManager::new(checkpoint_dir);
        let inferencer = Inferencer::from_checkpoint(&ckpt)?;
        Ok(Self { inferencer })
    }
}

impl KeypointPredictor for PredictUseCase {
    fn predict_keypoints(&self, image_path: &Path) -> Result<KeypointSet> {
        let image = image::open(image_path)
            .with_context(|| format!("Cannot open image '{}'", image_path.display()))?
            .to_luma8();
        self.inferencer.predict(&image)
    }
}
