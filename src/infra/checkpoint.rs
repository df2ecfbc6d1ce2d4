// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Persists trained weights through Burn's CompactRecorder and
// restores them for inference.
//
// What gets saved per checkpoint:
//   1. Model weights (.mpk.gz file)  all learned parameters
//   2. latest_epoch.json             which epoch was last saved
//   3. train_config.json             architecture + hyperparameters
//
// The config is saved separately because inference must rebuild
// the exact architecture variant (net / net2 / net3) before the
// weights can be loaded into it.
//
// File naming convention:
//   checkpoints/
//     model_epoch_1.mpk.gz   ← weights at the end of epoch 1
//     model_epoch_2.mpk.gz   ← weights at the end of epoch 2
//     ...
//     latest_epoch.json      ← number of the newest epoch on disk
//     train_config.json      ← the full training configuration
//
// save_model/load_model are generic over the module type, so the
// same manager handles every network variant.

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use std::{fs, path::PathBuf};

use crate::application::train_use_case::TrainConfig;

/// Owns the checkpoint directory and all reads/writes inside it.
pub struct CheckpointManager {
    /// Directory holding weights, config and the epoch pointer
    dir: PathBuf,
}

impl CheckpointManager {
    /// Point the manager at a directory, creating it on first use.
    pub fn new(dir: impl Into<String>) -> Self {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    /// Save model weights for a given epoch and update the
    /// latest-epoch pointer.
    pub fn save_model<B: Backend, M: Module<B>>(&self, model: &M, epoch: usize) -> Result<()> {
        // No extension here, the recorder appends .mpk.gz itself
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        // The latest-epoch pointer tells the inferencer which file to load
        let latest_path = self.dir.join("latest_epoch.json");
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| "Failed to write latest_epoch.json")?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the latest saved weights into `model`.
    ///
    /// The model must have the architecture the checkpoint was
    /// saved with (rebuild it from the stored TrainConfig first)
    /// or loading fails.
    pub fn load_model<B: Backend, M: Module<B>>(
        &self,
        model:  M,
        device: &B::Device,
    ) -> Result<M> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record: M::Record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display()
                )
            })?;

        Ok(model.load_record(record))
    }

    /// Save the training configuration to JSON.
    ///
    /// Called before training starts so the inferencer can
    /// reconstruct the exact architecture later.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Load the training configuration from JSON.
    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");

        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. \
                 Make sure you have run 'train' before 'predict'.",
                path.display()
            )
        })?;

        Ok(serde_json::from_str(&json)?)
    }

    /// Read latest_epoch.json and return the epoch number.
    /// Returns an error if training hasn't been run yet.
    fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");

        let s = fs::read_to_string(&path).with_context(|| {
            "Cannot find 'latest_epoch.json'. \
             Have you run 'train' first?"
        })?;

        Ok(serde_json::from_str::<usize>(&s)?)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::nn::{Linear, LinearConfig};

    fn temp_manager(tag: &str) -> CheckpointManager {
        let dir = std::env::temp_dir().join(format!(
            "face-keypoints-ckpt-{}-{}",
            tag,
            std::process::id()
        ));
        CheckpointManager::new(dir.to_string_lossy().to_string())
    }

    #[test]
    fn test_model_weights_round_trip() {
        let manager = temp_manager("weights");
        let device  = Default::default();

        let model: Linear<NdArray> = LinearConfig::new(4, 2).init(&device);
        manager.save_model(&model, 3).unwrap();

        // Load into a freshly initialised model of the same shape
        let fresh: Linear<NdArray> = LinearConfig::new(4, 2).init(&device);
        let loaded = manager.load_model(fresh, &device).unwrap();

        let original = model.weight.val().into_data().to_vec::<f32>().unwrap();
        let restored = loaded.weight.val().into_data().to_vec::<f32>().unwrap();
        assert_eq!(original, restored);
    }

    #[test]
    fn test_config_round_trip() {
        let manager = temp_manager("config");
        let cfg = TrainConfig::default();
        manager.save_config(&cfg).unwrap();
        assert_eq!(manager.load_config().unwrap(), cfg);
    }

    #[test]
    fn test_latest_epoch_missing_is_error() {
        let manager = temp_manager("untrained");
        assert!(manager.latest_epoch().is_err());
    }
}
