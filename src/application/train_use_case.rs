// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate the run          (Layer 2)
//   Step 2: Load annotated faces     (Layer 4 - data)
//   Step 3: Split train/validation   (Layer 4 - data)
//   Step 4: Build datasets           (Layer 4 - data)
//   Step 5: Save config, set up CSV  (Layer 6 - infra)
//   Step 6: Run training loop        (Layer 5 - ml)

use anyhow::{ensure, Result};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::data::{dataset::FaceDataset, loader::KeypointCsvLoader, splitter::split_train_val};
use crate::domain::traits::SampleSource;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::model::Architecture;
use crate::ml::trainer::run_training;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Serialisable so it can be saved to disk and reloaded for inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:       String,
    pub checkpoint_dir: String,
    pub arch:           Architecture,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    /// Head dropout probability (net2/net3 variants)
    pub dropout:        f64,
    pub val_fraction:   f64,
    /// Shorter image side after rescaling
    pub rescale_size:   u32,
    /// Square crop fed to the network; 224 matches the stock
    /// variants' flatten widths
    pub crop_size:      u32,
    pub seed:           u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:       "data/faces".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            arch:           Architecture::Net,
            batch_size:     10,
            epochs:         10,
            lr:             1e-3,
            dropout:        0.2,
            val_fraction:   0.2,
            rescale_size:   250,
            crop_size:      224,
            seed:           42,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the config and runs the full training pipeline.
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    /// Create a new TrainUseCase with the given configuration
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Validate the run ─────────────────────────────────────────
        // The crop window must fit inside the rescaled image
        ensure!(
            cfg.rescale_size >= cfg.crop_size,
            "rescale size ({}) must be at least the crop size ({})",
            cfg.rescale_size,
            cfg.crop_size,
        );
        ensure!(
            (0.0..1.0).contains(&cfg.val_fraction),
            "validation fraction must be in [0, 1), got {}",
            cfg.val_fraction,
        );

        // ── Step 2: Load the annotated dataset ───────────────────────────────
        tracing::info!("Loading annotated faces from '{}'", cfg.data_dir);
        let loader = KeypointCsvLoader::new(&cfg.data_dir);
        let faces  = loader.load_all()?;
        ensure!(!faces.is_empty(), "no usable samples in '{}'", cfg.data_dir);

        // ── Step 3: Train / validation split ─────────────────────────────────
        // Seeded so the same config reproduces the same split
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let (train_faces, val_faces) =
            split_train_val(faces, 1.0 - cfg.val_fraction, &mut rng);
        tracing::info!(
            "Split: {} train, {} validation",
            train_faces.len(),
            val_faces.len()
        );

        // ── Step 4: Build Burn datasets ──────────────────────────────────────
        let train_dataset = FaceDataset::new(train_faces);
        let val_dataset   = FaceDataset::new(val_faces);

        // ── Step 5: Save config for inference, set up metrics ────────────────
        // The inferencer needs the config to rebuild the architecture
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(cfg)?;
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;

        // ── Step 6: Run training loop (Layer 5) ──────────────────────────────
        run_training(cfg, train_dataset, val_dataset, ckpt_manager, metrics)?;

        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_crop_larger_than_rescale() {
        let cfg = TrainConfig {
            rescale_size: 100,
            crop_size: 224,
            ..TrainConfig::default()
        };
        let err = TrainUseCase::new(cfg).execute().unwrap_err();
        assert!(err.to_string().contains("rescale"));
    }

    #[test]
    fn test_rejects_bad_val_fraction() {
        let cfg = TrainConfig {
            val_fraction: 1.5,
            ..TrainConfig::default()
        };
        assert!(TrainUseCase::new(cfg).execute().is_err());
    }
}
