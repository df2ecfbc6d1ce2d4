// ============================================================
// Layer 5 — Inferencer
// ============================================================
use anyhow::Result;
use burn::prelude::*;
use image::GrayImage;

use crate::data::preprocessor::{denormalize_keypoints, Preprocessor};
use crate::domain::keypoints::{KeypointSet, FLAT_LEN};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{
    Architecture, KeypointEstimator, KeypointNet, KeypointNet2, KeypointNet2Config, KeypointNet3,
    KeypointNet3Config, KeypointNetConfig,
};
use crate::ml::InferBackend;

/// The trained variant actually found in the checkpoint.
enum LoadedModel {
    Net(KeypointNet<InferBackend>),
    Net2(KeypointNet2<InferBackend>),
    Net3(KeypointNet3<InferBackend>),
}

impl LoadedModel {
    fn forward(&self, images: Tensor<InferBackend, 4>) -> Tensor<InferBackend, 2> {
        match self {
            LoadedModel::Net(m) => m.forward(images),
            LoadedModel::Net2(m) => m.forward(images),
            LoadedModel::Net3(m) => m.forward(images),
        }
    }
}

pub struct Inferencer {
    model:        LoadedModel,
    preprocessor: Preprocessor,
    device:       <InferBackend as Backend>::Device,
}

impl Inferencer {
    /// Rebuild the architecture recorded in train_config.json and
    /// load the latest checkpointed weights into it.
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager) -> Result<Self> {
        let device = <InferBackend as Backend>::Device::default();
        let cfg = ckpt_manager.load_config()?;

        // Dropout never fires outside the autodiff backend
        let model = match cfg.arch {
            Architecture::Net => LoadedModel::Net(
                ckpt_manager.load_model(KeypointNetConfig::new().init(&device), &device)?,
            ),
            Architecture::Net2 => LoadedModel::Net2(ckpt_manager.load_model(
                KeypointNet2Config::new().with_dropout(0.0).init(&device),
                &device,
            )?),
            Architecture::Net3 => LoadedModel::Net3(ckpt_manager.load_model(
                KeypointNet3Config::new().with_dropout(0.0).init(&device),
                &device,
            )?),
        };

        tracing::info!("Model loaded from checkpoint ('{}')", cfg.arch);

        Ok(Self {
            model,
            preprocessor: Preprocessor::new(cfg.rescale_size, cfg.crop_size),
            device,
        })
    }

    /// Predict the 68 landmarks for one face image.
    /// Returned coordinates are in the crop's pixel space.
    pub fn predict(&self, image: &GrayImage) -> Result<KeypointSet> {
        // Same preprocessing as validation: rescale + centre crop
        let (pixels, size) = self.preprocessor.prepare_pixels(image);

        let input = Tensor::<InferBackend, 1>::from_floats(pixels.as_slice(), &self.device)
            .reshape([1, 1, size, size]);

        let output = self.model.forward(input);
        let values = output
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read model output: {e:?}"))?;

        denormalize_keypoints(&values).ok_or_else(|| {
            anyhow::anyhow!("Model returned {} values, expected {}", values.len(), FLAT_LEN)
        })
    }
}
