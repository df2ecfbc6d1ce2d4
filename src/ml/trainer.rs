// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full train + validation loop using Burn's DataLoader and Adam.
//
// Backend handling:
//   - Training runs on TrainBackend (Autodiff) for gradients
//   - model.valid() returns the model on InferBackend
//   - The validation batcher must also use InferBackend
//   - Both backends share the same device value
//
// The loop is generic over the network variant: run_training
// dispatches on the configured architecture, and train_loop
// only needs the KeypointEstimator surface.

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::FaceBatcher,
    dataset::FaceDataset,
    preprocessor::{Preprocessor, KEYPOINT_SCALE},
};
use crate::domain::keypoints::NUM_KEYPOINTS;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::model::{
    Architecture, KeypointEstimator, KeypointNet2Config, KeypointNet3Config, KeypointNetConfig,
};
use crate::ml::{InferBackend, TrainBackend};

/// Build the configured architecture and run the epoch loop on it.
pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: FaceDataset,
    val_dataset:   FaceDataset,
    ckpt_manager:  CheckpointManager,
    metrics:       MetricsLogger,
) -> Result<()> {
    let device: <TrainBackend as Backend>::Device = Default::default();
    tracing::info!("Using device {:?}, architecture '{}'", device, cfg.arch);

    match cfg.arch {
        Architecture::Net => {
            let model = KeypointNetConfig::new().init::<TrainBackend>(&device);
            train_loop(cfg, model, train_dataset, val_dataset, ckpt_manager, metrics, device)
        }
        Architecture::Net2 => {
            let model = KeypointNet2Config::new()
                .with_dropout(cfg.dropout)
                .init::<TrainBackend>(&device);
            train_loop(cfg, model, train_dataset, val_dataset, ckpt_manager, metrics, device)
        }
        Architecture::Net3 => {
            let model = KeypointNet3Config::new()
                .with_dropout(cfg.dropout)
                .init::<TrainBackend>(&device);
            train_loop(cfg, model, train_dataset, val_dataset, ckpt_manager, metrics, device)
        }
    }
}

fn train_loop<M>(
    cfg:           &TrainConfig,
    mut model: M,
    train_dataset: FaceDataset,
    val_dataset:   FaceDataset,
    ckpt_manager:  CheckpointManager,
    metrics:       MetricsLogger,
    device:        <TrainBackend as Backend>::Device,
) -> Result<()>
where
    M: AutodiffModule<TrainBackend> + KeypointEstimator<TrainBackend>,
    M::InnerModule: KeypointEstimator<InferBackend>,
{
    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let optim_cfg = AdamConfig::new().with_epsilon(1e-8);
    let mut optim = optim_cfg.init::<TrainBackend, M>();

    let preprocessor = Preprocessor::new(cfg.rescale_size, cfg.crop_size);

    // ── Training data loader (autodiff backend, random crops) ─────────────────
    let train_batcher =
        FaceBatcher::<TrainBackend>::new(device.clone(), preprocessor.clone(), true);
    let train_loader = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_dataset);

    // ── Validation data loader (inner backend, centre crops) ──────────────────
    let val_batcher = FaceBatcher::<InferBackend>::new(device.clone(), preprocessor, false);
    let val_loader = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    let mut best_val_loss = f64::INFINITY;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let (loss, _) = model.forward_loss(batch.images, batch.keypoints);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            train_loss_sum += loss_val;
            train_batches  += 1;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else {
            f64::NAN
        };

        // ── Validation phase ──────────────────────────────────────────────────
        // valid() puts the model on the inner backend: dropout
        // inactive, batch norm on running statistics
        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;
        let mut err_px_sum   = 0.0f64;
        let mut val_samples  = 0usize;

        for batch in val_loader.iter() {
            let n = batch.keypoints.dims()[0];
            let (loss, output) = model_valid.forward_loss(batch.images, batch.keypoints.clone());

            val_loss_sum += loss.into_scalar().elem::<f64>();
            val_batches  += 1;

            err_px_sum  += mean_keypoint_error_px(output, batch.keypoints) * n as f64;
            val_samples += n;
        }

        let avg_val_loss = if val_batches > 0 {
            val_loss_sum / val_batches as f64
        } else {
            f64::NAN
        };
        let mean_err_px = if val_samples > 0 {
            err_px_sum / val_samples as f64
        } else {
            f64::NAN
        };

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | mean_err={:.1}px",
            epoch, cfg.epochs, avg_train_loss, avg_val_loss, mean_err_px,
        );

        let epoch_metrics = EpochMetrics::new(epoch, avg_train_loss, avg_val_loss, mean_err_px);
        if epoch_metrics.is_improvement(best_val_loss) {
            best_val_loss = epoch_metrics.val_loss;
            tracing::info!("New best validation loss: {:.4}", best_val_loss);
        }
        metrics.log(&epoch_metrics)?;

        ckpt_manager.save_model::<TrainBackend, _>(&model, epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);
    }

    tracing::info!("Training complete!");
    Ok(())
}

/// Mean Euclidean distance between predicted and target landmarks,
/// converted from normalised units back to crop pixels.
fn mean_keypoint_error_px<B: Backend>(predictions: Tensor<B, 2>, targets: Tensor<B, 2>) -> f64 {
    let [batch_size, _] = predictions.dims();

    // Differences in normalised units scale back to pixels
    let diff = (predictions - targets).mul_scalar(KEYPOINT_SCALE);
    let sq = diff.clone() * diff;

    // Pair up x/y per landmark, then distance per landmark
    let dist = sq
        .reshape([batch_size, NUM_KEYPOINTS, 2])
        .sum_dim(2)
        .sqrt();

    dist.mean().into_scalar().elem::<f64>()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::keypoints::FLAT_LEN;
    use burn::backend::NdArray;

    #[test]
    fn test_zero_error_for_identical_tensors() {
        let device = Default::default();
        let targets = Tensor::<NdArray, 2>::full([3, FLAT_LEN], 0.4, &device);
        let err = mean_keypoint_error_px(targets.clone(), targets);
        assert!(err.abs() < 1e-6);
    }

    #[test]
    fn test_uniform_offset_error() {
        // An offset of 0.1 normalised units on every coordinate is
        // 5 px per axis, so each landmark is off by 5·√2 px
        let device = Default::default();
        let targets = Tensor::<NdArray, 2>::zeros([2, FLAT_LEN], &device);
        let predictions = Tensor::<NdArray, 2>::full([2, FLAT_LEN], 0.1, &device);

        let err = mean_keypoint_error_px(predictions, targets);
        assert!((err - 5.0 * 2.0_f64.sqrt()).abs() < 1e-3);
    }

    #[test]
    fn test_single_axis_offset_error() {
        // Only the x coordinates are off, by 0.2 normalised = 10 px
        let device = Default::default();
        let mut values = vec![0.0f32; FLAT_LEN];
        for i in (0..FLAT_LEN).step_by(2) {
            values[i] = 0.2;
        }
        let predictions = Tensor::<NdArray, 1>::from_floats(values.as_slice(), &device)
            .reshape([1, FLAT_LEN]);
        let targets = Tensor::<NdArray, 2>::zeros([1, FLAT_LEN], &device);

        let err = mean_keypoint_error_px(predictions, targets);
        assert!((err - 10.0).abs() < 1e-3);
    }
}
