// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code.
// No other layer builds models or touches autodiff, only
// this one.
//
// What's in this layer:
//
//   model.rs      — The three network variants
//                   • KeypointNet: five conv stages, dropout
//                     schedule, 18432→1000→136 head
//                   • KeypointNet2: four conv+batchnorm stages,
//                     1000-wide head
//                   • KeypointNet3: the same stack with a
//                     4000-wide first FC layer
//                   plus the KeypointEstimator trait they share
//
//   trainer.rs    — The training loop
//                   Forward pass, MSE loss, backward pass,
//                   Adam step, per-epoch validation, metrics
//                   and checkpoint saving
//
//   inferencer.rs — The inference engine
//                   Loads a checkpoint, preprocesses an image,
//                   runs the model, denormalises the landmarks
//
// Backend selection: CPU (NdArray) by default; building with
// the `wgpu` cargo feature switches both aliases to the GPU
// backend. Tests always run on the CPU backend.

/// The convolutional keypoint network variants
pub mod model;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Inference engine: loads a checkpoint and predicts landmarks
pub mod inferencer;

#[cfg(feature = "wgpu")]
pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;
#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;

#[cfg(not(feature = "wgpu"))]
pub type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;
#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;
