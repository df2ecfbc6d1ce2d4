// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from raw image files to device-ready tensor
// batches.
//
// The pipeline flows in this order:
//
//   keypoints.csv + images/
//       │
//       ▼
//   KeypointCsvLoader → reads the manifest, decodes grayscale
//       │
//       ▼
//   split_train_val   → seeded shuffle into train/validation
//       │
//       ▼
//   FaceDataset       → implements Burn's Dataset trait
//       │
//       ▼
//   FaceBatcher       → preprocesses (rescale, crop, normalise)
//       │               and stacks samples into tensor batches
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Each module is responsible for exactly one step.

/// Loads the CSV manifest and its grayscale images
pub mod loader;

/// Rescales, crops and normalises faces and keypoints
pub mod preprocessor;

/// Implements Burn's Dataset trait over annotated faces
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
