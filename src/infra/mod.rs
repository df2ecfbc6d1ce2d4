// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong in any specific
// business layer:
//
//   checkpoint.rs — Saving and loading model weights.
//                   Uses Burn's CompactRecorder to serialise
//                   parameters to disk, and saves/loads the
//                   TrainConfig as JSON so inference can
//                   rebuild the same architecture variant.
//
//   metrics.rs    — Training metrics logging.
//                   Writes epoch-level metrics (losses, mean
//                   pixel error) to a CSV file for later
//                   analysis and plotting.

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
