// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs and traits that define the core concepts
// of the system.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - NO ML-specific code
//   - Only plain data types and traits

// The 68-landmark keypoint types and their flat layout
pub mod keypoints;

// A face image paired with its annotated landmarks
pub mod sample;

// Core abstractions (traits) that other layers implement
pub mod traits;
