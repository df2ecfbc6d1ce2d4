// ============================================================
// Layer 3 — Keypoint Domain Types
// ============================================================
// A facial annotation is a fixed set of 68 landmark points
// (jaw line, eyebrows, nose, eyes, mouth), each an (x, y)
// position in image pixel coordinates.
//
// On disk and at the model boundary the set travels as a flat
// vector of 136 values in the order x0, y0, x1, y1, ...
// KeypointSet owns the conversion in both directions and
// rejects any flat slice that is not exactly 136 values long.

use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Number of landmark points in a full facial annotation.
pub const NUM_KEYPOINTS: usize = 68;

/// Length of the flattened representation: one x and one y per point.
pub const FLAT_LEN: usize = NUM_KEYPOINTS * 2;

/// A single landmark position in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The complete set of 68 landmarks for one face.
///
/// Invariant: always holds exactly NUM_KEYPOINTS points.
/// The constructors enforce this, so downstream code never
/// has to re-check the count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeypointSet {
    points: Vec<Keypoint>,
}

impl KeypointSet {
    /// Build a set from a flat slice laid out x0, y0, x1, y1, ...
    /// Returns None unless the slice holds exactly FLAT_LEN values.
    pub fn from_flat(values: &[f32]) -> Option<Self> {
        if values.len() != FLAT_LEN {
            return None;
        }
        let points = values
            .chunks_exact(2)
            .map(|pair| Keypoint::new(pair[0], pair[1]))
            .collect();
        Some(Self { points })
    }

    /// Flatten back to x0, y0, x1, y1, ... (always FLAT_LEN values).
    pub fn to_flat(&self) -> Vec<f32> {
        let mut flat = Vec::with_capacity(FLAT_LEN);
        for p in &self.points {
            flat.push(p.x);
            flat.push(p.y);
        }
        flat
    }

    /// All 68 points in landmark order.
    pub fn points(&self) -> &[Keypoint] {
        &self.points
    }

    /// A copy with every x multiplied by sx and every y by sy.
    /// Used when the underlying image is resized.
    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        let points = self
            .points
            .iter()
            .map(|p| Keypoint::new(p.x * sx, p.y * sy))
            .collect();
        Self { points }
    }

    /// A copy with (dx, dy) added to every point.
    /// Used when the underlying image is cropped (pass the
    /// negated crop origin).
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        let points = self
            .points
            .iter()
            .map(|p| Keypoint::new(p.x + dx, p.y + dy))
            .collect();
        Self { points }
    }
}

impl Index<usize> for KeypointSet {
    type Output = Keypoint;

    fn index(&self, i: usize) -> &Keypoint {
        &self.points[i]
    }
}

// ============================================================
// Tests
// ============================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn sample_flat() -> Vec<f32> {
        (0..FLAT_LEN).map(|i| i as f32).collect()
    }

    #[test]
    fn test_from_flat_accepts_exactly_136_values() {
        let set = KeypointSet::from_flat(&sample_flat()).unwrap();
        assert_eq!(set.points().len(), NUM_KEYPOINTS);
        assert_eq!(set[0], Keypoint::new(0.0, 1.0));
        assert_eq!(set[67], Keypoint::new(134.0, 135.0));
    }

    #[test]
    fn test_from_flat_rejects_wrong_lengths() {
        assert!(KeypointSet::from_flat(&[]).is_none());
        assert!(KeypointSet::from_flat(&[1.0; 135]).is_none());
        assert!(KeypointSet::from_flat(&[1.0; 137]).is_none());
    }

    #[test]
    fn test_to_flat_round_trips() {
        let flat = sample_flat();
        let set = KeypointSet::from_flat(&flat).unwrap();
        assert_eq!(set.to_flat(), flat);
    }

    #[test]
    fn test_scaled_multiplies_each_axis_independently() {
        let set = KeypointSet::from_flat(&sample_flat()).unwrap();
        let scaled = set.scaled(2.0, 0.5);
        assert_eq!(scaled[0], Keypoint::new(0.0, 0.5));
        assert_eq!(scaled[1], Keypoint::new(4.0, 1.5));
    }

    #[test]
    fn test_translated_shifts_every_point() {
        let set = KeypointSet::from_flat(&sample_flat()).unwrap();
        let moved = set.translated(-10.0, 5.0);
        assert_eq!(moved[0], Keypoint::new(-10.0, 6.0));
        assert_eq!(moved[67], Keypoint::new(124.0, 140.0));
    }
}
