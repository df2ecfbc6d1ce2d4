// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles the loaded samples and cuts them into two sets:
//   - Training set:   drives the weight updates
//   - Validation set: measures error on faces never trained on
//
// The caller passes the RNG, so a seeded run reproduces the
// exact same split. Shuffling first keeps both sets a
// representative mix even when the manifest is ordered.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.

use rand::{seq::SliceRandom, Rng};

/// Shuffle `samples` with `rng` and split into (train, validation).
///
/// # Arguments
/// * `samples`        - Everything the loader produced (consumed here)
/// * `train_fraction` - Share that goes to training, e.g. 0.8 = 80%
/// * `rng`            - Seed it for reproducible splits
pub fn split_train_val<T>(
    mut samples: Vec<T>,
    train_fraction: f64,
    rng: &mut impl Rng,
) -> (Vec<T>, Vec<T>) {
    // Fisher-Yates shuffle: every permutation is equally likely
    samples.shuffle(rng);

    // e.g. 100 faces * 0.8 = the first 80 become training data
    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction).round() as usize;

    // Rounding may overshoot on tiny datasets, clamp to the length
    let split_at = split_at.min(total);

    // split_off leaves [..n] in place and hands back [n..]
    let val = samples.split_off(split_at);

    tracing::debug!(
        "Split {} samples: {} train, {} validation ({}% / {}%)",
        total,
        samples.len(),
        val.len(),
        (samples.len() * 100) / total.max(1),
        (val.len()     * 100) / total.max(1),
    );

    (samples, val)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let mut rng           = StdRng::seed_from_u64(42);
        let (train, val)      = split_train_val(items, 0.8, &mut rng);
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(),   20);
    }

    #[test]
    fn test_all_items_preserved() {
        // No items should be lost in the split
        let items: Vec<usize> = (0..50).collect();
        let mut rng           = StdRng::seed_from_u64(7);
        let (mut train, val)  = split_train_val(items, 0.7, &mut rng);
        train.extend(val);
        train.sort_unstable();
        assert_eq!(train, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_dataset() {
        let items: Vec<usize> = Vec::new();
        let mut rng           = StdRng::seed_from_u64(42);
        let (train, val)      = split_train_val(items, 0.8, &mut rng);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }

    #[test]
    fn test_full_training_split() {
        // 1.0 fraction means everything goes to training
        let items: Vec<usize> = (0..10).collect();
        let mut rng           = StdRng::seed_from_u64(42);
        let (train, val)      = split_train_val(items, 1.0, &mut rng);
        assert_eq!(train.len(), 10);
        assert!(val.is_empty());
    }

    #[test]
    fn test_same_seed_reproduces_split() {
        let make = || -> (Vec<usize>, Vec<usize>) {
            let mut rng = StdRng::seed_from_u64(99);
            split_train_val((0..30).collect(), 0.8, &mut rng)
        };
        assert_eq!(make(), make());
    }
}
