// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row of training metrics per finished epoch.
//
// Metrics recorded per epoch:
//   - epoch:       the epoch number (1, 2, 3, ...)
//   - train_loss:  average MSE loss on the training set
//   - val_loss:    average MSE loss on the validation set
//   - mean_err_px: mean Euclidean distance between predicted
//                  and true landmarks, in crop pixels
//
// Output file: checkpoints/metrics.csv
//
// Example CSV output:
//   epoch,train_loss,val_loss,mean_err_px
//   1,0.412500,0.389200,31.15
//   2,0.190100,0.154300,19.62
//   ...

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

/// The metrics produced by one training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Epoch number, starting at 1
    pub epoch: usize,

    /// Average MSE loss over all training batches
    pub train_loss: f64,

    /// Average MSE loss on the validation set.
    /// Should track train_loss; divergence indicates overfitting
    pub val_loss: f64,

    /// Mean per-landmark Euclidean error on the validation set,
    /// denormalised into crop pixel units
    pub mean_err_px: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64, mean_err_px: f64) -> Self {
        Self {
            epoch,
            train_loss,
            val_loss,
            mean_err_px,
        }
    }

    /// True when this epoch beat the best validation loss so far
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Writes the per-epoch CSV so runs can be compared and plotted.
pub struct MetricsLogger {
    /// Location of the CSV inside the checkpoint directory
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Open (or start) the metrics CSV in `dir`.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");

        // Write the header only if the file is new, so an
        // interrupted run can append across restarts
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,val_loss,mean_err_px")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.2}",
            m.epoch, m.train_loss, m.val_loss, m.mean_err_px,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );

        Ok(())
    }

    /// Return the path to the metrics CSV file
    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 0.25, 0.23, 14.0);
        assert!(m.is_improvement(0.30));
        assert!(!m.is_improvement(0.20));
    }

    #[test]
    fn test_header_written_once_and_rows_append() {
        let dir = std::env::temp_dir().join(format!(
            "face-keypoints-metrics-{}",
            std::process::id()
        ));
        // Start from a clean file so line counts are predictable
        let _ = fs::remove_file(dir.join("metrics.csv"));

        let logger = MetricsLogger::new(dir.to_string_lossy().to_string()).unwrap();
        logger.log(&EpochMetrics::new(1, 0.5, 0.4, 30.0)).unwrap();
        logger.log(&EpochMetrics::new(2, 0.3, 0.25, 22.5)).unwrap();

        let contents = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "epoch,train_loss,val_loss,mean_err_px");
        assert!(lines[1].starts_with("1,0.500000,0.400000,30.00"));
        assert!(lines[2].starts_with("2,0.300000,0.250000,22.50"));
    }
}
