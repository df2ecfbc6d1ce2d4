// ============================================================
// Layer 4 — Keypoint CSV Loader
// ============================================================
// Loads the annotated dataset from disk. Expected layout:
//
//   <data_dir>/keypoints.csv    manifest: a header row, then one
//                               row per image of the form
//                               <file>,x0,y0,x1,y1,...,x67,y67
//   <data_dir>/images/<file>    the referenced face images
//
// Images are decoded to 8-bit grayscale on load. One bad row or
// unreadable image never aborts the whole load: it is logged
// and skipped. A missing manifest IS an error, because without
// it there is no dataset at all.

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::domain::keypoints::{KeypointSet, FLAT_LEN};
use crate::domain::sample::AnnotatedFace;
use crate::domain::traits::SampleSource;

/// Manifest file name inside the data directory.
pub const MANIFEST_FILE: &str = "keypoints.csv";

/// Subdirectory of the data directory holding the face images.
pub const IMAGES_DIR: &str = "images";

/// Loads annotated faces from a keypoints.csv manifest plus an
/// images/ directory. Implements the SampleSource trait from Layer 3.
pub struct KeypointCsvLoader {
    /// Path to the dataset directory
    dir: String,
}

impl KeypointCsvLoader {
    /// Create a new loader pointed at a dataset directory
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: dir.into() }
    }
}

/// Implement the SampleSource trait so the application layer can
/// call load_all() without knowing about the CSV layout
impl SampleSource for KeypointCsvLoader {
    fn load_all(&self) -> Result<Vec<AnnotatedFace>> {
        let dir        = Path::new(&self.dir);
        let manifest   = dir.join(MANIFEST_FILE);
        let images_dir = dir.join(IMAGES_DIR);

        let csv = fs::read_to_string(&manifest)
            .with_context(|| format!("Cannot read manifest '{}'", manifest.display()))?;

        let mut faces = Vec::new();

        // First line is the column header; data rows follow.
        for (line_no, line) in csv.lines().enumerate().skip(1) {
            if line.trim().is_empty() {
                continue;
            }

            match parse_row(line) {
                Ok((file_name, keypoints)) => {
                    let image_path = images_dir.join(&file_name);
                    match load_gray_image(&image_path) {
                        Ok(image) => {
                            tracing::debug!(
                                "Loaded: {} ({}x{})",
                                file_name,
                                image.width(),
                                image.height()
                            );
                            faces.push(AnnotatedFace::new(file_name, image, keypoints));
                        }
                        // Log a warning but continue, don't fail on one bad image
                        Err(e) => {
                            tracing::warn!("Skipping '{}': {}", image_path.display(), e);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "Skipping line {} of '{}': {}",
                        line_no + 1,
                        manifest.display(),
                        e
                    );
                }
            }
        }

        tracing::info!("Successfully loaded {} annotated faces", faces.len());
        Ok(faces)
    }
}

/// Parse a single manifest row: an image file name followed by
/// exactly 136 comma-separated coordinate values.
fn parse_row(line: &str) -> Result<(String, KeypointSet)> {
    let mut fields = line.split(',');

    let file_name = fields
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| anyhow::anyhow!("missing image file name"))?
        .to_string();

    let mut values = Vec::with_capacity(FLAT_LEN);
    for field in fields {
        let v: f32 = field
            .trim()
            .parse()
            .with_context(|| format!("bad coordinate value '{}'", field.trim()))?;
        values.push(v);
    }

    let keypoints = KeypointSet::from_flat(&values).ok_or_else(|| {
        anyhow::anyhow!(
            "expected {} coordinate values, found {}",
            FLAT_LEN,
            values.len()
        )
    })?;

    Ok((file_name, keypoints))
}

/// Decode the image file at `path` as 8-bit grayscale.
fn load_gray_image(path: &Path) -> Result<image::GrayImage> {
    let img = image::open(path)
        .with_context(|| format!("Cannot open image '{}'", path.display()))?;
    Ok(img.to_luma8())
}
