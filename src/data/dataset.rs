use burn::data::dataset::Dataset;

use crate::domain::sample::AnnotatedFace;

/// In-memory dataset over the loaded faces. Items stay raw here:
/// rescaling, cropping and normalisation happen in the batcher,
/// so the same face can yield a different crop every epoch.
pub struct FaceDataset {
    faces: Vec<AnnotatedFace>,
}

impl FaceDataset {
    pub fn new(faces: Vec<AnnotatedFace>) -> Self {
        Self { faces }
    }
}

impl Dataset<AnnotatedFace> for FaceDataset {
    fn get(&self, index: usize) -> Option<AnnotatedFace> {
        self.faces.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.faces.len()
    }
}
