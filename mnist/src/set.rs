use std::path::Path;

use crate::idx::{ImageFile, LabelFile, MnistError};

/// A paired image and label file, opened together and indexed in step.
#[derive(Debug)]
pub struct DataSet {
    images: ImageFile,
    labels: LabelFile,
}

impl DataSet {
    pub fn open(images: impl AsRef<Path>, labels: impl AsRef<Path>) -> Result<Self, MnistError> {
        let images = ImageFile::open(images)?;
        let labels = LabelFile::open(labels)?;
        if images.len() != labels.len() {
            return Err(MnistError::CountMismatch {
                images: images.len(),
                labels: labels.len(),
            });
        }
        Ok(DataSet { images, labels })
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn rows(&self) -> usize {
        self.images.rows()
    }

    pub fn columns(&self) -> usize {
        self.images.columns()
    }

    /// Pixels per image.
    pub fn image_len(&self) -> usize {
        self.images.image_len()
    }

    pub fn image(&mut self, index: usize) -> Result<Vec<f32>, MnistError> {
        self.images.image(index)
    }

    pub fn label(&mut self, index: usize) -> Result<u8, MnistError> {
        self.labels.label(index)
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    use super::*;

    fn fixture(name: &str, bytes: &[u8]) -> PathBuf {
        let path = env::temp_dir().join(format!("set_{}_{}", std::process::id(), name));
        fs::write(&path, bytes).unwrap();
        path
    }

    fn image_bytes(images: &[[u8; 4]]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2051u32.to_be_bytes());
        bytes.extend_from_slice(&(images.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.extend_from_slice(&2u32.to_be_bytes());
        for image in images {
            bytes.extend_from_slice(image);
        }
        bytes
    }

    fn label_bytes(labels: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2049u32.to_be_bytes());
        bytes.extend_from_slice(&(labels.len() as u32).to_be_bytes());
        bytes.extend_from_slice(labels);
        bytes
    }

    #[test]
    fn pairs_images_with_labels() {
        let images = fixture(
            "pair.idx3-ubyte",
            &image_bytes(&[[0, 0, 0, 0], [255, 255, 255, 255]]),
        );
        let labels = fixture("pair.idx1-ubyte", &label_bytes(&[3, 8]));

        let mut set = DataSet::open(&images, &labels).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.image_len(), 4);
        assert_eq!(set.label(1).unwrap(), 8);
        assert_eq!(set.image(1).unwrap(), vec![1.0, 1.0, 1.0, 1.0]);

        fs::remove_file(images).unwrap();
        fs::remove_file(labels).unwrap();
    }

    #[test]
    fn rejects_mismatched_record_counts() {
        let images = fixture("mismatch.idx3-ubyte", &image_bytes(&[[0, 0, 0, 0]]));
        let labels = fixture("mismatch.idx1-ubyte", &label_bytes(&[1, 2]));

        assert_eq!(
            DataSet::open(&images, &labels).unwrap_err(),
            MnistError::CountMismatch {
                images: 1,
                labels: 2,
            },
        );

        fs::remove_file(images).unwrap();
        fs::remove_file(labels).unwrap();
    }
}
