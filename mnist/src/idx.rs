use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

const IMAGE_MAGIC: u32 = 2051;
const LABEL_MAGIC: u32 = 2049;
const IMAGE_HEADER_LEN: u64 = 16;
const LABEL_HEADER_LEN: u64 = 8;

#[derive(Debug, Eq, PartialEq)]
pub enum MnistError {
    IoError(String),
    /// The file does not open with the expected idx magic number.
    BadMagic { expected: u32, actual: u32 },
    /// The image and label files of a set disagree on the record count.
    CountMismatch { images: usize, labels: usize },
    IndexOutOfRange { index: usize, count: usize },
}

impl From<io::Error> for MnistError {
    fn from(error: io::Error) -> Self {
        Self::IoError(error.to_string())
    }
}

impl fmt::Display for MnistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IoError(message) => write!(f, "io error: {message}"),
            Self::BadMagic { expected, actual } => {
                write!(f, "bad magic number: expected {expected}, got {actual}")
            }
            Self::CountMismatch { images, labels } => {
                write!(f, "count mismatch: {images} images but {labels} labels")
            }
            Self::IndexOutOfRange { index, count } => {
                write!(f, "index {index} is out of range for {count} records")
            }
        }
    }
}

impl std::error::Error for MnistError {}

/// An idx3-ubyte image file: a big-endian header of magic number, record
/// count, rows, and columns, followed by one byte per pixel, row-major.
/// Images are read on demand with one seek per record.
#[derive(Debug)]
pub struct ImageFile {
    file: File,
    count: u32,
    rows: u32,
    columns: u32,
}

impl ImageFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MnistError> {
        let path = path.as_ref();
        let mut file = File::open(path)?;

        let magic = read_u32(&mut file)?;
        if magic != IMAGE_MAGIC {
            return Err(MnistError::BadMagic {
                expected: IMAGE_MAGIC,
                actual: magic,
            });
        }
        let count = read_u32(&mut file)?;
        let rows = read_u32(&mut file)?;
        let columns = read_u32(&mut file)?;

        debug!(path = %path.display(), count, rows, columns, "Opened image file.");
        Ok(ImageFile {
            file,
            count,
            rows,
            columns,
        })
    }

    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn rows(&self) -> usize {
        self.rows as usize
    }

    pub fn columns(&self) -> usize {
        self.columns as usize
    }

    /// Pixels per image. Widens before multiplying so a corrupt header
    /// cannot wrap the size.
    pub fn image_len(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    /// Reads image `index` as one value per pixel, scaled into [0, 1].
    pub fn image(&mut self, index: usize) -> Result<Vec<f32>, MnistError> {
        if index >= self.len() {
            return Err(MnistError::IndexOutOfRange {
                index,
                count: self.len(),
            });
        }

        let image_len = self.image_len();
        self.file
            .seek(SeekFrom::Start(IMAGE_HEADER_LEN + (index * image_len) as u64))?;

        let mut pixels = vec![0; image_len];
        self.file.read_exact(&mut pixels)?;
        Ok(pixels.iter().map(|&pixel| pixel as f32 / 255.0).collect())
    }
}

/// An idx1-ubyte label file: a big-endian header of magic number and record
/// count, followed by one byte per label.
#[derive(Debug)]
pub struct LabelFile {
    file: File,
    count: u32,
}

impl LabelFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MnistError> {
        let path = path.as_ref();
        let mut file = File::open(path)?;

        let magic = read_u32(&mut file)?;
        if magic != LABEL_MAGIC {
            return Err(MnistError::BadMagic {
                expected: LABEL_MAGIC,
                actual: magic,
            });
        }
        let count = read_u32(&mut file)?;

        debug!(path = %path.display(), count, "Opened label file.");
        Ok(LabelFile { file, count })
    }

    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn label(&mut self, index: usize) -> Result<u8, MnistError> {
        if index >= self.len() {
            return Err(MnistError::IndexOutOfRange {
                index,
                count: self.len(),
            });
        }

        self.file
            .seek(SeekFrom::Start(LABEL_HEADER_LEN + index as u64))?;

        let mut byte = [0];
        self.file.read_exact(&mut byte)?;
        Ok(byte[0])
    }
}

fn read_u32(file: &mut File) -> Result<u32, MnistError> {
    let mut bytes = [0; 4];
    file.read_exact(&mut bytes)?;
    Ok(u32::from_be_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    use super::*;

    fn write_file(name: &str, bytes: &[u8]) -> PathBuf {
        let path = env::temp_dir().join(format!("idx_{}_{}", std::process::id(), name));
        fs::write(&path, bytes).unwrap();
        path
    }

    fn image_fixture(name: &str, images: &[[u8; 4]]) -> PathBuf {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&IMAGE_MAGIC.to_be_bytes());
        bytes.extend_from_slice(&(images.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.extend_from_slice(&2u32.to_be_bytes());
        for image in images {
            bytes.extend_from_slice(image);
        }
        write_file(name, &bytes)
    }

    fn label_fixture(name: &str, labels: &[u8]) -> PathBuf {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&LABEL_MAGIC.to_be_bytes());
        bytes.extend_from_slice(&(labels.len() as u32).to_be_bytes());
        bytes.extend_from_slice(labels);
        write_file(name, &bytes)
    }

    #[test]
    fn reads_scaled_pixels() {
        let path = image_fixture("scaled.idx3-ubyte", &[[0, 51, 102, 255]]);
        let mut images = ImageFile::open(&path).unwrap();

        assert_eq!(images.len(), 1);
        assert_eq!(images.rows(), 2);
        assert_eq!(images.columns(), 2);
        assert_eq!(images.image_len(), 4);
        assert_eq!(images.image(0).unwrap(), vec![0.0, 0.2, 0.4, 1.0]);

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn seeks_records_in_any_order() {
        let path = image_fixture(
            "seek.idx3-ubyte",
            &[[1, 1, 1, 1], [2, 2, 2, 2], [3, 3, 3, 3]],
        );
        let mut images = ImageFile::open(&path).unwrap();

        assert_eq!(images.image(2).unwrap()[0], 3.0 / 255.0);
        assert_eq!(images.image(0).unwrap()[0], 1.0 / 255.0);
        assert_eq!(images.image(1).unwrap()[3], 2.0 / 255.0);

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn reads_labels_by_index() {
        let path = label_fixture("labels.idx1-ubyte", &[7, 2, 9]);
        let mut labels = LabelFile::open(&path).unwrap();

        assert_eq!(labels.len(), 3);
        assert_eq!(labels.label(0).unwrap(), 7);
        assert_eq!(labels.label(2).unwrap(), 9);
        assert_eq!(labels.label(1).unwrap(), 2);

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn oversized_headers_do_not_wrap_the_image_len() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&IMAGE_MAGIC.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&65_536u32.to_be_bytes());
        bytes.extend_from_slice(&65_536u32.to_be_bytes());
        let path = write_file("oversized.idx3-ubyte", &bytes);

        let images = ImageFile::open(&path).unwrap();
        assert_eq!(images.image_len(), 65_536 * 65_536);
        assert!(images.is_empty());

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn rejects_a_wrong_magic_number() {
        let path = label_fixture("magic.idx1-ubyte", &[1]);
        assert_eq!(
            ImageFile::open(&path).unwrap_err(),
            MnistError::BadMagic {
                expected: IMAGE_MAGIC,
                actual: LABEL_MAGIC,
            },
        );
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn rejects_an_out_of_range_index() {
        let path = label_fixture("range.idx1-ubyte", &[1, 2]);
        let mut labels = LabelFile::open(&path).unwrap();
        assert_eq!(
            labels.label(2).unwrap_err(),
            MnistError::IndexOutOfRange { index: 2, count: 2 },
        );
        fs::remove_file(path).unwrap();
    }
}
