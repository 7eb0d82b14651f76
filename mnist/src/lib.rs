pub use self::idx::{ImageFile, LabelFile, MnistError};
pub use self::set::DataSet;

mod idx;
mod set;
