pub mod bitmap;
pub mod size;

pub use bitmap::Bitmap;
pub use size::{Size, SizeParseError};
