use std::fmt::{self, Display};
use std::path::PathBuf;

/// Errors produced by model constructors and validation routines.
#[derive(Debug)]
pub enum ModelError {
    /// The media path has no parent directory or no file name.
    InvalidMediaPath(PathBuf),
    /// The file name is empty or is not valid unicode.
    InvalidFileName(String),
    /// A stored percentage lies outside `0..=100`.
    PercentOutOfRange(u8),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidMediaPath(path) => {
                write!(f, "invalid media path: {}", path.display())
            }
            ModelError::InvalidFileName(name) => {
                write!(f, "invalid media file name: {name:?}")
            }
            ModelError::PercentOutOfRange(value) => {
                write!(f, "watch percentage {value} is outside 0..=100")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
