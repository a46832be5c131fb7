use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigLoadError;

#[derive(Error, Debug)]
pub enum ViewStatusError {
    #[error("failed to read view record {path}: {source}")]
    RecordRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write view record {path}: {source}")]
    RecordWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Invalid media: {0}")]
    InvalidMedia(#[from] viewstatus_model::ModelError),

    #[error(transparent)]
    Config(#[from] ConfigLoadError),
}

pub type Result<T> = std::result::Result<T, ViewStatusError>;
