use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnowError {
    #[error("Failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to load flake image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Logger already installed: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("Could not determine config directory")]
    NoConfigDir,
}
