//! Error types for display initialization, flushing, and configuration.

use thiserror::Error;

pub type DisplayResult<T> = std::result::Result<T, DisplayError>;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("could not allocate pixel buffer for {pixels} pixels")]
    Allocation { pixels: usize },

    #[error("invalid matrix geometry {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },

    #[error("LED matrix init error: {0}")]
    Hardware(String),

    #[error("flush error: {0}")]
    Flush(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
