use std::collections::TryReserveError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LensletError {
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error("file system error: {0}")]
    FileSys(#[from] std::io::Error),

    #[error("out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),

    #[error("image format error: {0}")]
    ImageError(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, LensletError>;
