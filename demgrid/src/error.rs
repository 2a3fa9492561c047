use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("missing header key '{key}' in {path}")]
    MissingKey { key: &'static str, path: PathBuf },

    #[error("invalid header line '{line}' in {path}")]
    HeaderLine { line: String, path: PathBuf },

    #[error("{ncols}x{nrows} grid in {path} is too large to address")]
    Dimensions {
        ncols: usize,
        nrows: usize,
        path: PathBuf,
    },

    #[error("invalid sample file len {0} for {1}, expected {2}")]
    FltLen(u64, PathBuf, u64),

    #[error("sample count {0} does not match {1}x{2} grid")]
    SampleCount(usize, usize, usize),
}
