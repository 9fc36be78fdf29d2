use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),
    #[error("{program} failed: {message}")]
    Toolchain { program: String, message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
