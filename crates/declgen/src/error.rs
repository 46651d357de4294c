use crate::input::ParseError;
use std::path::PathBuf;

/// Errors from [`generate`](crate::generate) and config loading.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{count} unsupported type expression(s) in strict mode")]
    Unsupported { count: usize },
}
