use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConvertError>;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("i/o error on {}: {}", path.display(), source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("no data found in {}", path.display())]
    NoData { path: PathBuf },
    #[error("nothing to render: empty track list")]
    EmptyTracks,
    #[error("generated {format} is not well-formed xml: {source}")]
    SelfCheck {
        format: &'static str,
        #[source]
        source: xml::reader::Error,
    },
    #[error("kmz packaging failed: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl ConvertError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }
}
