//! Error enum
use std::path::PathBuf;

use thiserror::Error;

use crate::stages::Stage;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An input of `stage` (dump or earlier stage output) does not exist.
    #[error("[{stage}] missing input file {}", path.display())]
    MissingInput { stage: Stage, path: PathBuf },

    /// A document read by `stage` does not have the expected shape.
    #[error("[{stage}] invalid document {}: {reason}", path.display())]
    SchemaViolation {
        stage: Stage,
        path: PathBuf,
        reason: String,
    },

    #[error("configuration error: {0}")]
    Config(String),

    /// Re-reading an exported dictionary did not give back what was written.
    #[error("round trip mismatch: {0}")]
    RoundTrip(String),
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(e: quick_xml::events::attributes::AttrError) -> Error {
        Error::Xml(quick_xml::Error::InvalidAttr(e))
    }
}
