use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConvertError>;

/// Errors raised while resolving a dataset.
///
/// Everything here aborts the run except [`ConvertError::VocXml`], which the
/// annotation resolver logs and turns into an empty box list.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid extension pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error(
        "synset lookup is not available; it is needed for COCO categories and \
         directory-name labels (pass --synsets <FILE>)"
    )]
    SynsetUnavailable,

    #[error("no synset found for term '{term}' (hint '{hint}')")]
    SynsetNotFound { term: String, hint: String },

    #[error("invalid synset table {}: line {line}", path.display())]
    InvalidSynsetTable { path: PathBuf, line: usize },

    #[error("attempted path traversal in archive {}: entry '{entry}'", archive.display())]
    PathTraversal { archive: PathBuf, entry: String },

    #[error("failed to read archive {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read zip archive {}: {source}", path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("failed to parse COCO annotations {}: {source}", path.display())]
    CocoJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse VOC annotation {}: {source}", path.display())]
    VocXml {
        path: PathBuf,
        #[source]
        source: quick_xml::DeError,
    },
}
