//! Errors raised while loading a Final Draft document.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Cannot read screenplay {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Screenplay is not well-formed XML: {source}")]
    Xml {
        #[source]
        source: roxmltree::Error,
    },

    #[error("Not a Final Draft document: root element is <{found}>, expected <FinalDraft>.")]
    NotFinalDraft { found: String },
}
