//! Error types for the annotator

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::label::Attribute;

#[derive(Error, Debug)]
pub enum AnnotatorError {
    /// Submission with one or more attributes unset; the caller retries
    #[error("Missing value for [{}]", attribute_list(.0))]
    MissingAttributes(Vec<Attribute>),

    #[error("Failed to create output directory {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write annotation {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to list directory {path}: {source}")]
    ListingFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),

    /// A list of files has no directory to default the output to
    #[error("An output directory is required when annotating a list of files")]
    OutputDirRequired,

    #[error("Duplicate basename '{basename}': {first} and {second}")]
    DuplicateBasename {
        basename: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Reading the user's input or writing the prompt failed
    #[error("Terminal I/O error: {0}")]
    Terminal(#[source] io::Error),

    #[error("Annotation session already completed")]
    SessionCompleted,

    #[error("Failed to serialize annotation: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn attribute_list(attributes: &[Attribute]) -> String {
    attributes
        .iter()
        .map(|attribute| attribute.name())
        .collect::<Vec<_>>()
        .join(", ")
}

impl AnnotatorError {
    /// Whether the session can continue after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AnnotatorError::MissingAttributes(_))
    }
}

pub type Result<T> = std::result::Result<T, AnnotatorError>;
