//! Error types for the anbima_data library.

use std::io;
use thiserror::Error;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while fetching, parsing or writing market data.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred during read or write operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error writing CSV output.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error writing JSON output.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The document could not be retrieved.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Error parsing XML format.
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// An expected element is absent from the document.
    #[error("Missing element: {0}")]
    MissingElement(String),

    /// An expected attribute is absent from an element.
    #[error("Missing attribute {attribute} on <{element}>")]
    MissingAttribute { element: String, attribute: String },

    /// Invalid date format.
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// Invalid numeric value.
    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    /// Invalid output format specified.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Unknown credit rating.
    #[error("Invalid rating: {0}")]
    InvalidRating(String),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlError(err.to_string())
    }
}

/// Reasons a page fetch can fail.
///
/// Kept apart from [`Error`] so callers can tell a document that has not been
/// published yet from a network outage.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request never produced a response (DNS, connection, TLS, body read).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered 404: nothing is published for this URL (yet).
    #[error("no document published at {url}")]
    NotPublished { url: String },

    /// Any other non-success status.
    #[error("{url} returned HTTP status {status}")]
    Status { url: String, status: u16 },

    /// The body arrived but is not well-formed XML.
    #[error("document at {url} is not well-formed XML: {message}")]
    Malformed { url: String, message: String },
}

impl FetchError {
    /// URL of the failed request, when one was attempted.
    pub fn url(&self) -> Option<&str> {
        match self {
            FetchError::Client(_) => None,
            FetchError::Transport { url, .. }
            | FetchError::NotPublished { url }
            | FetchError::Status { url, .. }
            | FetchError::Malformed { url, .. } => Some(url),
        }
    }

    /// True when the server reported the document as missing.
    pub fn is_not_published(&self) -> bool {
        matches!(self, FetchError::NotPublished { .. })
    }
}
