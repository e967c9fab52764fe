//! Error taxonomy for the search pipeline
//!
//! Three families, kept apart on purpose: [`ValidationError`] never reaches
//! the network, [`SearchError`] covers dispatch and normalization, and
//! [`IdentificationError`] is specific to the image pipeline.

use thiserror::Error;

/// Fallback text when the backend returns a failure without a usable body.
pub const GENERIC_SEARCH_FAILURE: &str = "Search failed. Please try again.";

/// Input rejected by the resolver before any request is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("search query is empty")]
    EmptyQuery,

    #[error("no visual features selected")]
    NoFeaturesSelected,

    #[error("no image selected")]
    NoImageSelected,

    #[error("unsupported image type {mime} (use JPG, PNG or WEBP)")]
    InvalidFileType { mime: String },

    #[error("image is {size_bytes} bytes, above the 5 MiB limit")]
    FileTooLarge { size_bytes: u64 },
}

/// Image-pipeline failures past the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentificationError {
    #[error("no matching plant was recognized in the image")]
    NoMatch,

    #[error("image was rejected: {message}")]
    Rejected { message: String },
}

/// Anything that goes wrong between dispatch and a canonical result.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Transport-level failure: timeout, refused connection, bad TLS.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response. `message` is the backend's structured error text
    /// when one was present, otherwise [`GENERIC_SEARCH_FAILURE`].
    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("could not decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Payload matched none of the known envelope shapes.
    #[error("unrecognized response shape")]
    UnrecognizedShape,

    #[error(transparent)]
    Identification(#[from] IdentificationError),

    /// Offline fallback found no known symptom terms in the description.
    #[error("{guidance}")]
    NoSymptomsRecognized { guidance: String },
}

impl SearchError {
    /// Whether the user-initiated retry path applies. Timeouts, connection
    /// failures and 5xx responses qualify; validation-style 4xx responses
    /// and decode failures do not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(err) => !err.is_decode(),
            Self::Backend { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_transient() {
        let err = SearchError::Backend {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn test_client_errors_are_not_transient() {
        let err = SearchError::Backend {
            status: 422,
            message: "query too long".to_string(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn test_shape_and_guidance_errors_are_terminal() {
        assert!(!SearchError::UnrecognizedShape.is_transient());
        let guidance = SearchError::NoSymptomsRecognized {
            guidance: "try again".to_string(),
        };
        assert!(!guidance.is_transient());
    }

    #[test]
    fn test_backend_message_is_surfaced_verbatim() {
        let err = SearchError::Backend {
            status: 400,
            message: "Query must not be blank".to_string(),
        };
        assert_eq!(err.to_string(), "Query must not be blank");
    }
}
