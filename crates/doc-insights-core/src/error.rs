//! Error taxonomy shared by every core component.
//!
//! Structural ingestion errors ([`DocqError::Configuration`],
//! [`DocqError::EmptyContent`], [`DocqError::UnsupportedFileType`]) and
//! precondition violations ([`DocqError::NoDocuments`],
//! [`DocqError::DimensionMismatch`]) always reach the caller. External
//! service failures are either swallowed with a fallback (summaries) or
//! folded into a degraded answer, depending on where they happen.

use std::fmt;

use thiserror::Error;

/// The external collaborator that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Embedding,
    Generation,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Embedding => write!(f, "embedding"),
            Service::Generation => write!(f, "generation"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DocqError {
    /// Invalid chunk size / overlap or other engine parameters.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Nothing left after extraction and trimming.
    #[error("no text could be extracted from {0}")]
    EmptyContent(String),

    #[error("unsupported file type: {0} (expected pdf or txt)")]
    UnsupportedFileType(String),

    #[error("embedding dimension mismatch: index holds {expected}-d vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("no documents have been indexed yet")]
    NoDocuments,

    #[error("{service} service error: {message}")]
    ExternalService { service: Service, message: String },
}

impl DocqError {
    /// Wrap a collaborator failure. Keeps the full `anyhow` context chain.
    pub fn external(service: Service, err: anyhow::Error) -> Self {
        DocqError::ExternalService {
            service,
            message: format!("{:#}", err),
        }
    }

    /// Short machine-readable code, used by the HTTP layer and batch reports.
    pub fn code(&self) -> &'static str {
        match self {
            DocqError::Configuration(_) => "configuration",
            DocqError::EmptyContent(_) => "empty_content",
            DocqError::UnsupportedFileType(_) => "unsupported_file_type",
            DocqError::DimensionMismatch { .. } => "dimension_mismatch",
            DocqError::NoDocuments => "no_documents",
            DocqError::ExternalService { .. } => "external_service",
        }
    }
}

pub type Result<T> = std::result::Result<T, DocqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_keeps_context_chain() {
        let err = anyhow::anyhow!("connection refused").context("POST /v1/embeddings");
        let wrapped = DocqError::external(Service::Embedding, err);
        let msg = wrapped.to_string();
        assert!(msg.starts_with("embedding service error"));
        assert!(msg.contains("connection refused"));
        assert_eq!(wrapped.code(), "external_service");
    }

    #[test]
    fn dimension_mismatch_message() {
        let err = DocqError::DimensionMismatch {
            expected: 768,
            actual: 384,
        };
        assert_eq!(
            err.to_string(),
            "embedding dimension mismatch: index holds 768-d vectors, got 384"
        );
    }
}
