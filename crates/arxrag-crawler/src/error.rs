use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),
    #[error("IO error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("manifest serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsafe category label: {0:?}")]
    UnsafeCategory(String),
    #[error("worker pool closed")]
    PoolClosed,
}

impl CrawlError {
    /// Network failures, throttling and server errors are worth another attempt;
    /// client errors and local failures are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Listing pages that cannot be paired into article records fail the whole category.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("invalid selector {0:?}")]
    Selector(String),
    #[error("found {meta_blocks} metadata blocks but {download_links} download links")]
    CountMismatch {
        meta_blocks: usize,
        download_links: usize,
    },
    #[error("article {index} has no {field}")]
    MissingField { index: usize, field: &'static str },
    #[error("duplicate article id {0}")]
    DuplicateId(String),
    #[error("article ids disagree with download links: missing {missing:?}, unexpected {unexpected:?}")]
    IdMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
    #[error("cannot resolve link {href:?}: {reason}")]
    Link { href: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> CrawlError {
        CrawlError::Status {
            url: "https://arxiv.org/pdf/1".into(),
            status: code,
        }
    }

    #[test]
    fn server_errors_are_transient() {
        assert!(status(500).is_transient());
        assert!(status(503).is_transient());
        assert!(status(429).is_transient());
    }

    #[test]
    fn client_errors_are_not_transient() {
        assert!(!status(404).is_transient());
        assert!(!status(403).is_transient());
        assert!(!CrawlError::UnsafeCategory("..".into()).is_transient());
    }

    #[test]
    fn count_mismatch_message_names_both_counts() {
        let err = ExtractError::CountMismatch {
            meta_blocks: 3,
            download_links: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains('3'));
        assert!(msg.contains('2'));
    }
}
