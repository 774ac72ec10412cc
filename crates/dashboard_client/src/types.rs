use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub type RequestId = u64;
pub type UrlId = u64;

/// One row of `GET /urls`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub id: UrlId,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub html_version: String,
    #[serde(default)]
    pub has_login: bool,
    #[serde(default)]
    pub internal_links: u32,
    #[serde(default)]
    pub external_links: u32,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub last_crawled: Option<String>,
}

/// Body of `GET /urls/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UrlDetailRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub html_version: String,
    #[serde(default)]
    pub internal_links: u32,
    #[serde(default)]
    pub external_links: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headings: BTreeMap<String, u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub broken_links: Vec<BrokenLinkRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenLinkRecord {
    #[serde(alias = "Link", alias = "link")]
    pub url: String,
    #[serde(default, alias = "Status")]
    pub status: Option<u16>,
}

/// Acknowledgement of `POST /crawl`. The server may answer with the created
/// entry or a bare message, so every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CrawlAccepted {
    #[serde(default)]
    pub id: Option<UrlId>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub(crate) enum CrawlRequest<'a> {
    Submit { url: &'a str },
    Rerun { id: UrlId },
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Which query a fetch answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchTarget {
    Urls,
    UrlDetail(UrlId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchPayload {
    Urls(Vec<UrlRecord>),
    UrlDetail(UrlDetailRecord),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkKind {
    Recrawl,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    FetchCompleted {
        request_id: RequestId,
        target: FetchTarget,
        result: Result<FetchPayload, ApiError>,
    },
    SubmitCompleted {
        correlation: u64,
        result: Result<CrawlAccepted, ApiError>,
    },
    BulkCompleted {
        batch: u64,
        kind: BulkKind,
        failures: Vec<(UrlId, ApiError)>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self.kind {
            FailureKind::HttpStatus(code) => Some(code),
            _ => None,
        }
    }

    /// Transport failures, timeouts and 5xx answers may succeed on a retry.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            FailureKind::Network | FailureKind::Timeout => true,
            FailureKind::HttpStatus(code) => (500..600).contains(&code),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidBaseUrl,
    MissingCredential,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Cancelled,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidBaseUrl => write!(f, "invalid base url"),
            FailureKind::MissingCredential => write!(f, "missing credential"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "undecodable response"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
