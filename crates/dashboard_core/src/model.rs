use std::collections::BTreeMap;
use std::fmt;

/// Server-assigned identifier of a crawled URL.
pub type UrlId = u64;

/// Client-generated token naming one optimistic submission.
///
/// Lives in its own namespace so a pending row can never be mistaken for a
/// persisted one, whatever ids the server hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CorrelationId(pub u64);

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pending-{}", self.0)
    }
}

/// Identity of one row in the list cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RowId {
    Server(UrlId),
    Pending(CorrelationId),
}

impl RowId {
    pub fn server_id(self) -> Option<UrlId> {
        match self {
            RowId::Server(id) => Some(id),
            RowId::Pending(_) => None,
        }
    }

    pub fn is_pending(self) -> bool {
        matches!(self, RowId::Pending(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlStatus {
    Queued,
    Running,
    Done,
    Error,
    Other(String),
}

impl CrawlStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "running" => CrawlStatus::Running,
            "done" => CrawlStatus::Done,
            "error" => CrawlStatus::Error,
            other if other.eq_ignore_ascii_case("queued") => CrawlStatus::Queued,
            other => CrawlStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CrawlStatus::Queued => "queued",
            CrawlStatus::Running => "running",
            CrawlStatus::Done => "done",
            CrawlStatus::Error => "error",
            CrawlStatus::Other(raw) => raw,
        }
    }

    pub fn badge(&self) -> Badge {
        match self {
            CrawlStatus::Done => Badge::Success,
            CrawlStatus::Running => Badge::Warning,
            CrawlStatus::Error => Badge::Error,
            CrawlStatus::Queued => Badge::Info,
            CrawlStatus::Other(_) => Badge::Default,
        }
    }
}

/// Colour class of a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Success,
    Warning,
    Error,
    Info,
    Default,
}

/// One row of the URL list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlEntry {
    pub id: RowId,
    pub url: String,
    pub title: String,
    pub html_version: String,
    pub has_login: bool,
    pub internal_links: u32,
    pub external_links: u32,
    pub status: CrawlStatus,
    pub created_at: String,
    pub last_crawled: Option<String>,
}

impl UrlEntry {
    /// Placeholder row shown while a submission is in flight.
    pub fn optimistic(correlation: CorrelationId, url: &str, created_at: &str) -> Self {
        Self {
            id: RowId::Pending(correlation),
            url: url.to_string(),
            title: String::new(),
            html_version: String::new(),
            has_login: false,
            internal_links: 0,
            external_links: 0,
            status: CrawlStatus::Queued,
            created_at: created_at.to_string(),
            last_crawled: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenLink {
    pub url: String,
    pub status: Option<u16>,
}

/// Per-URL analysis fetched for the detail page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UrlDetail {
    pub title: String,
    pub html_version: String,
    pub internal_links: u32,
    pub external_links: u32,
    pub headings: BTreeMap<String, u32>,
    pub broken_links: Vec<BrokenLink>,
}

/// A failed request as the views see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFailure {
    pub status: Option<u16>,
    pub message: String,
}

impl RequestFailure {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
