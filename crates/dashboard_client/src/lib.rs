//! Dashboard client: HTTP access to the crawl service and background execution.
mod api;
mod auth;
mod engine;
mod types;

pub use api::{ApiSettings, CrawlApi, ReqwestApi};
pub use auth::{EnvTokenProvider, StaticToken, TokenProvider};
pub use engine::EngineHandle;
pub use types::{
    ApiError, BrokenLinkRecord, BulkKind, CrawlAccepted, EngineEvent, FailureKind, FetchPayload,
    FetchTarget, RequestId, UrlDetailRecord, UrlId, UrlRecord,
};
