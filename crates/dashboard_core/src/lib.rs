//! Dashboard core: pure state machine, query cache and view-model helpers.
mod cache;
mod effect;
mod model;
mod msg;
mod route;
mod state;
mod submission;
mod update;
mod view_model;

pub use cache::{
    Invalidation, QueryCache, QueryData, QueryKey, QueryStatus, RequestToken, Resolution,
    Subscriber,
};
pub use effect::{BatchId, BulkAction, Effect};
pub use model::{
    Badge, BrokenLink, CorrelationId, CrawlStatus, RequestFailure, RowId, UrlDetail, UrlEntry,
    UrlId,
};
pub use msg::Msg;
pub use route::{Route, RouteError};
pub use state::{AppState, Focus, Page, PAGE_SIZES};
pub use submission::{Begun, Settled, Submissions};
pub use update::update;
pub use view_model::{
    AppViewModel, BrokenLinkRow, DetailPageView, DetailReport, LinkSplit, ListPageView, PageView,
    StatusSummary, UrlRowView, EMPTY_LIST_MESSAGE,
};
