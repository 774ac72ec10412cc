use crate::cache::RequestToken;
use crate::model::{CorrelationId, UrlId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch the query named by `token.key`; answer with `Msg::FetchSettled`.
    Fetch { token: RequestToken },
    /// Abort an in-flight fetch.
    CancelFetch { token: RequestToken },
    SubmitUrl {
        correlation: CorrelationId,
        url: String,
    },
    RunBulk {
        batch: BatchId,
        action: BulkAction,
        ids: Vec<UrlId>,
    },
}

pub type BatchId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Recrawl,
    Delete,
}
