use crate::cache::{QueryData, RequestToken};
use crate::effect::{BatchId, BulkAction};
use crate::model::{CorrelationId, RequestFailure, UrlId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the URL input box.
    InputChanged(String),
    /// User submitted the current input. `submitted_at` stamps the optimistic row.
    SubmitClicked { submitted_at: String },
    /// Keyboard focus moved between the input and the table.
    FocusToggled,
    CursorUp,
    CursorDown,
    /// Toggle selection of the row under the cursor.
    SelectionToggled,
    /// Open the detail page for the row under the cursor.
    RowActivated,
    PageNext,
    PagePrev,
    PageSizeCycled,
    RerunSelectedClicked,
    DeleteSelectedClicked,
    /// Navigate to a client-side path such as `/detail/4`.
    NavigateTo(String),
    BackClicked,
    BannerDismissed,
    /// Engine answer for a query fetch.
    FetchSettled {
        token: RequestToken,
        result: Result<QueryData, RequestFailure>,
    },
    /// Engine answer for a URL submission.
    SubmissionSettled {
        correlation: CorrelationId,
        result: Result<(), RequestFailure>,
    },
    /// Engine answer for a re-run or delete batch.
    BulkSettled {
        batch: BatchId,
        action: BulkAction,
        failures: Vec<(UrlId, RequestFailure)>,
    },
    /// Periodic list refresh.
    PollTick,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
