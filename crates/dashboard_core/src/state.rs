use std::collections::BTreeSet;

use crate::cache::{Invalidation, QueryCache, QueryData, QueryKey, RequestToken, Resolution, Subscriber};
use crate::effect::{BatchId, BulkAction, Effect};
use crate::model::{CorrelationId, RequestFailure, UrlEntry, UrlId};
use crate::route::{Route, RouteError};
use crate::submission::Submissions;

/// Page sizes offered by the list table, smallest first.
pub const PAGE_SIZES: [usize; 3] = [5, 10, 20];

/// The page currently mounted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Page {
    /// Nothing navigated to yet.
    #[default]
    Unmounted,
    List,
    Detail(UrlId),
    /// The path did not resolve to a page.
    Invalid(RouteError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    Table,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub(crate) cache: QueryCache,
    pub(crate) submissions: Submissions,
    pub(crate) page: Page,
    pub(crate) input: String,
    pub(crate) focus: Focus,
    pub(crate) cursor: usize,
    pub(crate) page_index: usize,
    pub(crate) page_size: usize,
    pub(crate) selection: BTreeSet<UrlId>,
    pub(crate) bulk_in_flight: Option<(BatchId, BulkAction)>,
    last_batch: BatchId,
    pub(crate) banner: Option<String>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_cache(QueryCache::new())
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the state around an existing cache.
    pub fn with_cache(cache: QueryCache) -> Self {
        Self {
            cache,
            submissions: Submissions::new(),
            page: Page::Unmounted,
            input: String::new(),
            focus: Focus::Input,
            cursor: 0,
            page_index: 0,
            page_size: PAGE_SIZES[0],
            selection: BTreeSet::new(),
            bulk_in_flight: None,
            last_batch: 0,
            banner: None,
            dirty: false,
        }
    }

    /// Sets the initial table page size. Zero is ignored.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        if page_size > 0 {
            self.page_size = page_size;
        }
        self
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn submission_pending(&self) -> bool {
        self.submissions.is_pending()
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn dirty_peek(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn notify(&mut self, notified: &[Subscriber]) {
        if !notified.is_empty() {
            self.mark_dirty();
        }
    }

    pub(crate) fn set_input(&mut self, text: String) {
        if self.input != text {
            self.input = text;
            self.mark_dirty();
        }
    }

    pub(crate) fn can_submit(&self) -> bool {
        matches!(self.page, Page::List)
            && !self.input.trim().is_empty()
            && !self.submissions.is_pending()
    }

    /// Runs the optimistic submission of the current input.
    pub(crate) fn submit(&mut self, submitted_at: &str) -> Vec<Effect> {
        if !self.can_submit() {
            return Vec::new();
        }
        let url = self.input.trim().to_string();
        self.submit_url(&url, submitted_at)
    }

    /// Submits `url` regardless of form state. Each call snapshots and rolls
    /// back independently of other pending submissions.
    pub fn submit_url(&mut self, url: &str, submitted_at: &str) -> Vec<Effect> {
        let begun = self.submissions.begin(&mut self.cache, url, submitted_at);
        self.input.clear();
        self.page_index = 0;
        self.notify(&begun.notified);
        self.mark_dirty();

        let mut effects = Vec::with_capacity(2);
        if let Some(token) = begun.cancelled {
            effects.push(Effect::CancelFetch { token });
        }
        effects.push(Effect::SubmitUrl {
            correlation: begun.correlation,
            url: url.to_string(),
        });
        effects
    }

    pub(crate) fn settle_submission(
        &mut self,
        correlation: CorrelationId,
        result: Result<(), RequestFailure>,
    ) -> Vec<Effect> {
        let settled = self.submissions.settle(&mut self.cache, correlation, &result);
        self.notify(&settled.notified);
        if let Err(failure) = &result {
            let url = settled.url.as_deref().unwrap_or("URL");
            self.banner = Some(format!("Failed to submit {url}: {failure}"));
            self.mark_dirty();
        }
        self.clamp_cursor();
        invalidation_effects(settled.invalidation)
    }

    pub(crate) fn apply_fetch(
        &mut self,
        token: RequestToken,
        result: Result<QueryData, RequestFailure>,
    ) {
        match self.cache.resolve(token, result) {
            Resolution::Applied(notified) => {
                if token.key == QueryKey::Urls {
                    self.prune_selection();
                    self.clamp_cursor();
                }
                self.notify(&notified);
            }
            Resolution::Stale => {}
        }
    }

    pub(crate) fn poll(&mut self) -> Vec<Effect> {
        if self.submissions.is_pending()
            || self.cache.is_fetching(QueryKey::Urls)
            || self.cache.subscribers(QueryKey::Urls).is_empty()
        {
            return Vec::new();
        }
        invalidation_effects(self.cache.invalidate(QueryKey::Urls))
    }

    /// Unmounts the current page and mounts the one at `path`.
    pub(crate) fn navigate(&mut self, path: &str) -> Vec<Effect> {
        let next = match Route::parse(path) {
            Ok(Route::List) => Page::List,
            Ok(Route::Detail(id)) => Page::Detail(id),
            Err(err) => Page::Invalid(err),
        };
        if next == self.page {
            return Vec::new();
        }

        match self.page {
            Page::List => self.cache.unsubscribe(QueryKey::Urls, Subscriber::ListView),
            Page::Detail(id) => self
                .cache
                .unsubscribe(QueryKey::UrlDetail(id), Subscriber::DetailView),
            Page::Unmounted | Page::Invalid(_) => {}
        }

        let mut effects = Vec::new();
        let mut fetch = |token: Option<RequestToken>| {
            if let Some(token) = token {
                effects.push(Effect::Fetch { token });
            }
        };
        fetch(self.cache.subscribe(QueryKey::Urls, Subscriber::StatusBar));
        match next {
            Page::List => fetch(self.cache.subscribe(QueryKey::Urls, Subscriber::ListView)),
            Page::Detail(id) => {
                fetch(self.cache.subscribe(QueryKey::UrlDetail(id), Subscriber::DetailView))
            }
            Page::Unmounted | Page::Invalid(_) => {}
        }

        self.page = next;
        self.mark_dirty();
        effects
    }

    pub(crate) fn activate_row(&mut self) -> Vec<Effect> {
        let target = self
            .current_page_rows()
            .get(self.cursor)
            .and_then(|row| row.id.server_id());
        match target {
            Some(id) => self.navigate(&Route::Detail(id).path()),
            None => Vec::new(),
        }
    }

    pub(crate) fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => Focus::Table,
            Focus::Table => Focus::Input,
        };
        self.mark_dirty();
    }

    pub(crate) fn move_cursor(&mut self, down: bool) {
        let len = self.current_page_rows().len();
        if len == 0 {
            return;
        }
        let next = if down {
            (self.cursor + 1).min(len - 1)
        } else {
            self.cursor.saturating_sub(1)
        };
        if next != self.cursor {
            self.cursor = next;
            self.mark_dirty();
        }
    }

    pub(crate) fn toggle_selection(&mut self) {
        let Some(id) = self
            .current_page_rows()
            .get(self.cursor)
            .and_then(|row| row.id.server_id())
        else {
            return;
        };
        if !self.selection.remove(&id) {
            self.selection.insert(id);
        }
        self.mark_dirty();
    }

    pub(crate) fn turn_page(&mut self, forward: bool) {
        let count = self.page_count();
        let next = if forward {
            (self.page_index + 1).min(count.saturating_sub(1))
        } else {
            self.page_index.saturating_sub(1)
        };
        if next != self.page_index {
            self.page_index = next;
            self.cursor = 0;
            self.mark_dirty();
        }
    }

    pub(crate) fn cycle_page_size(&mut self) {
        let next = PAGE_SIZES
            .iter()
            .copied()
            .find(|size| *size > self.page_size)
            .unwrap_or(PAGE_SIZES[0]);
        self.page_size = next;
        self.page_index = 0;
        self.cursor = 0;
        self.mark_dirty();
    }

    pub(crate) fn start_bulk(&mut self, action: BulkAction) -> Vec<Effect> {
        if self.selection.is_empty() || self.bulk_in_flight.is_some() {
            return Vec::new();
        }
        self.last_batch += 1;
        let batch = self.last_batch;
        self.bulk_in_flight = Some((batch, action));
        self.mark_dirty();
        vec![Effect::RunBulk {
            batch,
            action,
            ids: self.selection.iter().copied().collect(),
        }]
    }

    pub(crate) fn settle_bulk(
        &mut self,
        batch: BatchId,
        action: BulkAction,
        failures: Vec<(UrlId, RequestFailure)>,
    ) -> Vec<Effect> {
        if self.bulk_in_flight.is_some_and(|(current, _)| current == batch) {
            self.bulk_in_flight = None;
        }
        if action == BulkAction::Delete {
            let failed: BTreeSet<UrlId> = failures.iter().map(|(id, _)| *id).collect();
            self.selection.retain(|id| failed.contains(id));
        }
        if !failures.is_empty() {
            let verb = match action {
                BulkAction::Recrawl => "Re-run",
                BulkAction::Delete => "Delete",
            };
            let details = failures
                .iter()
                .map(|(id, failure)| format!("#{id}: {failure}"))
                .collect::<Vec<_>>()
                .join("; ");
            self.banner = Some(format!(
                "{verb} failed for {} URL(s): {details}",
                failures.len()
            ));
        }
        self.mark_dirty();
        invalidation_effects(self.cache.invalidate(QueryKey::Urls))
    }

    pub(crate) fn dismiss_banner(&mut self) {
        if self.banner.take().is_some() {
            self.mark_dirty();
        }
    }

    pub(crate) fn rows(&self) -> &[UrlEntry] {
        self.cache.urls().unwrap_or(&[])
    }

    pub(crate) fn page_count(&self) -> usize {
        let len = self.rows().len();
        if len == 0 {
            1
        } else {
            len.div_ceil(self.page_size)
        }
    }

    pub(crate) fn current_page_rows(&self) -> &[UrlEntry] {
        let rows = self.rows();
        let start = (self.page_index * self.page_size).min(rows.len());
        let end = (start + self.page_size).min(rows.len());
        &rows[start..end]
    }

    fn clamp_cursor(&mut self) {
        let last_page = self.page_count() - 1;
        if self.page_index > last_page {
            self.page_index = last_page;
        }
        let len = self.current_page_rows().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    fn prune_selection(&mut self) {
        let present: BTreeSet<UrlId> = self
            .rows()
            .iter()
            .filter_map(|row| row.id.server_id())
            .collect();
        self.selection.retain(|id| present.contains(id));
    }
}

fn invalidation_effects(invalidation: Invalidation) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(2);
    if let Some(token) = invalidation.superseded {
        effects.push(Effect::CancelFetch { token });
    }
    if let Some(token) = invalidation.refetch {
        effects.push(Effect::Fetch { token });
    }
    effects
}
