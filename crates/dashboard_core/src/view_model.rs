use crate::cache::{QueryKey, QueryStatus};
use crate::model::{Badge, CrawlStatus, RowId, UrlDetail, UrlEntry, UrlId};
use crate::state::{AppState, Focus, Page};

pub const EMPTY_LIST_MESSAGE: &str = "No URLs found. Submit one above!";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub page: PageView,
    pub status_bar: StatusSummary,
    pub banner: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageView {
    #[default]
    Blank,
    List(ListPageView),
    Detail(DetailPageView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPageView {
    pub input: String,
    pub focus: Focus,
    pub submit_enabled: bool,
    pub submit_label: &'static str,
    pub loading: bool,
    pub error: Option<String>,
    pub empty_message: Option<&'static str>,
    pub rows: Vec<UrlRowView>,
    pub cursor: Option<usize>,
    pub selected_count: usize,
    pub bulk_busy: bool,
    pub page_index: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub total_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRowView {
    pub id: RowId,
    pub id_label: String,
    pub url: String,
    pub title: String,
    pub html_version: String,
    pub login: &'static str,
    pub internal_links: u32,
    pub external_links: u32,
    pub status: String,
    pub badge: Badge,
    pub last_crawled: Option<String>,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailPageView {
    /// The route could not be resolved to a URL id.
    RouteError(String),
    Loading { id: UrlId },
    Error { id: UrlId, message: String },
    Ready { id: UrlId, report: DetailReport },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailReport {
    pub title: String,
    pub html_version: String,
    pub headings: Vec<(String, u32)>,
    pub links: LinkSplit,
    pub broken_links: Vec<BrokenLinkRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkSplit {
    pub internal: u32,
    pub external: u32,
}

impl LinkSplit {
    pub fn total(&self) -> u32 {
        self.internal.saturating_add(self.external)
    }

    /// Share of internal links in percent, 0 when there are no links.
    pub fn internal_percent(&self) -> f64 {
        percent(self.internal, self.total())
    }

    pub fn external_percent(&self) -> f64 {
        percent(self.external, self.total())
    }
}

fn percent(part: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(part) * 100.0 / f64::from(total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenLinkRow {
    pub url: String,
    pub status_label: String,
}

/// Crawl status counts over the cached list, shown on every page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusSummary {
    pub total: usize,
    pub queued: usize,
    pub running: usize,
    pub done: usize,
    pub error: usize,
    pub fetching: bool,
}

impl AppState {
    pub fn view(&self) -> AppViewModel {
        let page = match self.page() {
            Page::Unmounted => PageView::Blank,
            Page::List => PageView::List(self.list_view()),
            Page::Detail(id) => PageView::Detail(self.detail_view(*id)),
            Page::Invalid(err) => PageView::Detail(DetailPageView::RouteError(err.to_string())),
        };
        AppViewModel {
            page,
            status_bar: self.status_summary(),
            banner: self.banner.clone(),
            dirty: self.dirty_peek(),
        }
    }

    fn list_view(&self) -> ListPageView {
        let cache = self.cache();
        let status = cache.status(QueryKey::Urls);
        let has_data = cache.urls().is_some();
        let rows: Vec<UrlRowView> = self
            .current_page_rows()
            .iter()
            .map(|entry| {
                let selected = entry
                    .id
                    .server_id()
                    .is_some_and(|id| self.selection.contains(&id));
                row_view(entry, selected)
            })
            .collect();
        let cursor = (self.focus == Focus::Table && !rows.is_empty()).then_some(self.cursor);
        let pending = self.submission_pending();

        ListPageView {
            input: self.input.clone(),
            focus: self.focus,
            submit_enabled: self.can_submit(),
            submit_label: if pending { "Analyzing..." } else { "Analyze" },
            loading: !has_data && matches!(status, QueryStatus::Loading | QueryStatus::Idle),
            error: cache
                .error(QueryKey::Urls)
                .map(|failure| format!("Failed to load URLs: {failure}")),
            empty_message: (has_data && self.rows().is_empty()).then_some(EMPTY_LIST_MESSAGE),
            rows,
            cursor,
            selected_count: self.selection.len(),
            bulk_busy: self.bulk_in_flight.is_some(),
            page_index: self.page_index,
            page_count: self.page_count(),
            page_size: self.page_size,
            total_rows: self.rows().len(),
        }
    }

    fn detail_view(&self, id: UrlId) -> DetailPageView {
        let cache = self.cache();
        if let Some(failure) = cache.error(QueryKey::UrlDetail(id)) {
            return DetailPageView::Error {
                id,
                message: format!("Failed to load details: {failure}"),
            };
        }
        match cache.detail(id) {
            Some(detail) => DetailPageView::Ready {
                id,
                report: detail_report(detail),
            },
            None => DetailPageView::Loading { id },
        }
    }

    fn status_summary(&self) -> StatusSummary {
        let mut summary = StatusSummary {
            fetching: self.cache().is_fetching(QueryKey::Urls),
            ..StatusSummary::default()
        };
        for entry in self.rows() {
            summary.total += 1;
            match entry.status {
                CrawlStatus::Queued => summary.queued += 1,
                CrawlStatus::Running => summary.running += 1,
                CrawlStatus::Done => summary.done += 1,
                CrawlStatus::Error => summary.error += 1,
                CrawlStatus::Other(_) => {}
            }
        }
        summary
    }
}

fn row_view(entry: &UrlEntry, selected: bool) -> UrlRowView {
    UrlRowView {
        id: entry.id,
        id_label: match entry.id {
            RowId::Server(id) => id.to_string(),
            RowId::Pending(_) => "…".to_string(),
        },
        url: entry.url.clone(),
        title: entry.title.clone(),
        html_version: entry.html_version.clone(),
        login: if entry.has_login { "Yes" } else { "No" },
        internal_links: entry.internal_links,
        external_links: entry.external_links,
        status: entry.status.as_str().to_string(),
        badge: entry.status.badge(),
        last_crawled: entry.last_crawled.clone(),
        selected,
    }
}

fn detail_report(detail: &UrlDetail) -> DetailReport {
    DetailReport {
        title: detail.title.clone(),
        html_version: detail.html_version.clone(),
        headings: detail
            .headings
            .iter()
            .map(|(tag, count)| (tag.to_uppercase(), *count))
            .collect(),
        links: LinkSplit {
            internal: detail.internal_links,
            external: detail.external_links,
        },
        broken_links: detail
            .broken_links
            .iter()
            .map(|link| BrokenLinkRow {
                url: link.url.clone(),
                status_label: link
                    .status
                    .map_or_else(|| "unknown".to_string(), |code| code.to_string()),
            })
            .collect(),
    }
}
