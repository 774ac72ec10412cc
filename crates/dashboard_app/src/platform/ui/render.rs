use chrono::{DateTime, Local};
use dashboard_core::{
    AppViewModel, Badge, DetailPageView, DetailReport, Focus, ListPageView, PageView, StatusSummary,
    UrlRowView,
};
use ratatui::layout::{Position, Rect};
use ratatui::style::{Style, Stylize};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Bar, BarChart, BarGroup, Block, Cell, List, ListItem, Paragraph, Row, Table, TableState, Wrap,
};
use ratatui::Frame;

use super::constants::{
    badge_style, CURSOR_ROW, ERROR_TEXT, FOCUSED_BORDER, HEADER_ROW, HELP_DETAIL, HELP_INPUT,
    HELP_TABLE, IDLE_BORDER, MISSING_VALUE, MUTED_TEXT, TIME_FORMAT, TITLE,
};
use super::layout;

pub fn render(frame: &mut Frame, view: &AppViewModel) {
    let screen = layout::screen(frame.area(), view.banner.is_some());

    render_header(frame, screen.header, &view.page);
    if let (Some(area), Some(message)) = (screen.banner, view.banner.as_deref()) {
        render_banner(frame, area, message);
    }
    match &view.page {
        PageView::Blank => {}
        PageView::List(list) => render_list(frame, screen.body, list),
        PageView::Detail(detail) => render_detail(frame, screen.body, detail),
    }
    render_status(frame, screen.status, &view.status_bar);
}

fn render_header(frame: &mut Frame, area: Rect, page: &PageView) {
    let help = match page {
        PageView::List(list) if list.focus == Focus::Input => HELP_INPUT,
        PageView::List(_) => HELP_TABLE,
        PageView::Detail(_) => HELP_DETAIL,
        PageView::Blank => "",
    };
    let line = Line::from(vec![
        Span::from(TITLE).bold().cyan(),
        Span::styled(format!("  {help}"), MUTED_TEXT),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_banner(frame: &mut Frame, area: Rect, message: &str) {
    let banner = Paragraph::new(Line::from(vec![
        Span::styled(message.to_string(), ERROR_TEXT),
        Span::styled("  (Esc to dismiss)", MUTED_TEXT),
    ]))
    .block(Block::bordered().border_style(ERROR_TEXT))
    .wrap(Wrap { trim: true });
    frame.render_widget(banner, area);
}

fn render_status(frame: &mut Frame, area: Rect, summary: &StatusSummary) {
    let mut spans = vec![
        Span::styled(format!("{} URLs", summary.total), MUTED_TEXT),
        Span::raw("  "),
        Span::styled(format!("queued {}", summary.queued), badge_style(Badge::Info)),
        Span::raw("  "),
        Span::styled(
            format!("running {}", summary.running),
            badge_style(Badge::Warning),
        ),
        Span::raw("  "),
        Span::styled(format!("done {}", summary.done), badge_style(Badge::Success)),
        Span::raw("  "),
        Span::styled(format!("error {}", summary.error), badge_style(Badge::Error)),
    ];
    if summary.fetching {
        spans.push(Span::styled("  refreshing...", MUTED_TEXT));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_list(frame: &mut Frame, area: Rect, list: &ListPageView) {
    let areas = layout::list_page(area);
    render_input(frame, areas.input, list);

    let table_block = Block::bordered()
        .title(format!("URLs ({})", list.total_rows))
        .border_style(border_for(list.focus == Focus::Table));

    // A failed refresh keeps the cached rows on screen.
    let blocking_error = list
        .error
        .as_deref()
        .filter(|_| list.rows.is_empty() && list.empty_message.is_none());

    if let Some(error) = blocking_error {
        let paragraph = Paragraph::new(error)
            .style(ERROR_TEXT)
            .block(table_block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, areas.table);
    } else if list.loading {
        let paragraph = Paragraph::new("Loading URLs...")
            .style(MUTED_TEXT)
            .block(table_block);
        frame.render_widget(paragraph, areas.table);
    } else if let Some(empty) = list.empty_message {
        frame.render_widget(Paragraph::new(empty).block(table_block), areas.table);
    } else {
        let rows = list.rows.iter().map(url_row);
        let table = Table::new(rows, layout::list_columns())
            .header(
                Row::new(vec![
                    "", "ID", "URL", "Title", "HTML", "Login", "Internal", "External", "Status",
                    "Last Crawled",
                ])
                .style(HEADER_ROW),
            )
            .row_highlight_style(CURSOR_ROW)
            .column_spacing(1)
            .block(table_block);
        let mut state = TableState::default().with_selected(list.cursor);
        frame.render_stateful_widget(table, areas.table, &mut state);
    }

    frame.render_widget(
        Paragraph::new(footer_line(list, blocking_error.is_none())),
        areas.footer,
    );
}

fn render_input(frame: &mut Frame, area: Rect, list: &ListPageView) {
    let (text_area, button_area) = layout::input_row(area);
    let focused = list.focus == Focus::Input;

    let input = Paragraph::new(list.input.as_str()).block(
        Block::bordered()
            .title("URL to analyze")
            .border_style(border_for(focused)),
    );
    frame.render_widget(input, text_area);

    let button_style = if list.submit_enabled {
        Style::new().bold().green()
    } else {
        MUTED_TEXT
    };
    let button = Paragraph::new(Line::from(list.submit_label).centered())
        .style(button_style)
        .block(Block::bordered().border_style(button_style));
    frame.render_widget(button, button_area);

    if focused {
        let width = u16::try_from(list.input.chars().count()).unwrap_or(u16::MAX);
        let max_x = text_area.right().saturating_sub(2);
        let x = text_area.x.saturating_add(1).saturating_add(width).min(max_x);
        frame.set_cursor_position(Position::new(x, text_area.y + 1));
    }
}

fn url_row(row: &UrlRowView) -> Row<'static> {
    let marker = if row.selected { "[x]" } else { "[ ]" };
    Row::new(vec![
        Cell::from(marker),
        Cell::from(row.id_label.clone()),
        Cell::from(row.url.clone()),
        Cell::from(or_missing(&row.title)),
        Cell::from(or_missing(&row.html_version)),
        Cell::from(row.login),
        Cell::from(row.internal_links.to_string()),
        Cell::from(row.external_links.to_string()),
        Cell::from(row.status.clone()).style(badge_style(row.badge)),
        Cell::from(format_timestamp(row.last_crawled.as_deref())),
    ])
}

fn footer_line(list: &ListPageView, show_error: bool) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!(
            "Page {}/{} · {} per page · {} selected",
            list.page_index + 1,
            list.page_count,
            list.page_size,
            list.selected_count
        ),
        MUTED_TEXT,
    )];
    if list.bulk_busy {
        spans.push(Span::styled("  working...", MUTED_TEXT));
    }
    if let Some(error) = list.error.as_ref().filter(|_| show_error) {
        spans.push(Span::styled(format!("  {error}"), ERROR_TEXT));
    }
    Line::from(spans)
}

fn render_detail(frame: &mut Frame, area: Rect, detail: &DetailPageView) {
    match detail {
        DetailPageView::RouteError(message) => {
            let paragraph = Paragraph::new(message.as_str())
                .style(ERROR_TEXT)
                .block(Block::bordered().title("URL details"));
            frame.render_widget(paragraph, area);
        }
        DetailPageView::Loading { id } => {
            let paragraph = Paragraph::new("Loading details...")
                .style(MUTED_TEXT)
                .block(Block::bordered().title(format!("URL #{id}")));
            frame.render_widget(paragraph, area);
        }
        DetailPageView::Error { id, message } => {
            let paragraph = Paragraph::new(message.as_str())
                .style(ERROR_TEXT)
                .block(Block::bordered().title(format!("URL #{id}")))
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
        }
        DetailPageView::Ready { id, report } => render_report(frame, area, *id, report),
    }
}

fn render_report(frame: &mut Frame, area: Rect, id: u64, report: &DetailReport) {
    let areas = layout::detail_page(area);

    let summary = Paragraph::new(Text::from(vec![
        Line::from(vec![
            Span::styled("Title: ", MUTED_TEXT),
            Span::raw(or_missing(&report.title)),
        ]),
        Line::from(vec![
            Span::styled("HTML Version: ", MUTED_TEXT),
            Span::raw(or_missing(&report.html_version)),
        ]),
    ]))
    .block(Block::bordered().title(format!("URL #{id}")));
    frame.render_widget(summary, areas.summary);

    let headings_block = Block::bordered().title("Headings");
    if report.headings.is_empty() {
        frame.render_widget(
            Paragraph::new("No headings found.").block(headings_block),
            areas.headings,
        );
    } else {
        let items: Vec<ListItem> = report
            .headings
            .iter()
            .map(|(tag, count)| ListItem::new(format!("{tag}: {count}")))
            .collect();
        frame.render_widget(List::new(items).block(headings_block), areas.headings);
    }

    let links = report.links;
    let chart = BarChart::default()
        .block(Block::bordered().title(format!("Links ({})", links.total())))
        .bar_width(12)
        .bar_gap(3)
        .data(BarGroup::default().bars(&[
            Bar::default()
                .value(u64::from(links.internal))
                .label(Line::from("Internal"))
                .text_value(format!("{} ({:.0}%)", links.internal, links.internal_percent()))
                .style(badge_style(Badge::Info)),
            Bar::default()
                .value(u64::from(links.external))
                .label(Line::from("External"))
                .text_value(format!("{} ({:.0}%)", links.external, links.external_percent()))
                .style(badge_style(Badge::Warning)),
        ]));
    frame.render_widget(chart, areas.links);

    let broken_block = Block::bordered().title(format!("Broken links ({})", report.broken_links.len()));
    if report.broken_links.is_empty() {
        frame.render_widget(
            Paragraph::new("No broken links found.").block(broken_block),
            areas.broken,
        );
    } else {
        let items: Vec<ListItem> = report
            .broken_links
            .iter()
            .map(|link| {
                ListItem::new(Line::from(vec![
                    Span::raw(link.url.clone()),
                    Span::styled(format!(" – Status: {}", link.status_label), ERROR_TEXT),
                ]))
            })
            .collect();
        frame.render_widget(List::new(items).block(broken_block), areas.broken);
    }
}

fn border_for(focused: bool) -> Style {
    if focused {
        FOCUSED_BORDER
    } else {
        IDLE_BORDER
    }
}

fn or_missing(value: &str) -> String {
    if value.trim().is_empty() {
        MISSING_VALUE.to_string()
    } else {
        value.to_string()
    }
}

/// Renders a server timestamp in local time. Unparsable values are shown as-is.
pub(crate) fn format_timestamp(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|value| !value.trim().is_empty()) else {
        return MISSING_VALUE.to_string();
    };
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed.with_timezone(&Local).format(TIME_FORMAT).to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::{
        update, AppState, BrokenLink, CrawlStatus, Effect, Msg, QueryData, RequestFailure, RowId,
        UrlDetail, UrlEntry,
    };
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn rendered(view: &AppViewModel) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 36)).unwrap();
        terminal.draw(|frame| render(frame, view)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn entry(id: u64, url: &str, status: CrawlStatus) -> UrlEntry {
        UrlEntry {
            id: RowId::Server(id),
            url: url.to_string(),
            title: String::new(),
            html_version: "HTML5".to_string(),
            has_login: id % 2 == 0,
            internal_links: 3,
            external_links: 1,
            status,
            created_at: "2026-10-01T08:00:00Z".to_string(),
            last_crawled: None,
        }
    }

    /// Navigates to `path` and answers every fetch with `answer`.
    fn settled(path: &str, answer: impl Fn(&Effect) -> Option<Msg>) -> AppState {
        let (mut state, effects) = update(AppState::new(), Msg::NavigateTo(path.to_string()));
        for effect in &effects {
            if let Some(msg) = answer(effect) {
                state = update(state, msg).0;
            }
        }
        state
    }

    fn fetch_settled(effect: &Effect, data: Result<QueryData, RequestFailure>) -> Option<Msg> {
        match effect {
            Effect::Fetch { token } => Some(Msg::FetchSettled {
                token: *token,
                result: data,
            }),
            _ => None,
        }
    }

    #[test]
    fn list_shows_rows_and_missing_values() {
        let state = settled("/", |effect| {
            fetch_settled(
                effect,
                Ok(QueryData::Urls(vec![
                    entry(2, "https://second.example", CrawlStatus::Done),
                    entry(1, "https://first.example", CrawlStatus::Queued),
                ])),
            )
        });

        let screen = rendered(&state.view());

        assert!(screen.contains("https://second.example"));
        assert!(screen.contains("https://first.example"));
        assert!(screen.contains("Analyze"));
        assert!(screen.contains(MISSING_VALUE));
        assert!(screen.contains("2 URLs"));
        assert!(screen.find("second").unwrap() < screen.find("first.example").unwrap());
    }

    #[test]
    fn empty_list_invites_a_submission() {
        let state = settled("/", |effect| fetch_settled(effect, Ok(QueryData::Urls(Vec::new()))));
        assert!(rendered(&state.view()).contains("No URLs found. Submit one above!"));
    }

    #[test]
    fn list_failure_is_shown_in_place_of_the_table() {
        let state = settled("/", |effect| {
            fetch_settled(effect, Err(RequestFailure::new(Some(500), "db down")))
        });
        assert!(rendered(&state.view()).contains("Failed to load URLs: db down"));
    }

    #[test]
    fn failed_refresh_keeps_rows_visible() {
        let state = settled("/", |effect| {
            fetch_settled(
                effect,
                Ok(QueryData::Urls(vec![entry(1, "https://kept.example", CrawlStatus::Done)])),
            )
        });
        let (mut state, effects) = update(state, Msg::PollTick);
        for effect in &effects {
            if let Some(msg) = fetch_settled(effect, Err(RequestFailure::new(None, "timeout"))) {
                state = update(state, msg).0;
            }
        }

        let screen = rendered(&state.view());
        assert!(screen.contains("https://kept.example"));
        assert!(screen.contains("Failed to load URLs: timeout"));
    }

    #[test]
    fn pending_submission_relabels_the_button() {
        let state = settled("/", |effect| fetch_settled(effect, Ok(QueryData::Urls(Vec::new()))));
        let (state, _) = update(state, Msg::InputChanged("https://new.example".to_string()));
        let (state, _) = update(
            state,
            Msg::SubmitClicked {
                submitted_at: "2026-10-01T09:00:00Z".to_string(),
            },
        );

        let screen = rendered(&state.view());
        assert!(screen.contains("Analyzing..."));
        assert!(screen.contains("https://new.example"));
        assert!(screen.contains("…"));
    }

    #[test]
    fn detail_report_lists_headings_links_and_broken_links() {
        let detail = UrlDetail {
            title: "Example".to_string(),
            html_version: "HTML5".to_string(),
            internal_links: 3,
            external_links: 1,
            headings: [("h2".to_string(), 4), ("h1".to_string(), 1)].into_iter().collect(),
            broken_links: vec![BrokenLink {
                url: "https://gone.example".to_string(),
                status: None,
            }],
        };
        let state = settled("/detail/7", |effect| match effect {
            Effect::Fetch { token } if token.key == dashboard_core::QueryKey::UrlDetail(7) => {
                fetch_settled(effect, Ok(QueryData::UrlDetail(detail.clone())))
            }
            _ => None,
        });

        let screen = rendered(&state.view());

        assert!(screen.contains("Title: Example"));
        assert!(screen.contains("H1: 1"));
        assert!(screen.contains("H2: 4"));
        assert!(screen.contains("3 (75%)"));
        assert!(screen.contains("https://gone.example – Status: unknown"));
    }

    #[test]
    fn detail_without_findings_says_so() {
        let state = settled("/detail/3", |effect| match effect {
            Effect::Fetch { token } if token.key == dashboard_core::QueryKey::UrlDetail(3) => {
                fetch_settled(effect, Ok(QueryData::UrlDetail(UrlDetail::default())))
            }
            _ => None,
        });

        let screen = rendered(&state.view());
        assert!(screen.contains("No headings found."));
        assert!(screen.contains("No broken links found."));
    }

    #[test]
    fn missing_route_id_is_reported() {
        let (state, _) = update(AppState::new(), Msg::NavigateTo("/detail".to_string()));
        assert!(rendered(&state.view()).contains("No ID provided in the route."));
    }

    #[test]
    fn banner_is_drawn_above_the_page() {
        let state = settled("/", |effect| fetch_settled(effect, Ok(QueryData::Urls(Vec::new()))));
        let mut view = state.view();
        view.banner = Some("Failed to submit x: Invalid URL".to_string());

        let screen = rendered(&view);
        assert!(screen.contains("Failed to submit x: Invalid URL"));
        assert!(screen.contains("Esc to dismiss"));
    }

    #[test]
    fn timestamps_fall_back_gracefully() {
        assert_eq!(format_timestamp(None), MISSING_VALUE);
        assert_eq!(format_timestamp(Some("")), MISSING_VALUE);
        assert_eq!(format_timestamp(Some("yesterday")), "yesterday");
        assert_eq!(format_timestamp(Some("2026-10-01T08:00:00Z")).len(), 19);
    }
}
