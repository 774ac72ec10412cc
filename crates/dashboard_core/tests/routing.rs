use std::collections::BTreeMap;

use dashboard_core::{
    update, AppState, BrokenLink, DetailPageView, Effect, LinkSplit, Msg, PageView, QueryData,
    QueryKey, RequestFailure, RequestToken, Route, RouteError, UrlDetail,
};

fn fetches(effects: &[Effect]) -> Vec<RequestToken> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Fetch { token } => Some(*token),
            _ => None,
        })
        .collect()
}

fn detail_page(state: &AppState) -> DetailPageView {
    match state.view().page {
        PageView::Detail(detail) => detail,
        other => panic!("detail page expected, got {other:?}"),
    }
}

#[test]
fn parses_known_paths() {
    assert_eq!(Route::parse("/"), Ok(Route::List));
    assert_eq!(Route::parse(""), Ok(Route::List));
    assert_eq!(Route::parse("/detail/42"), Ok(Route::Detail(42)));
    assert_eq!(Route::parse("/detail/42/"), Ok(Route::Detail(42)));
    assert_eq!(Route::Detail(42).path(), "/detail/42");
}

#[test]
fn detail_without_id_is_a_routing_error() {
    assert_eq!(Route::parse("/detail"), Err(RouteError::MissingParam("id")));
    assert_eq!(Route::parse("/detail/"), Err(RouteError::MissingParam("id")));
    assert_eq!(
        Route::parse("/detail/abc"),
        Err(RouteError::InvalidParam {
            name: "id",
            value: "abc".to_string()
        })
    );
    assert!(matches!(Route::parse("/settings"), Err(RouteError::NotFound(_))));
}

#[test]
fn missing_id_renders_error_state() {
    let (state, effects) = update(AppState::new(), Msg::NavigateTo("/detail/".to_string()));

    assert_eq!(
        detail_page(&state),
        DetailPageView::RouteError("No ID provided in the route.".to_string())
    );
    // Only the status bar's list query is requested.
    let tokens = fetches(&effects);
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].key, QueryKey::Urls);
}

#[test]
fn detail_not_found_renders_server_message() {
    let (state, effects) = update(AppState::new(), Msg::NavigateTo("/detail/9".to_string()));
    let detail_token = fetches(&effects)
        .into_iter()
        .find(|token| token.key == QueryKey::UrlDetail(9))
        .unwrap();
    assert_eq!(detail_page(&state), DetailPageView::Loading { id: 9 });

    let (state, _) = update(
        state,
        Msg::FetchSettled {
            token: detail_token,
            result: Err(RequestFailure::new(Some(404), "url not found")),
        },
    );

    assert_eq!(
        detail_page(&state),
        DetailPageView::Error {
            id: 9,
            message: "Failed to load details: url not found".to_string()
        }
    );
}

#[test]
fn detail_report_formats_headings_and_broken_links() {
    let (state, effects) = update(AppState::new(), Msg::NavigateTo("/detail/3".to_string()));
    let token = fetches(&effects)
        .into_iter()
        .find(|token| token.key == QueryKey::UrlDetail(3))
        .unwrap();

    let detail = UrlDetail {
        title: "Example".to_string(),
        html_version: "HTML5".to_string(),
        internal_links: 3,
        external_links: 1,
        headings: BTreeMap::from([("h2".to_string(), 4), ("h1".to_string(), 1)]),
        broken_links: vec![
            BrokenLink {
                url: "https://gone.example".to_string(),
                status: Some(404),
            },
            BrokenLink {
                url: "https://odd.example".to_string(),
                status: None,
            },
        ],
    };
    let (state, _) = update(
        state,
        Msg::FetchSettled {
            token,
            result: Ok(QueryData::UrlDetail(detail)),
        },
    );

    let DetailPageView::Ready { id, report } = detail_page(&state) else {
        panic!("ready detail expected");
    };
    assert_eq!(id, 3);
    assert_eq!(
        report.headings,
        vec![("H1".to_string(), 1), ("H2".to_string(), 4)]
    );
    assert_eq!(report.links.total(), 4);
    assert!((report.links.internal_percent() - 75.0).abs() < f64::EPSILON);
    assert_eq!(report.broken_links[0].status_label, "404");
    assert_eq!(report.broken_links[1].status_label, "unknown");
}

#[test]
fn link_totals_saturate_on_huge_counts() {
    let links = LinkSplit {
        internal: u32::MAX,
        external: 7,
    };

    assert_eq!(links.total(), u32::MAX);
    assert!(links.internal_percent() <= 100.0);
}

#[test]
fn leaving_detail_unsubscribes_and_back_returns_to_list() {
    let (state, _) = update(AppState::new(), Msg::NavigateTo("/detail/5".to_string()));
    assert!(!state
        .cache()
        .subscribers(QueryKey::UrlDetail(5))
        .is_empty());

    let (state, _) = update(state, Msg::BackClicked);

    assert!(matches!(state.view().page, PageView::List(_)));
    assert!(state
        .cache()
        .subscribers(QueryKey::UrlDetail(5))
        .is_empty());
}

#[test]
fn navigating_to_current_page_is_noop() {
    let (mut state, _) = update(AppState::new(), Msg::NavigateTo("/".to_string()));
    assert!(state.consume_dirty());

    let (mut state, effects) = update(state, Msg::NavigateTo("/".to_string()));
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
}
