use dashboard_core::{
    update, AppState, CrawlStatus, Effect, Msg, QueryCache, QueryData, QueryKey, QueryStatus,
    RequestFailure, Resolution, RowId, Subscriber, UrlDetail, UrlEntry,
};

fn entry(id: u64) -> UrlEntry {
    UrlEntry {
        id: RowId::Server(id),
        url: format!("https://{id}.example"),
        title: String::new(),
        html_version: String::new(),
        has_login: false,
        internal_links: 0,
        external_links: 0,
        status: CrawlStatus::Running,
        created_at: "2026-10-01T08:00:00Z".to_string(),
        last_crawled: None,
    }
}

fn urls(ids: &[u64]) -> QueryData {
    QueryData::Urls(ids.iter().copied().map(entry).collect())
}

#[test]
fn concurrent_subscribers_share_one_fetch() {
    let mut cache = QueryCache::new();

    let first = cache.subscribe(QueryKey::Urls, Subscriber::StatusBar);
    let second = cache.subscribe(QueryKey::Urls, Subscriber::ListView);

    assert!(first.is_some());
    assert_eq!(second, None);
    assert_eq!(cache.status(QueryKey::Urls), QueryStatus::Loading);

    let notified = match cache.resolve(first.unwrap(), Ok(urls(&[1]))) {
        Resolution::Applied(notified) => notified,
        Resolution::Stale => panic!("current fetch must apply"),
    };
    assert_eq!(notified, vec![Subscriber::ListView, Subscriber::StatusBar]);
}

#[test]
fn mounting_list_page_issues_a_single_request() {
    let (_state, effects) = update(AppState::new(), Msg::NavigateTo("/".to_string()));

    let fetches: Vec<_> = effects
        .iter()
        .filter(|effect| matches!(effect, Effect::Fetch { .. }))
        .collect();
    assert_eq!(fetches.len(), 1);
}

#[test]
fn late_response_after_cancel_is_discarded() {
    let mut cache = QueryCache::new();
    let token = cache.subscribe(QueryKey::Urls, Subscriber::ListView).unwrap();
    cache.set(QueryKey::Urls, urls(&[1, 2]));

    assert_eq!(cache.cancel_in_flight(QueryKey::Urls), Some(token));
    cache.set(QueryKey::Urls, urls(&[9, 1, 2]));

    assert_eq!(cache.resolve(token, Ok(urls(&[1]))), Resolution::Stale);
    assert_eq!(cache.urls().unwrap().len(), 3);
}

#[test]
fn invalidate_supersedes_in_flight_fetch() {
    let mut cache = QueryCache::new();
    let old = cache.subscribe(QueryKey::Urls, Subscriber::ListView).unwrap();

    let invalidation = cache.invalidate(QueryKey::Urls);
    assert_eq!(invalidation.superseded, Some(old));
    let fresh = invalidation.refetch.unwrap();
    assert!(fresh.generation > old.generation);

    assert_eq!(cache.resolve(old, Ok(urls(&[1]))), Resolution::Stale);
    assert!(matches!(
        cache.resolve(fresh, Ok(urls(&[1, 2]))),
        Resolution::Applied(_)
    ));
    assert_eq!(cache.urls().unwrap().len(), 2);
    assert!(!cache.is_stale(QueryKey::Urls));
}

#[test]
fn invalidate_without_subscribers_defers_refetch_to_next_subscribe() {
    let mut cache = QueryCache::new();
    cache.set(QueryKey::Urls, urls(&[1]));

    let invalidation = cache.invalidate(QueryKey::Urls);
    assert_eq!(invalidation.refetch, None);
    assert!(cache.is_stale(QueryKey::Urls));

    assert!(cache.subscribe(QueryKey::Urls, Subscriber::ListView).is_some());
}

#[test]
fn fresh_observed_data_is_not_refetched_for_another_subscriber() {
    let mut cache = QueryCache::new();
    let token = cache.subscribe(QueryKey::Urls, Subscriber::StatusBar).unwrap();
    cache.resolve(token, Ok(urls(&[1])));

    assert_eq!(cache.subscribe(QueryKey::Urls, Subscriber::ListView), None);
}

#[test]
fn set_notifies_every_subscriber_of_the_key_only() {
    let mut cache = QueryCache::new();
    cache.subscribe(QueryKey::Urls, Subscriber::ListView);
    cache.subscribe(QueryKey::Urls, Subscriber::StatusBar);
    cache.subscribe(QueryKey::UrlDetail(4), Subscriber::DetailView);

    let notified = cache.set(QueryKey::Urls, urls(&[1]));
    assert_eq!(notified, vec![Subscriber::ListView, Subscriber::StatusBar]);

    let notified = cache.set(QueryKey::UrlDetail(4), QueryData::UrlDetail(UrlDetail::default()));
    assert_eq!(notified, vec![Subscriber::DetailView]);
}

#[test]
fn failed_refresh_keeps_last_data() {
    let mut cache = QueryCache::new();
    let token = cache.subscribe(QueryKey::Urls, Subscriber::ListView).unwrap();
    cache.resolve(token, Ok(urls(&[1])));

    let refresh = cache.invalidate(QueryKey::Urls).refetch.unwrap();
    cache.resolve(refresh, Err(RequestFailure::new(Some(502), "bad gateway")));

    assert_eq!(cache.status(QueryKey::Urls), QueryStatus::Error);
    assert_eq!(cache.urls().unwrap().len(), 1);
    assert_eq!(cache.error(QueryKey::Urls).unwrap().status, Some(502));
}

#[test]
fn generations_are_unique_across_keys() {
    let mut cache = QueryCache::new();
    let a = cache.subscribe(QueryKey::Urls, Subscriber::ListView).unwrap();
    let b = cache
        .subscribe(QueryKey::UrlDetail(1), Subscriber::DetailView)
        .unwrap();

    assert_ne!(a.generation, b.generation);
    assert_eq!(cache.resolve(b, Ok(QueryData::UrlDetail(UrlDetail::default()))), Resolution::Applied(vec![Subscriber::DetailView]));
    assert!(cache.is_fetching(QueryKey::Urls));
}
