//! End-to-end polling passes against mock feed servers.
//!
//! Each test builds its own in-memory database and temporary body cache.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tributary::app::context::PassRequest;
use tributary::app::{AppContext, TributaryError};
use tributary::config::Config;
use tributary::rank::Query;
use tributary::store::FreshnessStore;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn rss(title: &str, items: &[(&str, &str, &[&str])]) -> String {
    let items: String = items
        .iter()
        .map(|(title, date, categories)| {
            let categories: String = categories
                .iter()
                .map(|c| format!("<category>{c}</category>"))
                .collect();
            format!(
                "<item><title>{title}</title><guid>{title}</guid>\
                 <pubDate>{date}</pubDate>{categories}</item>"
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0"?><rss version="2.0"><channel><title>{title}</title>{items}</channel></rss>"#
    )
}

fn context(dir: &tempfile::TempDir) -> AppContext {
    AppContext::in_memory(Config::default(), dir.path()).unwrap()
}

async fn serve(server: &MockServer, route: &str, body: String, cache_control: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("Cache-Control", cache_control),
        )
        .mount(server)
        .await;
}

fn titles(report: &tributary::fetcher::PassReport) -> Vec<&str> {
    report.items.iter().map(|i| i.entry.title.as_str()).collect()
}

#[tokio::test]
async fn test_first_pass_fetches_every_feed_in_date_order() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/a",
        rss("Alpha", &[("a-old", "Fri, 31 May 2024 08:00:00 GMT", &[]), ("a-new", "Sat, 01 Jun 2024 11:00:00 GMT", &[])]),
        "max-age=600",
    )
    .await;
    serve(
        &server,
        "/b",
        rss("Beta", &[("b-mid", "Sat, 01 Jun 2024 09:00:00 GMT", &[])]),
        "max-age=600",
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&dir);
    ctx.store
        .subscribe("default", &[format!("{}/a", server.uri()), format!("{}/b", server.uri())])
        .unwrap();

    let report = ctx.run(&PassRequest::default(), now()).await.unwrap();

    assert_eq!(titles(&report), vec!["a-new", "b-mid", "a-old"]);
    assert!(report.items.iter().all(|i| i.is_new));
    assert_eq!(report.summary.feeds_count, 2);
    assert_eq!(report.summary.feeds_fetched, 2);
    assert_eq!(report.summary.feeds_cached, 0);
    assert_eq!(report.summary.items_count, 3);
    assert_eq!(report.summary.items_shown, 3);
    assert!(report.persist_error.is_none());

    let saved = ctx.store.load().unwrap();
    let entry = &saved[&format!("{}/a", server.uri())];
    assert_eq!(entry.last_fetch, now());
    assert_eq!(entry.fetch_after, now() + TimeDelta::seconds(600));
}

#[tokio::test]
async fn test_second_pass_inside_backoff_window_uses_cache_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(rss("Alpha", &[("hello", "Sat, 01 Jun 2024 11:00:00 GMT", &[])]))
                .insert_header("ETag", "\"v1\"")
                .insert_header("Cache-Control", "max-age=300"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&dir);
    let url = format!("{}/feed", server.uri());
    ctx.store.subscribe("default", &[url.clone()]).unwrap();

    ctx.run(&PassRequest::default(), now()).await.unwrap();
    let after_first = ctx.store.load().unwrap()[&url].clone();

    let later = now() + TimeDelta::seconds(299);
    let report = ctx.run(&PassRequest::default(), later).await.unwrap();

    assert_eq!(titles(&report), vec!["hello"]);
    assert_eq!(report.summary.feeds_cached, 1);
    assert_eq!(report.summary.feeds_fetched, 0);
    // Not new any more: published before the previous successful fetch
    assert!(!report.items[0].is_new);
    assert_eq!(ctx.store.load().unwrap()[&url], after_first);
}

#[tokio::test]
async fn test_revalidation_sends_etag_and_handles_not_modified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("if-none-match", "\"v1\""))
        .respond_with(ResponseTemplate::new(304).insert_header("Cache-Control", "max-age=30"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(rss("Alpha", &[("hello", "Sat, 01 Jun 2024 11:00:00 GMT", &[])]))
                .insert_header("ETag", "\"v1\""),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&dir);
    let url = format!("{}/feed", server.uri());
    ctx.store.subscribe("default", &[url.clone()]).unwrap();

    ctx.run(&PassRequest::default(), now()).await.unwrap();

    let later = now() + TimeDelta::minutes(2);
    let report = ctx.run(&PassRequest::default(), later).await.unwrap();

    assert_eq!(titles(&report), vec!["hello"]);
    assert_eq!(report.summary.feeds_cached, 1);
    let entry = &ctx.store.load().unwrap()[&url];
    assert_eq!(entry.validation_token, "\"v1\"");
    assert_eq!(entry.last_fetch, now());
    assert_eq!(entry.fetch_after, later + TimeDelta::seconds(60));
}

#[tokio::test]
async fn test_rate_limited_feed_backs_off_without_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "120"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&dir);
    let url = format!("{}/feed", server.uri());
    ctx.store.subscribe("default", &[url.clone()]).unwrap();

    let report = ctx.run(&PassRequest::default(), now()).await.unwrap();

    // Nothing cached yet, so the feed has no body to show
    assert!(report.items.is_empty());
    assert_eq!(report.failures.len(), 1);
    let entry = &ctx.store.load().unwrap()[&url];
    assert_eq!(entry.fetch_after, now() + TimeDelta::seconds(120));
    assert!(!entry.has_been_fetched());
}

#[tokio::test]
async fn test_failing_feeds_do_not_affect_others() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/good",
        rss("Good", &[("one", "Sat, 01 Jun 2024 10:00:00 GMT", &[]), ("two", "Sat, 01 Jun 2024 11:00:00 GMT", &[])]),
        "max-age=60",
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/error"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    serve(&server, "/garbage", "<definitely not a feed".to_string(), "max-age=60").await;

    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&dir);
    ctx.store
        .subscribe(
            "default",
            &[
                format!("{}/good", server.uri()),
                format!("{}/error", server.uri()),
                format!("{}/garbage", server.uri()),
            ],
        )
        .unwrap();

    let report = ctx.run(&PassRequest::default(), now()).await.unwrap();

    assert_eq!(titles(&report), vec!["two", "one"]);
    assert_eq!(report.failures.len(), 2);
    let mut failed: Vec<&str> = report.failures.iter().map(|f| f.url.as_str()).collect();
    failed.sort();
    assert!(failed[0].ends_with("/error"));
    assert!(failed[1].ends_with("/garbage"));
    assert!(report
        .failures
        .iter()
        .any(|f| matches!(f.error, TributaryError::UnexpectedStatus(500))));
}

#[tokio::test]
async fn test_search_ranks_full_matches_first_and_excludes_misses() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/feed",
        rss(
            "Blog",
            &[
                ("Rust release notes", "Sat, 01 Jun 2024 08:00:00 GMT", &[]),
                ("Async in practice", "Sat, 01 Jun 2024 09:00:00 GMT", &["Rust"]),
                ("Gardening tips", "Sat, 01 Jun 2024 10:00:00 GMT", &[]),
                ("Async Rust runtimes", "Sat, 01 Jun 2024 07:00:00 GMT", &[]),
            ],
        ),
        "max-age=60",
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&dir);
    ctx.store
        .subscribe("default", &[format!("{}/feed", server.uri())])
        .unwrap();

    let request = PassRequest {
        query: Some(Query::parse("async rust").unwrap()),
        ..Default::default()
    };
    let report = ctx.run(&request, now()).await.unwrap();

    let ranked = titles(&report);
    assert_eq!(ranked.len(), 3);
    let mut full_matches = ranked[..2].to_vec();
    full_matches.sort();
    assert_eq!(full_matches, ["Async Rust runtimes", "Async in practice"]);
    assert_eq!(ranked[2], "Rust release notes");
    assert!(!ranked.contains(&"Gardening tips"));
}

#[tokio::test]
async fn test_since_and_limit() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/feed",
        rss(
            "Blog",
            &[
                ("old", "Mon, 01 Jan 2024 00:00:00 GMT", &[]),
                ("recent-1", "Sat, 01 Jun 2024 08:00:00 GMT", &[]),
                ("recent-2", "Sat, 01 Jun 2024 09:00:00 GMT", &[]),
                ("recent-3", "Sat, 01 Jun 2024 10:00:00 GMT", &[]),
            ],
        ),
        "max-age=60",
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&dir);
    ctx.store
        .subscribe("news", &[format!("{}/feed", server.uri())])
        .unwrap();

    let since = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    let request = PassRequest {
        list: Some("news".into()),
        since: Some(since),
        limit: Some(2),
        ..Default::default()
    };
    let report = ctx.run(&request, now()).await.unwrap();

    assert_eq!(titles(&report), vec!["recent-3", "recent-2"]);
    assert!(report
        .items
        .iter()
        .all(|i| i.entry.published.unwrap() >= since));
    assert_eq!(report.summary.items_shown, 2);
    assert_eq!(report.summary.items_count, 4);
}

#[tokio::test]
async fn test_no_lists_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&dir);

    let result = ctx.run(&PassRequest::default(), now()).await;
    assert!(matches!(result, Err(TributaryError::Usage(_))));
}

#[tokio::test]
async fn test_empty_list_yields_no_items() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&dir);
    ctx.store
        .subscribe("default", &["http://127.0.0.1:9/feed".into()])
        .unwrap();

    let request = PassRequest {
        list: Some("empty".into()),
        ..Default::default()
    };
    let report = ctx.run(&request, now()).await.unwrap();
    assert!(report.items.is_empty());
    assert!(report.failures.is_empty());
}
