use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Map, Value};

use iris_core::{
    analytics::{EventRepository, PageStat, TimeWindow, VitalStat},
    error::RepositoryError,
    event::{Event, PAGEVIEW, WEB_VITAL},
};
use iris_duckdb::DuckDbBackend;

fn repo() -> Arc<dyn EventRepository> {
    Arc::new(DuckDbBackend::open_in_memory().expect("in-memory DuckDB"))
}

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).single().expect("valid time")
}

fn event(domain: &str, name: &str, url: &str) -> Event {
    Event {
        id: uuid::Uuid::new_v4().to_string(),
        event_name: name.to_string(),
        url: url.to_string(),
        domain: domain.to_string(),
        referrer: String::new(),
        screen_width: 1440,
        site_id: "site_1".to_string(),
        session_id: "sess_1".to_string(),
        visitor_id: "visitor_1".to_string(),
        properties: None,
        timestamp: at(2026, 3, 10, 12),
    }
}

fn pageview(domain: &str, url: &str) -> Event {
    event(domain, PAGEVIEW, url)
}

fn vital(domain: &str, props: Value) -> Event {
    let mut e = event(domain, WEB_VITAL, "/");
    e.properties = match props {
        Value::Object(map) => Some(map),
        _ => Some(Map::new()),
    };
    e
}

async fn insert_all(repo: &Arc<dyn EventRepository>, events: &[Event]) {
    for e in events {
        repo.insert(e).await.expect("insert");
    }
}

// ============================================================
// Stats
// ============================================================
#[tokio::test]
async fn test_stats_counts_only_pageviews_for_domain() {
    let repo = repo();
    let mut a = pageview("a.com", "/x");
    a.visitor_id = "v1".into();
    a.session_id = "s1".into();
    let mut b = pageview("a.com", "/y");
    b.visitor_id = "v1".into();
    b.session_id = "s2".into();
    let mut c = pageview("a.com", "/y");
    c.visitor_id = "v2".into();
    c.session_id = "s3".into();
    let click = event("a.com", "click", "/x");
    let other = pageview("b.com", "/x");
    insert_all(&repo, &[a, b, c, click, other]).await;

    let stats = repo
        .get_stats("a.com", &TimeWindow::unbounded())
        .await
        .expect("stats");
    assert_eq!(stats.pageviews, 3);
    assert_eq!(stats.unique_visitors, 2);
    assert_eq!(stats.sessions, 3);
    assert!(stats.unique_visitors <= stats.pageviews);
}

#[tokio::test]
async fn test_stats_domain_is_case_sensitive() {
    let repo = repo();
    insert_all(&repo, &[pageview("a.com", "/")]).await;

    let stats = repo
        .get_stats("A.com", &TimeWindow::unbounded())
        .await
        .expect("stats");
    assert_eq!(stats.pageviews, 0);
    assert_eq!(stats.unique_visitors, 0);
}

// ============================================================
// Top pages
// ============================================================
#[tokio::test]
async fn test_top_pages_end_to_end() {
    let repo = repo();
    insert_all(
        &repo,
        &[
            pageview("a.com", "/x"),
            pageview("a.com", "/x"),
            pageview("a.com", "/y"),
        ],
    )
    .await;

    let pages = repo
        .get_top_pages("a.com", &TimeWindow::unbounded(), 10)
        .await
        .expect("pages");
    assert_eq!(
        pages,
        vec![
            PageStat {
                url: "/x".into(),
                pageviews: 2
            },
            PageStat {
                url: "/y".into(),
                pageviews: 1
            },
        ]
    );
}

#[tokio::test]
async fn test_top_pages_sorted_limited_and_deterministic() {
    let repo = repo();
    let mut events = Vec::new();
    for (url, n) in [("/a", 1), ("/b", 3), ("/c", 1), ("/d", 2), ("/e", 1)] {
        for _ in 0..n {
            events.push(pageview("a.com", url));
        }
    }
    events.push(event("a.com", "click", "/z"));
    insert_all(&repo, &events).await;

    let first = repo
        .get_top_pages("a.com", &TimeWindow::unbounded(), 3)
        .await
        .expect("pages");
    assert_eq!(first.len(), 3);
    assert!(first.windows(2).all(|w| w[0].pageviews >= w[1].pageviews));
    assert_eq!(first[0].url, "/b");
    assert_eq!(first[1].url, "/d");
    // Ties at 1 pageview break by URL.
    assert_eq!(first[2].url, "/a");

    let second = repo
        .get_top_pages("a.com", &TimeWindow::unbounded(), 3)
        .await
        .expect("pages");
    assert_eq!(first, second);
}

// ============================================================
// Top referrers
// ============================================================
#[tokio::test]
async fn test_top_referrers_skips_empty_and_dedupes_visitors() {
    let repo = repo();
    let mut g1 = pageview("a.com", "/");
    g1.referrer = "https://google.com".into();
    g1.visitor_id = "v1".into();
    let mut g2 = g1.clone();
    g2.id = uuid::Uuid::new_v4().to_string();
    let mut g3 = pageview("a.com", "/");
    g3.referrer = "https://google.com".into();
    g3.visitor_id = "v2".into();
    let mut h = pageview("a.com", "/");
    h.referrer = "https://news.ycombinator.com".into();
    h.visitor_id = "v3".into();
    let mut direct = pageview("a.com", "/");
    direct.visitor_id = "v4".into();
    let mut vital_ref = vital("a.com", json!({"$name": "LCP", "$val": 1}));
    vital_ref.referrer = "https://bing.com".into();
    insert_all(&repo, &[g1, g2, g3, h, direct, vital_ref]).await;

    let referrers = repo
        .get_top_referrers("a.com", &TimeWindow::unbounded(), 10)
        .await
        .expect("referrers");
    assert_eq!(referrers.len(), 2);
    assert!(referrers.iter().all(|r| !r.referrer.is_empty()));
    assert_eq!(referrers[0].referrer, "https://google.com");
    assert_eq!(referrers[0].visitors, 2);
    assert_eq!(referrers[1].referrer, "https://news.ycombinator.com");
    assert_eq!(referrers[1].visitors, 1);

    let limited = repo
        .get_top_referrers("a.com", &TimeWindow::unbounded(), 1)
        .await
        .expect("referrers");
    assert_eq!(limited.len(), 1);
}

// ============================================================
// Vitals
// ============================================================
#[tokio::test]
async fn test_vitals_average_end_to_end() {
    let repo = repo();
    insert_all(
        &repo,
        &[
            vital("a.com", json!({"$name": "LCP", "$val": 1200})),
            vital("a.com", json!({"$name": "LCP", "$val": 1800})),
        ],
    )
    .await;

    let vitals = repo
        .get_vitals("a.com", &TimeWindow::unbounded())
        .await
        .expect("vitals");
    assert_eq!(
        vitals,
        vec![VitalStat {
            name: "LCP".into(),
            value: 1500.0
        }]
    );
}

#[tokio::test]
async fn test_vitals_skip_rows_without_numeric_value() {
    let repo = repo();
    insert_all(
        &repo,
        &[
            vital("a.com", json!({"$name": "CLS", "$val": 0.1})),
            vital("a.com", json!({"$name": "CLS", "$val": 0.3})),
            vital("a.com", json!({"$name": "CLS", "$val": "oops"})),
            vital("a.com", json!({"$name": "CLS", "$val": true})),
            vital("a.com", json!({"$name": "CLS"})),
            vital("a.com", json!({"$name": "INP", "$val": null})),
            vital("a.com", json!({"$val": 999})),
            pageview("a.com", "/"),
        ],
    )
    .await;

    let vitals = repo
        .get_vitals("a.com", &TimeWindow::unbounded())
        .await
        .expect("vitals");
    assert_eq!(vitals.len(), 1);
    assert_eq!(vitals[0].name, "CLS");
    assert!((vitals[0].value - 0.2).abs() < 1e-9);
}

#[tokio::test]
async fn test_vitals_grouped_by_name() {
    let repo = repo();
    insert_all(
        &repo,
        &[
            vital("a.com", json!({"$name": "LCP", "$val": 2000, "$rating": "good"})),
            vital("a.com", json!({"$name": "INP", "$val": 100})),
            vital("a.com", json!({"$name": "INP", "$val": 300})),
            vital("b.com", json!({"$name": "INP", "$val": 9000})),
        ],
    )
    .await;

    let vitals = repo
        .get_vitals("a.com", &TimeWindow::unbounded())
        .await
        .expect("vitals");
    let names: Vec<&str> = vitals.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["INP", "LCP"]);
    assert_eq!(vitals[0].value, 200.0);
    assert_eq!(vitals[1].value, 2000.0);
}

// ============================================================
// Devices
// ============================================================
#[tokio::test]
async fn test_devices_boundary_widths() {
    let repo = repo();
    let mut events = Vec::new();
    for width in [767, 768, 1023, 1024] {
        let mut e = event("a.com", "click", "/");
        e.screen_width = width;
        events.push(e);
    }
    insert_all(&repo, &events).await;

    let devices = repo
        .get_devices("a.com", &TimeWindow::unbounded())
        .await
        .expect("devices");
    let count = |name: &str| {
        devices
            .iter()
            .find(|d| d.device == name)
            .map(|d| d.count)
            .unwrap_or(0)
    };
    assert_eq!(count("Mobile"), 1);
    assert_eq!(count("Tablet"), 2);
    assert_eq!(count("Desktop"), 1);
    assert_eq!(devices[0].device, "Tablet");
}

#[tokio::test]
async fn test_devices_count_every_event_name() {
    let repo = repo();
    let mut phone = pageview("a.com", "/");
    phone.screen_width = 390;
    let mut phone_vital = vital("a.com", json!({"$name": "LCP", "$val": 1}));
    phone_vital.screen_width = 390;
    insert_all(&repo, &[phone, phone_vital, pageview("a.com", "/")]).await;

    let devices = repo
        .get_devices("a.com", &TimeWindow::unbounded())
        .await
        .expect("devices");
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].device, "Mobile");
    assert_eq!(devices[0].count, 2);
    assert_eq!(devices[1].device, "Desktop");
    assert_eq!(devices[1].count, 1);
}

// ============================================================
// Time series
// ============================================================
#[tokio::test]
async fn test_time_series_buckets_by_utc_day_without_zero_fill() {
    let repo = repo();
    let mut events = Vec::new();
    for ts in [
        at(2026, 3, 1, 0),
        at(2026, 3, 1, 23),
        at(2026, 3, 3, 9),
        at(2026, 3, 3, 10),
        at(2026, 3, 3, 11),
    ] {
        let mut e = pageview("a.com", "/");
        e.timestamp = ts;
        events.push(e);
    }
    let mut not_pageview = event("a.com", "click", "/");
    not_pageview.timestamp = at(2026, 3, 2, 12);
    events.push(not_pageview);
    insert_all(&repo, &events).await;

    let series = repo
        .get_pageviews_time_series("a.com", &TimeWindow::unbounded())
        .await
        .expect("series");
    let got: Vec<(&str, i64)> = series
        .iter()
        .map(|b| (b.date.as_str(), b.pageviews))
        .collect();
    assert_eq!(got, vec![("2026-03-01", 2), ("2026-03-03", 3)]);
}

// ============================================================
// Sites
// ============================================================
#[tokio::test]
async fn test_sites_are_distinct_pairs_across_domains() {
    let repo = repo();
    let mut b = pageview("b.com", "/");
    b.site_id = "site_b".into();
    let mut b2 = vital("b.com", json!({"$name": "LCP", "$val": 1}));
    b2.site_id = "site_b".into();
    insert_all(&repo, &[pageview("a.com", "/"), pageview("a.com", "/x"), b, b2]).await;

    let sites = repo.get_sites().await.expect("sites");
    let pairs: Vec<(&str, &str)> = sites
        .iter()
        .map(|s| (s.site_id.as_str(), s.domain.as_str()))
        .collect();
    assert_eq!(pairs, vec![("site_1", "a.com"), ("site_b", "b.com")]);
}

// ============================================================
// Window semantics
// ============================================================
#[tokio::test]
async fn test_window_brackets_and_excludes() {
    let repo = repo();
    let ts = at(2026, 3, 10, 12);
    let mut e = pageview("a.com", "/x");
    e.timestamp = ts;
    insert_all(&repo, &[e]).await;

    let inside = TimeWindow::new(Some(ts - Duration::hours(1)), Some(ts + Duration::hours(1)));
    let exact = TimeWindow::new(Some(ts), Some(ts));
    let before = TimeWindow::new(None, Some(ts - Duration::seconds(1)));
    let after = TimeWindow::new(Some(ts + Duration::seconds(1)), None);

    for (window, expected) in [(inside, 1), (exact, 1), (before, 0), (after, 0)] {
        let stats = repo.get_stats("a.com", &window).await.expect("stats");
        assert_eq!(stats.pageviews, expected, "window {window:?}");
        let pages = repo
            .get_top_pages("a.com", &window, 10)
            .await
            .expect("pages");
        assert_eq!(pages.len() as i64, expected, "window {window:?}");
        let series = repo
            .get_pageviews_time_series("a.com", &window)
            .await
            .expect("series");
        assert_eq!(series.len() as i64, expected, "window {window:?}");
        let devices = repo.get_devices("a.com", &window).await.expect("devices");
        assert_eq!(devices.len() as i64, expected, "window {window:?}");
    }
}

#[tokio::test]
async fn test_parsed_date_window_covers_whole_day() {
    let repo = repo();
    let mut late = pageview("a.com", "/");
    late.timestamp = at(2026, 3, 10, 23);
    let mut next_day = pageview("a.com", "/");
    next_day.timestamp = at(2026, 3, 11, 0);
    insert_all(&repo, &[late, next_day]).await;

    let window = TimeWindow::parse(Some("2026-03-10"), Some("2026-03-10")).expect("window");
    let stats = repo.get_stats("a.com", &window).await.expect("stats");
    assert_eq!(stats.pageviews, 1);
}

// ============================================================
// Insert edge cases
// ============================================================
#[tokio::test]
async fn test_insert_rejects_empty_domain() {
    let repo = repo();
    let err = repo
        .insert(&pageview("", "/"))
        .await
        .expect_err("empty domain");
    assert!(matches!(err, RepositoryError::InvalidEvent(_)));
}

#[tokio::test]
async fn test_insert_duplicate_id_surfaces_storage_error() {
    let repo = repo();
    let e = pageview("a.com", "/");
    repo.insert(&e).await.expect("first insert");
    let err = repo.insert(&e).await.expect_err("duplicate id");
    assert!(matches!(err, RepositoryError::Storage(_)));
}

#[tokio::test]
async fn test_properties_stored_as_json_text() {
    let db = Arc::new(DuckDbBackend::open_in_memory().expect("db"));
    let e = vital("a.com", json!({"$name": "LCP", "$val": 1200, "tags": ["a", "b"]}));
    db.insert_event(&e).await.expect("insert");

    let guard = db.conn_for_test().await;
    let conn = guard.as_ref().expect("open connection");
    let stored: String = conn
        .query_row(
            "SELECT properties FROM events WHERE id = ?1",
            iris_duckdb::duckdb::params![e.id],
            |row| row.get(0),
        )
        .expect("select");
    let parsed: Value = serde_json::from_str(&stored).expect("json");
    assert_eq!(parsed["tags"][1], "b");
    assert_eq!(parsed["$val"], 1200);
}

#[tokio::test]
async fn test_concurrent_inserts_all_land() {
    let repo = repo();
    let mut handles = Vec::new();
    for i in 0..20 {
        let repo = Arc::clone(&repo);
        handles.push(tokio::spawn(async move {
            let mut e = pageview("a.com", "/");
            e.visitor_id = format!("v{i}");
            repo.insert(&e).await
        }));
    }
    for h in handles {
        h.await.expect("join").expect("insert");
    }

    let stats = repo
        .get_stats("a.com", &TimeWindow::unbounded())
        .await
        .expect("stats");
    assert_eq!(stats.pageviews, 20);
    assert_eq!(stats.unique_visitors, 20);
}

// ============================================================
// Lifecycle
// ============================================================
#[tokio::test]
async fn test_calls_after_close_fail_with_closed() {
    let repo = repo();
    repo.close().await.expect("close");

    let err = repo
        .get_stats("a.com", &TimeWindow::unbounded())
        .await
        .expect_err("closed");
    assert!(matches!(err, RepositoryError::Closed));
    let err = repo.insert(&pageview("a.com", "/")).await.expect_err("closed");
    assert!(matches!(err, RepositoryError::Closed));
    let err = repo.close().await.expect_err("second close");
    assert!(matches!(err, RepositoryError::Closed));
}

#[tokio::test]
async fn test_file_database_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("iris.db");
    let path = path.to_str().expect("utf-8 path").to_string();

    let db = DuckDbBackend::open(&path, "256MB").expect("open");
    db.insert_event(&pageview("a.com", "/x")).await.expect("insert");
    db.close().await.expect("close");

    let db = DuckDbBackend::open(&path, "256MB").expect("reopen");
    let stats = db
        .get_stats("a.com", &TimeWindow::unbounded())
        .await
        .expect("stats");
    assert_eq!(stats.pageviews, 1);
}

fn count_rows(conn: &iris_duckdb::duckdb::Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
        .expect("count")
}

#[tokio::test]
async fn test_read_past_deadline_times_out_and_store_stays_usable() {
    let limit = std::time::Duration::from_millis(50);
    let db = DuckDbBackend::open_in_memory()
        .expect("db")
        .with_query_timeout(Some(limit));

    // Holding the connection lock keeps the read queued past the deadline.
    let guard = db.conn_for_test().await;
    let err = db
        .get_stats("a.com", &TimeWindow::unbounded())
        .await
        .expect_err("read should time out");
    assert!(matches!(err, RepositoryError::Timeout(d) if d == limit));
    drop(guard);

    db.insert_event(&pageview("a.com", "/x")).await.expect("insert");
    db.ping().await.expect("ping");
    let stats = db
        .get_stats("a.com", &TimeWindow::unbounded())
        .await
        .expect("stats");
    assert_eq!(stats.pageviews, 1);
}

#[tokio::test]
async fn test_insert_waits_for_real_outcome_past_deadline() {
    let db = Arc::new(
        DuckDbBackend::open_in_memory()
            .expect("db")
            .with_query_timeout(Some(std::time::Duration::from_millis(10))),
    );

    let guard = db.conn_for_test().await;
    let writer = Arc::clone(&db);
    let insert = tokio::spawn(async move {
        writer.insert_event(&pageview("a.com", "/x")).await
    });

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert!(!insert.is_finished(), "insert must not give up while blocked");
    drop(guard);

    insert.await.expect("join").expect("insert reported as stored");
    let guard = db.conn_for_test().await;
    let conn = guard.as_ref().expect("open connection");
    assert_eq!(count_rows(conn), 1);
}

#[tokio::test]
async fn test_every_insert_reported_ok_is_stored_under_tiny_deadline() {
    let db = DuckDbBackend::open_in_memory()
        .expect("db")
        .with_query_timeout(Some(std::time::Duration::from_nanos(1)));

    for i in 0..20 {
        db.insert_event(&pageview("a.com", &format!("/p{i}")))
            .await
            .expect("insert");
    }

    let guard = db.conn_for_test().await;
    let conn = guard.as_ref().expect("open connection");
    assert_eq!(count_rows(conn), 20);
}
