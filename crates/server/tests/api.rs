use am_core::ids::TransactionId;
use am_core::model::{
    ActivityType, Cluster, FactStatus, Location, NewActivityFact, OrgUnit, UserProfile,
};
use am_core::window::{MS_PER_HOUR, day_start_ms, parse_date};
use am_server::{AllowedOrigins, AppState, build_router};
use am_storage::{PoolConfig, SeedDimensionsRequest, SqliteStore, StorePool};
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::Value;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

const LOGIN: i64 = 1;
const VIEW_REPORT: i64 = 2;
const ALICE: i64 = 1;
const ANDI: i64 = 2;

fn temp_dir(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be monotonic enough for tests")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "am-server-{label}-{}-{nanos}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir must be creatable");
    dir
}

fn at(date: &str, hour: i64) -> i64 {
    day_start_ms(parse_date(date).expect("valid test date")) + hour * MS_PER_HOUR
}

fn fact(
    user_id: i64,
    activity_type_id: i64,
    status: FactStatus,
    event_ts_ms: i64,
) -> NewActivityFact {
    NewActivityFact {
        transaction_id: TransactionId::new_random(),
        user_id,
        org_unit_id: Some(2),
        activity_type_id,
        cluster_id: Some(1),
        location_id: Some(1),
        scope: "Neraca Perdagangan".to_string(),
        detail: String::new(),
        status,
        event_ts_ms,
        ingested_at_ms: event_ts_ms + 1_000,
    }
}

fn seed() -> SeedDimensionsRequest {
    let user = |id: i64, name: &str, email: &str| UserProfile {
        id,
        name: name.to_string(),
        email: email.to_string(),
        external_token: None,
        org_unit_id: Some(2),
        is_active: true,
        first_activity_ms: None,
        last_activity_ms: None,
    };
    SeedDimensionsRequest {
        org_units: vec![
            OrgUnit {
                id: 1,
                name: "Kementerian Perdagangan".to_string(),
                level_label: "Eselon I".to_string(),
                parent_id: None,
            },
            OrgUnit {
                id: 2,
                name: "Direktorat Analisis".to_string(),
                level_label: "Eselon II".to_string(),
                parent_id: Some(1),
            },
        ],
        activity_types: vec![
            ActivityType {
                id: LOGIN,
                name: "LOGIN".to_string(),
                category: "Authentication".to_string(),
                description: String::new(),
            },
            ActivityType {
                id: VIEW_REPORT,
                name: "View Report".to_string(),
                category: "View".to_string(),
                description: String::new(),
            },
        ],
        clusters: vec![Cluster {
            id: 1,
            name: "Laporan".to_string(),
            description: String::new(),
        }],
        locations: vec![Location {
            id: 1,
            name: "Jakarta Pusat".to_string(),
            province: "DKI Jakarta".to_string(),
        }],
        users: vec![
            user(ALICE, "Alice", "alice@example.go.id"),
            user(ANDI, "Andi", "andi@example.go.id"),
        ],
    }
}

struct TestApp {
    router: Router,
    reports_dir: PathBuf,
}

/// Alice: two successful logins and one view. Andi: one failed login and one view.
fn app(label: &str, origins: &str) -> TestApp {
    let dir = temp_dir(label);
    let db_path = dir.join("activity_monitor.db");
    let mut store = SqliteStore::open(&db_path).expect("fresh storage should open");
    store.seed_dimensions(seed()).expect("fixture dimensions should seed");
    store
        .insert_facts(&[
            fact(ALICE, LOGIN, FactStatus::Success, at("2024-03-11", 8)),
            fact(ALICE, LOGIN, FactStatus::Success, at("2024-03-11", 9)),
            fact(ALICE, VIEW_REPORT, FactStatus::Success, at("2024-03-11", 9)),
            fact(ANDI, LOGIN, FactStatus::Failed, at("2024-03-12", 10)),
            fact(ANDI, VIEW_REPORT, FactStatus::Success, at("2024-03-12", 11)),
        ])
        .expect("fixture facts should insert");
    drop(store);

    let pool = StorePool::open(PoolConfig::new(db_path)).expect("pool opens");
    let reports_dir = dir.join("reports");
    let state = AppState::new(pool, reports_dir.clone(), AllowedOrigins::parse(origins));
    TestApp {
        router: build_router(state),
        reports_dir,
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, body.to_vec())
}

async fn get_json(app: &TestApp, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).expect("request");
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).expect("json body"))
}

#[tokio::test]
async fn healthz_reports_ok() {
    let app = app("healthz", "*");
    let (status, body) = get_json(&app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn dashboard_stats_count_statuses_and_users() {
    let app = app("stats", "*");
    let (status, body) = get_json(&app, "/api/dashboard/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalUsers"], 2);
    assert_eq!(body["successLogins"], 4);
    assert_eq!(body["totalActivity"], 5);
    assert_eq!(body["logoutErrors"], 1);
}

#[tokio::test]
async fn blank_suggestion_query_returns_empty_list() {
    let app = app("suggest-empty", "*");
    let (status, body) = get_json(&app, "/api/search/suggestions?q=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(Vec::new()));

    let (_, body) = get_json(&app, "/api/search/suggestions?q=ali").await;
    assert_eq!(body[0]["type"], "user");
    assert_eq!(body[0]["value"], "Alice");
}

#[tokio::test]
async fn search_pages_through_matches() {
    let app = app("search-page", "*");
    let (status, body) = get_json(&app, "/api/search?pageSize=2&page=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 5);
    assert_eq!(body["page"], 2);
    assert_eq!(body["page_size"], 2);
    assert_eq!(body["total_pages"], 3);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let (_, body) = get_json(&app, "/api/search?status=failed").await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn activity_timestamps_are_iso_8601_with_region() {
    let app = app("iso-times", "*");
    let (status, body) = get_json(&app, "/api/search?pageSize=1").await;
    assert_eq!(status, StatusCode::OK);
    let newest = &body["data"][0];
    assert_eq!(newest["event_time"], "2024-03-12T11:00:00Z");
    assert_eq!(newest["ingested_at"], "2024-03-12T11:00:01Z");
    assert!(newest.get("event_ts_ms").is_none());
    assert_eq!(newest["province"], "DKI Jakarta");
    assert_eq!(newest["region"], "Jawa");

    let (_, body) = get_json(&app, "/api/dashboard/activities").await;
    assert_eq!(body["total"], 5);
    assert!(body["data"][0]["event_time"].is_string());
}

#[tokio::test]
async fn single_activity_is_found_by_transaction_id() {
    let app = app("activity-by-id", "*");
    let (_, body) = get_json(&app, "/api/search?pageSize=1").await;
    let transaction_id = body["data"][0]["transaction_id"]
        .as_str()
        .expect("transaction id")
        .to_string();

    let uri = format!("/api/dashboard/activities/{}", transaction_id.to_uppercase());
    let (status, record) = get_json(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["transaction_id"], transaction_id.as_str());
    assert_eq!(record["user_name"], "Andi");
    assert_eq!(record["event_time"], "2024-03-12T11:00:00Z");

    let missing = format!("/api/dashboard/activities/{}", TransactionId::new_random());
    let (status, body) = get_json(&app, &missing).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = get_json(&app, "/api/dashboard/activities/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_inputs_are_bad_requests_with_json_errors() {
    let app = app("bad-input", "*");
    for uri in [
        "/api/search?startDate=11-03-2024",
        "/api/search?page=abc",
        "/api/search?dateRange=yesterday",
        "/api/regional/provinces?start_date=2024-03-12&end_date=2024-03-01",
        "/api/dashboard/charts/pie",
    ] {
        let (status, body) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].as_str().is_some_and(|msg| !msg.is_empty()), "{uri}");
    }
}

#[tokio::test]
async fn org_tree_counts_activity_per_unit() {
    let app = app("org-tree", "*");
    let (status, body) = get_json(&app, "/api/org-tree?include_activity_count=true").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], 1);
    assert_eq!(body[0]["activity_count"], 0);
    assert_eq!(body[0]["children"][0]["activity_count"], 5);

    let (_, body) = get_json(&app, "/api/org-tree").await;
    assert!(body[0].get("activity_count").is_none());
}

#[tokio::test]
async fn generated_report_can_be_downloaded() {
    let app = app("report", "*");
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/reports/generate")
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-User-Name", "Alice")
        .body(Body::from(concat!(
            r#"{"template_id":"user-activity","format":"csv","#,
            r#""start_date":"2024-03-10","end_date":"2024-03-12"}"#,
        )))
        .expect("request");
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(body["format"], "csv");
    assert_eq!(body["template_id"], "user-activity");
    let file_name = body["file_name"].as_str().expect("file name").to_string();
    assert!(file_name.starts_with("user-activity_"));
    assert!(app.reports_dir.join(&file_name).is_file());

    let request = Request::builder()
        .uri(format!("/api/reports/files/{file_name}"))
        .body(Body::empty())
        .expect("request");
    let response = app.router.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let text = String::from_utf8(bytes.to_vec()).expect("utf-8 csv");
    assert!(text.starts_with("User Activity Report"));
    assert!(text.contains("Requested by,Alice"));
    assert!(text.contains("\"1\",\"Alice\",\"3\""));
}

#[tokio::test]
async fn report_requests_validate_template_and_format() {
    let app = app("report-invalid", "*");
    for payload in [
        r#"{"template_id":"weekly","format":"csv"}"#,
        r#"{"template_id":"user-activity","format":"docx"}"#,
        concat!(
            r#"{"template_id":"user-activity","format":"csv","#,
            r#""start_date":"2024-03-12","end_date":"2024-03-01"}"#,
        ),
        r#"{"format":"csv"}"#,
    ] {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/reports/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload))
            .expect("request");
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
    }
    assert!(!app.reports_dir.exists());
}

#[tokio::test]
async fn downloads_reject_traversal_and_report_missing_files() {
    let app = app("download", "*");
    let (status, _) = get_json(&app, "/api/reports/files/..%2Fsecret.csv").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = get_json(&app, "/api/reports/files/notes.txt").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let missing = "/api/reports/files/user-activity_20240101_000000.pdf";
    let (status, body) = get_json(&app, missing).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn cors_preflight_echoes_allowed_origin_only() {
    let app = app("cors", "https://dashboard.example.go.id");
    let preflight = |origin: &str| {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/dashboard/stats")
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .expect("request")
    };

    let response = app
        .router
        .clone()
        .oneshot(preflight("https://dashboard.example.go.id"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://dashboard.example.go.id"
    );
    assert!(response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));

    let response = app
        .router
        .clone()
        .oneshot(preflight("https://evil.example.com"))
        .await
        .expect("response");
    assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
