//! Integration tests for the snehband-server HTTP API
//!
//! Each test builds the router over an in-memory database with recording
//! doubles for the SMTP relay and image CDN, then drives it with `oneshot`.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use snehband_common::config::AppConfig;
use snehband_common::db;
use snehband_common::email::EmailContent;
use snehband_common::export::FontSources;
use snehband_common::{Error, Result};
use snehband_server::services::{ImageStore, Mailer};
use snehband_server::{build_router, AppState};
use sqlx::sqlite::SqlitePoolOptions;
use tower::util::ServiceExt; // for `oneshot`

const ADMIN: &str = "admin@example.org";
const VOLUNTEER: &str = "volunteer@example.org";
const BOUNDARY: &str = "snehband-test-boundary";

/// Records every message; addresses starting with `fail` are refused
#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, content: &EmailContent) -> Result<()> {
        if to.starts_with("fail") {
            return Err(Error::Upstream(format!("Relay refused {}", to)));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), content.subject.clone()));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingImageStore {
    uploads: Mutex<Vec<(String, String, usize)>>,
}

#[async_trait]
impl ImageStore for RecordingImageStore {
    async fn upload(&self, file_name: &str, content_type: &str, bytes: Vec<u8>) -> Result<String> {
        self.uploads
            .lock()
            .unwrap()
            .push((file_name.to_string(), content_type.to_string(), bytes.len()));
        Ok(format!("https://cdn.example.org/snehband/{}", file_name))
    }
}

struct TestApp {
    state: AppState,
    mailer: Arc<RecordingMailer>,
    images: Arc<RecordingImageStore>,
}

impl TestApp {
    async fn new() -> Self {
        let mut config = AppConfig::default();
        config.auth.admin_emails = vec![ADMIN.to_string()];
        Self::with_config(config).await
    }

    async fn with_config(config: AppConfig) -> Self {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::create_schema(&pool).await.unwrap();

        let mailer = Arc::new(RecordingMailer::default());
        let images = Arc::new(RecordingImageStore::default());
        let state = AppState::new(
            pool,
            config,
            mailer.clone(),
            images.clone(),
            FontSources::default(),
        );
        Self {
            state,
            mailer,
            images,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = build_router(self.state.clone())
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    async fn json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = self.send(request).await;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Should parse JSON")
        };
        (status, body)
    }

    /// Promote `email` through the admin account
    async fn grant(&self, email: &str, role: &str) {
        let (_, me) = self.json(get_as("/api/me", email)).await;
        let id = me["id"].as_str().unwrap().to_string();
        let (status, _) = self
            .json(json_as(
                "PATCH",
                &format!("/api/users/{}/role", id),
                ADMIN,
                json!({ "role": role }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    async fn register(&self, body: Value) -> (StatusCode, Value) {
        self.json(public_json("POST", "/api/register", body)).await
    }
}

fn get_as(uri: &str, email: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-forwarded-email", email)
        .body(Body::empty())
        .unwrap()
}

fn json_as(method: &str, uri: &str, email: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-email", email)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn public_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_body(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"{n}\"\r\nContent-Type: {t}\r\n\r\n",
        b = BOUNDARY,
        f = field,
        n = file_name,
        t = content_type
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_request(uri: &str, email: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={}", BOUNDARY),
    );
    if let Some(email) = email {
        builder = builder.header("x-forwarded-email", email);
    }
    builder.body(Body::from(body)).unwrap()
}

fn registration(id: i64, name: &str, mobile: &str) -> Value {
    json!({
        "anubandh_id": id,
        "name": name,
        "mobile": mobile,
        "gender": "Female",
        "attendee_count": 2,
    })
}

// =============================================================================
// Health and authentication
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let app = TestApp::new().await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = app.json(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "snehband-server");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_protected_routes_require_identity() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .uri("/api/profiles")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.json(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_proxy_secret_enforced_when_configured() {
    let mut config = AppConfig::default();
    config.auth.proxy_secret = Some("s3cret".to_string());
    let app = TestApp::with_config(config).await;

    let (status, _) = app.json(get_as("/api/me", VOLUNTEER)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/me")
        .header("x-forwarded-email", VOLUNTEER)
        .header("x-proxy-secret", "s3cret")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.json(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], VOLUNTEER);
}

#[tokio::test]
async fn test_first_sign_in_creates_accounts() {
    let app = TestApp::new().await;

    let (status, body) = app.json(get_as("/api/me", ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");

    let (_, body) = app.json(get_as("/api/me", VOLUNTEER)).await;
    assert_eq!(body["role"], "default");

    // Default role sees nothing
    let (status, body) = app.json(get_as("/api/profiles", VOLUNTEER)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_role_management() {
    let app = TestApp::new().await;
    app.grant(VOLUNTEER, "readOnly").await;

    let (status, _) = app.json(get_as("/api/profiles", VOLUNTEER)).await;
    assert_eq!(status, StatusCode::OK);

    // Read-only cannot change status
    let (status, _) = app
        .json(json_as(
            "PATCH",
            "/api/profiles/1/status",
            VOLUNTEER,
            json!({ "approved": true }),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Non-admins cannot list accounts
    let (status, _) = app.json(get_as("/api/users", VOLUNTEER)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, users) = app.json(get_as("/api/users", ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_admin_cannot_demote_self() {
    let app = TestApp::new().await;
    let (_, me) = app.json(get_as("/api/me", ADMIN)).await;
    let id = me["id"].as_str().unwrap();

    let (status, _) = app
        .json(json_as(
            "PATCH",
            &format!("/api/users/{}/role", id),
            ADMIN,
            json!({ "role": "user" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .json(json_as(
            "PATCH",
            "/api/users/missing/role",
            ADMIN,
            json!({ "role": "user" }),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_register_creates_profile_and_sends_email() {
    let app = TestApp::new().await;
    let mut body = registration(1201, "Sneha Patil", "9876543210");
    body["email"] = json!("sneha@example.org");

    let (status, profile) = app.register(body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(profile["anubandh_id"], 1201);
    assert_eq!(profile["gender"], "FEMALE");
    assert_eq!(profile["approved"], false);
    assert_eq!(profile["id_synthetic"], false);
    assert_eq!(profile["email_sent"], true);

    let sent = app.mailer.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "sneha@example.org");
}

#[tokio::test]
async fn test_register_duplicate_id_conflicts() {
    let app = TestApp::new().await;
    let (status, _) = app.register(registration(1201, "A", "1")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.register(registration(1201, "B", "2")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_register_requires_name_and_mobile() {
    let app = TestApp::new().await;
    let (status, body) = app.register(json!({ "name": "  " })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("name"));
    assert!(message.contains("mobile"));
}

#[tokio::test]
async fn test_register_without_id_gets_synthetic_ids() {
    let app = TestApp::new().await;

    let (_, first) = app
        .register(json!({ "name": "A", "mobile": "1", "attendee_text": "मी स्वतः" }))
        .await;
    let (_, second) = app.register(json!({ "name": "B", "mobile": "2" })).await;

    assert_eq!(first["anubandh_id"], 99999);
    assert_eq!(first["id_synthetic"], true);
    assert_eq!(first["attendee_count"], 1);
    assert_eq!(second["anubandh_id"], 99998);
    // No address, nothing sent
    assert_eq!(second["email_sent"], false);
}

#[tokio::test]
async fn test_register_non_positive_id_gets_synthetic_id() {
    let app = TestApp::new().await;
    let (status, profile) = app
        .register(json!({ "anubandh_id": 0, "name": "A", "mobile": "1" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(profile["anubandh_id"], 99999);
    assert_eq!(profile["id_synthetic"], true);

    let (_, profile) = app
        .register(json!({ "anubandh_id": -3, "name": "B", "mobile": "2" }))
        .await;
    assert_eq!(profile["anubandh_id"], 99998);
}

#[tokio::test]
async fn test_register_survives_email_failure() {
    let app = TestApp::new().await;
    let mut body = registration(7, "A", "1");
    body["email"] = json!("fail@example.org");

    let (status, profile) = app.register(body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(profile["email_sent"], false);
}

// =============================================================================
// Listing, editing and status
// =============================================================================

#[tokio::test]
async fn test_list_profiles_filters_and_pages() {
    let app = TestApp::new().await;
    app.register(registration(1, "Sneha Patil", "111")).await;
    app.register(json!({ "anubandh_id": 2, "name": "Rahul Jadhav", "mobile": "222", "gender": "M" }))
        .await;
    app.register(json!({ "anubandh_id": 3, "name": "Asha", "mobile": "333" }))
        .await;

    let (status, body) = app.json(get_as("/api/profiles", ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_results"], 3);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 100);
    assert_eq!(body["total_pages"], 1);

    let (_, body) = app.json(get_as("/api/profiles?search=patil", ADMIN)).await;
    assert_eq!(body["total_results"], 1);
    assert_eq!(body["profiles"][0]["anubandh_id"], 1);

    let (_, body) = app.json(get_as("/api/profiles?gender=unknown", ADMIN)).await;
    assert_eq!(body["total_results"], 1);
    assert_eq!(body["profiles"][0]["anubandh_id"], 3);

    let (_, body) = app.json(get_as("/api/profiles?search=222", ADMIN)).await;
    assert_eq!(body["profiles"][0]["name"], "Rahul Jadhav");

    // Out-of-range pages clamp to the last page
    let (_, body) = app.json(get_as("/api/profiles?page=9", ADMIN)).await;
    assert_eq!(body["page"], 1);
}

#[tokio::test]
async fn test_get_update_delete_profile() {
    let app = TestApp::new().await;
    app.register(registration(5, "Old Name", "555")).await;

    let (status, _) = app.json(get_as("/api/profiles/404", ADMIN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, updated) = app
        .json(json_as(
            "PUT",
            "/api/profiles/5",
            ADMIN,
            json!({ "name": " New Name ", "mobile": "555", "attendee_count": 3, "gotra": "Kashyap" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "New Name");
    assert_eq!(updated["attendee_count"], 3);
    assert_eq!(updated["gotra"], "Kashyap");

    let (status, _) = app
        .json(json_as("PUT", "/api/profiles/5", ADMIN, json!({ "name": "X" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let delete = Request::builder()
        .method("DELETE")
        .uri("/api/profiles/5")
        .header("x-forwarded-email", ADMIN)
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.json(delete).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 1);

    let (status, _) = app.json(get_as("/api/profiles/5", ADMIN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clear_profiles_is_admin_only() {
    let app = TestApp::new().await;
    app.register(registration(1, "A", "1")).await;
    app.register(registration(2, "B", "2")).await;
    app.grant(VOLUNTEER, "user").await;

    let clear = |email: &str| {
        Request::builder()
            .method("DELETE")
            .uri("/api/profiles")
            .header("x-forwarded-email", email)
            .body(Body::empty())
            .unwrap()
    };

    let (status, _) = app.json(clear(VOLUNTEER)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.json(clear(ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 2);
}

#[tokio::test]
async fn test_introduction_deferred_until_approved() {
    let app = TestApp::new().await;
    app.register(registration(9, "A", "1")).await;

    let (status, body) = app
        .json(json_as(
            "PATCH",
            "/api/profiles/9/status",
            ADMIN,
            json!({ "introduction": true }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["approved"], false);
    assert_eq!(body["introduction"], false);
    assert_eq!(body["introduction_deferred"], true);

    let (_, body) = app
        .json(json_as(
            "PATCH",
            "/api/profiles/9/status",
            ADMIN,
            json!({ "approved": true, "introduction": true }),
        ))
        .await;
    assert_eq!(body["introduction"], true);
    assert_eq!(body["introduction_deferred"], false);

    let (_, stats) = app.json(get_as("/api/stats", ADMIN)).await;
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["approved"], 1);
    assert_eq!(stats["introduction"], 1);
    assert_eq!(stats["approved_attendees"], 2);
}

// =============================================================================
// CSV import and PDF export
// =============================================================================

const CSV: &str = "अनुबंध आयडी,संपूर्ण नाव,मोबाईल नंबर,लिंग,मेळाव्यास उपस्थित राहणाऱ्या व्यक्तींची संख्या\n\
1201,Sneha Patil,9876543210,स्त्री,मी स्वतः आणि १ व्यक्ती\n\
,Rahul Jadhav,9123456780,M,Rs.200\n\
1203,,9000000000,,\n";

#[tokio::test]
async fn test_import_csv() {
    let app = TestApp::new().await;
    let body = multipart_body("file", "sheet.csv", "text/csv", CSV.as_bytes());
    let (status, report) = app
        .json(multipart_request("/api/profiles/import", Some(ADMIN), body))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total_rows"], 3);
    assert_eq!(report["imported"], 2);
    assert_eq!(report["assigned_synthetic"], json!([99999]));
    assert_eq!(report["next_synthetic_id"], 99998);
    assert_eq!(report["errors"][0]["row"], 3);

    let (_, sneha) = app.json(get_as("/api/profiles/1201", ADMIN)).await;
    assert_eq!(sneha["gender"], "FEMALE");
    assert_eq!(sneha["attendee_count"], 2);

    // A later registration continues below the imported synthetic id
    let (_, later) = app.register(json!({ "name": "C", "mobile": "3" })).await;
    assert_eq!(later["anubandh_id"], 99998);
}

#[tokio::test]
async fn test_import_requires_admin() {
    let app = TestApp::new().await;
    app.grant(VOLUNTEER, "user").await;
    let body = multipart_body("file", "sheet.csv", "text/csv", CSV.as_bytes());
    let (status, _) = app
        .json(multipart_request("/api/profiles/import", Some(VOLUNTEER), body))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_import_rejected_while_another_runs() {
    let app = TestApp::new().await;
    let _running = app.state.import_lock.lock().await;

    let body = multipart_body("file", "sheet.csv", "text/csv", CSV.as_bytes());
    let (status, body) = app
        .json(multipart_request("/api/profiles/import", Some(ADMIN), body))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_import_without_file_field() {
    let app = TestApp::new().await;
    let body = multipart_body("other", "sheet.csv", "text/csv", CSV.as_bytes());
    let (status, _) = app
        .json(multipart_request("/api/profiles/import", Some(ADMIN), body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_export_pdf() {
    let app = TestApp::new().await;
    app.register(registration(1, "Sneha Patil", "111")).await;
    app.register(registration(2, "Rahul Jadhav", "222")).await;

    for uri in [
        "/api/profiles/export.pdf",
        "/api/profiles/export.pdf?layout=cards&search=patil",
    ] {
        let response = build_router(app.state.clone())
            .oneshot(get_as(uri, ADMIN))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
        assert!(response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("attachment"));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}

// =============================================================================
// E-mail and check-in
// =============================================================================

#[tokio::test]
async fn test_send_one_email() {
    let app = TestApp::new().await;
    let mut body = registration(1, "A", "1");
    body["email"] = json!("a@example.org");
    app.register(body).await;
    app.register(registration(2, "B", "2")).await;

    let post = |uri: &str| {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("x-forwarded-email", ADMIN)
            .body(Body::empty())
            .unwrap()
    };

    let (status, body) = app.json(post("/api/email/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sent"], true);
    assert_eq!(body["to"], "a@example.org");

    let (status, _) = app.json(post("/api/email/2")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.json(post("/api/email/3")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bulk_email_collects_failures() {
    let app = TestApp::new().await;
    for (id, email) in [(1, Some("a@example.org")), (2, Some("fail@example.org")), (3, None)] {
        let mut body = registration(id, "X", "1");
        if let Some(email) = email {
            body["email"] = json!(email);
        }
        app.register(body).await;
    }
    app.mailer.sent.lock().unwrap().clear();

    let (status, body) = app
        .json(json_as(
            "POST",
            "/api/email/bulk",
            ADMIN,
            json!({ "ids": [3, 1, 2, 1, 42] }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requested"], 4);
    assert_eq!(body["sent"], 1);

    let failed: Vec<i64> = body["failed"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["anubandh_id"].as_i64().unwrap())
        .collect();
    assert_eq!(failed, vec![2, 3, 42]);
    assert_eq!(app.mailer.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_bulk_email_approved_only() {
    let app = TestApp::new().await;
    for id in [1, 2] {
        let mut body = registration(id, "X", "1");
        body["email"] = json!(format!("p{}@example.org", id));
        app.register(body).await;
    }
    app.json(json_as(
        "PATCH",
        "/api/profiles/2/status",
        ADMIN,
        json!({ "approved": true }),
    ))
    .await;
    app.mailer.sent.lock().unwrap().clear();

    let (_, body) = app
        .json(json_as(
            "POST",
            "/api/email/bulk",
            ADMIN,
            json!({ "approved_only": true }),
        ))
        .await;
    assert_eq!(body["requested"], 1);
    assert_eq!(body["sent"], 1);
    assert_eq!(app.mailer.sent.lock().unwrap()[0].0, "p2@example.org");
}

#[tokio::test]
async fn test_check_in_flow() {
    let app = TestApp::new().await;
    app.grant(VOLUNTEER, "user").await;
    app.register(registration(1201, "Sneha Patil", "9876543210")).await;

    let payload = json!({
        "anubandhId": 1201,
        "name": "Sneha Patil",
        "mobile": "9876543210",
        "attendeeCount": 2,
    })
    .to_string();

    // Not yet approved
    let (status, _) = app
        .json(json_as("POST", "/api/checkin", VOLUNTEER, json!({ "payload": payload })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    app.json(json_as(
        "PATCH",
        "/api/profiles/1201/status",
        ADMIN,
        json!({ "approved": true }),
    ))
    .await;

    let (status, first) = app
        .json(json_as("POST", "/api/checkin", VOLUNTEER, json!({ "payload": payload })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["anubandh_id"], 1201);
    assert_eq!(first["attendee_count"], 2);
    assert_eq!(first["already_checked_in"], false);

    let (status, second) = app
        .json(json_as("POST", "/api/checkin", VOLUNTEER, json!({ "anubandh_id": 1201 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["already_checked_in"], true);
    assert_eq!(second["checked_in_at"], first["checked_in_at"]);

    let (_, stats) = app.json(get_as("/api/stats", ADMIN)).await;
    assert_eq!(stats["checked_in"], 1);
}

#[tokio::test]
async fn test_check_in_rejects_bad_codes() {
    let app = TestApp::new().await;
    app.register(registration(1201, "Sneha Patil", "9876543210")).await;
    app.json(json_as(
        "PATCH",
        "/api/profiles/1201/status",
        ADMIN,
        json!({ "approved": true }),
    ))
    .await;

    let forged = json!({ "anubandhId": 1201, "name": "X", "mobile": "0000", "attendeeCount": 1 })
        .to_string();
    let (status, _) = app
        .json(json_as("POST", "/api/checkin", ADMIN, json!({ "payload": forged })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .json(json_as("POST", "/api/checkin", ADMIN, json!({ "payload": "not json" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .json(json_as("POST", "/api/checkin", ADMIN, json!({ "anubandh_id": 77 })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.json(json_as("POST", "/api/checkin", ADMIN, json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Photo upload
// =============================================================================

#[tokio::test]
async fn test_upload_image() {
    let app = TestApp::new().await;
    let png = [0x89u8, b'P', b'N', b'G', 0, 1, 2, 3];
    let body = multipart_body("file", "photo.png", "image/png", &png);

    let (status, body) = app
        .json(multipart_request("/api/upload/image", None, body))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "https://cdn.example.org/snehband/photo.png");

    let uploads = app.images.uploads.lock().unwrap().clone();
    assert_eq!(uploads, vec![("photo.png".to_string(), "image/png".to_string(), 8)]);
}

#[tokio::test]
async fn test_upload_rejects_non_images() {
    let app = TestApp::new().await;
    let body = multipart_body("file", "notes.txt", "text/plain", b"hello");

    let (status, _) = app
        .json(multipart_request("/api/upload/image", None, body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.images.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_rejects_oversized_files() {
    let app = TestApp::new().await;
    let data = vec![0u8; snehband_server::MAX_IMAGE_BYTES + 1];
    let body = multipart_body("file", "big.jpg", "image/jpeg", &data);

    let (status, _) = app
        .json(multipart_request("/api/upload/image", None, body))
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
