#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;
use votehub::api::AppState;
use votehub::config::{Config, EmailBackend, SessionStoreKind};
use votehub::db::NewUser;
use votehub::services::MemoryEmailSender;

pub const PASSWORD: &str = "Tr1cky-Ballot!";
pub const PHOTO: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUg==";

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub mail: Arc<MemoryEmailSender>,
    db_path: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.db_path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let db_path = std::env::temp_dir().join(format!("votehub-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}?mode=rwc", db_path.display());
    config.server.session_store = SessionStoreKind::Memory;
    config.server.secure_cookies = false;
    config.email.backend = EmailBackend::Memory;
    config.media.inline_images = true;
    customize(&mut config);

    let mail = Arc::new(MemoryEmailSender::new());
    let state = votehub::api::create_app_state_with_sender(config, mail.clone())
        .await
        .expect("Failed to create app state");
    let router = votehub::api::router(state.clone())
        .await
        .expect("Failed to build router");

    TestApp {
        router,
        state,
        mail,
        db_path,
    }
}

/// Browser-like client that carries the session cookie between requests.
pub struct Client<'a> {
    app: &'a TestApp,
    cookie: Option<String>,
}

impl<'a> Client<'a> {
    pub fn new(app: &'a TestApp) -> Self {
        Self { app, cookie: None }
    }

    /// Second handle on the same session, for concurrent requests.
    pub fn fork(&self) -> Self {
        Self {
            app: self.app,
            cookie: self.cookie.clone(),
        }
    }

    pub async fn get(&mut self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(body)).await
    }

    pub async fn put(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("PUT", uri, Some(body)).await
    }

    pub async fn delete(&mut self, uri: &str) -> (StatusCode, Value) {
        self.send("DELETE", uri, None).await
    }

    async fn send(&mut self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            let pair = set_cookie.split(';').next().unwrap_or_default().to_string();
            if set_cookie.contains("Max-Age=0") {
                self.cookie = None;
            } else {
                self.cookie = Some(pair);
            }
        }

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}

/// Runs the whole registration wizard and returns a logged-in client.
pub async fn register_student<'a>(
    app: &'a TestApp,
    email: &str,
    name: &str,
    student_id: &str,
) -> Client<'a> {
    let mut client = Client::new(app);

    let (status, _) = client
        .post(
            "/api/accounts/register",
            json!({ "email": email, "full_name": name, "student_id": student_id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let otp = app.mail.last_otp_for(email).expect("otp email");
    let (status, _) = client
        .post("/api/accounts/verify-otp", json!({ "otp": otp }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = client
        .post(
            "/api/accounts/set-password",
            json!({ "password": PASSWORD, "confirm_password": PASSWORD, "voter_image": PHOTO }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = client
        .post(
            "/api/accounts/student/login",
            json!({ "email": email, "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    client
}

pub async fn login_admin(app: &TestApp) -> Client<'_> {
    let email = "admin@sfscollege.in";
    if app.state.store().get_user_by_email(email).await.unwrap().is_none() {
        let security = app.state.config().read().await.security.clone();
        app.state
            .store()
            .create_user(
                NewUser {
                    email: email.to_string(),
                    full_name: "Election Officer".to_string(),
                    student_id: "ADMIN0000001".to_string(),
                    password: PASSWORD.to_string(),
                    is_admin: true,
                    profile_image_base64: None,
                },
                &security,
            )
            .await
            .unwrap();
    }

    let mut client = Client::new(app);
    let (status, _) = client
        .post(
            "/api/accounts/admin/login",
            json!({ "email": email, "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    client
}

/// Creates an election whose window is offset from now by the given hours,
/// and returns its id.
pub async fn create_election(
    admin: &mut Client<'_>,
    title: &str,
    starts_in_hours: i64,
    ends_in_hours: i64,
) -> String {
    let now = Utc::now();
    let (status, body) = admin
        .post(
            "/api/voting/admin/elections",
            json!({
                "title": title,
                "description": "Student council",
                "start_date": (now + Duration::hours(starts_in_hours)).to_rfc3339(),
                "end_date": (now + Duration::hours(ends_in_hours)).to_rfc3339(),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

pub async fn add_candidate(admin: &mut Client<'_>, election_id: &str, name: &str) -> String {
    let (status, body) = admin
        .post(
            &format!("/api/voting/admin/elections/{election_id}/candidates"),
            json!({
                "name": name,
                "description": "Manifesto",
                "position": "President",
                "image": PHOTO,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

pub fn ballot(candidate_id: &str) -> Value {
    json!({
        "candidate_id": candidate_id,
        "voter_image": PHOTO,
        "latitude": "12.9716",
        "longitude": 77.5946,
        "city": "Bengaluru",
        "country": "India",
    })
}
