mod common;

use axum::http::StatusCode;
use common::{Client, PASSWORD, PHOTO, register_student, spawn_app, spawn_app_with};
use serde_json::json;

#[tokio::test]
async fn test_register_rejects_outside_domain() {
    let app = spawn_app().await;
    let mut client = Client::new(&app);

    let (status, body) = client
        .post(
            "/api/accounts/register",
            json!({ "email": "mallory@gmail.com", "full_name": "Mallory", "student_id": "U01AB23CD456" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please enter a valid college ID (@sfscollege.in)");
    assert!(app.mail.sent().is_empty());
}

#[tokio::test]
async fn test_register_requires_all_fields_and_valid_student_id() {
    let app = spawn_app().await;
    let mut client = Client::new(&app);

    let (status, body) = client
        .post("/api/accounts/register", json!({ "email": "alice@sfscollege.in" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "All fields are required.");

    let (status, body) = client
        .post(
            "/api/accounts/register",
            json!({ "email": "alice@sfscollege.in", "full_name": "Alice", "student_id": "U01-23" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Student ID must be a 12-14 character alphanumeric UUCMS number."
    );
}

#[tokio::test]
async fn test_exempt_email_bypasses_domain_rule() {
    let app = spawn_app_with(|config| {
        config.registration.exempt_emails = vec!["guest.voter@gmail.com".to_string()];
    })
    .await;
    let mut client = Client::new(&app);

    let (status, _) = client
        .post(
            "/api/accounts/register",
            json!({ "email": "Guest.Voter@gmail.com", "full_name": "Guest", "student_id": "U01AB23CD999" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(app.mail.last_otp_for("guest.voter@gmail.com").is_some());
}

#[tokio::test]
async fn test_full_registration_flow() {
    let app = spawn_app().await;
    let mut client = Client::new(&app);

    let (status, body) = client
        .post(
            "/api/accounts/register",
            json!({ "email": "alice@sfscollege.in", "full_name": "Alice Example", "student_id": "u01ab23cd456" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["next"], "verify_otp");
    assert_eq!(body["message"], "An OTP has been sent to alice@sfscollege.in.");

    let email = app.mail.last_to("alice@sfscollege.in").unwrap();
    assert!(email.subject.starts_with("Email Verification Code: "));

    // Password cannot be set before the code is confirmed.
    let (status, _) = client
        .post(
            "/api/accounts/set-password",
            json!({ "password": PASSWORD, "confirm_password": PASSWORD, "voter_image": PHOTO }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = client
        .post("/api/accounts/verify-otp", json!({ "otp": "000000" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid OTP. Please try again.");

    let otp = app.mail.last_otp_for("alice@sfscollege.in").unwrap();
    let (status, body) = client
        .post("/api/accounts/verify-otp", json!({ "otp": otp }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["next"], "set_password");

    let (status, _) = client
        .post(
            "/api/accounts/set-password",
            json!({ "password": PASSWORD, "confirm_password": "different", "voter_image": PHOTO }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = client
        .post(
            "/api/accounts/set-password",
            json!({ "password": PASSWORD, "confirm_password": PASSWORD, "voter_image": PHOTO }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Registration successful! You can now login.");

    let user = app
        .state
        .store()
        .get_user_by_email("alice@sfscollege.in")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.student_id, "u01ab23cd456", "stored as typed");
    assert!(!user.is_admin);

    let (status, body) = client
        .post(
            "/api/accounts/student/login",
            json!({ "email": "alice@sfscollege.in", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "alice@sfscollege.in");

    let (status, body) = client.get("/api/accounts/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["full_name"], "Alice Example");
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let app = spawn_app().await;
    register_student(&app, "bob@sfscollege.in", "Bob Example", "U01AB23CD457").await;

    let mut other = Client::new(&app);
    let (status, body) = other
        .post(
            "/api/accounts/register",
            json!({ "email": "bob@sfscollege.in", "full_name": "Bob Again", "student_id": "U01AB23CD458" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "This email is already registered.");
}

#[tokio::test]
async fn test_resend_respects_cooldown() {
    let app = spawn_app().await;
    let mut client = Client::new(&app);

    client
        .post(
            "/api/accounts/register",
            json!({ "email": "carol@sfscollege.in", "full_name": "Carol", "student_id": "U01AB23CD459" }),
        )
        .await;

    let (status, body) = client.post("/api/accounts/resend-otp", json!({})).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Please wait ")
    );
    assert_eq!(app.mail.sent().len(), 1);
}

#[tokio::test]
async fn test_resend_issues_new_code_after_cooldown() {
    let app = spawn_app_with(|config| config.otp.resend_cooldown_seconds = 0).await;
    let mut client = Client::new(&app);

    client
        .post(
            "/api/accounts/register",
            json!({ "email": "dave@sfscollege.in", "full_name": "Dave", "student_id": "U01AB23CD460" }),
        )
        .await;

    let (status, body) = client.post("/api/accounts/resend-otp", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "A new OTP has been sent to dave@sfscollege.in.");
    assert_eq!(app.mail.sent().len(), 2);

    let otp = app.mail.last_otp_for("dave@sfscollege.in").unwrap();
    let (status, _) = client
        .post("/api/accounts/verify-otp", json!({ "otp": otp }))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_resend_without_pending_flow() {
    let app = spawn_app().await;
    let mut client = Client::new(&app);

    let (status, body) = client.post("/api/accounts/resend-otp", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Session expired. Please try again.");
}

#[tokio::test]
async fn test_login_portals_are_separate() {
    let app = spawn_app().await;
    register_student(&app, "erin@sfscollege.in", "Erin Example", "U01AB23CD461").await;
    common::login_admin(&app).await;

    let mut client = Client::new(&app);
    let (status, body) = client
        .post(
            "/api/accounts/admin/login",
            json!({ "email": "erin@sfscollege.in", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"],
        "Access Denied: Student accounts must use the Student Login."
    );

    let (status, body) = client
        .post(
            "/api/accounts/student/login",
            json!({ "email": "admin@sfscollege.in", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admins must use the dedicated Admin Portal.");

    let (status, body) = client
        .post(
            "/api/accounts/student/login",
            json!({ "email": "erin@sfscollege.in", "password": "wrong-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password.");
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = spawn_app().await;
    let mut student =
        register_student(&app, "frank@sfscollege.in", "Frank Example", "U01AB23CD462").await;
    student.post("/api/accounts/logout", json!({})).await;

    let mut client = Client::new(&app);
    let (status, body) = client
        .post(
            "/api/accounts/forgot-password",
            json!({ "email": "nobody@sfscollege.in" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No account found with this email.");

    let (status, _) = client
        .post(
            "/api/accounts/forgot-password",
            json!({ "email": "frank@sfscollege.in" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let email = app.mail.last_to("frank@sfscollege.in").unwrap();
    assert!(email.subject.starts_with("Password Reset Code: "));

    let (status, body) = client
        .post("/api/accounts/verify-reset-otp", json!({ "otp": "000000" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid OTP.");

    let otp = app.mail.last_otp_for("frank@sfscollege.in").unwrap();
    let (status, _) = client
        .post("/api/accounts/verify-reset-otp", json!({ "otp": otp }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let new_password = "Fresh-Ballot-42";
    let (status, body) = client
        .post(
            "/api/accounts/reset-password",
            json!({ "password": new_password, "confirm_password": new_password }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["next"], "login");

    let (status, _) = client
        .post(
            "/api/accounts/student/login",
            json!({ "email": "frank@sfscollege.in", "password": new_password }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_location_requires_coordinates() {
    let app = spawn_app().await;
    let mut student =
        register_student(&app, "gina@sfscollege.in", "Gina Example", "U01AB23CD463").await;

    let (status, body) = student
        .post("/api/accounts/update-location", json!({ "city": "Mysuru" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing location data");

    let (status, _) = student
        .post(
            "/api/accounts/update-location",
            json!({ "latitude": 12.3, "longitude": "76.6", "city": "Mysuru", "country": "India" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let user = app
        .state
        .store()
        .get_user_by_email("gina@sfscollege.in")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.city.as_deref(), Some("Mysuru"));
}

#[tokio::test]
async fn test_protected_routes_require_login() {
    let app = spawn_app().await;
    let mut client = Client::new(&app);

    let (status, _) = client.get("/api/accounts/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = client.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["next"], "login");
}
