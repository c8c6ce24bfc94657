mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{
    Client, add_candidate, ballot, create_election, login_admin, register_student, spawn_app,
    spawn_app_with,
};
use serde_json::json;

#[tokio::test]
async fn test_admin_routes_require_admin() {
    let app = spawn_app().await;

    let mut anonymous = Client::new(&app);
    let (status, _) = anonymous.get("/api/voting/admin/dashboard").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut student =
        register_student(&app, "lata@sfscollege.in", "Lata Example", "U01AB23CD480").await;
    let (status, body) = student.get("/api/voting/admin/dashboard").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Access denied. Admin privileges required.");

    let (status, _) = student.get("/api/metrics").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_election_validation() {
    let app = spawn_app().await;
    let mut admin = login_admin(&app).await;
    let now = Utc::now();

    let (status, body) = admin
        .post("/api/voting/admin/elections", json!({ "title": "Missing dates" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "All fields are required.");

    let (status, body) = admin
        .post(
            "/api/voting/admin/elections",
            json!({
                "title": "Bad dates",
                "description": "x",
                "start_date": "next tuesday",
                "end_date": "2026-12-01T10:00",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid date format.");

    let (status, body) = admin
        .post(
            "/api/voting/admin/elections",
            json!({
                "title": "Backwards",
                "description": "x",
                "start_date": (now + Duration::days(2)).to_rfc3339(),
                "end_date": (now + Duration::days(1)).to_rfc3339(),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "End date must be after start date.");

    let (status, body) = admin
        .post(
            "/api/voting/admin/elections",
            json!({
                "title": "Naive dates",
                "description": "Local form input",
                "start_date": "2030-01-10T09:00",
                "end_date": "2030-01-11T17:30:00",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], true);
    assert_eq!(body["data"]["created_by"], "admin@sfscollege.in");
    assert_eq!(body["message"], "Election \"Naive dates\" created successfully!");
}

#[tokio::test]
async fn test_update_election() {
    let app = spawn_app().await;
    let mut admin = login_admin(&app).await;
    let election_id = create_election(&mut admin, "Original", -1, 24).await;
    let now = Utc::now();

    let (status, body) = admin
        .put(
            &format!("/api/voting/admin/elections/{election_id}"),
            json!({
                "title": "Renamed",
                "description": "Updated",
                "start_date": (now - Duration::hours(1)).to_rfc3339(),
                "end_date": (now + Duration::hours(24)).to_rfc3339(),
                "is_active": false,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Renamed");
    assert_eq!(body["data"]["is_active"], false);

    let (_, body) = admin.get("/api/voting/admin/elections").await;
    assert_eq!(body["data"][0]["is_ongoing"], false);
}

#[tokio::test]
async fn test_candidate_requires_all_fields() {
    let app = spawn_app().await;
    let mut admin = login_admin(&app).await;
    let election_id = create_election(&mut admin, "Treasurer", -1, 24).await;

    let (status, body) = admin
        .post(
            &format!("/api/voting/admin/elections/{election_id}/candidates"),
            json!({ "name": "No Photo", "position": "Treasurer", "description": "x" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Name, Position, Description, and Photo are required."
    );

    let candidate_id = add_candidate(&mut admin, &election_id, "Meera").await;
    let (_, body) = admin
        .get(&format!("/api/voting/admin/elections/{election_id}/candidates"))
        .await;
    assert_eq!(body["data"]["candidates_count"], 1);

    let (status, _) = admin
        .delete(&format!("/api/voting/admin/candidates/{candidate_id}"))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = admin
        .delete(&format!("/api/voting/admin/candidates/{candidate_id}"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_results_and_dashboard() {
    let app = spawn_app().await;
    let mut admin = login_admin(&app).await;
    let election_id = create_election(&mut admin, "President", -1, 24).await;
    let first = add_candidate(&mut admin, &election_id, "Asha").await;
    let second = add_candidate(&mut admin, &election_id, "Vikram").await;

    let submit = format!("/api/voting/vote/{election_id}/submit");
    let voters = [
        ("nina@sfscollege.in", "Nina Example", "U01AB23CD481", &second),
        ("omar@sfscollege.in", "Omar Example", "U01AB23CD482", &second),
        ("pooja@sfscollege.in", "Pooja Example", "U01AB23CD483", &first),
    ];
    for (email, name, student_id, candidate) in voters {
        let mut student = register_student(&app, email, name, student_id).await;
        let (status, _) = student.post(&submit, ballot(candidate)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = admin
        .get(&format!("/api/voting/admin/elections/{election_id}/results"))
        .await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["total_votes"], 3);
    assert_eq!(data["results"][0]["candidate"]["name"], "Vikram");
    assert_eq!(data["results"][0]["votes"], 2);
    assert_eq!(data["results"][0]["percentage"], 66.67);
    assert_eq!(data["results"][1]["percentage"], 33.33);
    assert_eq!(data["votes"].as_array().unwrap().len(), 3);
    assert_eq!(data["votes"][0]["voter_name"], "Pooja Example");
    assert_eq!(data["votes"][0]["candidate_name"], "Asha");

    let (status, body) = admin.get("/api/voting/admin/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_elections"], 1);
    assert_eq!(body["data"]["active_elections"], 1);
    assert_eq!(body["data"]["total_students"], 3);
    assert_eq!(body["data"]["total_votes"], 3);
    assert_eq!(body["data"]["chart_data"][0], 3);
}

#[tokio::test]
async fn test_delete_election_cascades() {
    let app = spawn_app().await;
    let mut admin = login_admin(&app).await;
    let election_id = create_election(&mut admin, "Doomed", -1, 24).await;
    let candidate_id = add_candidate(&mut admin, &election_id, "Rahul").await;

    let mut student =
        register_student(&app, "quinn@sfscollege.in", "Quinn Example", "U01AB23CD484").await;
    student
        .post(
            &format!("/api/voting/vote/{election_id}/submit"),
            ballot(&candidate_id),
        )
        .await;

    let (status, body) = admin
        .delete(&format!("/api/voting/admin/elections/{election_id}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["candidates"], 1);
    assert_eq!(body["data"]["votes"], 1);

    let store = app.state.store();
    assert!(store.list_candidates(&election_id).await.unwrap().is_empty());
    assert_eq!(store.count_all_votes().await.unwrap(), 0);

    let (status, body) = admin
        .get(&format!("/api/voting/admin/elections/{election_id}"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["error"],
        format!("Election not found (ID: {election_id})")
    );
}

#[tokio::test]
async fn test_students_search_and_delete() {
    let app = spawn_app().await;
    let mut admin = login_admin(&app).await;
    let election_id = create_election(&mut admin, "Class Rep", -1, 24).await;
    let candidate_id = add_candidate(&mut admin, &election_id, "Sana").await;

    let mut student =
        register_student(&app, "rohan@sfscollege.in", "Rohan Example", "U01AB23CD485").await;
    register_student(&app, "sita@sfscollege.in", "Sita Example", "U01AB23CD486").await;
    student
        .post(
            &format!("/api/voting/vote/{election_id}/submit"),
            ballot(&candidate_id),
        )
        .await;

    let (_, body) = admin.get("/api/voting/admin/students").await;
    assert_eq!(body["data"]["students"].as_array().unwrap().len(), 2);

    let (_, body) = admin.get("/api/voting/admin/students?q=ROHAN").await;
    let students = body["data"]["students"].as_array().unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(body["data"]["query"], "ROHAN");
    let rohan_id = students[0]["id"].as_str().unwrap().to_string();

    let (_, body) = admin.get("/api/voting/admin/students?q=u01ab23cd486").await;
    assert_eq!(body["data"]["students"][0]["email"], "sita@sfscollege.in");

    let admin_user = app
        .state
        .store()
        .get_user_by_email("admin@sfscollege.in")
        .await
        .unwrap()
        .unwrap();
    let (status, body) = admin
        .delete(&format!("/api/voting/admin/students/{}", admin_user.id))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Cannot delete admin accounts from here.");

    let (status, body) = admin
        .delete(&format!("/api/voting/admin/students/{rohan_id}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["removed_votes"], 1);
    assert_eq!(app.state.store().count_all_votes().await.unwrap(), 0);

    // The deleted student's session no longer authenticates.
    let (status, _) = student.get("/api/voting/dashboard").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_uppercase_ids_resolve_for_candidates_and_students() {
    let app = spawn_app().await;
    let mut admin = login_admin(&app).await;
    let election_id = create_election(&mut admin, "Editor", -1, 24).await;
    let candidate_id = add_candidate(&mut admin, &election_id, "Tara").await;

    let mut student =
        register_student(&app, "uma@sfscollege.in", "Uma Example", "U01AB23CD487").await;
    let (status, _) = student
        .post(
            &format!("/api/voting/vote/{election_id}/submit"),
            ballot(&candidate_id.to_uppercase()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let wrapped = format!("ObjectId('{}')", candidate_id.to_uppercase());
    let (status, body) = admin
        .delete(&format!("/api/voting/admin/candidates/{wrapped}"))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(app.state.store().list_candidates(&election_id).await.unwrap().is_empty());

    let uma = app
        .state
        .store()
        .get_user_by_email("uma@sfscollege.in")
        .await
        .unwrap()
        .unwrap();
    let (status, body) = admin
        .delete(&format!("/api/voting/admin/students/{}", uma.id.to_uppercase()))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["removed_votes"], 1);
    assert!(app.state.store().get_user(&uma.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_deletes_remove_stored_images() {
    let media = std::env::temp_dir().join(format!("votehub-media-{}", uuid::Uuid::new_v4()));
    let media_path = media.to_string_lossy().to_string();
    let app = spawn_app_with(|config| {
        config.media.inline_images = false;
        config.media.media_path = media_path;
    })
    .await;
    let store = app.state.store();

    let mut admin = login_admin(&app).await;
    let first = create_election(&mut admin, "Secretary", -1, 24).await;
    let kept = add_candidate(&mut admin, &first, "Irfan").await;
    let dropped = add_candidate(&mut admin, &first, "Leela").await;
    let second = create_election(&mut admin, "Joint Secretary", -1, 24).await;
    let other = add_candidate(&mut admin, &second, "Nisha").await;

    let image_of = |candidates: &[votehub::db::Candidate], id: &str| {
        candidates
            .iter()
            .find(|c| c.id == id)
            .and_then(|c| c.image.clone())
            .unwrap()
    };
    let first_candidates = store.list_candidates(&first).await.unwrap();
    let kept_image = image_of(&first_candidates, &kept);
    let dropped_image = image_of(&first_candidates, &dropped);
    let other_image = image_of(&store.list_candidates(&second).await.unwrap(), &other);
    assert!(media.join(&dropped_image).exists());

    let mut vikas =
        register_student(&app, "vikas@sfscollege.in", "Vikas Example", "U01AB23CD488").await;
    let mut wren =
        register_student(&app, "wren@sfscollege.in", "Wren Example", "U01AB23CD489").await;
    vikas
        .post(&format!("/api/voting/vote/{first}/submit"), ballot(&kept))
        .await;
    wren.post(&format!("/api/voting/vote/{second}/submit"), ballot(&other))
        .await;
    let vikas_selfie = store.list_votes(&first).await.unwrap()[0].voter_image.clone();
    let wren_selfie = store.list_votes(&second).await.unwrap()[0].voter_image.clone();
    assert!(media.join(&vikas_selfie).exists());
    assert!(media.join(&wren_selfie).exists());

    let (status, _) = admin
        .delete(&format!("/api/voting/admin/candidates/{dropped}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!media.join(&dropped_image).exists());

    let wren_user = store
        .get_user_by_email("wren@sfscollege.in")
        .await
        .unwrap()
        .unwrap();
    let (status, _) = admin
        .delete(&format!("/api/voting/admin/students/{}", wren_user.id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!media.join(&wren_selfie).exists());
    assert!(media.join(&other_image).exists());

    let (status, _) = admin
        .delete(&format!("/api/voting/admin/elections/{first}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!media.join(&vikas_selfie).exists());
    assert!(!media.join(&kept_image).exists());

    assert_eq!(std::fs::read_dir(media.join("votes")).unwrap().count(), 0);
    assert_eq!(std::fs::read_dir(media.join("candidates")).unwrap().count(), 1);

    let _ = std::fs::remove_dir_all(media);
}

#[tokio::test]
async fn test_public_pages() {
    let app = spawn_app().await;
    let mut client = Client::new(&app);

    let (status, body) = client.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
}
