mod common;

use std::path::Path;

use axum::http::StatusCode;
use common::Part;
use sitetrack_db::models::project::Project;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-data";
const PDF: &[u8] = b"%PDF-1.4 fake-document";

struct Fixture {
    admin_token: String,
    owner_token: String,
    stranger_token: String,
    project: Project,
}

async fn fixture(pool: &sqlx::PgPool) -> Fixture {
    let (admin_id, admin_token) = common::create_admin(pool, "root@example.com").await;
    let (dana, owner_token) =
        common::create_customer(pool, admin_id, "Dana", "dana@example.com").await;
    let (_, stranger_token) =
        common::create_customer(pool, admin_id, "Eli", "eli@example.com").await;
    let project = common::create_project(pool, admin_id, dana.id, "Deck").await;
    Fixture {
        admin_token,
        owner_token,
        stranger_token,
        project,
    }
}

fn text_parts<'a>(project: &'a str, progress: &'a str) -> Vec<Part<'a>> {
    vec![
        Part::Text("project", project),
        Part::Text("title", "Framing"),
        Part::Text("description", "Walls framed"),
        Part::Text("progress", progress),
    ]
}

fn png(file_name: &str) -> Part<'_> {
    Part::File {
        file_name,
        content_type: "image/png",
        data: PNG,
    }
}

fn pdf(file_name: &str) -> Part<'_> {
    Part::File {
        file_name,
        content_type: "application/pdf",
        data: PDF,
    }
}

async fn project_json(app: axum::Router, id: i64, token: &str) -> serde_json::Value {
    let response = common::get_auth(app, &format!("/api/projects/{id}"), token).await;
    assert_eq!(response.status(), StatusCode::OK);
    common::body_json(response).await
}

fn stored_file(dir: &Path, storage_path: &str) -> std::path::PathBuf {
    dir.join(storage_path.strip_prefix("uploads/").unwrap())
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Files are stored and described in the response.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_update_stores_files(pool: sqlx::PgPool) {
    let fx = fixture(&pool).await;
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app_with_uploads(pool, dir.path());

    let id = fx.project.id.to_string();
    let mut parts = text_parts(&id, "45");
    parts.push(png("site.png"));
    parts.push(pdf("plans/permit.pdf"));

    let response = common::post_multipart_auth(app.clone(), "/api/updates", &parts, &fx.admin_token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = common::body_json(response).await;
    assert_eq!(json["project_id"], fx.project.id);
    assert_eq!(json["title"], "Framing");
    assert_eq!(json["progress"], 45);

    let files = json["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["kind"], "image");
    assert_eq!(files[0]["original_name"], "site.png");
    assert_eq!(files[0]["size_bytes"], PNG.len());
    assert_eq!(files[1]["kind"], "document");
    assert_eq!(files[1]["original_name"], "permit.pdf");
    assert_eq!(files[1]["mime_type"], "application/pdf");

    let path = files[0]["storage_path"].as_str().unwrap();
    assert!(path.starts_with("uploads/") && path.ends_with(".png"));
    assert_eq!(std::fs::read(stored_file(dir.path(), path)).unwrap(), PNG);
    assert_eq!(common::count_files(dir.path()), 2);

    let response = common::get(app, &format!("/{path}")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

/// Progress 1-99 moves the project to In Progress.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_partial_progress_marks_in_progress(pool: sqlx::PgPool) {
    let fx = fixture(&pool).await;
    let app = common::build_test_app(pool);

    let id = fx.project.id.to_string();
    let response =
        common::post_multipart_auth(app.clone(), "/api/updates", &text_parts(&id, "45"), &fx.admin_token).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let project = project_json(app, fx.project.id, &fx.admin_token).await;
    assert_eq!(project["status"], "In Progress");
    assert_eq!(project["progress"], 45);
    assert!(project["actual_end_date"].is_null());
}

/// Progress 100 completes the project and stamps the end date.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_progress_completes_project(pool: sqlx::PgPool) {
    let fx = fixture(&pool).await;
    let app = common::build_test_app(pool);

    let id = fx.project.id.to_string();
    let response =
        common::post_multipart_auth(app.clone(), "/api/updates", &text_parts(&id, "100"), &fx.admin_token).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let project = project_json(app.clone(), fx.project.id, &fx.admin_token).await;
    assert_eq!(project["status"], "Completed");
    assert_eq!(project["progress"], 100);
    assert!(project["actual_end_date"].is_string());

    // Reopening clears the end date.
    let response =
        common::post_multipart_auth(app.clone(), "/api/updates", &text_parts(&id, "80"), &fx.admin_token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let project = project_json(app, fx.project.id, &fx.admin_token).await;
    assert_eq!(project["status"], "In Progress");
    assert!(project["actual_end_date"].is_null());
}

/// A rejected file type aborts the whole update and leaves no files behind.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_disallowed_file_type_is_rejected(pool: sqlx::PgPool) {
    let fx = fixture(&pool).await;
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app_with_uploads(pool, dir.path());

    let id = fx.project.id.to_string();
    let mut parts = text_parts(&id, "45");
    parts.push(png("site.png"));
    parts.push(Part::File {
        file_name: "setup.exe",
        content_type: "application/octet-stream",
        data: b"MZ",
    });

    let response = common::post_multipart_auth(app.clone(), "/api/updates", &parts, &fx.admin_token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = common::body_json(response).await;
    assert_eq!(json["code"], "UNSUPPORTED_FILE_TYPE");
    assert_eq!(common::count_files(dir.path()), 0);

    let response = common::get_auth(
        app.clone(),
        &format!("/api/updates/project/{}", fx.project.id),
        &fx.admin_token,
    )
    .await;
    assert!(common::body_json(response).await.as_array().unwrap().is_empty());

    let project = project_json(app, fx.project.id, &fx.admin_token).await;
    assert_eq!(project["status"], "Not Started");
    assert_eq!(project["progress"], 0);
}

/// Extension and declared type must agree.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_mismatched_mime_type_is_rejected(pool: sqlx::PgPool) {
    let fx = fixture(&pool).await;
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app_with_uploads(pool, dir.path());

    let id = fx.project.id.to_string();
    let mut parts = text_parts(&id, "10");
    parts.push(Part::File {
        file_name: "photo.png",
        content_type: "application/pdf",
        data: PNG,
    });

    let response = common::post_multipart_auth(app, "/api/updates", &parts, &fx.admin_token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(common::count_files(dir.path()), 0);
}

/// Files already received are discarded when the project does not exist.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_project_discards_files(pool: sqlx::PgPool) {
    let fx = fixture(&pool).await;
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app_with_uploads(pool, dir.path());

    let parts = vec![
        png("a.png"),
        pdf("b.pdf"),
        Part::Text("projectId", "999999"),
        Part::Text("title", "Framing"),
        Part::Text("description", "Walls framed"),
        Part::Text("progress", "45"),
    ];
    let response = common::post_multipart_auth(app, "/api/updates", &parts, &fx.admin_token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(common::count_files(dir.path()), 0);
}

/// An upload cut off by the request timeout leaves no files and no update.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_timed_out_upload_discards_files(pool: sqlx::PgPool) {
    let fx = fixture(&pool).await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = common::test_config(dir.path().to_path_buf());
    config.request_timeout_secs = 1;
    let app = common::build_test_app_with_config(pool, config);

    let id = fx.project.id.to_string();
    let mut parts = text_parts(&id, "45");
    parts.push(png("a.png"));
    parts.push(png("b.png"));
    let response = common::post_multipart_stalled(
        app.clone(),
        "/api/updates",
        &parts,
        PNG.len() / 2,
        &fx.admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

    let mut remaining = common::count_files(dir.path());
    for _ in 0..100 {
        if remaining == 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        remaining = common::count_files(dir.path());
    }
    assert_eq!(remaining, 0, "abandoned uploads left on disk");

    let response = common::get_auth(
        app,
        &format!("/api/updates/project/{id}"),
        &fx.admin_token,
    )
    .await;
    assert_eq!(common::body_json(response).await, serde_json::json!([]));
}

/// Missing or malformed text fields are validation errors.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_fields_are_rejected(pool: sqlx::PgPool) {
    let fx = fixture(&pool).await;
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app_with_uploads(pool, dir.path());
    let id = fx.project.id.to_string();

    let cases: Vec<Vec<Part<'_>>> = vec![
        vec![png("a.png"), Part::Text("project", &id), Part::Text("progress", "10")],
        text_parts(&id, "101"),
        text_parts(&id, "ten"),
        text_parts("abc", "10"),
    ];
    for parts in cases {
        let response =
            common::post_multipart_auth(app.clone(), "/api/updates", &parts, &fx.admin_token).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = common::body_json(response).await;
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }
    assert_eq!(common::count_files(dir.path()), 0);
}

/// More than ten files is refused.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_too_many_files_are_rejected(pool: sqlx::PgPool) {
    let fx = fixture(&pool).await;
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app_with_uploads(pool, dir.path());

    let id = fx.project.id.to_string();
    let mut parts = text_parts(&id, "10");
    for _ in 0..11 {
        parts.push(png("site.png"));
    }

    let response = common::post_multipart_auth(app, "/api/updates", &parts, &fx.admin_token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(common::count_files(dir.path()), 0);
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// The owning customer can read updates; other customers cannot.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_updates_are_ownership_gated(pool: sqlx::PgPool) {
    let fx = fixture(&pool).await;
    let app = common::build_test_app(pool);

    let id = fx.project.id.to_string();
    let response =
        common::post_multipart_auth(app.clone(), "/api/updates", &text_parts(&id, "20"), &fx.admin_token).await;
    let update_id = common::body_json(response).await["id"].as_i64().unwrap();
    let response =
        common::post_multipart_auth(app.clone(), "/api/updates", &text_parts(&id, "30"), &fx.admin_token).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let list_uri = format!("/api/updates/project/{}", fx.project.id);
    let response = common::get_auth(app.clone(), &list_uri, &fx.owner_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = common::body_json(response).await;
    let progress: Vec<i64> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["progress"].as_i64().unwrap())
        .collect();
    assert_eq!(progress, vec![30, 20]);

    let response = common::get_auth(app.clone(), &list_uri, &fx.stranger_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let item_uri = format!("/api/updates/{update_id}");
    let response = common::get_auth(app.clone(), &item_uri, &fx.owner_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = common::body_json(response).await;
    assert_eq!(json["progress"], 20);
    assert!(json["files"].as_array().unwrap().is_empty());

    let response = common::get_auth(app.clone(), &item_uri, &fx.stranger_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = common::get_auth(app.clone(), "/api/updates/999999", &fx.admin_token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = common::get_auth(app, "/api/updates/project/999999", &fx.admin_token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// Deleting an update removes its files but leaves project progress as is.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_update_removes_files_and_keeps_progress(pool: sqlx::PgPool) {
    let fx = fixture(&pool).await;
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app_with_uploads(pool, dir.path());

    let id = fx.project.id.to_string();
    let mut parts = text_parts(&id, "100");
    parts.push(png("site.png"));
    let response = common::post_multipart_auth(app.clone(), "/api/updates", &parts, &fx.admin_token).await;
    let update_id = common::body_json(response).await["id"].as_i64().unwrap();
    assert_eq!(common::count_files(dir.path()), 1);

    let uri = format!("/api/updates/{update_id}");
    let response = common::delete_auth(app.clone(), &uri, &fx.admin_token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(common::count_files(dir.path()), 0);

    let response = common::delete_auth(app.clone(), &uri, &fx.admin_token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let project = project_json(app, fx.project.id, &fx.admin_token).await;
    assert_eq!(project["status"], "Completed");
    assert_eq!(project["progress"], 100);
}

/// A file that already vanished from disk does not block the delete.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_update_with_missing_file_succeeds(pool: sqlx::PgPool) {
    let fx = fixture(&pool).await;
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app_with_uploads(pool, dir.path());

    let id = fx.project.id.to_string();
    let mut parts = text_parts(&id, "50");
    parts.push(pdf("plans.pdf"));
    let response = common::post_multipart_auth(app.clone(), "/api/updates", &parts, &fx.admin_token).await;
    let json = common::body_json(response).await;
    let update_id = json["id"].as_i64().unwrap();
    let path = json["files"][0]["storage_path"].as_str().unwrap();
    std::fs::remove_file(stored_file(dir.path(), path)).unwrap();

    let response =
        common::delete_auth(app, &format!("/api/updates/{update_id}"), &fx.admin_token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

/// Deleting a project removes its updates' files.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_project_removes_update_files(pool: sqlx::PgPool) {
    let fx = fixture(&pool).await;
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app_with_uploads(pool, dir.path());

    let id = fx.project.id.to_string();
    let mut parts = text_parts(&id, "30");
    parts.push(png("a.png"));
    parts.push(pdf("b.pdf"));
    let response = common::post_multipart_auth(app.clone(), "/api/updates", &parts, &fx.admin_token).await;
    let update_id = common::body_json(response).await["id"].as_i64().unwrap();
    assert_eq!(common::count_files(dir.path()), 2);

    let response =
        common::delete_auth(app.clone(), &format!("/api/projects/{}", fx.project.id), &fx.admin_token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(common::count_files(dir.path()), 0);

    let response =
        common::get_auth(app, &format!("/api/updates/{update_id}"), &fx.admin_token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
