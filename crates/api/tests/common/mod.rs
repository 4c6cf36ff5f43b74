//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use futures::StreamExt;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use sitetrack_api::auth::jwt::{generate_access_token, JwtConfig};
use sitetrack_api::auth::password::hash_password;
use sitetrack_api::config::ServerConfig;
use sitetrack_api::router::build_app_router;
use sitetrack_api::state::AppState;
use sitetrack_core::customer::BuildingType;
use sitetrack_core::roles::Role;
use sitetrack_db::models::credential::CreateCredential;
use sitetrack_db::models::customer::{CreateCustomer, Customer};
use sitetrack_db::models::project::{CreateProject, Project};
use sitetrack_db::repositories::{CredentialRepo, CustomerRepo, ProjectRepo};

pub const TEST_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";
pub const TEST_PASSWORD: &str = "test_password_123!";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(upload_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: String::new(),
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        upload_dir,
        jwt: jwt_config(),
    }
}

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: TEST_SECRET.to_string(),
        expiry_hours: 1,
    }
}

/// Build the full application router (same middleware stack as production).
///
/// Uploads land in a shared scratch directory; tests that inspect files use
/// [`build_test_app_with_uploads`].
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_uploads(pool, &std::env::temp_dir().join("sitetrack-test-uploads"))
}

pub fn build_test_app_with_uploads(pool: PgPool, upload_dir: &Path) -> Router {
    build_test_app_with_config(pool, test_config(upload_dir.to_path_buf()))
}

pub fn build_test_app_with_config(pool: PgPool, config: ServerConfig) -> Router {
    let state = AppState::new(pool, Arc::new(config.clone()));
    build_app_router(state, &config)
}

/// Sign a token with the test secret.
pub fn token_for(credential_id: i64, role: Role) -> String {
    generate_access_token(credential_id, role, &jwt_config()).expect("token generation")
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert an admin credential (password [`TEST_PASSWORD`]) and return its id
/// and a bearer token.
pub async fn create_admin(pool: &PgPool, email: &str) -> (i64, String) {
    let credential = CredentialRepo::create(
        pool,
        &CreateCredential {
            name: "Admin".to_string(),
            email: email.to_string(),
            password_hash: hash_password(TEST_PASSWORD).expect("hashing"),
            role: Role::Admin,
        },
    )
    .await
    .expect("admin creation");
    let token = token_for(credential.id, Role::Admin);
    (credential.id, token)
}

pub fn new_customer(name: &str, email: &str) -> CreateCustomer {
    CreateCustomer {
        name: name.to_string(),
        email: email.to_string(),
        contact_number: "555-0100".to_string(),
        address: "1 Main St".to_string(),
        square_feet: 1500,
        site_location: "Lot 7".to_string(),
        building_type: BuildingType::Residential,
    }
}

/// Insert a customer (password [`TEST_PASSWORD`]) and return it with a
/// bearer token for its credential.
pub async fn create_customer(pool: &PgPool, admin_id: i64, name: &str, email: &str) -> (Customer, String) {
    let hash = hash_password(TEST_PASSWORD).expect("hashing");
    let customer = CustomerRepo::create_with_credential(pool, &new_customer(name, email), &hash, admin_id)
        .await
        .expect("customer creation");
    let token = token_for(customer.credential_id, Role::Customer);
    (customer, token)
}

/// Insert a `Not Started` project for `customer_id`.
pub async fn create_project(pool: &PgPool, admin_id: i64, customer_id: i64, title: &str) -> Project {
    ProjectRepo::create(
        pool,
        &CreateProject {
            title: title.to_string(),
            description: format!("{title} work"),
            customer_id,
            status: None,
            progress: None,
            start_date: None,
            estimated_end_date: None,
        },
        admin_id,
    )
    .await
    .expect("project creation")
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("request should not fail")
}

fn request(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header("authorization", format!("Bearer {token}")),
        None => builder,
    }
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    request(method, uri, token)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, None).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, Some(token)).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request(Method::POST, uri, None, body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request(Method::POST, uri, Some(token), body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request(Method::PUT, uri, Some(token), body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request(Method::DELETE, uri, Some(token)).body(Body::empty()).unwrap()).await
}

/// Send a raw `Authorization` header value.
pub async fn get_with_authorization(app: Router, uri: &str, value: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("authorization", value)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

// ---------------------------------------------------------------------------
// Multipart
// ---------------------------------------------------------------------------

const BOUNDARY: &str = "sitetrack-test-boundary";

/// One part of a multipart form.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        file_name: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

/// Encode parts as `multipart/form-data`. Files use the field name `files`.
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                file_name,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"files\"; filename=\"{file_name}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart_auth(
    app: Router,
    uri: &str,
    parts: &[Part<'_>],
    token: &str,
) -> Response<Body> {
    let request = request(Method::POST, uri, Some(token))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    send(app, request).await
}

/// Send the form up to `kept` bytes into the data of its last part, which
/// must be a file, then stall without ever finishing the body.
pub async fn post_multipart_stalled(
    app: Router,
    uri: &str,
    parts: &[Part<'_>],
    kept: usize,
    token: &str,
) -> Response<Body> {
    let Some(Part::File { data, .. }) = parts.last() else {
        panic!("the last part must be a file");
    };
    let mut body = multipart_body(parts);
    let closing = format!("\r\n--{BOUNDARY}--\r\n").len();
    body.truncate(body.len() - closing - (data.len() - kept));

    let stream = futures::stream::iter([Ok::<_, std::io::Error>(body)])
        .chain(futures::stream::pending());
    let request = request(Method::POST, uri, Some(token))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from_stream(stream))
        .unwrap();
    send(app, request).await
}

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

/// Number of entries in a directory (0 if it does not exist).
pub fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
