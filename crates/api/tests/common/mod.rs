//! Shared helpers for API integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use locker_api::auth::jwt::{generate_access_token, JwtConfig};
use locker_api::config::{LockerConfig, ServerConfig};
use locker_api::router::build_app_router;
use locker_api::state::AppState;
use locker_core::types::DbId;
use locker_core::upload::AppEnvironment;
use locker_storage::{LocalMediaStore, S3Config, StorageBackend, StorageConfig};
use sqlx::PgPool;
use tower::ServiceExt;

pub const PUBLIC_BASE: &str = "http://localhost:3000/media/";

pub struct TestApp {
    pub router: Router,
    pub config: ServerConfig,
    pub media_root: PathBuf,
    _dir: tempfile::TempDir,
}

impl TestApp {
    /// Mint an access token for `account_id` with the given role name.
    pub fn token(&self, account_id: DbId, role: &str) -> String {
        generate_access_token(account_id, role, &self.config.jwt).unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: &str) -> Response {
        self.send(
            Request::builder()
                .method(Method::GET)
                .uri(uri)
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, token: &str, body: serde_json::Value) -> Response {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// PUT raw bytes, declaring `declared_len` as the Content-Length.
    pub async fn put_bytes(
        &self,
        uri: &str,
        token: &str,
        content_type: &str,
        declared_len: usize,
        bytes: Vec<u8>,
    ) -> Response {
        self.send(
            Request::builder()
                .method(Method::PUT)
                .uri(uri)
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .header(CONTENT_TYPE, content_type)
                .header(CONTENT_LENGTH, declared_len)
                .body(Body::from(bytes))
                .unwrap(),
        )
        .await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Response {
        self.send(
            Request::builder()
                .method(Method::DELETE)
                .uri(uri)
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

pub fn test_config(media_root: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        upload_timeout_secs: 60,
        jwt: JwtConfig {
            secret: "locker-test-secret-that-is-long-enough".to_string(),
            access_token_expiry_mins: 15,
        },
        locker: LockerConfig {
            environment: AppEnvironment::Testing,
            ..LockerConfig::default()
        },
        storage: StorageConfig {
            backend: StorageBackend::Local,
            local_root: media_root,
            local_public_url: PUBLIC_BASE.to_string(),
            s3: S3Config::default(),
        },
    }
}

/// Build the full application router over a temporary local media store.
pub async fn build_test_app(pool: PgPool) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let media_root = dir.path().join("media");
    let config = test_config(media_root.clone());
    let store = LocalMediaStore::new(&media_root, PUBLIC_BASE).await.unwrap();
    let state = AppState::new(pool, config.clone(), Arc::new(store));
    let router = build_app_router(state, &config);
    TestApp {
        router,
        config,
        media_root,
        _dir: dir,
    }
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn seed_account(pool: &PgPool, email: &str) -> DbId {
    let (id,): (DbId,) = sqlx::query_as("INSERT INTO accounts (email) VALUES ($1) RETURNING id")
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap();
    id
}

pub async fn seed_instructor(pool: &PgPool, email: &str) -> DbId {
    let id = seed_account(pool, email).await;
    sqlx::query("INSERT INTO instructors (id) VALUES ($1)")
        .bind(id)
        .execute(pool)
        .await
        .unwrap();
    id
}

pub async fn link_student(pool: &PgPool, instructor_id: DbId, account_id: DbId) {
    sqlx::query("INSERT INTO instructor_students (instructor_id, account_id) VALUES ($1, $2)")
        .bind(instructor_id)
        .bind(account_id)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn job_count(pool: &PgPool) -> i64 {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs")
        .fetch_one(pool)
        .await
        .unwrap();
    n
}
