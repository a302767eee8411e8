//! Upstream client tests against a local stand-in backend
//!
//! The stand-in serves the four collections (paginated and bare), the
//! activity endpoints and the token endpoint on an ephemeral port.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use fapecafe_reports::error::AppError;
use fapecafe_reports::external::{Credentials, UpstreamClient};
use fapecafe_reports::services::SnapshotSource;
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Backend {
    fail_samples: Arc<AtomicBool>,
    revoke_lots_once: Arc<AtomicBool>,
    logins: Arc<AtomicUsize>,
    require_auth: bool,
    issue_expired: bool,
}

const ACCESS_TOKEN: &str = "opaque-access-token";

/// A JWT whose `exp` is long past
fn expired_token() -> String {
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &json!({ "exp": 1_000_000, "user_id": 1 }),
        &jsonwebtoken::EncodingKey::from_secret(b"upstream-secret"),
    )
    .unwrap()
}

fn authorized(backend: &Backend, headers: &HeaderMap) -> bool {
    let expected = if backend.issue_expired {
        expired_token()
    } else {
        ACCESS_TOKEN.to_string()
    };
    !backend.require_auth
        || headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .is_some_and(|h| h == format!("Bearer {}", expected))
}

fn guarded(backend: &Backend, headers: &HeaderMap, body: Value) -> Response {
    if authorized(backend, headers) {
        Json(body).into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

async fn lots(State(b): State<Backend>, headers: HeaderMap) -> Response {
    if b.revoke_lots_once.swap(false, Ordering::SeqCst) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    guarded(
        &b,
        &headers,
        json!({
            "count": 2, "next": null, "previous": null,
            "results": [
                { "id": 1, "numero_lote": "L-1", "organizacion": { "id": 1, "nombre": "Org A" },
                  "total_quintales": "12.50",
                  "propietarios": [{ "cedula": "1710034065", "nombre_completo": "Ana", "quintales_entregados": "12.50" }] },
                { "numero_lote": "sin id" },
            ]
        }),
    )
}

async fn organizations(State(b): State<Backend>, headers: HeaderMap) -> Response {
    guarded(&b, &headers, json!([{ "id": 1, "nombre": "Org A" }]))
}

async fn samples(State(b): State<Backend>, headers: HeaderMap) -> Response {
    if b.fail_samples.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    guarded(&b, &headers, json!([{ "id": 5, "lote": 1, "estado": "APROBADA" }]))
}

async fn processes(State(b): State<Backend>, headers: HeaderMap) -> Response {
    guarded(&b, &headers, json!({ "detail": "unexpected shape" }))
}

async fn tasks(State(b): State<Backend>, headers: HeaderMap) -> Response {
    guarded(&b, &headers, json!([{ "id": 1, "lote": 1, "duracion_horas": 2 }]))
}

async fn empty(State(b): State<Backend>, headers: HeaderMap) -> Response {
    guarded(&b, &headers, json!([]))
}

async fn token(State(b): State<Backend>, Json(body): Json<Value>) -> Response {
    b.logins.fetch_add(1, Ordering::SeqCst);
    if body["username"] == "contador" && body["password"] == "clave" {
        let access = if b.issue_expired {
            expired_token()
        } else {
            ACCESS_TOKEN.to_string()
        };
        Json(json!({ "access": access, "refresh": "r" })).into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

async fn spawn_backend(backend: Backend) -> String {
    let app = Router::new()
        .route("/api/lotes/", get(lots))
        .route("/api/organizaciones/", get(organizations))
        .route("/api/muestras/", get(samples))
        .route("/api/procesos/", get(processes))
        .route("/api/tareas/", get(tasks))
        .route("/api/descargas/", get(empty))
        .route("/api/uso-maquinaria/", get(empty))
        .route("/api/token/", post(token))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api/", addr)
}

#[tokio::test]
async fn test_snapshot_normalizes_collections() {
    let base = spawn_backend(Backend::default()).await;
    let client = UpstreamClient::with_base_url(base, Credentials::Anonymous);

    let snapshot = client.fetch_snapshot().await.unwrap();

    // Malformed lot dropped, nested organization id resolved
    assert_eq!(snapshot.lots.len(), 1);
    assert_eq!(snapshot.lots[0].organization_id, Some(1));
    assert_eq!(snapshot.organizations.len(), 1);
    assert_eq!(snapshot.samples.len(), 1);
    // Unrecognized shape is an empty collection, not a failure
    assert!(snapshot.processes.is_empty());
    assert_eq!(snapshot.activity.len(), 1);
    assert_eq!(snapshot.owners.len(), 1);
}

#[tokio::test]
async fn test_one_failed_collection_fails_the_snapshot() {
    let backend = Backend::default();
    backend.fail_samples.store(true, Ordering::SeqCst);
    let base = spawn_backend(backend).await;
    let client = UpstreamClient::with_base_url(base, Credentials::Anonymous);

    let err = client.fetch_snapshot().await.unwrap_err();
    assert!(matches!(err, AppError::UpstreamStatus { status: 500, .. }));
}

#[tokio::test]
async fn test_login_once_and_reuse_token() {
    let backend = Backend {
        require_auth: true,
        ..Default::default()
    };
    let logins = backend.logins.clone();
    let base = spawn_backend(backend).await;
    let client = UpstreamClient::with_base_url(
        base,
        Credentials::Login {
            username: "contador".to_string(),
            password: "clave".to_string(),
        },
    )
    .with_activity(false);

    client.fetch_snapshot().await.unwrap();
    client.fetch_snapshot().await.unwrap();

    // Concurrent fetches share the session lock; an opaque token is reused
    assert_eq!(logins.load(Ordering::SeqCst), 1);
}

fn login_client(base: String) -> UpstreamClient {
    UpstreamClient::with_base_url(
        base,
        Credentials::Login {
            username: "contador".to_string(),
            password: "clave".to_string(),
        },
    )
    .with_activity(false)
}

#[tokio::test]
async fn test_expired_token_triggers_new_login() {
    let backend = Backend {
        require_auth: true,
        issue_expired: true,
        ..Default::default()
    };
    let logins = backend.logins.clone();
    let base = spawn_backend(backend).await;
    let client = login_client(base);

    client.fetch_snapshot().await.unwrap();

    // The stored token is already past `exp`, so every collection request logs in
    assert_eq!(logins.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_unauthorized_response_clears_session() {
    let backend = Backend {
        require_auth: true,
        ..Default::default()
    };
    backend.revoke_lots_once.store(true, Ordering::SeqCst);
    let logins = backend.logins.clone();
    let base = spawn_backend(backend).await;
    let client = login_client(base);

    let err = client.fetch_snapshot().await.unwrap_err();
    assert!(matches!(err, AppError::UpstreamUnauthorized));

    let snapshot = client.fetch_snapshot().await.unwrap();
    assert_eq!(snapshot.lots.len(), 1);
    assert_eq!(logins.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_rejected_credentials() {
    let backend = Backend {
        require_auth: true,
        ..Default::default()
    };
    let base = spawn_backend(backend).await;
    let client = UpstreamClient::with_base_url(
        base,
        Credentials::Login {
            username: "contador".to_string(),
            password: "incorrecta".to_string(),
        },
    );

    let err = client.fetch_snapshot().await.unwrap_err();
    assert!(matches!(err, AppError::UpstreamUnauthorized));
}

#[tokio::test]
async fn test_static_token_without_auth_fails() {
    let backend = Backend {
        require_auth: true,
        ..Default::default()
    };
    let base = spawn_backend(backend).await;
    let client = UpstreamClient::with_base_url(base, Credentials::Token("wrong".to_string()));

    let err = client.fetch_snapshot().await.unwrap_err();
    assert!(matches!(err, AppError::UpstreamUnauthorized));
}
