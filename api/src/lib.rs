//! HTTP surface: routing, principal resolution, request/response shapes.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use authn::TokenAuthority;
use service::{IdentityService, TaskService};

pub mod error;
pub mod handlers;
pub mod models;
pub mod principal;
pub mod server;

pub use server::{start_server, start_server_with_config, ApiConfig};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<storage::Database>,
    pub identity: Arc<IdentityService>,
    pub tasks: Arc<TaskService>,
    pub tokens: Arc<TokenAuthority>,
}

/// Create the main API router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let tasks = Router::new()
        .route(
            "/",
            get(handlers::tasks::list_tasks).post(handlers::tasks::create_task),
        )
        .route(
            "/:task_id",
            get(handlers::tasks::get_task)
                .patch(handlers::tasks::update_task)
                .delete(handlers::tasks::delete_task),
        );

    let users = Router::new()
        .route("/", get(handlers::users::list_users))
        .route(
            "/:user_id",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .nest("/:user_id/tasks", tasks);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .nest("/users", users)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            principal::resolve_principal,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use chrono::{Duration, Utc};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;
    use uuid::Uuid;

    use authz::Role;
    use storage::{Database, DatabaseConfig, SqliteAccountStore, SqliteTaskStore};

    struct TestApp {
        router: Router,
        tokens: Arc<TokenAuthority>,
        _temp_dir: TempDir,
    }

    async fn test_app() -> TestApp {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(DatabaseConfig {
            database_path: temp_dir.path().join("test.db"),
            max_connections: 5,
        })
        .await
        .unwrap();
        let db = Arc::new(db);

        let accounts = Arc::new(SqliteAccountStore::new(db.pool().clone()));
        let task_store = Arc::new(SqliteTaskStore::new(db.pool().clone()));
        let tokens = Arc::new(TokenAuthority::new(b"integration-test-signing-secret"));

        let state = AppState {
            db,
            identity: Arc::new(IdentityService::new(accounts, tokens.clone())),
            tasks: Arc::new(TaskService::new(task_store)),
            tokens: tokens.clone(),
        };

        TestApp {
            router: create_router(state),
            tokens,
            _temp_dir: temp_dir,
        }
    }

    async fn send(
        app: &TestApp,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Register an account and log in, returning its id and a live token.
    async fn register_and_login(app: &TestApp, email: &str) -> (Uuid, String) {
        let (status, body) = send(
            app,
            "POST",
            "/auth/register",
            None,
            Some(json!({"email": email, "password": "secret-pass"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();

        let (status, body) = send(
            app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": email, "password": "secret-pass"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        (id, body["token"].as_str().unwrap().to_string())
    }

    /// Forge an admin token directly; the API has no admin bootstrap route.
    fn admin_token(app: &TestApp) -> String {
        app.tokens
            .issue(Uuid::new_v4(), Role::Admin, Utc::now())
            .unwrap()
            .token
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = test_app().await;
        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_register_validation_failures() {
        let app = test_app().await;

        let (status, body) = send(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({"email": "not-an-email", "password": "secret-pass"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, _) = send(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({"email": "a@b.com", "password": "short"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_response_never_carries_secrets() {
        let app = test_app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({"email": "a@b.com", "password": "secret-pass"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["email"], "a@b.com");
        assert_eq!(body["role"], "regular");
        assert!(body.get("password").is_none());
        assert!(body.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let app = test_app().await;
        register_and_login(&app, "dup@example.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({"email": "dup@example.com", "password": "secret-pass"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let app = test_app().await;
        register_and_login(&app, "known@example.com").await;

        let (wrong_status, wrong_body) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "known@example.com", "password": "wrong-secret"})),
        )
        .await;
        let (unknown_status, unknown_body) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "unknown@example.com", "password": "wrong-secret"})),
        )
        .await;

        assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_body, unknown_body);
    }

    #[tokio::test]
    async fn test_anonymous_register_of_admin_forbidden() {
        let app = test_app().await;
        let (status, _) = send(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "email": "boss@example.com",
                "password": "secret-pass",
                "role": "admin"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_can_register_admin() {
        let app = test_app().await;
        let token = admin_token(&app);
        let (status, body) = send(
            &app,
            "POST",
            "/auth/register",
            Some(&token),
            Some(json!({
                "email": "boss@example.com",
                "password": "secret-pass",
                "role": "admin"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["role"], "admin");
    }

    #[tokio::test]
    async fn test_missing_token_rejected_for_protected_route() {
        let app = test_app().await;
        let (id, _) = register_and_login(&app, "a@example.com").await;

        let (status, body) = send(&app, "GET", &format!("/users/{}", id), None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_non_utf8_authorization_header_rejected() {
        // A garbled header must be rejected outright, not downgraded to an
        // anonymous request; registration would otherwise proceed.
        let app = test_app().await;

        let mut request = Request::builder()
            .method("POST")
            .uri("/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"email": "a@b.com", "password": "secret-pass"}).to_string(),
            ))
            .unwrap();
        request.headers_mut().insert(
            header::AUTHORIZATION,
            axum::http::HeaderValue::from_bytes(b"Bearer t\xffken").unwrap(),
        );

        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let app = test_app().await;
        let (id, _) = register_and_login(&app, "a@example.com").await;

        let (status, _) = send(
            &app,
            "GET",
            &format!("/users/{}", id),
            Some("not.a.token"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let app = test_app().await;
        let (id, _) = register_and_login(&app, "a@example.com").await;

        let stale = app
            .tokens
            .issue(id, Role::Regular, Utc::now() - Duration::hours(4))
            .unwrap();
        let (status, _) = send(
            &app,
            "GET",
            &format!("/users/{}", id),
            Some(&stale.token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_regular_caller_cannot_read_other_accounts() {
        let app = test_app().await;
        let (_, token_a) = register_and_login(&app, "a@example.com").await;
        let (id_b, _) = register_and_login(&app, "b@example.com").await;

        let (status, body) = send(
            &app,
            "GET",
            &format!("/users/{}", id_b),
            Some(&token_a),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_user_listing_is_admin_only() {
        let app = test_app().await;
        let (_, token) = register_and_login(&app, "a@example.com").await;

        let (status, _) = send(&app, "GET", "/users", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let admin = admin_token(&app);
        let (status, body) = send(&app, "GET", "/users", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["users"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_self_elevation_denied_admin_elevation_allowed() {
        let app = test_app().await;
        let (id, token) = register_and_login(&app, "a@example.com").await;

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/users/{}", id),
            Some(&token),
            Some(json!({"role": "admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let admin = admin_token(&app);
        let (status, body) = send(
            &app,
            "PUT",
            &format!("/users/{}", id),
            Some(&admin),
            Some(json!({"role": "admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "admin");
    }

    #[tokio::test]
    async fn test_empty_update_rejected() {
        let app = test_app().await;
        let (id, token) = register_and_login(&app, "a@example.com").await;

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/users/{}", id),
            Some(&token),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "no fields to update");
    }

    #[tokio::test]
    async fn test_task_lifecycle() {
        let app = test_app().await;
        let (id, token) = register_and_login(&app, "a@example.com").await;
        let base = format!("/users/{}/tasks", id);

        let (status, task) = send(
            &app,
            "POST",
            &base,
            Some(&token),
            Some(json!({"description": "write the quarterly report"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(task["status"], "todo");
        let task_id = task["id"].as_str().unwrap().to_string();

        let (status, patched) = send(
            &app,
            "PATCH",
            &format!("{}/{}", base, task_id),
            Some(&token),
            Some(json!({"status": "done"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patched["status"], "done");

        let (status, listed) = send(
            &app,
            "GET",
            &format!("{}?status=done", base),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["tasks"].as_array().unwrap().len(), 1);

        let (status, listed) = send(
            &app,
            "GET",
            &format!("{}?status=todo", base),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(listed["tasks"].as_array().unwrap().is_empty());

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("{}/{}", base, task_id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            "GET",
            &format!("{}/{}", base, task_id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_task_description_bounds() {
        let app = test_app().await;
        let (id, token) = register_and_login(&app, "a@example.com").await;

        let (status, _) = send(
            &app,
            "POST",
            &format!("/users/{}/tasks", id),
            Some(&token),
            Some(json!({"description": "too short"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_cross_user_task_access_forbidden() {
        let app = test_app().await;
        let (id_a, token_a) = register_and_login(&app, "a@example.com").await;
        let (_, token_b) = register_and_login(&app, "b@example.com").await;

        let (_, task) = send(
            &app,
            "POST",
            &format!("/users/{}/tasks", id_a),
            Some(&token_a),
            Some(json!({"description": "a private piece of work"})),
        )
        .await;
        let task_id = task["id"].as_str().unwrap();

        // Probing the true owner's scope with a foreign credential is a
        // policy denial; the resource is known to sit under that scope.
        let (status, _) = send(
            &app,
            "GET",
            &format!("/users/{}/tasks/{}", id_a, task_id),
            Some(&token_b),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let admin = admin_token(&app);
        let (status, _) = send(
            &app,
            "GET",
            &format!("/users/{}/tasks/{}", id_a, task_id),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_task_scope_mismatch_reads_as_absent() {
        let app = test_app().await;
        let (id_a, token_a) = register_and_login(&app, "a@example.com").await;
        let (id_b, token_b) = register_and_login(&app, "b@example.com").await;

        let (_, task) = send(
            &app,
            "POST",
            &format!("/users/{}/tasks", id_a),
            Some(&token_a),
            Some(json!({"description": "a private piece of work"})),
        )
        .await;
        let task_id = task["id"].as_str().unwrap();

        // The task exists, but not under b's scope; b must not learn that.
        let (status, _) = send(
            &app,
            "GET",
            &format!("/users/{}/tasks/{}", id_b, task_id),
            Some(&token_b),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_task_patch_rejected() {
        let app = test_app().await;
        let (id, token) = register_and_login(&app, "a@example.com").await;

        let (_, task) = send(
            &app,
            "POST",
            &format!("/users/{}/tasks", id),
            Some(&token),
            Some(json!({"description": "a task that needs doing"})),
        )
        .await;
        let task_id = task["id"].as_str().unwrap();

        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/users/{}/tasks/{}", id, task_id),
            Some(&token),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "no fields to update");
    }

    #[tokio::test]
    async fn test_unknown_status_filter_rejected() {
        let app = test_app().await;
        let (id, token) = register_and_login(&app, "a@example.com").await;

        let (status, _) = send(
            &app,
            "GET",
            &format!("/users/{}/tasks?status=cancelled", id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_deleting_account_removes_its_tasks() {
        let app = test_app().await;
        let (id, token) = register_and_login(&app, "a@example.com").await;

        send(
            &app,
            "POST",
            &format!("/users/{}/tasks", id),
            Some(&token),
            Some(json!({"description": "doomed alongside its owner"})),
        )
        .await;

        let (status, _) = send(&app, "DELETE", &format!("/users/{}", id), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let admin = admin_token(&app);
        let (status, listed) = send(
            &app,
            "GET",
            &format!("/users/{}/tasks", id),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(listed["tasks"].as_array().unwrap().is_empty());
    }
}
