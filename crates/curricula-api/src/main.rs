//! curricula HTTP API server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use curricula_core::{defaults, TokenService};
use curricula_db::{Database, LocalFileStore, PgNotificationRepository};
use curricula_jobs::NotificationWorker;

mod error;
mod handlers;
mod middleware;
mod state;

use middleware::{authenticate, require_admin, require_staff};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   RUST_LOG    - standard env filter (default: "curricula_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "curricula_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("curricula-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
                .init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            registry.with(tracing_subscriber::fmt::layer()).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Get configuration from environment
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| defaults::DATABASE_URL.to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| defaults::HTTP_HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(defaults::HTTP_PORT);

    let token_secret = std::env::var("TOKEN_SECRET").unwrap_or_else(|_| {
        warn!("TOKEN_SECRET not set, using development default");
        "curricula-dev-secret".to_string()
    });
    let token_ttl: i64 = std::env::var("TOKEN_TTL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults::TOKEN_TTL_SECS);

    let upload_dir =
        std::env::var("UPLOAD_DIR").unwrap_or_else(|_| defaults::UPLOAD_DIR.to_string());

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    // Create and start the notification worker
    let worker_enabled = std::env::var("WORKER_ENABLED")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(true);

    let (queue, receiver) = curricula_jobs::channel(defaults::NOTIFICATION_QUEUE_CAPACITY);
    let _worker_handle = if worker_enabled {
        info!("Starting notification worker...");
        let sink = Arc::new(PgNotificationRepository::new(db.pool().clone()));
        Some(NotificationWorker::spawn(receiver, sink))
    } else {
        warn!("Notification worker disabled, queued notifications will be dropped");
        None
    };

    let state = AppState {
        db,
        tokens: Arc::new(TokenService::new(token_secret.as_bytes(), token_ttl)),
        files: Arc::new(LocalFileStore::new(&upload_dir)),
        notifications: queue,
    };
    info!("File storage initialized at {}", upload_dir);

    let app = build_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Assemble the router from role-grouped sub-routers.
///
/// Each group carries its own middleware chain; exact role match means
/// admin and staff surfaces are disjoint even where paths overlap (the
/// merged router distinguishes them by method).
fn build_router(state: AppState) -> Router {
    use handlers::*;

    let public = Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout));

    // Any authenticated user; ownership checks live in the handlers.
    let authed = Router::new()
        .route("/auth/password", put(auth::change_password))
        .route(
            "/materials",
            post(materials::create_material).get(materials::list_materials),
        )
        .route(
            "/materials/:id",
            get(materials::get_material)
                .put(materials::update_material)
                .delete(materials::delete_material),
        )
        .route("/materials/:id/download", get(materials::download_material))
        .route(
            "/comments",
            post(comments::create_comment).get(comments::list_comments),
        )
        .route(
            "/comments/:id",
            get(comments::get_comment)
                .put(comments::update_comment)
                .delete(comments::delete_comment),
        )
        .route("/notifications/:id", get(notifications::get_notification))
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    let staff = Router::new()
        .route("/programs/:id", get(programs::get_program))
        .route("/graduate-attributes", get(attributes::list_attributes))
        .route("/graduate-attributes/:id", get(attributes::get_attribute))
        .route(
            "/graduate-attributes/:id/supports",
            get(relations::list_attribute_supports),
        )
        .route("/objectives", get(objectives::list_objectives))
        .route("/objectives/:id", get(objectives::get_objective))
        .route(
            "/objectives/:id/supported-by",
            get(relations::list_objective_supporters),
        )
        .route("/observations", get(observations::list_observations))
        .route("/observations/:id", get(observations::get_observation))
        .route(
            "/observations/:id/supported-by",
            get(links::list_observation_supporters),
        )
        .route("/modules", get(modules::list_modules))
        .route("/modules/:id", get(modules::get_module))
        .route("/modules/:id/supports", get(links::list_module_supports))
        .route("/relations", get(relations::list_relations))
        .route("/relations/:id", get(relations::get_relation))
        .route("/links", get(links::list_links))
        .route("/links/:id", get(links::get_link))
        .route("/tags", get(tags::list_tags))
        .route("/tags/:id", get(tags::get_tag))
        .route_layer(from_fn(require_staff))
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    let admin = Router::new()
        .route("/users", post(users::create_user).get(users::list_users))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/programs",
            post(programs::create_program).get(programs::list_programs),
        )
        .route(
            "/programs/:id",
            put(programs::update_program).delete(programs::delete_program),
        )
        .route("/graduate-attributes", post(attributes::create_attribute))
        .route(
            "/graduate-attributes/:id",
            put(attributes::update_attribute).delete(attributes::delete_attribute),
        )
        .route(
            "/graduate-attributes/:id/supports",
            post(relations::merge_attribute_supports)
                .delete(relations::clear_attribute_supports),
        )
        .route("/objectives", post(objectives::create_objective))
        .route(
            "/objectives/:id",
            put(objectives::update_objective).delete(objectives::delete_objective),
        )
        .route(
            "/objectives/:id/supported-by",
            post(relations::merge_objective_supporters)
                .delete(relations::clear_objective_supporters),
        )
        .route("/observations", post(observations::create_observation))
        .route(
            "/observations/:id",
            put(observations::update_observation).delete(observations::delete_observation),
        )
        .route(
            "/observations/:id/supported-by",
            post(links::merge_observation_supporters)
                .delete(links::clear_observation_supporters),
        )
        .route("/modules", post(modules::create_module))
        .route(
            "/modules/:id",
            put(modules::update_module).delete(modules::delete_module),
        )
        .route(
            "/modules/:id/supports",
            post(links::merge_module_supports).delete(links::clear_module_supports),
        )
        .route("/relations", post(relations::upsert_relation))
        .route("/relations/:id", delete(relations::delete_relation))
        .route("/links", post(links::upsert_link))
        .route("/links/:id", delete(links::delete_link))
        .route("/tags", post(tags::create_tag))
        .route(
            "/tags/:id",
            put(tags::update_tag).delete(tags::delete_tag),
        )
        .route(
            "/notifications",
            post(notifications::create_notification).get(notifications::list_notifications),
        )
        .route(
            "/notifications/:id",
            put(notifications::update_notification).delete(notifications::delete_notification),
        )
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .merge(public)
        .merge(authed)
        .merge(staff)
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(
            tower_http::request_id::MakeRequestUuid,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]),
        )
        .layer(RequestBodyLimitLayer::new(defaults::MAX_BODY_BYTES))
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::middleware::Next;
    use tower::ServiceExt;

    use curricula_core::{Role, User};

    use crate::middleware::CurrentUser;

    /// State over a lazy pool: requests that are rejected before any
    /// query never touch the database.
    fn test_state() -> AppState {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/curricula_unreachable")
            .unwrap();
        let (queue, _receiver) = curricula_jobs::channel(8);
        AppState {
            db: Database::new(pool),
            tokens: Arc::new(TokenService::new("router-test-secret", 60)),
            files: Arc::new(LocalFileStore::new("uploads")),
            notifications: queue,
        }
    }

    fn get(path: &str) -> Request<Body> {
        Request::get(path).body(Body::empty()).unwrap()
    }

    /// Run one request through a gated route with an already-resolved
    /// user of `role`, returning the response status.
    async fn gate_status(role: Role, required: Role) -> StatusCode {
        let user = CurrentUser(User {
            user_id: 1,
            username: "gate-test".to_string(),
            password_hash: String::new(),
            role,
        });

        let router = Router::new().route("/gated", axum::routing::get(|| async { "ok" }));
        let router = match required {
            Role::Admin => router.route_layer(from_fn(require_admin)),
            _ => router.route_layer(from_fn(require_staff)),
        };
        let app = router.layer(from_fn(
            move |mut req: axum::extract::Request, next: Next| {
                let user = user.clone();
                async move {
                    req.extensions_mut().insert(user);
                    next.run(req).await
                }
            },
        ));

        app.oneshot(get("/gated")).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_health_needs_no_token() {
        let app = build_router(test_state());
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let app = build_router(test_state());
        let response = app.oneshot(get("/observations")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthorized() {
        let app = build_router(test_state());
        let request = Request::get("/observations")
            .header(header::AUTHORIZATION, "Bearer not.a.token")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_token_is_unauthorized() {
        let state = test_state();
        // TTL is 60s; a token issued two minutes ago is past expiry.
        let issued = chrono::Utc::now() - chrono::Duration::seconds(120);
        let token = state.tokens.issue_at(1, Role::Staff, issued).unwrap();

        let app = build_router(state);
        let request = Request::get("/observations")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_role_gates_are_exact_match() {
        assert_eq!(gate_status(Role::Admin, Role::Admin).await, StatusCode::OK);
        assert_eq!(gate_status(Role::Staff, Role::Staff).await, StatusCode::OK);

        // A staff token on an admin route is forbidden, and there is no
        // hierarchy in the other direction either.
        assert_eq!(
            gate_status(Role::Staff, Role::Admin).await,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            gate_status(Role::Admin, Role::Staff).await,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            gate_status(Role::Guest, Role::Staff).await,
            StatusCode::FORBIDDEN
        );
    }
}
