/// Application state and router builder
///
/// This module defines the shared application state and provides a function
/// to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use dailyreport_api::{app::AppState, config::Config};
/// use dailyreport_shared::db::pool::{create_pool, DatabaseConfig};
/// use dailyreport_shared::store::postgres::PgStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig::with_url(config.database.url.clone())).await?;
/// let state = AppState::new(Arc::new(PgStore::new(pool)), config);
/// let app = dailyreport_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{rate_limit::RateLimiter, security::SecurityHeadersLayer},
    routes,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use dailyreport_shared::auth::middleware::authenticate;
use dailyreport_shared::services::{ReportService, TaskService, TokenSettings, UserService};
use dailyreport_shared::store::Store;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; every
/// field is an `Arc` or wraps one.
#[derive(Clone)]
pub struct AppState {
    /// Persistence collaborator
    pub store: Arc<dyn Store>,

    pub reports: ReportService,
    pub tasks: TaskService,
    pub users: UserService,

    /// Application configuration
    pub config: Arc<Config>,

    /// Limiter shared by the authentication routes
    pub auth_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let tokens = TokenSettings {
            secret: config.jwt.secret.clone(),
            expiration_hours: config.jwt.expiration_hours,
        };
        let auth_limiter = RateLimiter::new(
            config.rate_limit.auth_max_requests,
            Duration::from_secs(config.rate_limit.auth_window_seconds),
        );

        Self {
            reports: ReportService::new(store.clone()),
            tasks: TaskService::new(store.clone()),
            users: UserService::new(store.clone(), tokens),
            store,
            config: Arc::new(config),
            auth_limiter: Arc::new(auth_limiter),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                    # Health check (public)
/// └── /api
///     ├── GET /                      # Endpoint index (public)
///     ├── /auth                      # Rate limited
///     │   ├── POST /register
///     │   ├── POST /login
///     │   ├── GET  /current          # Authenticated
///     │   ├── PUT  /profile          # Authenticated
///     │   └── PUT  /password         # Authenticated
///     ├── /reports                   # Authenticated
///     │   ├── GET/POST /
///     │   ├── GET  /user/:user_id
///     │   ├── GET/PUT/DELETE /:id
///     │   └── POST /:id/comments
///     ├── /tasks                     # Authenticated
///     │   ├── GET/POST /
///     │   ├── GET  /search
///     │   ├── GET  /my-tasks
///     │   ├── GET  /stats
///     │   ├── GET/PUT/DELETE /:id
///     │   └── POST /:id/comments
///     └── /users                     # Authenticated, admin only
///         ├── GET /
///         └── GET/PUT/DELETE /:id
/// ```
///
/// # Middleware Stack
///
/// Outermost first:
/// 1. Security headers
/// 2. Compression
/// 3. CORS
/// 4. Request tracing
/// 5. Rate limiting and authentication, per route group
pub fn build_router(state: AppState) -> Router {
    let auth_layer = from_fn_with_state(state.clone(), jwt_auth_layer);

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let session_routes = Router::new()
        .route("/current", get(routes::auth::current))
        .route("/profile", put(routes::auth::update_profile))
        .route("/password", put(routes::auth::change_password))
        .layer(auth_layer.clone());

    let auth_routes = public_auth_routes.merge(session_routes).layer(from_fn_with_state(
        state.clone(),
        crate::middleware::rate_limit::rate_limit_layer,
    ));

    let report_routes = Router::new()
        .route(
            "/",
            get(routes::reports::list_reports).post(routes::reports::create_report),
        )
        .route("/user/:user_id", get(routes::reports::list_user_reports))
        .route(
            "/:id",
            get(routes::reports::get_report)
                .put(routes::reports::update_report)
                .delete(routes::reports::delete_report),
        )
        .route("/:id/comments", post(routes::reports::add_comment))
        .layer(auth_layer.clone());

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/search", get(routes::tasks::search_tasks))
        .route("/my-tasks", get(routes::tasks::my_tasks))
        .route("/stats", get(routes::tasks::task_stats))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/comments", post(routes::tasks::add_comment))
        .layer(auth_layer.clone());

    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route(
            "/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .layer(auth_layer);

    let api_routes = Router::new()
        .route("/", get(routes::index))
        .nest("/auth", auth_routes)
        .nest("/reports", report_routes)
        .nest("/tasks", task_routes)
        .nest("/users", user_routes);

    let cors = if state.config.allows_any_origin() {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(Duration::from_secs(3600))
    };

    let production = state.config.api.production;

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .fallback(routes::not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer token, loads the user it names and injects the
/// resulting `AuthContext` into request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(state.store.as_ref(), state.jwt_secret(), req.headers()).await?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
