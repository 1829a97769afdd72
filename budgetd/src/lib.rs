//! # budgetd: Personal Budget Tracker
//!
//! `budgetd` is a small self-hostable service for keeping a personal budget in Korean won. Each
//! user records income and expenses, sees totals converted to US dollars, gets a breakdown of
//! spending per category and can back the whole ledger up to a JSON file and restore it later.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! keeps everything in a single SQLite database through [SQLx](https://github.com/launchbadge/sqlx).
//!
//! ### Request Flow
//!
//! Browser clients log in at `/authentication/login` and receive a signed session cookie. Requests
//! to `/api/*` resolve that cookie into a [`CurrentUser`](api::models::users::CurrentUser) and are
//! scoped to that user's rows; a missing or invalid cookie is answered with 401. Handlers talk to
//! the database through the repositories in [`db::handlers`]. Totals and the category breakdown
//! are pure functions in [`ledger`], recomputed on every request.
//!
//! ### Exchange Rates
//!
//! USD figures use a KRW-per-USD rate served by [`rates::RateService`]. The rate is cached in the
//! database and refreshed from the configured source once it is older than `rates.max_age`
//! (12 hours by default). A failed refresh never fails the request: the last cached rate, or the
//! configured default, is used and the response carries a notice instead.
//!
//! ## Configuration
//!
//! Configuration is loaded from a YAML file (default `config.yaml`) with environment variable
//! overrides prefixed `BUDGETD_`. See [`config`] for the full structure.
//!
//! ## Getting Started
//!
//! ```bash
//! BUDGETD_SECRET_KEY=change-me budgetd -f config.yaml
//! ```
//!
//! The OpenAPI document is served at `/api/openapi.json` and rendered at `/api/docs`.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod ledger;
pub mod openapi;
pub mod rates;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{config::CorsOrigin, openapi::ApiDoc, rates::RateService};
use axum::{
    Json, Router,
    http::{self, HeaderValue, Method},
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::str::FromStr;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{RecordId, UserId};

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `db`: SQLite connection pool
/// - `config`: Application configuration loaded from environment/files
/// - `rates`: Cached exchange rate lookup
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .rates(rates)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub rates: RateService,
}

/// Get the budgetd database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Open the SQLite database, creating the file if needed, and run migrations.
pub async fn setup_database(config: &Config) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database.url)?
        .create_if_missing(true)
        .foreign_keys(true);

    info!("Opening database {}", config.database.url);
    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout)
        .connect_with(options)
        .await?;

    migrator().run(&pool).await?;
    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    // Credentialed CORS cannot use wildcard methods or headers
    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([http::header::CONTENT_TYPE])
        .expose_headers(vec![http::header::LOCATION, http::header::CONTENT_DISPOSITION]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the main application router with all endpoints and middleware.
///
/// This function constructs the complete Axum router with:
/// - Authentication routes (register, login, logout, password change)
/// - Ledger routes (income, expenses, categories, summary, rate, export/import, settings)
/// - OpenAPI document and Scalar viewer
/// - Health check
/// - CORS configuration
/// - Tracing middleware
///
/// # Errors
///
/// Returns an error if CORS configuration is invalid.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let auth_routes = Router::new()
        .route("/authentication/register", post(api::handlers::auth::register))
        .route("/authentication/login", post(api::handlers::auth::login))
        .route("/authentication/logout", post(api::handlers::auth::logout))
        .route("/authentication/password-change", post(api::handlers::auth::change_password));

    let api_routes = Router::new()
        .route("/me", get(api::handlers::auth::get_current_user))
        // Income records
        .route(
            "/income",
            get(api::handlers::income::list_income)
                .post(api::handlers::income::create_income)
                .put(api::handlers::income::update_income)
                .delete(api::handlers::income::delete_income),
        )
        // Expense records
        .route(
            "/expenses",
            get(api::handlers::expenses::list_expenses)
                .post(api::handlers::expenses::create_expense)
                .put(api::handlers::expenses::update_expense)
                .delete(api::handlers::expenses::delete_expense),
        )
        .route(
            "/categories",
            get(api::handlers::categories::list_categories)
                .post(api::handlers::categories::create_category)
                .delete(api::handlers::categories::delete_category),
        )
        .route("/summary", get(api::handlers::summary::get_summary))
        // Exchange rate
        .route("/rate", get(api::handlers::rates::get_rate))
        .route("/rate/refresh", post(api::handlers::rates::refresh_rate))
        // Backup and restore
        .route("/ledger/export", get(api::handlers::transfer::export_ledger))
        .route("/ledger/import", post(api::handlers::transfer::import_ledger))
        .route(
            "/settings",
            get(api::handlers::settings::get_settings).put(api::handlers::settings::update_settings),
        )
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }));

    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .merge(auth_routes)
        .nest("/api", api_routes)
        .route("/healthz", get(api::handlers::health::healthz))
        .with_state(state)
        .merge(Scalar::with_url("/api/docs", ApiDoc::openapi()))
        .layer(cors_layer);

    // Add tracing layer
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The assembled service: database, rate lookup and router.
///
/// # Lifecycle
///
/// 1. **Initialization** ([`Application::new`]): opens the database, runs migrations, builds the
///    rate source and the router
/// 2. **Serving** ([`Application::serve`]): binds the configured address and handles requests
/// 3. **Shutdown**: when the shutdown future resolves, in-flight requests finish and the pool
///    is closed
pub struct Application {
    router: Router,
    app_state: AppState,
    config: Config,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create an application on an existing pool instead of opening `database.url`.
    ///
    /// Migrations are still applied to the supplied pool.
    pub async fn new_with_pool(config: Config, pool: Option<SqlitePool>) -> anyhow::Result<Self> {
        debug!("Starting budgetd with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => {
                migrator().run(&pool).await?;
                pool
            }
            None => setup_database(&config).await?,
        };

        let source = rates::create_source(config.rates.source.clone())?;
        info!("Using exchange rate source {}", source.name());
        let rates = RateService::new(source, &config.rates);

        let app_state = AppState::builder().db(pool).config(config.clone()).rates(rates).build();
        let router = build_router(app_state.clone())?;

        Ok(Self {
            router,
            app_state,
            config,
        })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> (axum_test::TestServer, AppState) {
        let server = axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server");
        (server, self.app_state)
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("budgetd listening on http://{}, available at http://localhost:{}", bind_addr, self.config.port);

        // Run the server with graceful shutdown
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.app_state.db.close().await;

        Ok(())
    }
}
