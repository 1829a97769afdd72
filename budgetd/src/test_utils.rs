//! Helpers shared by handler and repository tests.

use crate::{
    AppState,
    api::models::users::{CurrentUser, UserResponse},
    auth::{
        password::{HashCost, hash_with_cost},
        session::create_session_token,
    },
    config::{Config, FixedRateSourceConfig, RateSourceConfig},
    db::{
        handlers::{Repository, Users},
        models::users::{UserCreateDBRequest, UserDBResponse},
    },
};
use axum_test::TestServer;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Password every user from [`create_test_user`] logs in with.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// One won is worth 1/1024 dollars, so the service reports exactly 1024 KRW per USD.
pub const TEST_USD_PER_KRW: f64 = 1.0 / 1024.0;

pub fn create_test_config() -> Config {
    let mut config = Config {
        secret_key: Some("test-secret-key-for-sessions".to_string()),
        ..Default::default()
    };
    config.auth.native.session.cookie_secure = false;
    config.rates.source = RateSourceConfig::Fixed(FixedRateSourceConfig {
        usd_per_krw: TEST_USD_PER_KRW,
    });
    config
}

pub async fn create_test_app(pool: SqlitePool) -> (TestServer, AppState) {
    create_test_app_with_config(pool, create_test_config()).await
}

pub async fn create_test_app_with_config(pool: SqlitePool, config: Config) -> (TestServer, AppState) {
    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

/// Insert a user with a unique email and [`TEST_PASSWORD`].
pub async fn create_test_user(pool: &SqlitePool) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users_repo = Users::new(&mut conn);
    let suffix = Uuid::new_v4().simple().to_string();

    let password_hash = hash_with_cost(TEST_PASSWORD, HashCost::MINIMAL).expect("Failed to hash test password");

    let user_create = UserCreateDBRequest {
        email: format!("saver_{suffix}@example.com"),
        name: format!("Saver {}", &suffix[..8]),
        password_hash,
    };

    users_repo.create(&user_create).await.expect("Failed to create test user")
}

/// A `Cookie` header value carrying a valid session for `user`.
pub fn session_cookie(user: &UserDBResponse, config: &Config) -> String {
    let current_user = CurrentUser::from(UserResponse::from(user.clone()));
    let token = create_session_token(&current_user, config).expect("Failed to create session token");
    format!("{}={}", config.auth.native.session.cookie_name, token)
}
