use axum::{Json, extract::State};

use crate::api::json::ApiJson;
use crate::{
    AppState,
    api::models::{
        auth::{
            AuthResponse, AuthSuccessResponse, ChangePasswordRequest, LoginRequest, LoginResponse, LogoutResponse, RegisterRequest,
            RegisterResponse,
        },
        users::{CurrentUser, UserResponse},
    },
    auth::{password, session},
    config::{Config, PasswordConfig},
    db::{
        handlers::{Repository, Users},
        models::users::UserCreateDBRequest,
    },
    errors::Error,
};

/// Register a new user account
#[utoipa::path(
    post,
    path = "/authentication/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "User already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, ApiJson(request): ApiJson<RegisterRequest>) -> Result<RegisterResponse, Error> {
    if !state.config.auth.native.enabled {
        return Err(Error::BadRequest {
            message: "Native authentication is disabled".to_string(),
        });
    }

    if !state.config.auth.native.allow_registration {
        return Err(Error::BadRequest {
            message: "User registration is disabled".to_string(),
        });
    }

    let email = request.email.trim().to_string();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::BadRequest {
            message: "A valid email address is required".to_string(),
        });
    }
    check_password_length(&request.password, &state.config.auth.native.password)?;

    let name = request
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    let password_hash = password::hash_password(request.password).await?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut tx);

    // The unique index decides races; this check only gives the common case a clearer message
    if user_repo.get_user_by_email(&email).await?.is_some() {
        return Err(Error::Conflict {
            message: "An account with this email address already exists".to_string(),
        });
    }

    let created_user = user_repo
        .create(&UserCreateDBRequest {
            email,
            name,
            password_hash,
        })
        .await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let user_response = UserResponse::from(created_user);
    let current_user = user_response.clone().into();
    let token = session::create_session_token(&current_user, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    let auth_response = AuthResponse {
        user: user_response,
        message: "Registration successful".to_string(),
    };

    Ok(RegisterResponse { auth_response, cookie })
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/authentication/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, ApiJson(request): ApiJson<LoginRequest>) -> Result<LoginResponse, Error> {
    if !state.config.auth.native.enabled {
        return Err(Error::BadRequest {
            message: "Native authentication is disabled".to_string(),
        });
    }
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let user = Users::new(&mut pool_conn)
        .get_user_by_email(request.email.trim())
        .await?
        .ok_or_else(invalid_credentials)?;

    let is_valid = password::verify_password(request.password, user.password_hash.clone()).await?;
    if !is_valid {
        return Err(invalid_credentials());
    }

    let user_response = UserResponse::from(user);
    let current_user = user_response.clone().into();
    let token = session::create_session_token(&current_user, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    let auth_response = AuthResponse {
        user: user_response,
        message: "Login successful".to_string(),
    };

    Ok(LoginResponse { auth_response, cookie })
}

/// Logout (clear session)
#[utoipa::path(
    post,
    path = "/authentication/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = AuthSuccessResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> Result<LogoutResponse, Error> {
    let session_config = &state.config.auth.native.session;
    let secure = if session_config.cookie_secure { "; Secure" } else { "" };
    let cookie = format!(
        "{}=; Path=/; HttpOnly{}; SameSite={}; Max-Age=0",
        session_config.cookie_name, secure, session_config.cookie_same_site
    );

    let auth_response = AuthSuccessResponse {
        message: "Logout successful".to_string(),
    };

    Ok(LogoutResponse { auth_response, cookie })
}

/// Change password for authenticated user
#[utoipa::path(
    post,
    path = "/authentication/password-change",
    request_body = ChangePasswordRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Password changed successfully", body = AuthSuccessResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Current password is incorrect"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<Json<AuthSuccessResponse>, Error> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut pool_conn);

    let user = user_repo.get_by_id(current_user.id).await?.ok_or_else(|| Error::Unauthenticated {
        message: Some("User not found".to_string()),
    })?;

    let is_valid = password::verify_password(request.current_password, user.password_hash).await?;
    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Current password is incorrect".to_string()),
        });
    }

    check_password_length(&request.new_password, &state.config.auth.native.password)?;
    let new_password_hash = password::hash_password(request.new_password).await?;

    user_repo.update_password(current_user.id, &new_password_hash).await?;

    Ok(Json(AuthSuccessResponse {
        message: "Password changed successfully".to_string(),
    }))
}

/// Get the signed-in user
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "authentication",
    responses(
        (status = 200, description = "The signed-in user", body = CurrentUser),
        (status = 401, description = "Not signed in"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_current_user(current_user: CurrentUser) -> Json<CurrentUser> {
    Json(current_user)
}

fn invalid_credentials() -> Error {
    Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    }
}

fn check_password_length(password: &str, config: &PasswordConfig) -> Result<(), Error> {
    let length = password.chars().count();
    if length < config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", config.min_length),
        });
    }
    if length > config.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters", config.max_length),
        });
    }
    Ok(())
}

/// Build the `Set-Cookie` value carrying a session token
pub(crate) fn create_session_cookie(token: &str, config: &Config) -> String {
    let session_config = &config.auth.native.session;
    let max_age = session_config.timeout.as_secs();
    let secure = if session_config.cookie_secure { "; Secure" } else { "" };

    format!(
        "{}={}; Path=/; HttpOnly{}; SameSite={}; Max-Age={}",
        session_config.cookie_name, token, secure, session_config.cookie_same_site, max_age
    )
}
