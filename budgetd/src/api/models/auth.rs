use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::models::users::UserResponse;

/// Request to register a new user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Email address (must be unique, compared case-insensitively)
    pub email: String,
    /// Password (will be hashed)
    pub password: String,
    /// Display name; defaults to the part of the email before the `@`
    #[serde(default)]
    pub name: Option<String>,
}

/// Request to login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

/// Request to change password (for authenticated users)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    /// Current password (for verification)
    pub current_password: String,
    /// New password
    pub new_password: String,
}

/// Response after successful login or registration
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    /// User information
    pub user: UserResponse,
    /// Success message
    pub message: String,
}

/// Generic success response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthSuccessResponse {
    pub message: String,
}

/// Structured response for successful registration
pub struct RegisterResponse {
    pub auth_response: AuthResponse,
    pub cookie: String,
}

/// Structured response for successful login
pub struct LoginResponse {
    pub auth_response: AuthResponse,
    pub cookie: String,
}

/// Structured response for successful logout
pub struct LogoutResponse {
    pub auth_response: AuthSuccessResponse,
    pub cookie: String,
}

fn with_cookie<T: Serialize>(status: StatusCode, cookie: &str, body: T) -> Response {
    let mut headers = HeaderMap::new();
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            headers.insert(header::SET_COOKIE, value);
        }
        Err(e) => {
            tracing::error!("Session cookie is not a valid header value: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }
    (status, headers, Json(body)).into_response()
}

impl IntoResponse for RegisterResponse {
    fn into_response(self) -> Response {
        with_cookie(StatusCode::CREATED, &self.cookie, self.auth_response)
    }
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        with_cookie(StatusCode::OK, &self.cookie, self.auth_response)
    }
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        with_cookie(StatusCode::OK, &self.cookie, self.auth_response)
    }
}
