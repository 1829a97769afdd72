use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    config::Config,
    errors::{Error, Result},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, instrument, trace};

/// Extract user from JWT session cookie if present and valid
/// Returns:
/// - None: No valid session cookie present
/// - Some(Ok(user)): Valid JWT found and verified
/// - Some(Err(error)): Cookie header present but unreadable
#[instrument(skip(parts, config))]
fn try_jwt_session_auth(parts: &Parts, config: &Config) -> Option<Result<CurrentUser>> {
    let cookie_header = parts.headers.get(axum::http::header::COOKIE)?;

    let cookie_str = match cookie_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid cookie header: {e}"),
            }));
        }
    };
    let cookie_name = &config.auth.native.session.cookie_name;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=') {
            if name == cookie_name {
                match session::verify_session_token(value, config) {
                    Ok(user) => return Some(Ok(user)),
                    Err(e) => {
                        // Expired or tampered tokens are expected; keep looking in case of duplicates
                        trace!("Session cookie rejected: {}", e);
                        continue;
                    }
                }
            }
        }
    }
    None
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        if !state.config.auth.native.enabled {
            return Err(Error::Unauthenticated {
                message: Some("Authentication is disabled".to_string()),
            });
        }

        match try_jwt_session_auth(parts, &state.config) {
            Some(Ok(user)) => {
                debug!("Found JWT session authenticated user: {}", user.id);
                Ok(user)
            }
            Some(Err(e)) => Err(e),
            None => Err(Error::Unauthenticated { message: None }),
        }
    }
}
