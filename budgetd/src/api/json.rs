//! JSON request bodies that fail like every other bad request.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use tracing::debug;

use crate::errors::Error;

/// [`Json`] whose rejection is an [`Error::BadRequest`] naming what was wrong with the body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(status = %rejection.status(), "Rejected request body");
                Err(Error::BadRequest {
                    message: rejection.body_text(),
                })
            }
        }
    }
}
