//! Request extractors that turn framework rejections into [`AppError`]s.

use crate::error::{AppError, FieldError};
use crate::schema::Validate;
use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;

/// JSON body that has been deserialized and passed [`Validate`].
/// Malformed bodies and rule violations are both reported as 422. Bodies
/// that cannot be read at all (over the size limit, aborted) are not.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_to_error)?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::BytesRejection(_) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            AppError::PayloadTooLarge(rejection.body_text())
        }
        JsonRejection::BytesRejection(_) => AppError::BadRequest(rejection.body_text()),
        _ => AppError::Validation(vec![FieldError::new("body", rejection.body_text())]),
    }
}

/// Parse an integer primary key from a path segment.
pub fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("invalid id".into()))
}
