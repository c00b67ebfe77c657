// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error envelope for handler failures.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use promptlab_core::{ErrorType, PromptlabError};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub error_type: ErrorType,
    pub error_code: &'static str,
}

/// A [`PromptlabError`] rendered as an HTTP 200 failure body.
#[derive(Debug)]
pub struct ApiError(pub PromptlabError);

impl From<PromptlabError> for ApiError {
    fn from(err: PromptlabError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            success: false,
            error: self.0.to_string(),
            error_type: self.0.error_type(),
            error_code: self.0.error_code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = self.body();
        if body.error_type == ErrorType::Unexpected {
            warn!(error = %self.0, "request failed unexpectedly");
        }
        (StatusCode::OK, Json(body)).into_response()
    }
}

/// JSON body extractor whose rejections use the failure envelope.
///
/// Missing fields, wrong types and malformed JSON are validation failures.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError(PromptlabError::Validation(
                rejection.body_text(),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_type_and_code() {
        let body = ApiError(PromptlabError::Timeout {
            duration: std::time::Duration::from_secs(120),
        })
        .body();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["errorType"], "api");
        assert_eq!(json["errorCode"], "timeout");
    }

    #[test]
    fn response_is_http_200() {
        let response = ApiError(PromptlabError::Validation("bad".into())).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
