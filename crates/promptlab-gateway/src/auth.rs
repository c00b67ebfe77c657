// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential extraction middleware.
//!
//! Parses `Authorization: Bearer <token>` and the optional `X-Refresh-Token`
//! header into a [`Credential`] request extension. Only structure is checked
//! here; expiry, refresh and identity checks happen per operation.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use promptlab_auth::parse_credential;
use promptlab_core::PromptlabError;
use promptlab_core::types::Credential;

use crate::error::ApiError;

pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

/// Rejects requests without a well-formed bearer credential.
pub async fn credential_middleware(mut request: Request, next: Next) -> Response {
    match extract_credential(&request) {
        Ok(credential) => {
            request.extensions_mut().insert(credential);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "rejecting request without a usable credential");
            ApiError(e).into_response()
        }
    }
}

fn extract_credential(request: &Request) -> Result<Credential, PromptlabError> {
    let headers = request.headers();
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| PromptlabError::AuthMalformed("missing bearer token".into()))?;
    let refresh = headers
        .get(REFRESH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    parse_credential(bearer, refresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use promptlab_test_utils::TokenBuilder;

    fn request_with(headers: &[(&str, &str)]) -> Request {
        let mut builder = axum::http::Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn missing_header_is_malformed() {
        let err = extract_credential(&request_with(&[])).unwrap_err();
        assert!(matches!(err, PromptlabError::AuthMalformed(_)));
    }

    #[test]
    fn non_bearer_scheme_is_malformed() {
        let err = extract_credential(&request_with(&[("authorization", "Basic abc")])).unwrap_err();
        assert!(matches!(err, PromptlabError::AuthMalformed(_)));
    }

    #[test]
    fn garbage_token_is_malformed() {
        let err =
            extract_credential(&request_with(&[("authorization", "Bearer not-a-jwt")])).unwrap_err();
        assert_eq!(err.error_code(), "auth_malformed");
    }

    #[test]
    fn bearer_and_refresh_are_parsed() {
        let tokens = TokenBuilder::new("u1");
        let bearer = tokens.bearer();
        let credential = extract_credential(&request_with(&[
            ("authorization", bearer.as_str()),
            ("x-refresh-token", "refresh-u1"),
        ]))
        .unwrap();
        assert_eq!(credential.claims.sub, "u1");
        assert_eq!(credential.refresh_token.as_deref(), Some("refresh-u1"));
    }
}
