// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local, unverified decoding of JWT-shaped bearer tokens.
//!
//! Only the payload segment is read. Signature verification belongs to the
//! identity service.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use promptlab_core::PromptlabError;
use promptlab_core::types::{AuthToken, Claims, Credential};

/// Decode the claims of a `header.payload.signature` token.
pub fn decode_claims(token: &AuthToken) -> Result<Claims, PromptlabError> {
    let mut segments = token.as_str().split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(header), Some(payload), Some(_sig), None) if !header.is_empty() && !payload.is_empty() => {
            payload
        }
        _ => {
            return Err(PromptlabError::AuthMalformed(
                "token must have three dot-separated segments".to_string(),
            ));
        }
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| PromptlabError::AuthMalformed(format!("payload is not base64url: {e}")))?;

    let claims: Claims = serde_json::from_slice(&bytes)
        .map_err(|e| PromptlabError::AuthMalformed(format!("payload is not a claims object: {e}")))?;

    if claims.sub.trim().is_empty() {
        return Err(PromptlabError::AuthMalformed("token has an empty subject".to_string()));
    }
    Ok(claims)
}

/// Build a [`Credential`] from a raw bearer value and optional refresh token.
pub fn parse_credential(
    bearer: &str,
    refresh_token: Option<String>,
) -> Result<Credential, PromptlabError> {
    let token = AuthToken(bearer.trim().to_string());
    let claims = decode_claims(&token)?;
    Ok(Credential {
        token,
        claims,
        refresh_token: refresh_token.filter(|t| !t.trim().is_empty()),
    })
}

/// Encode claims as an unsigned token (`alg: none`).
///
/// Used by tests and local tooling; the identity service never accepts these.
pub fn encode_unsigned(claims: &Claims) -> AuthToken {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    // Claims is a plain struct of strings and integers; serialization cannot fail.
    let payload = serde_json::to_vec(claims).unwrap_or_default();
    AuthToken(format!("{header}.{}.unsigned", URL_SAFE_NO_PAD.encode(payload)))
}
