// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Caller authentication for Promptlab.
//!
//! Bearer tokens are decoded locally to read their claims, then validated
//! against the external identity service. Token issuance happens elsewhere.

pub mod claims;
pub mod remote;
pub mod validator;

pub use claims::{decode_claims, encode_unsigned, parse_credential};
pub use remote::RemoteAuthAdapter;
pub use validator::{SessionValidator, ValidatedSession};
