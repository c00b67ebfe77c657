// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model registry and cost estimation for Promptlab.
//!
//! The registry is a closed, compile-time table of supported models. Token
//! counts are estimated from character length; there is no tokenizer.

pub mod estimate;
pub mod registry;

pub use estimate::{estimate_cost, estimate_tokens, estimate_usage};
pub use registry::{ModelId, ModelSpec, lookup, validate_models};
