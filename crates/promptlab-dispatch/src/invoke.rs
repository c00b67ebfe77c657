// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One provider call under a deadline and an optional cancel token, followed
//! by exactly one persisted row.

use std::time::Duration;

use promptlab_core::types::{InvocationContext, ProviderRequest, TestResult};
use promptlab_core::{PromptlabError, ProviderAdapter, StorageAdapter};
use promptlab_cost::{estimate_cost, estimate_usage};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Absolute deadline plus the budget it was derived from, for error reporting.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    pub at: Instant,
    pub budget: Duration,
}

impl Deadline {
    pub fn after(start: Instant, budget: Duration) -> Self {
        Self {
            at: start + budget,
            budget,
        }
    }
}

/// The persisted row and, for failures, the error that produced it.
#[derive(Debug)]
pub(crate) struct InvocationOutcome {
    pub result: TestResult,
    pub error: Option<PromptlabError>,
}

/// Call the provider and persist the outcome.
///
/// Returns `Err` only when the row itself could not be written.
pub(crate) async fn invoke_and_persist(
    provider: &dyn ProviderAdapter,
    storage: &dyn StorageAdapter,
    ctx: InvocationContext,
    full_prompt: String,
    deadline: Deadline,
    cancel: Option<&CancellationToken>,
) -> Result<InvocationOutcome, PromptlabError> {
    let started = Instant::now();
    let request = ProviderRequest {
        model: ctx.model.clone(),
        prompt: full_prompt.clone(),
        temperature: ctx.temperature,
        max_tokens: ctx.max_tokens,
    };

    let cancelled = async {
        match cancel {
            Some(token) => token.cancelled().await,
            None => std::future::pending::<()>().await,
        }
    };

    let call = tokio::select! {
        biased;
        _ = cancelled => Err(PromptlabError::Cancelled(
            "superseded by a newer run in the same session".into(),
        )),
        res = tokio::time::timeout_at(deadline.at, provider.complete(request)) => match res {
            Ok(inner) => inner,
            Err(_) => Err(PromptlabError::Timeout { duration: deadline.budget }),
        },
    };
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let (result, error) = match call {
        Ok(response) => {
            let usage = estimate_usage(&full_prompt, &response.content);
            let cost = estimate_cost(&usage, response.cost_per_1k);
            (
                TestResult::completed(&ctx, response.content, usage, cost, elapsed_ms),
                None,
            )
        }
        Err(e) => {
            warn!(
                model = %ctx.model,
                batch_id = ?ctx.batch_id,
                error_code = e.error_code(),
                elapsed_ms,
                "model invocation failed: {e}"
            );
            (TestResult::failed(&ctx, e.to_string(), elapsed_ms), Some(e))
        }
    };

    storage.insert_test_result(&result).await?;
    info!(
        result_id = %result.id,
        prompt_id = %result.prompt_id,
        model = %result.model,
        batch_id = ?result.batch_id,
        status = %result.status,
        elapsed_ms,
        "test result persisted"
    );
    Ok(InvocationOutcome { result, error })
}
