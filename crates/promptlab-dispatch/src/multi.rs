// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multi-model dispatch.
//!
//! Fans one input out to N models at once under a shared deadline. Each
//! model is isolated: a failure is recorded next to its siblings' results
//! and never aborts them. Every outcome is persisted under the batch id.

use std::time::Duration;

use futures::future::join_all;
use promptlab_core::PromptlabError;
use promptlab_core::types::{Credential, InvocationContext, TestResult};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::DispatchContext;
use crate::assemble_prompt;
use crate::invoke::{Deadline, invoke_and_persist};
use crate::request::BatchRequest;
use crate::state::{RunState, RunTracker};

pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(300);

/// One model that did not produce a completed result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFailure {
    pub model: String,
    pub error: String,
    pub error_code: &'static str,
}

/// Aggregates over successful invocations only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchMetadata {
    pub total_cost: f64,
    pub mean_response_time_ms: f64,
    pub total_tokens: u32,
}

impl BatchMetadata {
    pub fn over(successes: &[TestResult]) -> Self {
        if successes.is_empty() {
            return Self::default();
        }
        let total_cost = successes.iter().map(|r| r.cost_estimate).sum();
        let total_ms: u64 = successes.iter().map(|r| r.response_time_ms).sum();
        let total_tokens = successes.iter().map(|r| r.token_usage.total_tokens).sum();
        Self {
            total_cost,
            mean_response_time_ms: total_ms as f64 / successes.len() as f64,
            total_tokens,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub batch_id: String,
    pub version_number: i64,
    pub successes: Vec<TestResult>,
    pub failures: Vec<ModelFailure>,
    pub metadata: BatchMetadata,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len()
    }
}

/// Runs one input against many models concurrently.
pub struct MultiTestDispatcher {
    ctx: DispatchContext,
    timeout: Duration,
}

impl MultiTestDispatcher {
    pub fn new(ctx: DispatchContext) -> Self {
        Self {
            ctx,
            timeout: DEFAULT_BATCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn run(
        &self,
        credential: &Credential,
        request: &BatchRequest,
    ) -> Result<BatchOutcome, PromptlabError> {
        let batch_id = uuid::Uuid::new_v4().to_string();
        let mut run = RunTracker::new(batch_id.clone());
        let outcome = self.drive(&mut run, batch_id, credential, request).await;
        if outcome.is_err() {
            run.fail();
        }
        outcome
    }

    async fn drive(
        &self,
        run: &mut RunTracker,
        batch_id: String,
        credential: &Credential,
        request: &BatchRequest,
    ) -> Result<BatchOutcome, PromptlabError> {
        run.advance(RunState::Validating)?;
        let (specs, params) = request.validate(&self.ctx.defaults)?;
        let session = self.ctx.validator.validate(credential).await?;

        run.advance(RunState::HealthChecking)?;
        self.ctx.health_gate().check().await?;

        run.advance(RunState::Invoking)?;
        let version = self.ctx.current_version(&request.prompt_id).await?;
        let full_prompt = assemble_prompt(&version.content, &request.input);
        let deadline = Deadline::after(Instant::now(), self.timeout);
        info!(
            batch_id = %batch_id,
            prompt_id = %request.prompt_id,
            models = specs.len(),
            "dispatching batch"
        );

        let calls = specs.iter().map(|spec| {
            let invocation = InvocationContext {
                prompt_id: request.prompt_id.clone(),
                prompt_version_id: version.version_id.clone(),
                user_id: session.identity.user_id.clone(),
                input_text: request.input.clone(),
                model: spec.id.to_string(),
                temperature: params.temperature,
                max_tokens: params.max_tokens,
                batch_id: Some(batch_id.clone()),
            };
            let model = invocation.model.clone();
            let prompt = full_prompt.clone();
            async move {
                let outcome = invoke_and_persist(
                    self.ctx.provider.as_ref(),
                    self.ctx.storage.as_ref(),
                    invocation,
                    prompt,
                    deadline,
                    None,
                )
                .await;
                (model, outcome)
            }
        });
        let outcomes = join_all(calls).await;
        run.advance(RunState::Persisting)?;

        let mut successes = Vec::new();
        let mut failures = Vec::new();
        for (model, outcome) in outcomes {
            match outcome {
                Ok(done) => match done.error {
                    None => successes.push(done.result),
                    Some(e) => failures.push(ModelFailure {
                        model,
                        error: e.to_string(),
                        error_code: e.error_code(),
                    }),
                },
                Err(e) => {
                    warn!(batch_id = %batch_id, model = %model, "result could not be persisted: {e}");
                    failures.push(ModelFailure {
                        model,
                        error: e.to_string(),
                        error_code: e.error_code(),
                    });
                }
            }
        }

        let metadata = BatchMetadata::over(&successes);
        run.advance(RunState::Done)?;
        info!(
            batch_id = %batch_id,
            succeeded = successes.len(),
            failed = failures.len(),
            total_cost = metadata.total_cost,
            "batch completed"
        );
        Ok(BatchOutcome {
            batch_id,
            version_number: version.version_number,
            successes,
            failures,
            metadata,
        })
    }
}
