// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-model dispatch.

use std::time::Duration;

use promptlab_core::PromptlabError;
use promptlab_core::types::{Credential, InvocationContext, TestResult};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::DispatchContext;
use crate::assemble_prompt;
use crate::invoke::{Deadline, invoke_and_persist};
use crate::request::TestRequest;
use crate::scope::CancelRegistry;
use crate::state::{RunState, RunTracker};

pub const DEFAULT_SINGLE_TIMEOUT: Duration = Duration::from_secs(120);

/// A completed single run.
#[derive(Debug, Clone)]
pub struct SingleTestOutcome {
    pub result: TestResult,
    pub version_number: i64,
}

/// Runs exactly one model invocation end to end.
pub struct SingleTestDispatcher {
    ctx: DispatchContext,
    timeout: Duration,
}

impl SingleTestDispatcher {
    pub fn new(ctx: DispatchContext) -> Self {
        Self {
            ctx,
            timeout: DEFAULT_SINGLE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run `request` on behalf of `credential`.
    ///
    /// Once the request and the session are both valid, any run still in
    /// flight for the same authenticated caller in `scopes` is cancelled.
    /// Failures before the provider is called leave no row behind; once the
    /// provider is called, exactly one row is written and a failed row is
    /// reported as the error that caused it.
    pub async fn run(
        &self,
        credential: &Credential,
        request: &TestRequest,
        scopes: &CancelRegistry,
    ) -> Result<SingleTestOutcome, PromptlabError> {
        let mut run = RunTracker::new(uuid::Uuid::new_v4().to_string());
        let outcome = self.drive(&mut run, credential, request, scopes).await;
        if outcome.is_err() {
            run.fail();
        }
        outcome
    }

    async fn drive(
        &self,
        run: &mut RunTracker,
        credential: &Credential,
        request: &TestRequest,
        scopes: &CancelRegistry,
    ) -> Result<SingleTestOutcome, PromptlabError> {
        run.advance(RunState::Validating)?;
        let (spec, params) = request.validate(&self.ctx.defaults)?;
        let session = self.ctx.validator.validate(credential).await?;
        let ticket = scopes.begin(&session.identity.user_id);

        run.advance(RunState::HealthChecking)?;
        self.ctx.health_gate().check().await?;

        run.advance(RunState::Invoking)?;
        let version = self.ctx.current_version(&request.prompt_id).await?;
        let full_prompt = assemble_prompt(&version.content, &request.input);
        let invocation = InvocationContext {
            prompt_id: request.prompt_id.clone(),
            prompt_version_id: version.version_id.clone(),
            user_id: session.identity.user_id.clone(),
            input_text: request.input.clone(),
            model: spec.id.to_string(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            batch_id: None,
        };
        debug!(
            run_id = %run.run_id(),
            prompt_id = %request.prompt_id,
            model = %invocation.model,
            version = version.version_number,
            "invoking model"
        );

        let deadline = Deadline::after(Instant::now(), self.timeout);
        let outcome = invoke_and_persist(
            self.ctx.provider.as_ref(),
            self.ctx.storage.as_ref(),
            invocation,
            full_prompt,
            deadline,
            Some(ticket.token()),
        )
        .await?;
        run.advance(RunState::Persisting)?;

        if let Some(error) = outcome.error {
            return Err(error);
        }
        run.advance(RunState::Done)?;
        info!(
            run_id = %run.run_id(),
            model = %outcome.result.model,
            elapsed_ms = outcome.result.response_time_ms,
            "single test completed"
        );
        Ok(SingleTestOutcome {
            result: outcome.result,
            version_number: version.version_number,
        })
    }
}
