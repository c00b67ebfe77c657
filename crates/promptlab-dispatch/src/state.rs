// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatcher run lifecycle.

use promptlab_core::PromptlabError;
use serde::Serialize;
use strum::Display;
use tracing::debug;

/// States of a single dispatcher run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Validating,
    HealthChecking,
    Invoking,
    Persisting,
    Done,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }

    fn can_advance_to(self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Idle, Validating)
            | (Validating, HealthChecking)
            | (HealthChecking, Invoking)
            | (Invoking, Persisting)
            | (Persisting, Done) => true,
            _ => false,
        }
    }
}

/// Tracks one run through [`RunState`], logging each transition.
#[derive(Debug)]
pub struct RunTracker {
    run_id: String,
    state: RunState,
}

impl RunTracker {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn advance(&mut self, next: RunState) -> Result<(), PromptlabError> {
        if !self.state.can_advance_to(next) {
            return Err(PromptlabError::Internal(format!(
                "illegal run transition {} -> {next}",
                self.state
            )));
        }
        debug!(run_id = %self.run_id, from = %self.state, state = %next, "run state transition");
        self.state = next;
        Ok(())
    }

    /// Move to `Failed` unless the run already finished.
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            debug!(run_id = %self.run_id, from = %self.state, state = %RunState::Failed, "run failed");
            self.state = RunState::Failed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_reaches_done() {
        let mut run = RunTracker::new("r1");
        for next in [
            RunState::Validating,
            RunState::HealthChecking,
            RunState::Invoking,
            RunState::Persisting,
            RunState::Done,
        ] {
            run.advance(next).unwrap();
        }
        assert_eq!(run.state(), RunState::Done);
        assert!(run.state().is_terminal());
    }

    #[test]
    fn skipping_a_state_is_rejected() {
        let mut run = RunTracker::new("r1");
        run.advance(RunState::Validating).unwrap();
        let err = run.advance(RunState::Invoking).unwrap_err();
        assert!(err.to_string().contains("validating -> invoking"));
        assert_eq!(run.state(), RunState::Validating);
    }

    #[test]
    fn any_live_state_can_fail() {
        let mut run = RunTracker::new("r1");
        run.advance(RunState::Validating).unwrap();
        run.advance(RunState::HealthChecking).unwrap();
        run.advance(RunState::Failed).unwrap();
        assert_eq!(run.state(), RunState::Failed);
    }

    #[test]
    fn terminal_states_are_final() {
        let mut run = RunTracker::new("r1");
        run.fail();
        assert!(run.advance(RunState::Validating).is_err());
        run.fail();
        assert_eq!(run.state(), RunState::Failed);
    }

    #[test]
    fn state_display_is_snake_case() {
        assert_eq!(RunState::HealthChecking.to_string(), "health_checking");
    }
}
