//! Validation outcome and its terminal/issues invariant.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::issue::ValidationIssue;

/// Workflow state of a validation.
///
/// The engine only ever produces `Succeeded` or `Failed`; the other states
/// belong to the orchestrator's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationState {
    NotStarted,
    Incomplete,
    Failed,
    Succeeded,
}

impl ValidationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Succeeded)
    }
}

impl fmt::Display for ValidationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotStarted => "not_started",
            Self::Incomplete => "incomplete",
            Self::Failed => "failed",
            Self::Succeeded => "succeeded",
        })
    }
}

/// State plus the ordered issues explaining it.
///
/// Fields are private so the invariant checked in [`ValidationOutcome::new`]
/// cannot be bypassed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    state: ValidationState,
    issues: Vec<ValidationIssue>,
}

impl ValidationOutcome {
    /// Build an outcome, rejecting issues on a non-terminal state.
    pub fn new(state: ValidationState, issues: Vec<ValidationIssue>) -> ValidationResult<Self> {
        if !issues.is_empty() && !state.is_terminal() {
            return Err(ValidationError::InvalidOutcome {
                state,
                issue_count: issues.len(),
            });
        }
        Ok(Self { state, issues })
    }

    pub fn succeeded() -> Self {
        Self {
            state: ValidationState::Succeeded,
            issues: Vec::new(),
        }
    }

    /// Failed with no issues attached.
    pub fn failed() -> Self {
        Self::failed_with(Vec::new())
    }

    pub fn failed_with(issues: Vec<ValidationIssue>) -> Self {
        Self {
            state: ValidationState::Failed,
            issues,
        }
    }

    pub fn state(&self) -> ValidationState {
        self.state
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn is_succeeded(&self) -> bool {
        self.state == ValidationState::Succeeded
    }
}

impl<'de> Deserialize<'de> for ValidationOutcome {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            state: ValidationState,
            #[serde(default)]
            issues: Vec<ValidationIssue>,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.state, raw.issues).map_err(serde::de::Error::custom)
    }
}
