//! Scenario report model
//!
//! The serializable tree handed to renderers once a scenario completes.

use crate::error::ReportError;
use crate::fragment::{Outcome, ReportFragment};
use crate::sink::CastEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything recorded for one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario name
    pub scenario: String,
    /// When the report was assembled
    pub generated_at: DateTime<Utc>,
    /// Top-level fragments in emission order
    pub fragments: Vec<ReportFragment>,
    /// Cast events in emission order
    pub events: Vec<CastEvent>,
}

/// Outcome counts over every fragment in a report, nested ones included
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeSummary {
    /// Passed steps
    pub passed: usize,
    /// Failed steps
    pub failed: usize,
    /// Canceled steps
    pub canceled: usize,
}

impl OutcomeSummary {
    /// Total number of steps
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.canceled
    }
}

impl ScenarioReport {
    /// Assemble a report
    #[must_use]
    pub fn new(
        scenario: impl Into<String>,
        fragments: Vec<ReportFragment>,
        events: Vec<CastEvent>,
    ) -> Self {
        Self {
            scenario: scenario.into(),
            generated_at: Utc::now(),
            fragments,
            events,
        }
    }

    /// Every fragment, depth-first in invocation order
    #[must_use]
    pub fn steps(&self) -> Vec<&ReportFragment> {
        self.fragments.iter().flat_map(ReportFragment::walk).collect()
    }

    /// Count outcomes
    #[must_use]
    pub fn summary(&self) -> OutcomeSummary {
        let mut summary = OutcomeSummary::default();
        for step in self.steps() {
            match step.outcome() {
                Outcome::Passed => summary.passed += 1,
                Outcome::Failed { .. } => summary.failed += 1,
                Outcome::Canceled => summary.canceled += 1,
            }
        }
        summary
    }

    /// Whether every step passed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.steps().iter().all(|step| step.outcome().is_passed())
    }

    /// Serialize to JSON
    ///
    /// # Errors
    /// Returns [`ReportError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON
    ///
    /// # Errors
    /// Returns [`ReportError::Serialization`] if encoding fails.
    pub fn to_json_pretty(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON
    ///
    /// # Errors
    /// Returns [`ReportError::Serialization`] on malformed input.
    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        Ok(serde_json::from_str(json)?)
    }
}
