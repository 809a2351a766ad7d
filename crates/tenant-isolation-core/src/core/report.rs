// crates/tenant-isolation-core/src/core/report.rs
// ============================================================================
// Module: Validation Report
// Description: Probe verdicts and the aggregated validation report.
// Purpose: Keep probe status derivation and report aggregation in one place.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Probes never construct a [`ProbeResult`] directly; they collect evidence
//! through a [`ProbeRecorder`], which derives the status from what was
//! recorded. The orchestrator folds the per-category results into a
//! [`ValidationReport`].
//!
//! ## Invariants
//! - `status == Failed` iff `issues` is non-empty.
//! - `status == Passed` iff `issues` is empty and at least one check ran.
//! - `status == Skipped` only when a precondition was unmet; the reason is
//!   carried in `skip_reason`, never in `issues`.
//! - `validation_status == Passed` iff every category passed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Probe Results
// ============================================================================

/// Verdict of a single probe category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    /// Every applicable check passed.
    Passed,
    /// At least one check recorded an issue.
    Failed,
    /// Preconditions were unmet; nothing was checked.
    Skipped,
}

impl ProbeStatus {
    /// Returns a stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Isolation check category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeCategory {
    /// Cross-tenant network reachability.
    NetworkIsolation,
    /// Per-tenant storage write/read.
    DataIsolation,
    /// Memory, CPU and network attachment limits.
    ResourceLimits,
    /// Privilege and filesystem posture.
    ContainerSecurity,
}

impl ProbeCategory {
    /// All categories in execution order.
    pub const ALL: [Self; 4] =
        [Self::NetworkIsolation, Self::DataIsolation, Self::ResourceLimits, Self::ContainerSecurity];

    /// Returns a stable label for the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NetworkIsolation => "network_isolation",
            Self::DataIsolation => "data_isolation",
            Self::ResourceLimits => "resource_limits",
            Self::ContainerSecurity => "container_security",
        }
    }
}

impl fmt::Display for ProbeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one probe category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Derived verdict.
    pub status: ProbeStatus,
    /// Evidence for passing checks, in execution order.
    pub tests: Vec<String>,
    /// Evidence for failing checks, in execution order.
    pub issues: Vec<String>,
    /// Why the probe was skipped, when it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

impl ProbeResult {
    /// Builds a skipped result with an explanation.
    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Skipped,
            tests: Vec::new(),
            issues: Vec::new(),
            skip_reason: Some(reason.into()),
        }
    }
}

/// Evidence accumulator that derives a consistent [`ProbeResult`].
#[derive(Debug, Default)]
pub struct ProbeRecorder {
    /// Passing evidence.
    tests: Vec<String>,
    /// Failing evidence.
    issues: Vec<String>,
}

impl ProbeRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records evidence of a passing check.
    pub fn pass(&mut self, evidence: impl Into<String>) {
        self.tests.push(evidence.into());
    }

    /// Records evidence of a failing check.
    pub fn issue(&mut self, evidence: impl Into<String>) {
        self.issues.push(evidence.into());
    }

    /// Finalizes the recorder into a result.
    ///
    /// A recorder with no evidence at all yields `Skipped`, since no
    /// applicable check ran.
    #[must_use]
    pub fn finish(self) -> ProbeResult {
        let (status, skip_reason) = if !self.issues.is_empty() {
            (ProbeStatus::Failed, None)
        } else if self.tests.is_empty() {
            (ProbeStatus::Skipped, Some("no applicable checks ran".to_string()))
        } else {
            (ProbeStatus::Passed, None)
        };
        ProbeResult {
            status,
            tests: self.tests,
            issues: self.issues,
            skip_reason,
        }
    }
}

// ============================================================================
// SECTION: Validation Report
// ============================================================================

/// Overall verdict of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Every probe passed.
    Passed,
    /// At least one probe did not pass.
    Failed,
    /// The run itself failed outside the probes.
    Error,
}

impl ValidationStatus {
    /// Returns a stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated pass/fail counts and flattened issues.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Number of probe categories that produced a result.
    pub total_checks: usize,
    /// Categories that passed.
    pub passed: usize,
    /// Categories that failed.
    pub failed: usize,
    /// Categories that were skipped.
    pub skipped: usize,
    /// Issues from every category (prefixed by category) plus run errors.
    pub issues: Vec<String>,
}

/// Structured report of one validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Completion time (RFC 3339, UTC).
    pub timestamp: String,
    /// Number of tenants requested for the run.
    pub total_tenants: usize,
    /// Overall verdict.
    pub validation_status: ValidationStatus,
    /// Per-category probe results.
    pub isolation_checks: BTreeMap<ProbeCategory, ProbeResult>,
    /// Aggregated counts and issues.
    pub summary: ValidationSummary,
}

impl ValidationReport {
    /// Aggregates probe results and run errors into a report.
    ///
    /// Any run error forces [`ValidationStatus::Error`]; otherwise the run
    /// passes only when every category is present and passed.
    #[must_use]
    pub fn aggregate(
        total_tenants: usize,
        isolation_checks: BTreeMap<ProbeCategory, ProbeResult>,
        run_errors: Vec<String>,
    ) -> Self {
        let mut summary = ValidationSummary {
            total_checks: isolation_checks.len(),
            ..ValidationSummary::default()
        };
        for (category, result) in &isolation_checks {
            match result.status {
                ProbeStatus::Passed => summary.passed += 1,
                ProbeStatus::Failed => summary.failed += 1,
                ProbeStatus::Skipped => summary.skipped += 1,
            }
            summary.issues.extend(result.issues.iter().map(|issue| format!("{category}: {issue}")));
        }
        let has_errors = !run_errors.is_empty();
        summary.issues.extend(run_errors);
        let all_passed = isolation_checks.len() == ProbeCategory::ALL.len()
            && isolation_checks.values().all(|result| result.status == ProbeStatus::Passed);
        let validation_status = if has_errors {
            ValidationStatus::Error
        } else if all_passed {
            ValidationStatus::Passed
        } else {
            ValidationStatus::Failed
        };
        Self {
            timestamp: now_rfc3339(),
            total_tenants,
            validation_status,
            isolation_checks,
            summary,
        }
    }

    /// Returns true when the run passed.
    #[must_use]
    pub fn is_passed(&self) -> bool {
        self.validation_status == ValidationStatus::Passed
    }
}

/// Formats the current UTC time as RFC 3339.
fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| "unknown".to_string())
}
