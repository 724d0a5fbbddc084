use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of a single check, ordered from best to worst for summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckOutcome {
    Passed,
    Fixed,
    Skipped,
    Warning,
    Failed,
}

impl CheckOutcome {
    /// Folds two outcomes of sub-steps into the one reported for the check.
    pub fn combine(self, other: CheckOutcome) -> CheckOutcome {
        use CheckOutcome::*;
        match (self, other) {
            (Failed, _) | (_, Failed) => Failed,
            (Warning, _) | (_, Warning) => Warning,
            (Fixed, _) | (_, Fixed) => Fixed,
            (Passed, _) | (_, Passed) => Passed,
            (Skipped, Skipped) => Skipped,
        }
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CheckOutcome::Passed => "passed",
            CheckOutcome::Fixed => "fixed",
            CheckOutcome::Skipped => "skipped",
            CheckOutcome::Warning => "warning",
            CheckOutcome::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// A host port the compose stack expects to bind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    pub port: u16,
    pub service: String,
    /// Variable written to the ports override file when remapped.
    pub env_var: String,
}

impl PortSpec {
    pub fn new(port: u16, service: &str, env_var: &str) -> Self {
        Self {
            port,
            service: service.to_string(),
            env_var: env_var.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "macos" => Platform::MacOs,
            "linux" => Platform::Linux,
            _ => Platform::Other,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: &str) -> Self {
        Self {
            success: true,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: &str) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: &'static str,
    pub outcome: CheckOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctorReport {
    pub results: Vec<CheckResult>,
    pub fixes_applied: bool,
}

impl DoctorReport {
    pub fn outcome_of(&self, name: &str) -> Option<CheckOutcome> {
        self.results
            .iter()
            .find(|result| result.name == name)
            .map(|result| result.outcome)
    }

    pub fn count(&self, outcome: CheckOutcome) -> usize {
        self.results
            .iter()
            .filter(|result| result.outcome == outcome)
            .count()
    }
}
