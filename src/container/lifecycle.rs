//! Container lifecycle phases.

use std::fmt;

use crate::container::error::Error;

/// Lifecycle of a container. Phases only move forward.
///
/// ```text
/// Building ──start──▶ Running ──begin_shutdown──▶ ShuttingDown ──cleanup──▶ Closed
///     └──────────────────────────cleanup (after a failed build)─────────────▲
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Registrations accepted, construction on demand.
    Building,
    /// All bootstrap actions completed.
    Running,
    /// The cancellation token fired; waiting for teardown.
    ShuttingDown,
    /// Cleanup ran. Terminal.
    Closed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Building => "building",
            Phase::Running => "running",
            Phase::ShuttingDown => "shutting down",
            Phase::Closed => "closed",
        }
    }

    /// Fail unless the current phase is one of `allowed`.
    pub(crate) fn require(&self, operation: &'static str, allowed: &[Phase]) -> Result<(), Error> {
        if allowed.contains(self) {
            Ok(())
        } else {
            Err(Error::InvalidPhase {
                operation,
                phase: self.as_str(),
            })
        }
    }

    /// Move to `next`, refusing to go backwards or stand still.
    pub(crate) fn advance(&mut self, next: Phase) -> Result<(), Error> {
        if next <= *self {
            return Err(Error::InvalidPhase {
                operation: next.transition_name(),
                phase: self.as_str(),
            });
        }
        tracing::info!(from = %self, to = %next, "Container phase changed");
        *self = next;
        Ok(())
    }

    fn transition_name(&self) -> &'static str {
        match self {
            Phase::Building => "reset",
            Phase::Running => "start",
            Phase::ShuttingDown => "begin_shutdown",
            Phase::Closed => "cleanup",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        let mut phase = Phase::Building;
        phase.advance(Phase::Running).unwrap();
        phase.advance(Phase::ShuttingDown).unwrap();
        phase.advance(Phase::Closed).unwrap();
        assert_eq!(phase, Phase::Closed);
    }

    #[test]
    fn test_no_reverse_transitions() {
        let mut phase = Phase::ShuttingDown;
        assert!(phase.advance(Phase::Running).is_err());
        assert!(phase.advance(Phase::ShuttingDown).is_err());
        assert_eq!(phase, Phase::ShuttingDown);
    }

    #[test]
    fn test_require() {
        assert!(Phase::Building.require("provide", &[Phase::Building]).is_ok());
        let err = Phase::Running.require("provide", &[Phase::Building]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "provide is not allowed while the container is running"
        );
    }
}
