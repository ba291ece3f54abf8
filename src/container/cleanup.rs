//! Cleanup stack: release objects gathered during construction.

use crate::container::provider::Release;
use crate::observability::metrics;

struct CleanupEntry {
    sequence: u64,
    provider: String,
    release: Box<dyn Release>,
}

/// LIFO record of release objects, tagged with construction sequence numbers.
#[derive(Default)]
pub(crate) struct CleanupStack {
    entries: Vec<CleanupEntry>,
}

impl CleanupStack {
    pub fn push(&mut self, sequence: u64, provider: String, release: Box<dyn Release>) {
        debug_assert!(
            self.entries.last().map_or(true, |top| top.sequence < sequence),
            "cleanup entries must be pushed in construction order"
        );
        self.entries.push(CleanupEntry {
            sequence,
            provider,
            release,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Pop and run every release, newest first.
    ///
    /// A failing release is logged and recorded; the rest still run. The
    /// stack is empty afterwards, so a second call does nothing.
    pub fn run(&mut self) -> CleanupReport {
        let mut report = CleanupReport::default();

        while let Some(entry) = self.entries.pop() {
            match entry.release.release() {
                Ok(()) => {
                    tracing::debug!(
                        provider = %entry.provider,
                        sequence = entry.sequence,
                        "Released"
                    );
                    report.released += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        provider = %entry.provider,
                        sequence = entry.sequence,
                        error = %e,
                        "Release failed, continuing teardown"
                    );
                    metrics::record_cleanup_failure(&entry.provider);
                    report.failures.push(CleanupFailure {
                        provider: entry.provider,
                        sequence: entry.sequence,
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }
}

/// Outcome of a teardown.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    /// Releases that completed successfully.
    pub released: usize,
    /// Releases that returned an error, in the order they ran.
    pub failures: Vec<CleanupFailure>,
}

impl CleanupReport {
    /// True when every release succeeded (or there was nothing to release).
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A release that returned an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupFailure {
    pub provider: String,
    pub sequence: u64,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::provider::release_fn;
    use std::sync::{Arc, Mutex};

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Box<dyn Release> {
        let log = log.clone();
        Box::new(release_fn(move || {
            log.lock().unwrap().push(name);
            Ok(())
        }))
    }

    #[test]
    fn test_releases_run_lifo() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut stack = CleanupStack::default();
        stack.push(1, "P1".into(), recorder(&log, "R1"));
        stack.push(2, "P2".into(), recorder(&log, "R2"));
        stack.push(4, "P4".into(), recorder(&log, "R4"));

        let report = stack.run();
        assert_eq!(*log.lock().unwrap(), vec!["R4", "R2", "R1"]);
        assert_eq!(report.released, 3);
        assert!(report.is_clean());
    }

    #[test]
    fn test_failure_does_not_block_remaining() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut stack = CleanupStack::default();
        stack.push(1, "P1".into(), recorder(&log, "R1"));
        stack.push(2, "P2".into(), Box::new(release_fn(|| Err("socket busy".into()))));
        stack.push(3, "P3".into(), recorder(&log, "R3"));

        let report = stack.run();
        assert_eq!(*log.lock().unwrap(), vec!["R3", "R1"]);
        assert_eq!(report.released, 2);
        assert_eq!(
            report.failures,
            vec![CleanupFailure {
                provider: "P2".into(),
                sequence: 2,
                error: "socket busy".into(),
            }]
        );
    }

    #[test]
    fn test_second_run_is_noop() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut stack = CleanupStack::default();
        stack.push(1, "P1".into(), recorder(&log, "R1"));

        assert_eq!(stack.run().released, 1);
        assert_eq!(stack.run(), CleanupReport::default());
        assert_eq!(stack.len(), 0);
        assert_eq!(log.lock().unwrap().len(), 1);
    }
}
