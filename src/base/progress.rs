use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Reports progress against a precomputed total and carries a cooperative abort flag
///
/// The host layer creates one monitor per run; the engine increments the
/// completed-unit counter and polls the abort flag between discrete work
/// units (per cell, per fracture, per episode span). On abort, results for
/// completed units are retained, not discarded.
#[derive(Debug)]
pub struct ProgressMonitor {
    /// Precomputed total number of work units
    total: usize,

    /// Monotonically increasing number of completed work units
    completed: AtomicUsize,

    /// Cooperative abort flag
    abort: AtomicBool,
}

impl ProgressMonitor {
    /// Allocates a new instance with the given total number of work units
    pub fn new(total: usize) -> Self {
        ProgressMonitor {
            total,
            completed: AtomicUsize::new(0),
            abort: AtomicBool::new(false),
        }
    }

    /// Returns the precomputed total number of work units
    pub fn total(&self) -> usize {
        self.total
    }

    /// Records that `units` work units completed
    pub fn advance(&self, units: usize) {
        self.completed.fetch_add(units, Ordering::Relaxed);
    }

    /// Returns the number of completed work units
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    /// Returns the completed fraction in 0.0 ≤ f ≤ 1.0
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        f64::min(1.0, self.completed() as f64 / self.total as f64)
    }

    /// Requests a cooperative abort
    pub fn request_abort(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }

    /// Returns whether an abort has been requested
    pub fn abort_requested(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::ProgressMonitor;
    use russell_chk::assert_approx_eq;

    #[test]
    fn counting_and_fraction_work() {
        let monitor = ProgressMonitor::new(4);
        assert_eq!(monitor.total(), 4);
        assert_eq!(monitor.completed(), 0);
        monitor.advance(1);
        monitor.advance(2);
        assert_eq!(monitor.completed(), 3);
        assert_approx_eq!(monitor.fraction(), 0.75, 1e-15);
        monitor.advance(5);
        assert_approx_eq!(monitor.fraction(), 1.0, 1e-15);
        // zero-total monitors report complete
        assert_approx_eq!(ProgressMonitor::new(0).fraction(), 1.0, 1e-15);
    }

    #[test]
    fn abort_flag_works() {
        let monitor = ProgressMonitor::new(10);
        assert!(!monitor.abort_requested());
        monitor.request_abort();
        assert!(monitor.abort_requested());
    }
}
