// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! This module defines the cutoff abstraction polled by the search between
//! two node expansions, along with the stock implementations. A solve whose
//! cutoff trips returns the best solution found so far (or reports the
//! problem unsolvable when no feasible solution was reached in time).

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// The cancellation token honored by the branch-and-bound loop. The check
/// must be cheap and monotone: once `must_stop` returns true it keeps
/// returning true for the rest of the solve.
pub trait Cutoff {
    fn must_stop(&self) -> bool;
}

/// _This is the default cutoff._ It lets the search run to a proof of
/// optimality (or of infeasibility).
#[derive(Debug, Default, Copy, Clone)]
pub struct NoCutoff;
impl Cutoff for NoCutoff {
    fn must_stop(&self) -> bool {
        false
    }
}

/// This cutoff allows one to specify a maximum time budget for a solve. Once
/// the budget is elapsed, the search stops and the best solution found so
/// far is returned. Useful when the solver runs inside a latency-sensitive
/// host.
///
/// # Example
/// ```
/// # use resflow::{compute_rates_with_cutoff, ProcessorSnapshot, TimeBudget};
/// use std::time::Duration;
///
/// let snapshot = ProcessorSnapshot::default();
/// let budget = TimeBudget::new(Duration::from_millis(50));
/// let solution = compute_rates_with_cutoff(&snapshot, &budget);
/// ```
#[derive(Debug, Clone)]
pub struct TimeBudget {
    stop: Arc<AtomicBool>,
}
impl TimeBudget {
    pub fn new(budget: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let t_flag = Arc::clone(&stop);

        // timer
        std::thread::spawn(move || {
            std::thread::sleep(budget);
            t_flag.store(true, std::sync::atomic::Ordering::Relaxed);
        });

        TimeBudget { stop }
    }
}
impl Cutoff for TimeBudget {
    fn must_stop(&self) -> bool {
        self.stop.load(std::sync::atomic::Ordering::Relaxed)
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_cutoff {
    use std::time::Duration;

    use super::{Cutoff, NoCutoff, TimeBudget};

    #[test]
    fn no_cutoff_never_stops() {
        assert!(!NoCutoff.must_stop());
    }

    #[test]
    fn time_budget_trips_once_elapsed() {
        let budget = TimeBudget::new(Duration::from_millis(30));
        assert!(!budget.must_stop());
        std::thread::sleep(Duration::from_millis(300));
        assert!(budget.must_stop());
    }
}
