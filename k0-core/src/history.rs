//! Fixed-capacity ring buffer of a node's sigmoid output over time, with an
//! optional incrementally-maintained rolling variance window.

use crate::constants::Num;
use crate::error::{K0Error, Result};
use std::collections::VecDeque;

/// Ring buffer over a node's recent sigmoid outputs.
///
/// `get(0)` returns the most recently pushed sample. Pushing past capacity
/// silently drops the oldest sample, exactly like a fixed-size deque.
#[derive(Debug, Clone)]
pub struct ActivationHistory {
    capacity: usize,
    samples: VecDeque<Num>,
    monitoring: Option<MonitoringState>,
}

/// Incrementally-updated statistics for a trailing window of size `window`.
#[derive(Debug, Clone)]
struct MonitoringState {
    window: usize,
    sum: f64,
    sum_sq: f64,
}

impl ActivationHistory {
    /// Build a history with the given fixed capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
            monitoring: None,
        }
    }

    /// Number of samples currently held (≤ capacity).
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Push a new sample, evicting the oldest one if at capacity, and
    /// updating the monitoring window's running statistics if enabled.
    pub fn put(&mut self, value: Num) {
        let evicted = if self.samples.len() >= self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(value);

        if let Some(state) = &mut self.monitoring {
            state.on_push(value, evicted, &self.samples);
        }
    }

    /// Sample `offset` ticks back from the most recent one (`offset == 0`
    /// is the most recent sample).
    pub fn get(&self, offset: usize) -> Result<Num> {
        if offset >= self.samples.len() {
            return Err(K0Error::HistoryIndexOutOfRange {
                offset,
                capacity: self.capacity,
            });
        }
        let index = self.samples.len() - offset - 1;
        Ok(self.samples[index])
    }

    /// The last `n` samples, oldest first.
    pub fn tail(&self, n: usize) -> Result<Vec<Num>> {
        if n > self.samples.len() {
            return Err(K0Error::HistoryIndexOutOfRange {
                offset: n,
                capacity: self.capacity,
            });
        }
        let start = self.samples.len() - n;
        Ok(self.samples.iter().skip(start).copied().collect())
    }

    /// Iterate samples oldest-to-newest.
    pub fn iter(&self) -> impl Iterator<Item = &Num> {
        self.samples.iter()
    }

    /// Resize the buffer's capacity, preserving the most recent samples (the
    /// tail) and dropping older ones if shrinking.
    pub fn resize(&mut self, new_capacity: usize) {
        while self.samples.len() > new_capacity {
            self.samples.pop_front();
        }
        self.samples.reserve(new_capacity.saturating_sub(self.samples.len()));
        self.capacity = new_capacity;
        if let Some(state) = &self.monitoring {
            if state.window > new_capacity {
                self.monitoring = None;
            }
        }
    }

    /// Enable (or replace) O(1) rolling-variance tracking over the trailing
    /// `window` samples. `window` must not exceed the history's capacity.
    /// `window == 0` disables monitoring, same as never having called this.
    pub fn set_activity_monitoring(&mut self, window: usize) -> Result<()> {
        if window == 0 {
            self.monitoring = None;
            return Ok(());
        }
        if window > self.capacity {
            return Err(K0Error::MonitoringWindowTooLarge {
                window,
                capacity: self.capacity,
            });
        }
        let mut state = MonitoringState {
            window,
            sum: 0.0,
            sum_sq: 0.0,
        };
        // Seed from whatever history already exists so monitoring enabled
        // mid-run reflects the true trailing window immediately.
        let seed_len = window.min(self.samples.len());
        let start = self.samples.len() - seed_len;
        for v in self.samples.iter().skip(start) {
            state.sum += *v as f64;
            state.sum_sq += (*v as f64) * (*v as f64);
        }
        self.monitoring = Some(state);
        Ok(())
    }

    /// O(1) sample variance (Bessel-corrected) over the monitored window.
    /// Requires [`Self::set_activity_monitoring`] to have been called.
    /// Zero when fewer than two samples are in the window.
    pub fn variance(&self) -> Result<Num> {
        let state = self.monitoring.as_ref().ok_or(K0Error::MonitoringWindowUndefined)?;
        let n = state.window.min(self.samples.len());
        if n < 2 {
            return Ok(0.0);
        }
        let mean = state.sum / n as f64;
        let sum_sq_deviation = (state.sum_sq - n as f64 * mean * mean).max(0.0);
        Ok((sum_sq_deviation / (n - 1) as f64) as Num)
    }

    /// O(1) standard deviation over the monitored window.
    pub fn stddev(&self) -> Result<Num> {
        Ok(self.variance()?.sqrt())
    }

    /// Welford sample variance (Bessel-corrected) computed fresh over an
    /// arbitrary trailing window, independent of whatever monitoring window
    /// (if any) is installed. Zero when fewer than two samples are in the
    /// window.
    pub fn variance_over(&self, window: usize) -> Result<Num> {
        let n = window.min(self.samples.len());
        if n < 2 {
            return Ok(0.0);
        }
        let start = self.samples.len() - n;
        let mut mean = 0.0_f64;
        let mut m2 = 0.0_f64;
        for (i, v) in self.samples.iter().skip(start).enumerate() {
            let x = *v as f64;
            let delta = x - mean;
            mean += delta / (i + 1) as f64;
            let delta2 = x - mean;
            m2 += delta * delta2;
        }
        Ok((m2 / (n - 1) as f64) as Num)
    }

    /// Welford standard deviation over an arbitrary trailing window.
    pub fn stddev_over(&self, window: usize) -> Result<Num> {
        Ok(self.variance_over(window)?.sqrt())
    }
}

impl MonitoringState {
    /// Update the running sum and sum-of-squares for one push. `buffer`
    /// already includes the newly pushed sample (the monitored window may
    /// be smaller than the buffer's own capacity, so the sample that falls
    /// out of the window is not necessarily the one evicted from the whole
    /// buffer).
    fn on_push(&mut self, pushed: Num, _evicted_from_buffer: Option<Num>, buffer: &VecDeque<Num>) {
        self.sum += pushed as f64;
        self.sum_sq += (pushed as f64) * (pushed as f64);

        if buffer.len() > self.window {
            let dropped = buffer[buffer.len() - self.window - 1] as f64;
            self.sum -= dropped;
            self.sum_sq -= dropped * dropped;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn get_zero_is_most_recent() {
        let mut h = ActivationHistory::new(4);
        h.put(1.0);
        h.put(2.0);
        h.put(3.0);
        assert_relative_eq!(h.get(0).unwrap(), 3.0);
        assert_relative_eq!(h.get(2).unwrap(), 1.0);
    }

    #[test]
    fn exceeding_capacity_evicts_oldest() {
        let mut h = ActivationHistory::new(2);
        h.put(1.0);
        h.put(2.0);
        h.put(3.0);
        assert_eq!(h.len(), 2);
        assert_relative_eq!(h.get(1).unwrap(), 2.0);
    }

    #[test]
    fn out_of_range_offset_errors() {
        let mut h = ActivationHistory::new(4);
        h.put(1.0);
        assert!(h.get(5).is_err());
    }

    #[test]
    fn resize_preserves_tail() {
        let mut h = ActivationHistory::new(5);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            h.put(v);
        }
        h.resize(3);
        assert_eq!(h.len(), 3);
        assert_relative_eq!(h.get(0).unwrap(), 5.0);
        assert_relative_eq!(h.get(2).unwrap(), 3.0);
    }

    #[test]
    fn monitored_variance_matches_welford_over_same_window() {
        let mut h = ActivationHistory::new(50);
        h.set_activity_monitoring(10).unwrap();
        for i in 0..30 {
            h.put((i as Num * 0.37).sin());
        }
        let incremental = h.variance().unwrap();
        let welford = h.variance_over(10).unwrap();
        assert_relative_eq!(incremental, welford, epsilon = 1e-3);
    }

    #[test]
    fn variance_without_monitoring_errors() {
        let h = ActivationHistory::new(4);
        assert!(h.variance().is_err());
    }

    #[test]
    fn monitoring_window_larger_than_capacity_errors() {
        let mut h = ActivationHistory::new(4);
        assert!(h.set_activity_monitoring(5).is_err());
    }

    #[test]
    fn zero_window_disables_monitoring() {
        let mut h = ActivationHistory::new(4);
        h.set_activity_monitoring(2).unwrap();
        h.put(1.0);
        assert!(h.variance().is_ok());
        h.set_activity_monitoring(0).unwrap();
        assert!(h.variance().is_err());
    }

    #[test]
    fn tail_returns_oldest_first() {
        let mut h = ActivationHistory::new(5);
        for v in [1.0, 2.0, 3.0] {
            h.put(v);
        }
        assert_eq!(h.tail(2).unwrap(), vec![2.0, 3.0]);
    }
}
