//! Rolling window statistics for a single device.
//!
//! A [`RollingWindowStats`] keeps the last `capacity` readings in admission
//! order together with a running sum. The running sum is rebuilt from the
//! retained samples on every eviction, and the average and sample standard
//! deviation are recomputed from the window on every admission, so rounding
//! error cannot accumulate.
//!
//! The type itself is not synchronised. The registry wraps each instance in
//! its own lock, see [`crate::registry`].

use std::collections::VecDeque;

use crate::events::StatsSnapshot;

/// Average, spread and size of a window at one point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WindowMoments {
    pub len: usize,
    pub average: f64,
    pub std_dev: f64,
}

/// Bounded FIFO of recent readings with derived statistics.
#[derive(Clone, Debug)]
pub struct RollingWindowStats {
    window: VecDeque<f64>,
    capacity: usize,
    running_sum: f64,
    last_average: f64,
    last_std_dev: f64,
    last_z_score: f64,
    anomaly_count: u64,
    admitted: u64,
}

impl RollingWindowStats {
    /// Create an empty window. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            running_sum: 0.0,
            last_average: 0.0,
            last_std_dev: 0.0,
            last_z_score: 0.0,
            anomaly_count: 0,
            admitted: 0,
        }
    }

    /// Admit a reading, evicting the oldest one if the window overflows,
    /// and return the post-admission `(average, std_dev)`.
    pub fn admit_and_compute(&mut self, value: f64) -> (f64, f64) {
        self.window.push_back(value);
        self.running_sum += value;

        if self.window.len() > self.capacity {
            self.window.pop_front();
            // Subtracting the evicted value cannot recover what it absorbed.
            self.running_sum = self.window.iter().sum();
        }
        self.admitted += 1;

        let moments = self.moments();
        self.last_average = moments.average;
        self.last_std_dev = moments.std_dev;
        (moments.average, moments.std_dev)
    }

    /// Standard score of `value` against the given statistics.
    ///
    /// Returns `0.0` when there is no spread or fewer than two samples are
    /// retained. The result is recorded as the last z-score.
    pub fn compute_z_score(&mut self, value: f64, average: f64, std_dev: f64) -> f64 {
        let z = standard_score(value, average, std_dev, self.window.len());
        self.last_z_score = z;
        z
    }

    /// Like [`compute_z_score`](Self::compute_z_score), but against moments
    /// captured earlier (e.g. before the reading was admitted).
    pub fn compute_z_score_against(&mut self, value: f64, reference: WindowMoments) -> f64 {
        let z = standard_score(value, reference.average, reference.std_dev, reference.len);
        self.last_z_score = z;
        z
    }

    /// Bump the anomaly counter and return the new total.
    pub fn increment_anomaly_count(&mut self) -> u64 {
        self.anomaly_count += 1;
        self.anomaly_count
    }

    /// Average and sample standard deviation of the current window,
    /// without mutating anything.
    pub fn moments(&self) -> WindowMoments {
        let len = self.window.len();
        if len == 0 {
            return WindowMoments::default();
        }
        let n = len as f64;
        let rough = self.running_sum / n;
        // Second pass corrects the rounding of sum / n, so identical samples
        // average to exactly their value.
        let average = rough + self.window.iter().map(|v| v - rough).sum::<f64>() / n;
        let std_dev = if len <= 1 {
            0.0
        } else {
            let squared: f64 = self.window.iter().map(|v| (v - average).powi(2)).sum();
            (squared / (n - 1.0)).sqrt()
        };
        WindowMoments {
            len,
            average,
            std_dev,
        }
    }

    /// The published statistics of this window.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            average: self.last_average,
            std_dev: self.last_std_dev,
            z_score: self.last_z_score,
            anomaly_count: self.anomaly_count,
            sample_count: self.window.len(),
        }
    }

    /// Retained samples, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.window.iter().copied()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn running_sum(&self) -> f64 {
        self.running_sum
    }

    pub fn last_average(&self) -> f64 {
        self.last_average
    }

    pub fn last_std_dev(&self) -> f64 {
        self.last_std_dev
    }

    pub fn last_z_score(&self) -> f64 {
        self.last_z_score
    }

    pub fn anomaly_count(&self) -> u64 {
        self.anomaly_count
    }

    /// Total readings ever admitted, including evicted ones.
    pub fn admitted(&self) -> u64 {
        self.admitted
    }
}

/// `(value - average) / std_dev`, or `0.0` when the spread is zero or the
/// window holds fewer than two samples.
pub fn standard_score(value: f64, average: f64, std_dev: f64, samples: usize) -> f64 {
    if std_dev == 0.0 || samples < 2 {
        return 0.0;
    }
    (value - average) / std_dev
}
