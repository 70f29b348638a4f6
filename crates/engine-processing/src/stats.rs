use crate::store::{Status, StoredRecord};
use serde::Serialize;
use std::fmt;

/// Running count, sum, sum of squares and extrema of a numeric series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    count: u64,
    sum: f64,
    sum_squares: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl RunningStats {
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        self.sum += x;
        self.sum_squares += x * x;
        self.min = Some(self.min.map_or(x, |m| m.min(x)));
        self.max = Some(self.max.map_or(x, |m| m.max(x)));
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    /// Sample standard deviation; undefined below two observations.
    pub fn stddev(&self) -> Option<f64> {
        if self.count < 2 {
            return None;
        }
        let n = self.count as f64;
        let variance = (self.sum_squares - self.sum * self.sum / n) / (n - 1.0);
        Some(variance.max(0.0).sqrt())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BonusSnapshot {
    pub count: u64,
    pub total: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResultsSnapshot {
    pub approve_count: u64,
    pub reject_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualificationSnapshot {
    pub count: u64,
}

/// Aggregates over the records of one store.
#[derive(Debug, Clone, Default)]
pub struct StatsAccumulator {
    bonus: RunningStats,
    approved: u64,
    rejected: u64,
    qualified: u64,
    filtered: u64,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once per inserted record.
    pub fn update(&mut self, record: &StoredRecord) {
        match record.status {
            Status::Approve => self.approved += 1,
            Status::Reject => self.rejected += 1,
            Status::None => {}
        }
        if record.has_bonus {
            self.add_bonus(record.bonus);
        }
        if record.has_qualification {
            self.qualified += 1;
        }
    }

    pub fn add_bonus(&mut self, amount: f64) {
        self.bonus.push(amount);
    }

    pub fn record_filtered(&mut self) {
        self.filtered += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn filtered_count(&self) -> u64 {
        self.filtered
    }

    pub fn bonus(&self) -> BonusSnapshot {
        BonusSnapshot {
            count: self.bonus.count(),
            total: self.bonus.sum(),
            min: self.bonus.min,
            max: self.bonus.max,
            mean: self.bonus.mean(),
            stddev: self.bonus.stddev(),
        }
    }

    pub fn results(&self) -> ResultsSnapshot {
        ResultsSnapshot {
            approve_count: self.approved,
            reject_count: self.rejected,
        }
    }

    pub fn qualification(&self) -> QualificationSnapshot {
        QualificationSnapshot {
            count: self.qualified,
        }
    }
}

struct Amount(Option<f64>);

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v:.2}"),
            None => f.write_str("NA"),
        }
    }
}

impl fmt::Display for BonusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bonuses: {} | total: {:.2} | min: {} | max: {} | mean: {} | stddev: {}",
            self.count,
            self.total,
            Amount(self.min),
            Amount(self.max),
            Amount(self.mean),
            Amount(self.stddev),
        )
    }
}

impl fmt::Display for ResultsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "approved: {} | rejected: {}",
            self.approve_count, self.reject_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_sample_stddev() {
        let mut stats = StatsAccumulator::new();
        for amount in [2.0, 4.0, 6.0] {
            stats.add_bonus(amount);
        }

        let bonus = stats.bonus();
        assert_eq!(bonus.count, 3);
        assert_eq!(bonus.total, 12.0);
        assert_eq!(bonus.min, Some(2.0));
        assert_eq!(bonus.max, Some(6.0));
        assert_eq!(bonus.mean, Some(4.0));
        assert!((bonus.stddev.unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_observation_has_no_stddev() {
        let mut stats = StatsAccumulator::new();
        stats.add_bonus(5.0);
        assert_eq!(stats.bonus().mean, Some(5.0));
        assert_eq!(stats.bonus().stddev, None);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut stats = StatsAccumulator::new();
        stats.add_bonus(1.0);
        stats.record_filtered();
        stats.reset();

        let bonus = stats.bonus();
        assert_eq!(bonus.count, 0);
        assert_eq!(bonus.mean, None);
        assert_eq!(stats.filtered_count(), 0);
        assert_eq!(
            bonus.to_string(),
            "bonuses: 0 | total: 0.00 | min: NA | max: NA | mean: NA | stddev: NA"
        );
    }
}
