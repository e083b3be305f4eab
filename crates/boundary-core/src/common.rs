// crates/boundary-core/src/common.rs
use serde::{Deserialize, Serialize};

/// Cumulative counters kept by the [`FeatureProcessor`](crate::FeatureProcessor).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorStats {
    pub processed_count: usize,
    pub error_count: usize,
}

impl ProcessorStats {
    /// processed / (processed + errors); `0.0` before any feature is seen.
    pub fn success_rate(&self) -> f64 {
        let seen = self.processed_count + self.error_count;
        if seen == 0 {
            0.0
        } else {
            self.processed_count as f64 / seen as f64
        }
    }
}

/// Outcome of one import run.
///
/// Partial failure is reported here rather than raised: only total failures
/// (unreadable file, missing table) surface as errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub total_features: usize,
    pub imported_count: usize,
    pub error_count: usize,
    pub batches: usize,
    /// Human-readable messages for rejected or failed features, input order.
    pub errors: Vec<String>,
}

impl ImportReport {
    /// imported / total × 100; `0.0` for an empty source.
    pub fn success_percentage(&self) -> f64 {
        if self.total_features == 0 {
            0.0
        } else {
            self.imported_count as f64 / self.total_features as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_is_zero_before_any_feature() {
        assert_eq!(ProcessorStats::default().success_rate(), 0.0);
    }

    #[test]
    fn success_rate_is_a_ratio() {
        let s = ProcessorStats {
            processed_count: 3,
            error_count: 1,
        };
        assert!((s.success_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn percentage_over_total() {
        let r = ImportReport {
            total_features: 200,
            imported_count: 150,
            error_count: 50,
            ..ImportReport::default()
        };
        assert!((r.success_percentage() - 75.0).abs() < 1e-9);
    }
}
