//! Aggregation and categorical statistics
//!
//! Folds a sequence of [`Comparison`]s into an [`AnalysisReport`]. The fold
//! only adds counters and appends names, so [`aggregate`] and
//! [`aggregate_parallel`] produce identical reports.

use crate::compare::Comparison;
use crate::path::PathPattern;
use crate::scenario::Operation;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Match/difference counters for one bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketStats {
    /// Comparisons with identical behavior
    pub matches: u64,
    /// Comparisons with different behavior
    pub differences: u64,
}

impl BucketStats {
    /// Total comparisons in the bucket
    #[inline]
    #[must_use]
    pub fn total(&self) -> u64 {
        self.matches + self.differences
    }

    /// Match rate in percent, `None` for an empty bucket
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn match_rate(&self) -> Option<f64> {
        (self.total() > 0).then(|| self.matches as f64 / self.total() as f64 * 100.0)
    }

    fn record(&mut self, matched: bool) {
        if matched {
            self.matches += 1;
        } else {
            self.differences += 1;
        }
    }

    fn merge(&mut self, other: Self) {
        self.matches += other.matches;
        self.differences += other.differences;
    }
}

/// Per-operation counters plus the scenarios that diverged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStats {
    /// Comparisons with identical behavior
    pub matches: u64,
    /// Comparisons with different behavior
    pub differences: u64,
    /// Names of diverging scenarios, in input order
    pub failing_scenarios: Vec<String>,
}

impl OperationStats {
    /// As plain bucket counters
    #[inline]
    #[must_use]
    pub fn bucket(&self) -> BucketStats {
        BucketStats {
            matches: self.matches,
            differences: self.differences,
        }
    }
}

/// Run-level totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Comparisons made
    pub total: u64,
    /// Comparisons with identical behavior
    pub identical: u64,
    /// Comparisons with different behavior
    pub different: u64,
    /// Scenarios with a critical difference, in input order
    pub critical_scenario_names: Vec<String>,
}

/// Aggregated result of one analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Every comparison, in input order
    pub comparisons: Vec<Comparison>,
    /// Counters keyed by base-path pattern
    pub by_path_pattern: BTreeMap<PathPattern, BucketStats>,
    /// Counters keyed by operation
    pub by_operation: BTreeMap<Operation, OperationStats>,
    /// Totals
    pub summary: Summary,
}

/// Violated report invariant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// A comparison is both critical and matching
    #[error("comparison '{0}' is critical yet reports matching behavior")]
    CriticalMatch(String),

    /// Bucket counters do not add up to the summary
    #[error("{bucket} counters sum to {counted}, expected {expected}")]
    CountMismatch {
        bucket: String,
        counted: u64,
        expected: u64,
    },
}

impl AnalysisReport {
    /// Verify the report's structural invariants
    ///
    /// # Errors
    /// The first violated invariant found.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if let Some(bad) = self
            .comparisons
            .iter()
            .find(|c| c.critical_difference && c.behavior_match)
        {
            return Err(InvariantViolation::CriticalMatch(bad.scenario_name.clone()));
        }

        let expected = self.comparisons.len() as u64;
        let check = |bucket: &str, counted: u64| {
            if counted == expected {
                Ok(())
            } else {
                Err(InvariantViolation::CountMismatch {
                    bucket: bucket.to_string(),
                    counted,
                    expected,
                })
            }
        };

        check("summary", self.summary.total)?;
        check("summary identical+different", self.summary.identical + self.summary.different)?;
        check(
            "path pattern",
            self.by_path_pattern.values().map(BucketStats::total).sum(),
        )?;
        check(
            "operation",
            self.by_operation.values().map(|s| s.bucket().total()).sum(),
        )?;
        Ok(())
    }

    /// Comparisons that did not match
    pub fn differing(&self) -> impl Iterator<Item = &Comparison> {
        self.comparisons.iter().filter(|c| !c.behavior_match)
    }
}

/// Associative accumulator behind both fold flavours
#[derive(Debug, Default)]
struct Tally {
    comparisons: Vec<Comparison>,
    by_path_pattern: BTreeMap<PathPattern, BucketStats>,
    by_operation: BTreeMap<Operation, OperationStats>,
    summary: Summary,
}

impl Tally {
    fn absorb(mut self, comparison: Comparison) -> Self {
        let matched = comparison.behavior_match;

        self.by_path_pattern
            .entry(PathPattern::classify(&comparison.path_used))
            .or_default()
            .record(matched);

        let op = self.by_operation.entry(comparison.operation).or_default();
        if matched {
            op.matches += 1;
        } else {
            op.differences += 1;
            op.failing_scenarios.push(comparison.scenario_name.clone());
        }

        self.summary.total += 1;
        if matched {
            self.summary.identical += 1;
        } else {
            self.summary.different += 1;
        }
        if comparison.critical_difference {
            self.summary
                .critical_scenario_names
                .push(comparison.scenario_name.clone());
        }

        self.comparisons.push(comparison);
        self
    }

    fn merge(mut self, other: Self) -> Self {
        self.comparisons.extend(other.comparisons);
        for (pattern, stats) in other.by_path_pattern {
            self.by_path_pattern.entry(pattern).or_default().merge(stats);
        }
        for (operation, stats) in other.by_operation {
            let entry = self.by_operation.entry(operation).or_default();
            entry.matches += stats.matches;
            entry.differences += stats.differences;
            entry.failing_scenarios.extend(stats.failing_scenarios);
        }
        self.summary.total += other.summary.total;
        self.summary.identical += other.summary.identical;
        self.summary.different += other.summary.different;
        self.summary
            .critical_scenario_names
            .extend(other.summary.critical_scenario_names);
        self
    }

    fn finish(mut self) -> AnalysisReport {
        // Every pattern is reported, even when no comparison fell into it
        for pattern in PathPattern::ALL {
            self.by_path_pattern.entry(pattern).or_default();
        }
        AnalysisReport {
            comparisons: self.comparisons,
            by_path_pattern: self.by_path_pattern,
            by_operation: self.by_operation,
            summary: self.summary,
        }
    }
}

/// Fold comparisons into a report on the current thread
#[must_use]
pub fn aggregate(comparisons: impl IntoIterator<Item = Comparison>) -> AnalysisReport {
    comparisons
        .into_iter()
        .fold(Tally::default(), Tally::absorb)
        .finish()
}

/// Fold comparisons into a report with rayon
///
/// Produces exactly the report [`aggregate`] would for the same input.
#[must_use]
pub fn aggregate_parallel(comparisons: Vec<Comparison>) -> AnalysisReport {
    comparisons
        .into_par_iter()
        .fold(Tally::default, Tally::absorb)
        .reduce(Tally::default, Tally::merge)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cmp(name: &str, path: &str, op: Operation, matched: bool, critical: bool) -> Comparison {
        Comparison {
            scenario_name: name.to_string(),
            path_used: path.to_string(),
            operation: op,
            behavior_match: matched,
            critical_difference: critical,
            difference_detail: String::new(),
            path_resolution_differences: Vec::new(),
        }
    }

    fn sample() -> Vec<Comparison> {
        vec![
            cmp("a", "/x", Operation::Write, true, false),
            cmp("b", "x", Operation::Write, false, false),
            cmp("c", "//x", Operation::BatchUpdate, false, true),
            cmp("d", "/", Operation::PartialUpdate, true, false),
            cmp("e", "", Operation::BatchUpdate, true, false),
        ]
    }

    #[test]
    fn aggregate_counts_buckets() {
        let report = aggregate(sample());
        assert_eq!(report.summary.total, 5);
        assert_eq!(report.summary.identical, 3);
        assert_eq!(report.summary.different, 2);
        assert_eq!(report.summary.critical_scenario_names, vec!["c".to_string()]);

        assert_eq!(
            report.by_path_pattern[&PathPattern::DoubleSlash],
            BucketStats { matches: 0, differences: 1 }
        );
        assert_eq!(report.by_path_pattern[&PathPattern::Root].matches, 1);
        assert_eq!(report.by_operation[&Operation::Write].failing_scenarios, vec!["b"]);
        assert_eq!(report.by_operation[&Operation::BatchUpdate].bucket().total(), 2);
        report.check_invariants().unwrap();
    }

    #[test]
    fn empty_input_reports_every_pattern() {
        let report = aggregate(Vec::new());
        assert_eq!(report.by_path_pattern.len(), PathPattern::ALL.len());
        assert!(report.by_operation.is_empty());
        report.check_invariants().unwrap();
    }

    #[test]
    fn parallel_matches_sequential() {
        let many: Vec<_> = (0..200)
            .map(|i| {
                let op = Operation::ALL[i % 3];
                let path = if i % 2 == 0 { "/p" } else { "p" };
                cmp(&format!("s{i}"), path, op, i % 5 != 0, i % 10 == 0)
            })
            .collect();
        assert_eq!(aggregate(many.clone()), aggregate_parallel(many));
    }

    #[test]
    fn invariant_check_catches_critical_match() {
        let mut report = aggregate(sample());
        report.comparisons[0].critical_difference = true;
        assert_eq!(
            report.check_invariants(),
            Err(InvariantViolation::CriticalMatch("a".to_string()))
        );
    }

    #[test]
    fn match_rate_handles_empty_bucket() {
        assert_eq!(BucketStats::default().match_rate(), None);
        let stats = BucketStats { matches: 1, differences: 3 };
        assert_eq!(stats.match_rate(), Some(25.0));
    }

    #[test]
    fn report_json_uses_camel_case_keys() {
        let value = serde_json::to_value(aggregate(sample())).unwrap();
        assert!(value["byPathPattern"]["doubleSlash"]["differences"].is_u64());
        assert!(value["byOperation"]["WRITE"]["failingScenarios"].is_array());
        assert_eq!(value["summary"]["criticalScenarioNames"][0], "c");
    }
}
