//! The append-only ensemble of sampled plans and its summary.
use crate::stats::election::SampleRecord;
use crate::votes::Party;
use serde::Serialize;
use std::collections::BTreeMap;

/// Records produced by the sampling phase of one or more chains, in the
/// order they were produced.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Ensemble {
    records: Vec<SampleRecord>,
}

/// Aggregate statistics of an [Ensemble], relative to a baseline plan.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnsembleSummary {
    pub samples: usize,
    /// The baseline plan's efficiency gap.
    pub baseline_gap: f64,
    /// Fraction of samples whose gap is at most the baseline's.
    pub baseline_percentile: f64,
    pub mean_gap: f64,
    pub min_gap: f64,
    pub max_gap: f64,
    /// For each party, the number of samples winning each seat count.
    pub seat_histograms: BTreeMap<Party, BTreeMap<usize, usize>>,
}

impl Ensemble {
    pub fn new() -> Ensemble {
        Ensemble::default()
    }

    pub fn with_capacity(capacity: usize) -> Ensemble {
        Ensemble {
            records: Vec::with_capacity(capacity),
        }
    }

    /// Appends a record. Records are never modified once appended.
    pub fn push(&mut self, record: SampleRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SampleRecord> {
        self.records.iter()
    }

    /// Pools the records of `other` (e.g. an independent chain) after
    /// this ensemble's records.
    pub fn merge(&mut self, other: Ensemble) {
        self.records.extend(other.records);
    }

    /// Summarizes the ensemble against `baseline`.
    ///
    /// Gap statistics of an empty ensemble are NaN; the percentile is 0.
    pub fn summary(&self, baseline: &SampleRecord) -> EnsembleSummary {
        let baseline_gap = baseline.efficiency_gap.value;
        let gaps: Vec<f64> = self.records.iter().map(|r| r.efficiency_gap.value).collect();
        let samples = gaps.len();
        let (mean_gap, baseline_percentile) = if samples == 0 {
            (f64::NAN, 0.0)
        } else {
            let at_most = gaps.iter().filter(|&&gap| gap <= baseline_gap).count();
            (
                gaps.iter().sum::<f64>() / samples as f64,
                at_most as f64 / samples as f64,
            )
        };
        let min_gap = gaps.iter().copied().fold(f64::NAN, f64::min);
        let max_gap = gaps.iter().copied().fold(f64::NAN, f64::max);

        let mut seat_histograms = BTreeMap::new();
        for &party in Party::ALL.iter() {
            let mut hist = BTreeMap::<usize, usize>::new();
            for record in self.records.iter() {
                *hist.entry(record.seats.get(party)).or_insert(0) += 1;
            }
            seat_histograms.insert(party, hist);
        }

        EnsembleSummary {
            samples,
            baseline_gap,
            baseline_percentile,
            mean_gap,
            min_gap,
            max_gap,
            seat_histograms,
        }
    }
}

impl<'a> IntoIterator for &'a Ensemble {
    type Item = &'a SampleRecord;
    type IntoIter = std::slice::Iter<'a, SampleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::election::{EfficiencyGap, Seats};

    fn sample(gap: f64, dem: usize, rep: usize) -> SampleRecord {
        SampleRecord {
            efficiency_gap: EfficiencyGap {
                value: gap,
                favors: Some(Party::Democratic),
            },
            seats: Seats { dem, rep },
            districts: vec![],
        }
    }

    #[test]
    fn summary_of_small_ensemble() {
        let mut ensemble = Ensemble::new();
        ensemble.push(sample(0.1, 2, 1));
        ensemble.push(sample(0.3, 1, 2));
        ensemble.push(sample(0.2, 2, 1));
        ensemble.push(sample(0.4, 2, 1));
        let summary = ensemble.summary(&sample(0.2, 2, 1));
        assert_eq!(summary.samples, 4);
        assert!((summary.mean_gap - 0.25).abs() < 1e-12);
        assert_eq!(summary.min_gap, 0.1);
        assert_eq!(summary.max_gap, 0.4);
        assert_eq!(summary.baseline_percentile, 0.5);
        let dem: Vec<(usize, usize)> = summary.seat_histograms[&Party::Democratic]
            .iter()
            .map(|(&k, &v)| (k, v))
            .collect();
        assert_eq!(dem, vec![(1, 1), (2, 3)]);
    }

    #[test]
    fn empty_ensemble_summary() {
        let summary = Ensemble::new().summary(&sample(0.2, 1, 1));
        assert_eq!(summary.samples, 0);
        assert!(summary.mean_gap.is_nan());
        assert!(summary.min_gap.is_nan());
        assert_eq!(summary.baseline_percentile, 0.0);
    }

    #[test]
    fn merge_appends_in_order() {
        let mut first = Ensemble::new();
        first.push(sample(0.1, 1, 1));
        let mut second = Ensemble::new();
        second.push(sample(0.2, 1, 1));
        second.push(sample(0.3, 1, 1));
        first.merge(second);
        let gaps: Vec<f64> = first.iter().map(|r| r.efficiency_gap.value).collect();
        assert_eq!(gaps, vec![0.1, 0.2, 0.3]);
    }
}
