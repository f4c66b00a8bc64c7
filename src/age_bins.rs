//! Age bins with evenly spaced edges.
//!
//! The edges of a sex's bins are `first_edge + i * increment` years for `i` in
//! `0..bin_count`. An age is assigned to the first bin whose edge lies above it, so bin `0`
//! holds everyone younger than the first edge and ages past the last edge fall in the last bin.
//! The mapping is total: every age, however large or small, has a bin.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::demographics::DAYS_PER_YEAR;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgeBins {
    edges: Vec<f64>,
}

impl AgeBins {
    #[must_use]
    pub fn new(bin_count: usize, first_edge: f64, increment: f64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let edges = (0..bin_count)
            .map(|i| first_edge + i as f64 * increment)
            .collect();
        AgeBins { edges }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Bin edges in years.
    #[must_use]
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    #[must_use]
    pub fn bin_index(&self, age_in_days: f64) -> usize {
        let age_in_years = age_in_days / DAYS_PER_YEAR;

        if age_in_years < self.edges[0] {
            debug!(
                "age {age_in_years} is off the start of the bins (lower limit {})",
                self.edges[0]
            );
            return 0;
        }

        match self.edges.iter().position(|&edge| age_in_years < edge) {
            Some(index) => index,
            None => {
                trace!("age {age_in_years} is past the last bin edge");
                self.edges.len() - 1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn years(age: f64) -> f64 {
        age * DAYS_PER_YEAR
    }

    #[test]
    fn edges_are_evenly_spaced() {
        let bins = AgeBins::new(20, 17.5, 2.5);
        assert_eq!(bins.len(), 20);
        assert_eq!(bins.edges()[0], 17.5);
        assert_eq!(bins.edges()[19], 17.5 + 19.0 * 2.5);
    }

    #[test]
    fn bin_index_for_ages() {
        let bins = AgeBins::new(20, 17.5, 2.5);
        let expected = [
            (0.0, 0),
            (5.0, 0),
            (10.0, 0),
            (15.0, 0),
            (20.0, 2),
            (25.0, 4),
            (30.0, 6),
            (35.0, 8),
            (40.0, 10),
            (45.0, 12),
            (50.0, 14),
            (55.0, 16),
            (60.0, 18),
            (65.0, 19),
            (70.0, 19),
        ];
        for (age, bin) in expected {
            assert_eq!(bins.bin_index(years(age)), bin, "age {age}");
        }
    }

    #[test]
    fn single_bin_holds_everyone() {
        let bins = AgeBins::new(1, 15.0, 1.0);
        assert_eq!(bins.bin_index(0.0), 0);
        assert_eq!(bins.bin_index(years(15.0)), 0);
        assert_eq!(bins.bin_index(years(90.0)), 0);
    }
}
