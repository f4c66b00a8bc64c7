//! Flat storage for per-bin values. Every table in the engine is one of two shapes:
//!
//! * [`SexBins`]: one sequence of values per sex, used for desired flow.
//! * [`RiskGroupGrid`]: one [`SexBins`] per risk group, used for eligibility counts and rates.
//!
//! The male and female bin counts may differ; they are fixed by a [`BinCounts`] when the grid
//! is constructed and never change afterwards. Values are stored contiguously, male bins first.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::demographics::{RiskGroup, Sex};

/// The number of age bins for each sex.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct BinCounts {
    male: usize,
    female: usize,
}

impl BinCounts {
    #[must_use]
    pub fn new(male: usize, female: usize) -> Self {
        BinCounts { male, female }
    }

    #[must_use]
    pub fn get(self, sex: Sex) -> usize {
        match sex {
            Sex::Male => self.male,
            Sex::Female => self.female,
        }
    }

    #[must_use]
    pub fn total(self) -> usize {
        self.male + self.female
    }

    fn range(self, sex: Sex) -> std::ops::Range<usize> {
        match sex {
            Sex::Male => 0..self.male,
            Sex::Female => self.male..self.male + self.female,
        }
    }
}

impl Display for BinCounts {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} male bins, {} female bins", self.male, self.female)
    }
}

/// Panics unless `actual` and `expected` agree: a table may only be rebound to parameters with
/// the shape it was built for.
#[track_caller]
pub(crate) fn assert_shape(table: &str, actual: BinCounts, expected: BinCounts) {
    assert!(
        actual == expected,
        "{table} shape ({actual}) does not match parameters ({expected})"
    );
}

/// One sequence of values per sex, one value per age bin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SexBins<T> {
    bin_counts: BinCounts,
    values: Vec<T>,
}

impl<T: Copy> SexBins<T> {
    #[must_use]
    pub fn new(bin_counts: BinCounts, value: T) -> Self {
        SexBins {
            bin_counts,
            values: vec![value; bin_counts.total()],
        }
    }

    #[must_use]
    pub fn bin_counts(&self) -> BinCounts {
        self.bin_counts
    }

    /// The values for one sex, indexed by age bin.
    #[must_use]
    pub fn get(&self, sex: Sex) -> &[T] {
        &self.values[self.bin_counts.range(sex)]
    }

    pub fn get_mut(&mut self, sex: Sex) -> &mut [T] {
        let range = self.bin_counts.range(sex);
        &mut self.values[range]
    }

    pub fn fill(&mut self, value: T) {
        self.values.fill(value);
    }

    /// Iterates over `(sex, bin, value)` for every cell, male bins first.
    pub fn iter(&self) -> impl Iterator<Item = (Sex, usize, T)> + '_ {
        Sex::iter().flat_map(move |sex| {
            self.get(sex)
                .iter()
                .enumerate()
                .map(move |(bin, value)| (sex, bin, *value))
        })
    }

    /// Checks that the stored values agree with the declared bin counts. Only a hand-edited or
    /// corrupted snapshot can fail this.
    #[track_caller]
    pub(crate) fn assert_shape(&self, table: &str, expected: BinCounts) {
        assert_shape(table, self.bin_counts, expected);
        assert_eq!(
            self.values.len(),
            expected.total(),
            "{table} holds {} values for {expected}",
            self.values.len()
        );
    }
}

/// One [`SexBins`] per risk group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskGroupGrid<T> {
    groups: [SexBins<T>; RiskGroup::COUNT],
}

impl<T: Copy> RiskGroupGrid<T> {
    #[must_use]
    pub fn new(bin_counts: BinCounts, value: T) -> Self {
        RiskGroupGrid {
            groups: [
                SexBins::new(bin_counts, value),
                SexBins::new(bin_counts, value),
            ],
        }
    }

    #[must_use]
    pub fn bin_counts(&self) -> BinCounts {
        self.groups[RiskGroup::Low.index()].bin_counts()
    }

    #[must_use]
    pub fn get(&self, risk_group: RiskGroup) -> &SexBins<T> {
        &self.groups[risk_group.index()]
    }

    pub fn get_mut(&mut self, risk_group: RiskGroup) -> &mut SexBins<T> {
        &mut self.groups[risk_group.index()]
    }

    pub fn fill(&mut self, value: T) {
        for group in &mut self.groups {
            group.fill(value);
        }
    }

    /// Iterates over `(risk_group, sex, bin, value)` for every cell.
    pub fn iter(&self) -> impl Iterator<Item = (RiskGroup, Sex, usize, T)> + '_ {
        RiskGroup::iter().flat_map(move |risk_group| {
            self.get(risk_group)
                .iter()
                .map(move |(sex, bin, value)| (risk_group, sex, bin, value))
        })
    }

    #[track_caller]
    pub(crate) fn assert_shape(&self, table: &str, expected: BinCounts) {
        for group in &self.groups {
            group.assert_shape(table, expected);
        }
    }
}
