//! Counts of the individuals currently eligible to seek a relationship, by risk group, sex, and
//! age bin.
//!
//! The host's population loop rebuilds the counts every cycle: one [`EligibilityTracker::reset_eligible`]
//! followed by an [`EligibilityTracker::update_eligible`] for every eligible individual. Counts
//! are signed and never clamped; callers keep increments and decrements balanced.

use log::{info, trace};
use strum::IntoEnumIterator;

use crate::demographics::{RiskGroup, Sex};
use crate::grid::{assert_shape, BinCounts, RiskGroupGrid, SexBins};
use crate::parameters::PairFormationParameters;

pub struct EligibilityTracker<'p> {
    parameters: &'p dyn PairFormationParameters,
    eligible: RiskGroupGrid<i64>,
}

impl<'p> EligibilityTracker<'p> {
    #[must_use]
    pub fn new(parameters: &'p dyn PairFormationParameters) -> Self {
        EligibilityTracker {
            parameters,
            eligible: RiskGroupGrid::new(parameters.bin_counts(), 0),
        }
    }

    /// Rebuilds a tracker from previously saved counts.
    ///
    /// # Panics
    ///
    /// Panics if the counts do not have the shape of `parameters`.
    #[must_use]
    pub fn from_counts(
        parameters: &'p dyn PairFormationParameters,
        eligible: RiskGroupGrid<i64>,
    ) -> Self {
        eligible.assert_shape("eligibility", parameters.bin_counts());
        EligibilityTracker {
            parameters,
            eligible,
        }
    }

    /// Zeroes every count. Rates computed from the old counts are stale until the next update.
    pub fn reset_eligible(&mut self) {
        self.eligible.fill(0);
    }

    /// Adds `delta` to the count for the bin that `age_in_days` falls in. `delta` is negative when
    /// an individual stops being eligible.
    pub fn update_eligible(
        &mut self,
        age_in_days: f64,
        sex: Sex,
        risk_group: RiskGroup,
        delta: i64,
    ) {
        let bin = self.parameters.bin_index_for_age_and_sex(age_in_days, sex);
        trace!(
            target: "pair_formation::eligibility::updates",
            "{}: eligible {risk_group} {sex} bin {bin} += {delta}",
            self.parameters.relationship_type()
        );
        self.eligible.get_mut(risk_group).get_mut(sex)[bin] += delta;
    }

    /// The live counts for one risk group, by sex and age bin.
    #[must_use]
    pub fn get_eligible(&self, risk_group: RiskGroup) -> &SexBins<i64> {
        self.eligible.get(risk_group)
    }

    /// The counts summed across both risk groups.
    #[must_use]
    pub fn get_eligible_aggregate(&self) -> SexBins<i64> {
        let mut aggregate = self.eligible.get(RiskGroup::Low).clone();
        for sex in Sex::iter() {
            let high = self.eligible.get(RiskGroup::High).get(sex);
            for (total, count) in aggregate.get_mut(sex).iter_mut().zip(high) {
                *total += count;
            }
        }
        aggregate
    }

    /// The count summed over every risk group, sex, and age bin.
    #[must_use]
    pub fn total_eligible(&self) -> i64 {
        self.eligible.iter().map(|(_, _, _, count)| count).sum()
    }

    /// Adds every count in `other` to this tracker. Used to combine trackers that worker threads
    /// filled independently.
    ///
    /// # Panics
    ///
    /// Panics if the two trackers have different shapes.
    pub fn merge_from(&mut self, other: &EligibilityTracker) {
        assert_shape("eligibility", other.bin_counts(), self.bin_counts());
        for (risk_group, sex, bin, count) in other.eligible.iter() {
            self.eligible.get_mut(risk_group).get_mut(sex)[bin] += count;
        }
    }

    /// Rebinds the tracker to `parameters`, which must have the shape the tracker was built with.
    ///
    /// # Panics
    ///
    /// Panics if the bin counts of `parameters` differ from the tracker's.
    pub fn set_parameters(&mut self, parameters: &'p dyn PairFormationParameters) {
        assert_shape("eligibility", self.bin_counts(), parameters.bin_counts());
        self.parameters = parameters;
    }

    #[must_use]
    pub fn bin_counts(&self) -> BinCounts {
        self.eligible.bin_counts()
    }

    #[must_use]
    pub fn counts(&self) -> &RiskGroupGrid<i64> {
        &self.eligible
    }

    pub fn dump_eligible(&self) {
        let relationship_type = self.parameters.relationship_type();
        for risk_group in RiskGroup::iter() {
            for sex in Sex::iter() {
                info!(
                    "{relationship_type} eligible {risk_group} {sex}: {:?}",
                    self.eligible.get(risk_group).get(sex)
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demographics::DAYS_PER_YEAR;
    use crate::parameters::tests::test_parameters;

    fn age(years: f64) -> f64 {
        years * DAYS_PER_YEAR
    }

    #[test]
    fn starts_at_zero() {
        let parameters = test_parameters(20, 10);
        let tracker = EligibilityTracker::new(&parameters);
        for risk_group in RiskGroup::iter() {
            assert_eq!(tracker.get_eligible(risk_group).get(Sex::Male), &[0; 20]);
            assert_eq!(tracker.get_eligible(risk_group).get(Sex::Female), &[0; 10]);
        }
        assert_eq!(tracker.total_eligible(), 0);
    }

    #[test]
    fn update_lands_in_age_bin() {
        let parameters = test_parameters(20, 10);
        let mut tracker = EligibilityTracker::new(&parameters);
        tracker.update_eligible(age(21.0), Sex::Male, RiskGroup::High, 1);
        tracker.update_eligible(age(21.0), Sex::Male, RiskGroup::High, 1);
        tracker.update_eligible(age(26.0), Sex::Female, RiskGroup::Low, 3);

        assert_eq!(tracker.get_eligible(RiskGroup::High).get(Sex::Male)[2], 2);
        assert_eq!(tracker.get_eligible(RiskGroup::Low).get(Sex::Female)[3], 3);
        assert_eq!(tracker.get_eligible(RiskGroup::Low).get(Sex::Male)[2], 0);
        assert_eq!(tracker.total_eligible(), 5);
    }

    #[test]
    fn increment_then_decrement_restores_count() {
        let parameters = test_parameters(20, 10);
        let mut tracker = EligibilityTracker::new(&parameters);
        tracker.update_eligible(age(30.0), Sex::Female, RiskGroup::Low, 4);
        let before = tracker.counts().clone();

        tracker.update_eligible(age(45.0), Sex::Female, RiskGroup::Low, 17);
        tracker.update_eligible(age(45.0), Sex::Female, RiskGroup::Low, -17);
        assert_eq!(tracker.counts(), &before);
    }

    #[test]
    fn reset_zeroes_every_group() {
        let parameters = test_parameters(20, 10);
        let mut tracker = EligibilityTracker::new(&parameters);
        for risk_group in RiskGroup::iter() {
            for sex in Sex::iter() {
                tracker.update_eligible(age(18.0), sex, risk_group, 5);
                tracker.update_eligible(age(80.0), sex, risk_group, 2);
            }
        }
        tracker.reset_eligible();
        for risk_group in RiskGroup::iter() {
            for sex in Sex::iter() {
                assert!(tracker
                    .get_eligible(risk_group)
                    .get(sex)
                    .iter()
                    .all(|&count| count == 0));
            }
        }
    }

    #[test]
    fn aggregate_sums_risk_groups() {
        let parameters = test_parameters(20, 10);
        let mut tracker = EligibilityTracker::new(&parameters);
        tracker.update_eligible(age(21.0), Sex::Male, RiskGroup::Low, 2);
        tracker.update_eligible(age(21.0), Sex::Male, RiskGroup::High, 3);
        tracker.update_eligible(age(16.0), Sex::Female, RiskGroup::High, 1);

        let aggregate = tracker.get_eligible_aggregate();
        assert_eq!(aggregate.get(Sex::Male)[2], 5);
        assert_eq!(aggregate.get(Sex::Female)[1], 1);
        assert_eq!(aggregate.get(Sex::Female).iter().sum::<i64>(), 1);
    }

    #[test]
    fn merge_adds_counts() {
        let parameters = test_parameters(20, 10);
        let mut main = EligibilityTracker::new(&parameters);
        let mut worker = EligibilityTracker::new(&parameters);
        main.update_eligible(age(21.0), Sex::Male, RiskGroup::Low, 2);
        worker.update_eligible(age(21.0), Sex::Male, RiskGroup::Low, 5);
        worker.update_eligible(age(40.0), Sex::Female, RiskGroup::High, 1);

        main.merge_from(&worker);
        assert_eq!(main.get_eligible(RiskGroup::Low).get(Sex::Male)[2], 7);
        assert_eq!(main.total_eligible(), 8);
    }

    #[test]
    #[should_panic(expected = "eligibility shape")]
    fn rebinding_to_other_shape_panics() {
        let parameters = test_parameters(20, 10);
        let other = test_parameters(20, 12);
        let mut tracker = EligibilityTracker::new(&parameters);
        tracker.set_parameters(&other);
    }
}
