//! Converts population-level demand into per-capita entry rates.
//!
//! Each cycle runs in two phases. Phase 1 ([`FlowController::update_desired_flow`]) turns the
//! eligible headcount and the aggregate formation rate into a target flow for every sex and age
//! bin. Phase 2 ([`FlowController::update_entry_rates`]) splits each bin's target between the
//! two risk groups so that
//!
//! ```text
//! rate_low * eligible_low + rate_high * eligible_high == desired_flow
//! rate_high == rate_ratio * rate_low
//! ```
//!
//! whenever the bin has anyone eligible in it.

use log::{debug, info, trace};
use strum::IntoEnumIterator;

use crate::demographics::{RiskGroup, Sex};
use crate::eligibility::EligibilityTracker;
use crate::grid::{assert_shape, SexBins};
use crate::parameters::PairFormationParameters;
use crate::rate_table::RateTable;

pub struct FlowController<'p> {
    parameters: &'p dyn PairFormationParameters,
    desired_flow: SexBins<f64>,
    rate_ratio: [f64; Sex::COUNT],
}

fn rate_ratios(parameters: &dyn PairFormationParameters) -> [f64; Sex::COUNT] {
    [
        parameters.rate_ratio(Sex::Male),
        parameters.rate_ratio(Sex::Female),
    ]
}

impl<'p> FlowController<'p> {
    #[must_use]
    pub fn new(parameters: &'p dyn PairFormationParameters) -> Self {
        FlowController {
            parameters,
            desired_flow: SexBins::new(parameters.bin_counts(), 0.0),
            rate_ratio: rate_ratios(parameters),
        }
    }

    /// Phase 1: recomputes the desired flow for every sex and bin from the total eligible
    /// population and the formation rate at `current_time`.
    ///
    /// # Panics
    ///
    /// Panics if the parameters return a marginal whose length differs from the bin count.
    pub fn update_desired_flow(
        &mut self,
        eligibility: &EligibilityTracker,
        current_time: f64,
        dt: f64,
    ) {
        #[allow(clippy::cast_precision_loss)]
        let cumulative_eligible = eligibility.total_eligible() as f64;
        let formation_rate = self.parameters.formation_rate(current_time, dt);
        let cumulative_base_flow = cumulative_eligible * formation_rate;

        debug!(
            "{} at t={current_time}: {cumulative_eligible} eligible, formation rate {formation_rate}, base flow {cumulative_base_flow}",
            self.parameters.relationship_type()
        );

        if cumulative_base_flow > 0.0 {
            for sex in Sex::iter() {
                let marginal = self.parameters.marginal_values(sex);
                let flows = self.desired_flow.get_mut(sex);
                assert_eq!(
                    marginal.len(),
                    flows.len(),
                    "{sex} marginal has {} values for {} age bins",
                    marginal.len(),
                    flows.len()
                );
                for (flow, weight) in flows.iter_mut().zip(marginal) {
                    *flow = 0.5 * cumulative_base_flow * weight;
                }
            }
        } else {
            self.desired_flow.fill(0.0);
        }
    }

    /// Phase 2: refreshes the desired flow, then writes the low- and high-risk rate for every
    /// sex and bin into `rate_table`. Bins with nobody eligible get a rate of zero.
    ///
    /// # Panics
    ///
    /// Panics if `eligibility` or `rate_table` does not have the controller's shape.
    #[track_caller]
    pub fn update_entry_rates(
        &mut self,
        eligibility: &EligibilityTracker,
        rate_table: &mut RateTable,
        current_time: f64,
        dt: f64,
    ) {
        let expected = self.desired_flow.bin_counts();
        assert_shape("eligibility", eligibility.bin_counts(), expected);
        assert_shape("rate table", rate_table.bin_counts(), expected);
        self.update_desired_flow(eligibility, current_time, dt);

        let low = eligibility.get_eligible(RiskGroup::Low);
        let high = eligibility.get_eligible(RiskGroup::High);

        for sex in Sex::iter() {
            let rate_ratio = self.rate_ratio[sex.index()];
            let desired = self.desired_flow.get(sex);
            for (bin, (&eligible_low, &eligible_high)) in
                low.get(sex).iter().zip(high.get(sex)).enumerate()
            {
                #[allow(clippy::cast_precision_loss)]
                let effective_eligible = rate_ratio * eligible_high as f64 + eligible_low as f64;
                let rate_low = if effective_eligible > 0.0 {
                    desired[bin] / effective_eligible
                } else {
                    0.0
                };
                let rate_high = rate_ratio * rate_low;
                trace!("{sex} bin {bin}: effective eligible {effective_eligible}, rates {rate_low} / {rate_high}");

                rate_table.set_rate_for_bin_and_sex_and_risk_group(
                    bin,
                    sex,
                    RiskGroup::Low,
                    rate_low,
                );
                rate_table.set_rate_for_bin_and_sex_and_risk_group(
                    bin,
                    sex,
                    RiskGroup::High,
                    rate_high,
                );
            }
        }
    }

    /// The most recent Phase 1 result for `sex`, indexed by age bin.
    #[must_use]
    pub fn desired_flow(&self, sex: Sex) -> &[f64] {
        self.desired_flow.get(sex)
    }

    #[must_use]
    pub fn desired_flow_bins(&self) -> &SexBins<f64> {
        &self.desired_flow
    }

    #[must_use]
    pub fn rate_ratio(&self, sex: Sex) -> f64 {
        self.rate_ratio[sex.index()]
    }

    /// Rebinds the controller to `parameters` and re-reads the rate ratios from them.
    ///
    /// # Panics
    ///
    /// Panics if the bin counts of `parameters` differ from the desired-flow cache's.
    pub fn set_parameters(&mut self, parameters: &'p dyn PairFormationParameters) {
        self.desired_flow
            .assert_shape("desired flow", parameters.bin_counts());
        self.parameters = parameters;
        self.rate_ratio = rate_ratios(parameters);
    }

    /// Replaces the desired-flow cache with a saved copy.
    ///
    /// # Panics
    ///
    /// Panics if `desired_flow` does not have the shape of the controller's parameters.
    pub fn restore_desired_flow(&mut self, desired_flow: SexBins<f64>) {
        desired_flow.assert_shape("desired flow", self.parameters.bin_counts());
        self.desired_flow = desired_flow;
    }

    pub fn dump_flow(&self) {
        let relationship_type = self.parameters.relationship_type();
        for sex in Sex::iter() {
            info!(
                "{relationship_type} desired flow {sex} (rate ratio {}): {:?}",
                self.rate_ratio(sex),
                self.desired_flow(sex)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;
    use crate::demographics::{RelationshipType, DAYS_PER_YEAR};
    use crate::formation_rate::FormationRate;
    use crate::grid::BinCounts;
    use crate::parameters::tests::{test_config, test_parameters};
    use crate::parameters::ConfiguredParameters;

    fn age(years: f64) -> f64 {
        years * DAYS_PER_YEAR
    }

    fn populate(tracker: &mut EligibilityTracker) {
        for (years, low, high) in [(18.0, 12, 3), (21.0, 40, 0), (26.0, 0, 7), (70.0, 5, 5)] {
            for sex in Sex::iter() {
                tracker.update_eligible(age(years), sex, RiskGroup::Low, low);
                tracker.update_eligible(age(years), sex, RiskGroup::High, high);
            }
        }
    }

    #[test]
    fn desired_flow_splits_base_flow_by_marginal() {
        let parameters = test_parameters(4, 2);
        let mut tracker = EligibilityTracker::new(&parameters);
        tracker.update_eligible(age(21.0), Sex::Male, RiskGroup::Low, 60);
        tracker.update_eligible(age(21.0), Sex::Female, RiskGroup::High, 40);

        let mut controller = FlowController::new(&parameters);
        controller.update_desired_flow(&tracker, 0.0, 1.0);

        // 100 eligible at rate 0.01 is a base flow of 1; half of it goes to each sex.
        for &flow in controller.desired_flow(Sex::Male) {
            assert_almost_eq!(flow, 0.5 / 4.0, 1e-12);
        }
        for &flow in controller.desired_flow(Sex::Female) {
            assert_almost_eq!(flow, 0.5 / 2.0, 1e-12);
        }
    }

    #[test]
    fn conservation_and_ratio() {
        let parameters = test_parameters(20, 10);
        let mut tracker = EligibilityTracker::new(&parameters);
        populate(&mut tracker);
        let mut table = RateTable::new(&parameters);
        let mut controller = FlowController::new(&parameters);

        controller.update_entry_rates(&tracker, &mut table, 0.0, 1.0);

        for sex in Sex::iter() {
            let ratio = controller.rate_ratio(sex);
            let low = tracker.get_eligible(RiskGroup::Low).get(sex);
            let high = tracker.get_eligible(RiskGroup::High).get(sex);
            for bin in 0..parameters.bin_counts().get(sex) {
                let rate_low = table.get_rate_for_bin_and_sex_and_risk_group(bin, sex, RiskGroup::Low);
                let rate_high =
                    table.get_rate_for_bin_and_sex_and_risk_group(bin, sex, RiskGroup::High);
                assert_eq!(rate_high, ratio * rate_low);

                #[allow(clippy::cast_precision_loss)]
                let (low, high) = (low[bin] as f64, high[bin] as f64);
                if ratio * high + low > 0.0 {
                    assert_almost_eq!(
                        rate_low * low + rate_high * high,
                        controller.desired_flow(sex)[bin],
                        1e-12
                    );
                } else {
                    assert_eq!(rate_low, 0.0);
                }
            }
        }
    }

    #[test]
    fn only_high_risk_in_bin() {
        let parameters = test_parameters(20, 10);
        let mut tracker = EligibilityTracker::new(&parameters);
        tracker.update_eligible(age(26.0), Sex::Male, RiskGroup::High, 10);
        let mut table = RateTable::new(&parameters);
        let mut controller = FlowController::new(&parameters);

        controller.update_entry_rates(&tracker, &mut table, 0.0, 1.0);

        // Base flow 0.1, male share 0.05 spread over 20 bins; effective eligible 2 * 10.
        let rate_low = table.get_rate_for_bin_and_sex_and_risk_group(4, Sex::Male, RiskGroup::Low);
        assert_almost_eq!(rate_low, 0.05 / 20.0 / 20.0, 1e-15);
        assert_almost_eq!(
            table.get_rate_for_age_and_sex_and_risk_group(age(26.0), Sex::Male, RiskGroup::High),
            2.0 * rate_low,
            1e-15
        );
        // Nobody eligible among the women: every female rate is zero.
        for risk_group in RiskGroup::iter() {
            assert!(table.rates().get(risk_group).get(Sex::Female).iter().all(|&r| r == 0.0));
        }
    }

    #[test]
    fn zero_population_is_idempotent() {
        let parameters = test_parameters(20, 10);
        let tracker = EligibilityTracker::new(&parameters);
        let mut table = RateTable::new(&parameters);
        let mut controller = FlowController::new(&parameters);

        for step in 0..5 {
            controller.update_entry_rates(&tracker, &mut table, f64::from(step), 1.0);
            assert!(table.rates().iter().all(|(_, _, _, rate)| rate == 0.0));
            assert!(controller.desired_flow_bins().iter().all(|(_, _, flow)| flow == 0.0));
            assert_eq!(tracker.total_eligible(), 0);
        }
    }

    #[test]
    fn desired_flow_resets_when_demand_drops() {
        let parameters = test_parameters(20, 10);
        let mut tracker = EligibilityTracker::new(&parameters);
        populate(&mut tracker);
        let mut table = RateTable::new(&parameters);
        let mut controller = FlowController::new(&parameters);

        controller.update_entry_rates(&tracker, &mut table, 0.0, 1.0);
        assert!(controller.desired_flow(Sex::Male).iter().all(|&flow| flow > 0.0));

        tracker.reset_eligible();
        controller.update_entry_rates(&tracker, &mut table, 1.0, 1.0);
        assert!(controller.desired_flow_bins().iter().all(|(_, _, flow)| flow == 0.0));
        assert!(table.rates().iter().all(|(_, _, _, rate)| rate == 0.0));
    }

    #[test]
    fn zero_formation_rate_gives_zero_flow() {
        let mut config = test_config(20, 10);
        config.formation_rate = FormationRate::InterpolatedValues {
            times: vec![0.0, 10.0],
            values: vec![0.0, 0.02],
        };
        let parameters =
            ConfiguredParameters::from_config(RelationshipType::Informal, &config).unwrap();
        let mut tracker = EligibilityTracker::new(&parameters);
        populate(&mut tracker);
        let mut table = RateTable::new(&parameters);
        let mut controller = FlowController::new(&parameters);

        controller.update_entry_rates(&tracker, &mut table, 0.0, 1.0);
        assert!(table.rates().iter().all(|(_, _, _, rate)| rate == 0.0));

        controller.update_entry_rates(&tracker, &mut table, age(5.0), 1.0);
        assert!(table.rates().iter().any(|(_, _, _, rate)| rate > 0.0));
    }

    #[test]
    fn set_parameters_rereads_rate_ratio() {
        let parameters = test_parameters(20, 10);
        let mut config = test_config(20, 10);
        config.rate_ratio_female = 1.5;
        let other = ConfiguredParameters::from_config(RelationshipType::Transitory, &config).unwrap();

        let mut controller = FlowController::new(&parameters);
        assert_eq!(controller.rate_ratio(Sex::Female), 4.0);
        controller.set_parameters(&other);
        assert_eq!(controller.rate_ratio(Sex::Female), 1.5);
        assert_eq!(controller.rate_ratio(Sex::Male), 2.0);
    }

    #[test]
    #[should_panic(expected = "desired flow shape")]
    fn set_parameters_with_other_shape_panics() {
        let parameters = test_parameters(20, 10);
        let other = test_parameters(10, 10);
        let mut controller = FlowController::new(&parameters);
        controller.set_parameters(&other);
    }

    #[test]
    #[should_panic(expected = "eligibility shape (18 male bins, 10 female bins)")]
    fn eligibility_with_fewer_bins_panics() {
        let parameters = test_parameters(20, 10);
        let smaller = test_parameters(18, 10);
        let mut tracker = EligibilityTracker::new(&smaller);
        tracker.update_eligible(age(70.0), Sex::Male, RiskGroup::Low, 10);
        let mut table = RateTable::new(&parameters);
        let mut controller = FlowController::new(&parameters);
        controller.update_entry_rates(&tracker, &mut table, 0.0, 1.0);
    }

    #[test]
    #[should_panic(expected = "eligibility shape (20 male bins, 10 female bins)")]
    fn eligibility_with_more_bins_panics() {
        let parameters = test_parameters(18, 10);
        let larger = test_parameters(20, 10);
        let mut tracker = EligibilityTracker::new(&larger);
        populate(&mut tracker);
        let mut table = RateTable::new(&parameters);
        let mut controller = FlowController::new(&parameters);
        controller.update_entry_rates(&tracker, &mut table, 0.0, 1.0);
    }

    #[test]
    #[should_panic(expected = "rate table shape (18 male bins, 10 female bins)")]
    fn rate_table_with_other_shape_panics() {
        let parameters = test_parameters(20, 10);
        let smaller = test_parameters(18, 10);
        let mut tracker = EligibilityTracker::new(&parameters);
        populate(&mut tracker);
        let mut table = RateTable::new(&smaller);
        let mut controller = FlowController::new(&parameters);
        controller.update_entry_rates(&tracker, &mut table, 0.0, 1.0);
    }

    /// Delegates to configured parameters but drops the last male marginal.
    struct ShortMarginal(ConfiguredParameters);

    impl PairFormationParameters for ShortMarginal {
        fn relationship_type(&self) -> RelationshipType {
            self.0.relationship_type()
        }

        fn bin_counts(&self) -> BinCounts {
            self.0.bin_counts()
        }

        fn bin_index_for_age_and_sex(&self, age_in_days: f64, sex: Sex) -> usize {
            self.0.bin_index_for_age_and_sex(age_in_days, sex)
        }

        fn marginal_values(&self, sex: Sex) -> &[f64] {
            let values = self.0.marginal_values(sex);
            match sex {
                Sex::Male => &values[..values.len() - 1],
                Sex::Female => values,
            }
        }

        fn rate_ratio(&self, sex: Sex) -> f64 {
            self.0.rate_ratio(sex)
        }

        fn formation_rate(&self, current_time: f64, dt: f64) -> f64 {
            self.0.formation_rate(current_time, dt)
        }
    }

    #[test]
    #[should_panic(expected = "MALE marginal has 19 values for 20 age bins")]
    fn short_marginal_panics() {
        let parameters = ShortMarginal(test_parameters(20, 10));
        let mut tracker = EligibilityTracker::new(&parameters);
        populate(&mut tracker);
        let mut controller = FlowController::new(&parameters);
        controller.update_desired_flow(&tracker, 0.0, 1.0);
    }

    #[test]
    #[should_panic(expected = "desired flow shape")]
    fn restoring_mismatched_flow_panics() {
        let parameters = test_parameters(20, 10);
        let mut controller = FlowController::new(&parameters);
        controller.restore_desired_flow(SexBins::new(BinCounts::new(20, 9), 0.0));
    }
}
