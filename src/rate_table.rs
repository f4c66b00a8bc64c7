//! Per-capita rates of entering relationship formation, by risk group, sex, and age bin.
//!
//! The [`FlowController`](crate::flow_controller::FlowController) writes the table once per
//! cycle; the matching agent reads it once per eligible individual to decide whether that
//! individual starts seeking a partner.

use log::info;
use strum::IntoEnumIterator;

use crate::demographics::{RiskGroup, Sex};
use crate::grid::{BinCounts, RiskGroupGrid};
use crate::parameters::PairFormationParameters;

pub struct RateTable<'p> {
    parameters: &'p dyn PairFormationParameters,
    rates: RiskGroupGrid<f64>,
}

impl<'p> RateTable<'p> {
    #[must_use]
    pub fn new(parameters: &'p dyn PairFormationParameters) -> Self {
        RateTable {
            parameters,
            rates: RiskGroupGrid::new(parameters.bin_counts(), 0.0),
        }
    }

    /// Rebuilds a table from previously saved rates.
    ///
    /// # Panics
    ///
    /// Panics if the rates do not have the shape of `parameters`.
    #[must_use]
    pub fn from_rates(
        parameters: &'p dyn PairFormationParameters,
        rates: RiskGroupGrid<f64>,
    ) -> Self {
        rates.assert_shape("rate table", parameters.bin_counts());
        RateTable { parameters, rates }
    }

    /// The rate for the bin `age_in_days` falls in. The age must be one the parameters' binning
    /// accepts.
    #[must_use]
    pub fn get_rate_for_age_and_sex_and_risk_group(
        &self,
        age_in_days: f64,
        sex: Sex,
        risk_group: RiskGroup,
    ) -> f64 {
        let bin = self.parameters.bin_index_for_age_and_sex(age_in_days, sex);
        self.get_rate_for_bin_and_sex_and_risk_group(bin, sex, risk_group)
    }

    #[must_use]
    pub fn get_rate_for_bin_and_sex_and_risk_group(
        &self,
        bin: usize,
        sex: Sex,
        risk_group: RiskGroup,
    ) -> f64 {
        self.rates.get(risk_group).get(sex)[bin]
    }

    /// Stores `value`, which is expected to be non-negative.
    ///
    /// # Panics
    ///
    /// Panics if `bin` is not a bin of `sex`.
    pub fn set_rate_for_bin_and_sex_and_risk_group(
        &mut self,
        bin: usize,
        sex: Sex,
        risk_group: RiskGroup,
        value: f64,
    ) {
        self.rates.get_mut(risk_group).get_mut(sex)[bin] = value;
    }

    /// Rebinds the table to `parameters`. The table keeps its shape; restoring it against
    /// parameters with different bin counts is an internal-consistency error.
    ///
    /// # Panics
    ///
    /// Panics if the bin counts of `parameters` differ from the table's.
    pub fn set_parameters(&mut self, parameters: &'p dyn PairFormationParameters) {
        self.rates.assert_shape("rate table", parameters.bin_counts());
        self.parameters = parameters;
    }

    #[must_use]
    pub fn bin_counts(&self) -> BinCounts {
        self.rates.bin_counts()
    }

    #[must_use]
    pub fn rates(&self) -> &RiskGroupGrid<f64> {
        &self.rates
    }

    pub fn dump_rates(&self) {
        let relationship_type = self.parameters.relationship_type();
        info!("{relationship_type} formation rates ({})", self.bin_counts());
        for risk_group in RiskGroup::iter() {
            for sex in Sex::iter() {
                let rates = self.rates.get(risk_group).get(sex);
                let row = rates
                    .iter()
                    .map(|rate| format!("{rate:.6e}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                info!("{relationship_type} rate {risk_group} {sex}: [{row}]");
            }
        }
    }
}
