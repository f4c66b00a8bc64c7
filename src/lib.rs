//! Flow control for relationship pair formation in agent-based epidemic models.
//!
//! Every simulated timestep the engine decides at what rate eligible individuals are admitted
//! into partner seeking, broken out by relationship type, age bin, sex, and risk group. It does
//! not pair anyone; a matching agent in the host simulation reads the rates this crate produces.
//!
//! Each relationship type has three components, all bound to one set of
//! [`PairFormationParameters`]:
//! * An [`EligibilityTracker`] counting who is currently eligible.
//! * A [`FlowController`] turning those counts and the aggregate formation rate into a desired
//!   flow per sex and age bin, then into per-capita rates for the low- and high-risk groups.
//! * A [`RateTable`] holding those rates for lookup by age, sex, and risk group.
//!
//! A cycle looks like:
//!
//! ```
//! use pair_formation::prelude::*;
//! # let parameters = {
//! #     let json = r#"{
//! #         "number_age_bins_male": 2, "age_of_first_bin_edge_male": 20.0,
//! #         "years_between_bin_edges_male": 10.0,
//! #         "number_age_bins_female": 2, "age_of_first_bin_edge_female": 20.0,
//! #         "years_between_bin_edges_female": 10.0,
//! #         "marginal_values_male": [0.5, 0.5], "marginal_values_female": [0.5, 0.5],
//! #         "rate_ratio_male": 2.0, "rate_ratio_female": 2.0,
//! #         "formation_rate": { "type": "constant", "rate": 0.01 }
//! #     }"#;
//! #     let config: ParametersConfig = serde_json::from_str(json).unwrap();
//! #     ConfiguredParameters::from_config(RelationshipType::Transitory, &config).unwrap()
//! # };
//! let mut eligibility = EligibilityTracker::new(&parameters);
//! let mut rates = RateTable::new(&parameters);
//! let mut controller = FlowController::new(&parameters);
//!
//! eligibility.reset_eligible();
//! eligibility.update_eligible(25.0 * DAYS_PER_YEAR, Sex::Male, RiskGroup::Low, 1);
//! eligibility.update_eligible(25.0 * DAYS_PER_YEAR, Sex::Female, RiskGroup::High, 1);
//! controller.update_entry_rates(&eligibility, &mut rates, 0.0, 1.0);
//!
//! let rate = rates.get_rate_for_age_and_sex_and_risk_group(
//!     25.0 * DAYS_PER_YEAR,
//!     Sex::Female,
//!     RiskGroup::High,
//! );
//! assert!(rate > 0.0);
//! ```
//!
//! [`Society`] bundles one such engine per configured relationship type, and the
//! `pair-formation` binary drives a society from a population file (see [`runner`]).
pub mod age_bins;
pub mod demographics;
pub mod eligibility;
pub mod error;
pub mod flow_controller;
pub mod formation_rate;
pub mod grid;
pub mod log;
mod macros;
pub mod numeric;
pub mod parameters;
pub mod prelude;
pub mod rate_table;
pub mod runner;
pub mod snapshot;
pub mod society;

pub use crate::demographics::{RelationshipType, RiskGroup, Sex};
pub use crate::eligibility::EligibilityTracker;
pub use crate::error::PairFormationError;
pub use crate::flow_controller::FlowController;
pub use crate::parameters::{ConfiguredParameters, PairFormationParameters, SocietyParameters};
pub use crate::rate_table::RateTable;
pub use crate::society::Society;
