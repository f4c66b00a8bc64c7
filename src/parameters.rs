//! The parameters collaborator. The engine never derives bin boundaries, marginal
//! distributions, rate ratios, or the formation rate itself; it asks a
//! [`PairFormationParameters`] implementation for them.
//!
//! [`ConfiguredParameters`] is the implementation backed by a JSON configuration, one per
//! relationship type, and [`SocietyParameters`] holds the set configured for a simulation:
//!
//! ```json
//! {
//!   "transitory": {
//!     "number_age_bins_male": 20,
//!     "age_of_first_bin_edge_male": 17.5,
//!     "years_between_bin_edges_male": 2.5,
//!     "number_age_bins_female": 20,
//!     "age_of_first_bin_edge_female": 17.5,
//!     "years_between_bin_edges_female": 2.5,
//!     "marginal_values_male": [0.05, ...],
//!     "marginal_values_female": [0.05, ...],
//!     "rate_ratio_male": 2.0,
//!     "rate_ratio_female": 3.0,
//!     "formation_rate": { "type": "constant", "rate": 0.0013699 }
//!   }
//! }
//! ```
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::age_bins::AgeBins;
use crate::demographics::{RelationshipType, Sex};
use crate::error::PairFormationError;
use crate::formation_rate::FormationRate;
use crate::grid::{BinCounts, SexBins};

/// Everything the engine needs to know about one relationship type.
pub trait PairFormationParameters {
    fn relationship_type(&self) -> RelationshipType;

    /// The number of age bins for each sex. Every table built from these parameters has this
    /// shape.
    fn bin_counts(&self) -> BinCounts;

    /// Maps an age in days to an age bin for the given sex. Must return a value less than
    /// `bin_counts().get(sex)` for every age the simulation can produce.
    fn bin_index_for_age_and_sex(&self, age_in_days: f64, sex: Sex) -> usize;

    /// The share of each sex's formation flow that belongs to each age bin. Expected to sum to
    /// one across the bins of a sex.
    fn marginal_values(&self, sex: Sex) -> &[f64];

    /// How much larger the high-risk per-capita rate is than the low-risk one.
    fn rate_ratio(&self, sex: Sex) -> f64;

    /// Expected entries into pair seeking per eligible individual per unit time.
    fn formation_rate(&self, current_time: f64, dt: f64) -> f64;
}

const MAX_BIN_COUNT: usize = 1000;
const MAX_FIRST_BIN_EDGE: f64 = 100.0;
const MIN_BIN_INCREMENT: f64 = 0.1;
const MAX_BIN_INCREMENT: f64 = 100.0;
const MARGINAL_SUM_TOLERANCE: f64 = 1e-3;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ParametersConfig {
    pub number_age_bins_male: usize,
    pub age_of_first_bin_edge_male: f64,
    pub years_between_bin_edges_male: f64,
    pub number_age_bins_female: usize,
    pub age_of_first_bin_edge_female: f64,
    pub years_between_bin_edges_female: f64,
    pub marginal_values_male: Vec<f64>,
    pub marginal_values_female: Vec<f64>,
    pub rate_ratio_male: f64,
    pub rate_ratio_female: f64,
    pub formation_rate: FormationRate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfiguredParameters {
    relationship_type: RelationshipType,
    age_bins: [AgeBins; Sex::COUNT],
    marginal_values: SexBins<f64>,
    rate_ratio: [f64; Sex::COUNT],
    formation_rate: FormationRate,
}

struct Validator {
    relationship_type: RelationshipType,
}

impl Validator {
    fn check_range(
        &self,
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Result<(), PairFormationError> {
        if (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(PairFormationError::ParameterOutOfRange {
                relationship_type: self.relationship_type,
                name,
                value,
                min,
                max,
            })
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn check_bin_count(&self, name: &'static str, value: usize) -> Result<(), PairFormationError> {
        self.check_range(name, value as f64, 1.0, MAX_BIN_COUNT as f64)
    }

    fn check_marginals(
        &self,
        name: &'static str,
        values: &[f64],
        bin_count: usize,
    ) -> Result<(), PairFormationError> {
        if values.len() != bin_count {
            return Err(PairFormationError::MissingValues {
                relationship_type: self.relationship_type,
                name,
                expected: bin_count,
                found: values.len(),
            });
        }
        for &value in values {
            self.check_range(name, value, 0.0, f64::MAX)?;
        }
        let total: f64 = values.iter().sum();
        if (total - 1.0).abs() > MARGINAL_SUM_TOLERANCE {
            warn!(
                "{}:{name} sums to {total} rather than 1; desired flow will be scaled by the same factor",
                self.relationship_type
            );
        }
        Ok(())
    }

    fn check_formation_rate(&self, formation_rate: &FormationRate) -> Result<(), PairFormationError> {
        if let FormationRate::InterpolatedValues { times, values } = formation_rate {
            if times.is_empty() || times.len() != values.len() {
                return Err(PairFormationError::InvalidInput(format!(
                    "{}:formation_rate needs one value per time and at least one of each (found {} times, {} values)",
                    self.relationship_type,
                    times.len(),
                    values.len()
                )));
            }
            if times.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(PairFormationError::InvalidInput(format!(
                    "{}:formation_rate times must be strictly increasing",
                    self.relationship_type
                )));
            }
        }
        if let FormationRate::SigmoidVariableFunctionOfTime { mid_year, rate, .. } = formation_rate
        {
            self.check_range("formation_rate.mid_year", *mid_year, f64::MIN, f64::MAX)?;
            self.check_range("formation_rate.rate", *rate, f64::MIN, f64::MAX)?;
        }
        let (lowest, highest) = formation_rate.bounds();
        self.check_range("formation_rate", lowest, 0.0, 1.0)?;
        self.check_range("formation_rate", highest, 0.0, 1.0)
    }
}

impl ConfiguredParameters {
    /// Validates `config` and builds the bins for each sex.
    ///
    /// # Errors
    ///
    /// Returns `PairFormationError::ParameterOutOfRange` or `PairFormationError::MissingValues`
    /// naming the offending variable and `relationship_type`.
    pub fn from_config(
        relationship_type: RelationshipType,
        config: &ParametersConfig,
    ) -> Result<Self, PairFormationError> {
        let validator = Validator { relationship_type };

        validator.check_bin_count("number_age_bins_male", config.number_age_bins_male)?;
        validator.check_bin_count("number_age_bins_female", config.number_age_bins_female)?;
        validator.check_range(
            "age_of_first_bin_edge_male",
            config.age_of_first_bin_edge_male,
            0.0,
            MAX_FIRST_BIN_EDGE,
        )?;
        validator.check_range(
            "age_of_first_bin_edge_female",
            config.age_of_first_bin_edge_female,
            0.0,
            MAX_FIRST_BIN_EDGE,
        )?;
        validator.check_range(
            "years_between_bin_edges_male",
            config.years_between_bin_edges_male,
            MIN_BIN_INCREMENT,
            MAX_BIN_INCREMENT,
        )?;
        validator.check_range(
            "years_between_bin_edges_female",
            config.years_between_bin_edges_female,
            MIN_BIN_INCREMENT,
            MAX_BIN_INCREMENT,
        )?;
        validator.check_marginals(
            "marginal_values_male",
            &config.marginal_values_male,
            config.number_age_bins_male,
        )?;
        validator.check_marginals(
            "marginal_values_female",
            &config.marginal_values_female,
            config.number_age_bins_female,
        )?;
        validator.check_range("rate_ratio_male", config.rate_ratio_male, 0.0, f64::MAX)?;
        validator.check_range("rate_ratio_female", config.rate_ratio_female, 0.0, f64::MAX)?;
        validator.check_formation_rate(&config.formation_rate)?;

        let bin_counts = BinCounts::new(config.number_age_bins_male, config.number_age_bins_female);
        let mut marginal_values = SexBins::new(bin_counts, 0.0);
        marginal_values
            .get_mut(Sex::Male)
            .copy_from_slice(&config.marginal_values_male);
        marginal_values
            .get_mut(Sex::Female)
            .copy_from_slice(&config.marginal_values_female);

        debug!("configured pair formation parameters for {relationship_type} ({bin_counts})");

        Ok(ConfiguredParameters {
            relationship_type,
            age_bins: [
                AgeBins::new(
                    config.number_age_bins_male,
                    config.age_of_first_bin_edge_male,
                    config.years_between_bin_edges_male,
                ),
                AgeBins::new(
                    config.number_age_bins_female,
                    config.age_of_first_bin_edge_female,
                    config.years_between_bin_edges_female,
                ),
            ],
            marginal_values,
            rate_ratio: [config.rate_ratio_male, config.rate_ratio_female],
            formation_rate: config.formation_rate.clone(),
        })
    }

    /// Reads a single relationship type's parameters from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns a `PairFormationError` if the file cannot be read or parsed, or if any value
    /// fails validation.
    pub fn load_from_json(
        relationship_type: RelationshipType,
        file_path: &Path,
    ) -> Result<Self, PairFormationError> {
        let reader = BufReader::new(File::open(file_path)?);
        let config: ParametersConfig = serde_json::from_reader(reader)?;
        Self::from_config(relationship_type, &config)
    }

    #[must_use]
    pub fn age_bins(&self, sex: Sex) -> &AgeBins {
        &self.age_bins[sex.index()]
    }
}

impl PairFormationParameters for ConfiguredParameters {
    fn relationship_type(&self) -> RelationshipType {
        self.relationship_type
    }

    fn bin_counts(&self) -> BinCounts {
        self.marginal_values.bin_counts()
    }

    fn bin_index_for_age_and_sex(&self, age_in_days: f64, sex: Sex) -> usize {
        self.age_bins(sex).bin_index(age_in_days)
    }

    fn marginal_values(&self, sex: Sex) -> &[f64] {
        self.marginal_values.get(sex)
    }

    fn rate_ratio(&self, sex: Sex) -> f64 {
        self.rate_ratio[sex.index()]
    }

    fn formation_rate(&self, current_time: f64, dt: f64) -> f64 {
        self.formation_rate.evaluate(current_time, dt)
    }
}

/// The parameters for every relationship type configured in a simulation, in
/// `RelationshipType` order.
#[derive(Debug, Clone, PartialEq)]
pub struct SocietyParameters {
    parameters: Vec<ConfiguredParameters>,
}

impl SocietyParameters {
    /// # Errors
    ///
    /// Returns a `PairFormationError` if no relationship type is configured or any
    /// configuration fails validation.
    pub fn from_configs(
        configs: &BTreeMap<RelationshipType, ParametersConfig>,
    ) -> Result<Self, PairFormationError> {
        if configs.is_empty() {
            return Err("Zero relationship types were configured for pair formation".into());
        }
        let parameters = configs
            .iter()
            .map(|(relationship_type, config)| {
                ConfiguredParameters::from_config(*relationship_type, config)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SocietyParameters { parameters })
    }

    /// Reads a JSON object keyed by relationship type name (`"transitory"`, `"informal"`,
    /// `"marital"`, `"commercial"`).
    ///
    /// # Errors
    ///
    /// Returns a `PairFormationError` if the file cannot be read or parsed, names an unknown
    /// relationship type, or any configuration fails validation.
    pub fn load_from_json(file_path: &Path) -> Result<Self, PairFormationError> {
        let reader = BufReader::new(File::open(file_path)?);
        let raw: BTreeMap<String, ParametersConfig> = serde_json::from_reader(reader)?;
        let mut configs = BTreeMap::new();
        for (name, config) in raw {
            let relationship_type = name.parse::<RelationshipType>().map_err(|_| {
                PairFormationError::InvalidInput(format!("unknown relationship type '{name}'"))
            })?;
            configs.insert(relationship_type, config);
        }
        Self::from_configs(&configs)
    }

    #[must_use]
    pub fn get(&self, relationship_type: RelationshipType) -> Option<&ConfiguredParameters> {
        self.parameters
            .iter()
            .find(|parameters| parameters.relationship_type == relationship_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfiguredParameters> {
        self.parameters.iter()
    }

    pub fn relationship_types(&self) -> impl Iterator<Item = RelationshipType> + '_ {
        self.parameters
            .iter()
            .map(|parameters| parameters.relationship_type)
    }
}
