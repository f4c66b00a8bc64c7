//! The closed categories the pair-formation engine is indexed by. Each enum has a fixed
//! cardinality (`COUNT`) and a fixed iteration order, which the flat grids in [`crate::grid`]
//! rely on for their layout.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Number of days in a simulated year. Ages are tracked in days; bin edges are in years.
pub const DAYS_PER_YEAR: f64 = 365.0;

#[derive(
    Deserialize, Serialize, Copy, Clone, PartialEq, Eq, Debug, Hash, EnumIter, EnumString, Display, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub const COUNT: usize = 2;

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Coarse behavioral-activity classification. High-risk individuals seek relationships at
/// `rate_ratio` times the per-capita rate of low-risk individuals.
#[derive(
    Deserialize, Serialize, Copy, Clone, PartialEq, Eq, Debug, Hash, EnumIter, EnumString, Display, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum RiskGroup {
    Low,
    High,
}

impl RiskGroup {
    pub const COUNT: usize = 2;

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(
    Deserialize, Serialize, Copy, Clone, PartialEq, Eq, Debug, Hash, EnumIter, EnumString, Display, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum RelationshipType {
    Transitory,
    Informal,
    Marital,
    Commercial,
}

impl RelationshipType {
    pub const COUNT: usize = 4;

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// All relationship types in their canonical order.
    pub fn all() -> impl Iterator<Item = RelationshipType> {
        RelationshipType::iter()
    }
}
