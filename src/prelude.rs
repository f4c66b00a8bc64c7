pub use crate::demographics::{RelationshipType, RiskGroup, Sex, DAYS_PER_YEAR};
pub use crate::eligibility::EligibilityTracker;
pub use crate::error::PairFormationError;
pub use crate::flow_controller::FlowController;
pub use crate::formation_rate::FormationRate;
pub use crate::grid::{BinCounts, RiskGroupGrid, SexBins};
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::parameters::{
    ConfiguredParameters, PairFormationParameters, ParametersConfig, SocietyParameters,
};
pub use crate::rate_table::RateTable;
pub use crate::snapshot::{EngineSnapshot, PairFormationSnapshot};
pub use crate::society::{Engine, Society};
pub use crate::{assert_almost_eq, assert_relative_almost_eq};
