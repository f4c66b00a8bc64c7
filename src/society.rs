//! One pair formation engine per configured relationship type.
//!
//! A [`Society`] is what a host simulation holds: each cycle it calls
//! [`Society::reset_eligibility`], reports every eligible individual with
//! [`Society::update_eligible`], calls [`Society::update_pair_formation_rates`] once, and then
//! lets the matching agent read rates with [`Society::get_rate`].

use log::{debug, info};

use crate::demographics::{RelationshipType, RiskGroup, Sex};
use crate::eligibility::EligibilityTracker;
use crate::error::PairFormationError;
use crate::flow_controller::FlowController;
use crate::parameters::{ConfiguredParameters, PairFormationParameters, SocietyParameters};
use crate::rate_table::RateTable;
use crate::snapshot::{EngineSnapshot, PairFormationSnapshot};

/// The tracker, rate table, and controller for one relationship type, all bound to the same
/// parameters.
pub struct Engine<'p> {
    parameters: &'p ConfiguredParameters,
    eligibility: EligibilityTracker<'p>,
    rates: RateTable<'p>,
    controller: FlowController<'p>,
}

impl<'p> Engine<'p> {
    #[must_use]
    pub fn new(parameters: &'p ConfiguredParameters) -> Self {
        Engine {
            parameters,
            eligibility: EligibilityTracker::new(parameters),
            rates: RateTable::new(parameters),
            controller: FlowController::new(parameters),
        }
    }

    /// Rebuilds an engine from saved state. Every grid is checked against `parameters`.
    ///
    /// # Panics
    ///
    /// Panics if any saved grid does not have the shape of `parameters`.
    #[must_use]
    pub fn restore(parameters: &'p ConfiguredParameters, snapshot: &EngineSnapshot) -> Self {
        let eligibility = EligibilityTracker::from_counts(parameters, snapshot.eligibility.clone());
        let rates = RateTable::from_rates(parameters, snapshot.rates.clone());
        let mut controller = FlowController::new(parameters);
        controller.restore_desired_flow(snapshot.desired_flow.clone());
        Engine {
            parameters,
            eligibility,
            rates,
            controller,
        }
    }

    #[must_use]
    pub fn relationship_type(&self) -> RelationshipType {
        self.parameters.relationship_type()
    }

    #[must_use]
    pub fn parameters(&self) -> &'p ConfiguredParameters {
        self.parameters
    }

    #[must_use]
    pub fn eligibility(&self) -> &EligibilityTracker<'p> {
        &self.eligibility
    }

    pub fn eligibility_mut(&mut self) -> &mut EligibilityTracker<'p> {
        &mut self.eligibility
    }

    #[must_use]
    pub fn rates(&self) -> &RateTable<'p> {
        &self.rates
    }

    #[must_use]
    pub fn controller(&self) -> &FlowController<'p> {
        &self.controller
    }

    /// Runs both controller phases against the current eligibility counts.
    pub fn update_entry_rates(&mut self, current_time: f64, dt: f64) {
        self.controller
            .update_entry_rates(&self.eligibility, &mut self.rates, current_time, dt);
    }

    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            relationship_type: self.relationship_type(),
            eligibility: self.eligibility.counts().clone(),
            desired_flow: self.controller.desired_flow_bins().clone(),
            rates: self.rates.rates().clone(),
        }
    }

    pub fn dump(&self) {
        self.eligibility.dump_eligible();
        self.controller.dump_flow();
        self.rates.dump_rates();
    }
}

pub struct Society<'p> {
    engines: Vec<Engine<'p>>,
}

impl<'p> Society<'p> {
    #[must_use]
    pub fn new(parameters: &'p SocietyParameters) -> Self {
        let engines = parameters.iter().map(Engine::new).collect::<Vec<_>>();
        debug!("society created with {} relationship types", engines.len());
        Society { engines }
    }

    /// Rebuilds a society from a checkpoint. The snapshot must hold exactly one engine for each
    /// relationship type in `parameters`.
    ///
    /// # Errors
    ///
    /// Returns a `PairFormationError` if the snapshot and `parameters` cover different
    /// relationship types.
    ///
    /// # Panics
    ///
    /// Panics if any saved grid does not have the shape of its relationship type's parameters.
    pub fn restore(
        parameters: &'p SocietyParameters,
        snapshot: &PairFormationSnapshot,
    ) -> Result<Self, PairFormationError> {
        if let Some(extra) = snapshot
            .engines
            .iter()
            .find(|engine| parameters.get(engine.relationship_type).is_none())
        {
            return Err(format!(
                "snapshot holds {} state but that relationship type is not configured",
                extra.relationship_type
            )
            .into());
        }
        let engines = parameters
            .iter()
            .map(|configured| {
                let relationship_type = configured.relationship_type();
                snapshot
                    .get(relationship_type)
                    .map(|saved| Engine::restore(configured, saved))
                    .ok_or_else(|| {
                        PairFormationError::from(format!(
                            "snapshot holds no state for {relationship_type}"
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!("society restored with {} relationship types", engines.len());
        Ok(Society { engines })
    }

    pub fn relationship_types(&self) -> impl Iterator<Item = RelationshipType> + '_ {
        self.engines.iter().map(Engine::relationship_type)
    }

    #[must_use]
    pub fn engine(&self, relationship_type: RelationshipType) -> Option<&Engine<'p>> {
        self.engines
            .iter()
            .find(|engine| engine.relationship_type() == relationship_type)
    }

    fn engine_mut(
        &mut self,
        relationship_type: RelationshipType,
    ) -> Result<&mut Engine<'p>, PairFormationError> {
        self.engines
            .iter_mut()
            .find(|engine| engine.relationship_type() == relationship_type)
            .ok_or_else(|| {
                format!("no pair formation parameters configured for {relationship_type}").into()
            })
    }

    /// Zeroes the eligibility counts of every relationship type.
    pub fn reset_eligibility(&mut self) {
        for engine in &mut self.engines {
            engine.eligibility.reset_eligible();
        }
    }

    /// # Errors
    ///
    /// Returns a `PairFormationError` if `relationship_type` is not configured.
    pub fn update_eligible(
        &mut self,
        relationship_type: RelationshipType,
        age_in_days: f64,
        sex: Sex,
        risk_group: RiskGroup,
        delta: i64,
    ) -> Result<(), PairFormationError> {
        self.engine_mut(relationship_type)?
            .eligibility
            .update_eligible(age_in_days, sex, risk_group, delta);
        Ok(())
    }

    /// Recomputes the entry rates of every relationship type.
    pub fn update_pair_formation_rates(&mut self, current_time: f64, dt: f64) {
        for engine in &mut self.engines {
            engine.update_entry_rates(current_time, dt);
        }
    }

    /// The entry rate for an individual, or `None` if `relationship_type` is not configured.
    #[must_use]
    pub fn get_rate(
        &self,
        relationship_type: RelationshipType,
        age_in_days: f64,
        sex: Sex,
        risk_group: RiskGroup,
    ) -> Option<f64> {
        self.rates(relationship_type).map(|rates| {
            rates.get_rate_for_age_and_sex_and_risk_group(age_in_days, sex, risk_group)
        })
    }

    #[must_use]
    pub fn stats(&self, relationship_type: RelationshipType) -> Option<&EligibilityTracker<'p>> {
        self.engine(relationship_type).map(Engine::eligibility)
    }

    #[must_use]
    pub fn rates(&self, relationship_type: RelationshipType) -> Option<&RateTable<'p>> {
        self.engine(relationship_type).map(Engine::rates)
    }

    #[must_use]
    pub fn controller(&self, relationship_type: RelationshipType) -> Option<&FlowController<'p>> {
        self.engine(relationship_type).map(Engine::controller)
    }

    #[must_use]
    pub fn snapshot(&self) -> PairFormationSnapshot {
        PairFormationSnapshot {
            engines: self.engines.iter().map(Engine::snapshot).collect(),
        }
    }

    pub fn dump(&self) {
        for engine in &self.engines {
            info!("pair formation state for {}", engine.relationship_type());
            engine.dump();
        }
    }
}
