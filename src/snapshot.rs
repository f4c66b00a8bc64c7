//! Checkpoints of the engine's mutable state: the eligibility counts, the desired-flow cache,
//! and the rate table for each relationship type. Parameters are not saved; a snapshot is
//! restored against parameters supplied by the host, and every grid's shape is checked against
//! them (see [`Society::restore`](crate::society::Society::restore)).
//!
//! Snapshots encode as JSON for inspection or as compact `bincode` bytes for checkpoint files.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::demographics::RelationshipType;
use crate::error::PairFormationError;
use crate::grid::{RiskGroupGrid, SexBins};

/// The saved state of one relationship type's engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub relationship_type: RelationshipType,
    pub eligibility: RiskGroupGrid<i64>,
    pub desired_flow: SexBins<f64>,
    pub rates: RiskGroupGrid<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairFormationSnapshot {
    pub engines: Vec<EngineSnapshot>,
}

impl PairFormationSnapshot {
    #[must_use]
    pub fn get(&self, relationship_type: RelationshipType) -> Option<&EngineSnapshot> {
        self.engines
            .iter()
            .find(|engine| engine.relationship_type == relationship_type)
    }

    /// # Errors
    ///
    /// Returns `PairFormationError::JsonError` if serialization fails.
    pub fn to_json(&self) -> Result<String, PairFormationError> {
        Ok(serde_json::to_string(self)?)
    }

    /// # Errors
    ///
    /// Returns `PairFormationError::JsonError` if `json` is not a snapshot.
    pub fn from_json(json: &str) -> Result<Self, PairFormationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    ///
    /// Returns `PairFormationError::EncodeError` if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PairFormationError> {
        Ok(bincode::serde::encode_to_vec(
            self,
            bincode::config::standard(),
        )?)
    }

    /// # Errors
    ///
    /// Returns `PairFormationError::DecodeError` if `bytes` is not a complete snapshot.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PairFormationError> {
        let (snapshot, read): (Self, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
        if read != bytes.len() {
            return Err(PairFormationError::InvalidInput(format!(
                "snapshot has {} trailing bytes",
                bytes.len() - read
            )));
        }
        Ok(snapshot)
    }

    /// Writes the snapshot to `file_path` as JSON.
    ///
    /// # Errors
    ///
    /// Returns a `PairFormationError` if the file cannot be written.
    pub fn save_json(&self, file_path: &Path) -> Result<(), PairFormationError> {
        let mut writer = BufWriter::new(File::create(file_path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a `PairFormationError` if the file cannot be read or is not a snapshot.
    pub fn load_json(file_path: &Path) -> Result<Self, PairFormationError> {
        let reader = BufReader::new(File::open(file_path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
