use std::fmt::{self, Debug, Display};
use std::io;

use crate::demographics::RelationshipType;

/// Provides `PairFormationError` and maps to other errors to
/// convert to a `PairFormationError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum PairFormationError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    EncodeError(bincode::error::EncodeError),
    DecodeError(bincode::error::DecodeError),
    /// A configured value fell outside of its permitted range.
    ParameterOutOfRange {
        relationship_type: RelationshipType,
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// A configured array does not have one value per age bin.
    MissingValues {
        relationship_type: RelationshipType,
        name: &'static str,
        expected: usize,
        found: usize,
    },
    InvalidInput(String),
    PairFormationError(String),
}

impl From<io::Error> for PairFormationError {
    fn from(error: io::Error) -> Self {
        PairFormationError::IoError(error)
    }
}

impl From<serde_json::Error> for PairFormationError {
    fn from(error: serde_json::Error) -> Self {
        PairFormationError::JsonError(error)
    }
}

impl From<csv::Error> for PairFormationError {
    fn from(error: csv::Error) -> Self {
        PairFormationError::CSVError(error)
    }
}

impl From<bincode::error::EncodeError> for PairFormationError {
    fn from(error: bincode::error::EncodeError) -> Self {
        PairFormationError::EncodeError(error)
    }
}

impl From<bincode::error::DecodeError> for PairFormationError {
    fn from(error: bincode::error::DecodeError) -> Self {
        PairFormationError::DecodeError(error)
    }
}

impl From<String> for PairFormationError {
    fn from(error: String) -> Self {
        PairFormationError::PairFormationError(error)
    }
}

impl From<&str> for PairFormationError {
    fn from(error: &str) -> Self {
        PairFormationError::PairFormationError(error.to_string())
    }
}

impl std::error::Error for PairFormationError {}

impl Display for PairFormationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PairFormationError::ParameterOutOfRange {
                relationship_type,
                name,
                value,
                min,
                max,
            } => {
                let bound = if value < min {
                    format!("less than {min}")
                } else {
                    format!("greater than {max}")
                };
                write!(
                    f,
                    "Configuration variable {name} with value {value} out of range: {bound}.\nWas reading values for {relationship_type}."
                )
            }
            PairFormationError::MissingValues {
                relationship_type,
                name,
                expected,
                found,
            } => write!(
                f,
                "The {relationship_type}:{name} array has {found} values when it should have one for each age bin ({expected}).",
            ),
            PairFormationError::InvalidInput(message)
            | PairFormationError::PairFormationError(message) => write!(f, "Error: {message}"),
            other => write!(f, "Error: {other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_message_names_variable_and_relationship_type() {
        let error = PairFormationError::ParameterOutOfRange {
            relationship_type: RelationshipType::Transitory,
            name: "number_age_bins_male",
            value: 0.0,
            min: 1.0,
            max: 1000.0,
        };
        assert_eq!(
            error.to_string(),
            "Configuration variable number_age_bins_male with value 0 out of range: less than 1.\nWas reading values for TRANSITORY."
        );
    }

    #[test]
    fn above_range_message() {
        let error = PairFormationError::ParameterOutOfRange {
            relationship_type: RelationshipType::Marital,
            name: "number_age_bins_female",
            value: 9999.0,
            min: 1.0,
            max: 1000.0,
        };
        assert!(error.to_string().contains("greater than 1000"));
        assert!(error.to_string().contains("MARITAL"));
    }

    #[test]
    fn string_conversions() {
        let error: PairFormationError = "no parameters".into();
        assert!(matches!(error, PairFormationError::PairFormationError(_)));
        assert_eq!(error.to_string(), "Error: no parameters");
    }
}
