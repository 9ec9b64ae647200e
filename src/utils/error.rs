use crate::domain::model::{RawValue, TargetType};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PropertyError {
    #[error("Unable to convert property for field [{field}]. Value [{value}] cannot be converted to [{target}]")]
    ConversionFailure {
        field: String,
        value: RawValue,
        target: TargetType,
        #[source]
        source: CoercionError,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration validation error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl PropertyError {
    pub fn is_conversion_failure(&self) -> bool {
        matches!(self, PropertyError::ConversionFailure { .. })
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PropertyError::ConversionFailure { .. } => {
                "Check that the property value matches the declared field type"
            }
            PropertyError::IoError(_) => "Check that the file exists and is readable",
            PropertyError::SerializationError(_) => "Report this as a bug",
            PropertyError::ConfigValidationError { .. } => {
                "Check the property file syntax and field declarations"
            }
            PropertyError::InvalidConfigValueError { .. } => {
                "Fix the reported value and run again"
            }
        }
    }
}

/// Why a raw value could not be coerced into its target shape.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    #[error("cannot convert a {found} value to {expected}")]
    UnsupportedSource { expected: String, found: &'static str },

    #[error("'{value}' is not a valid {expected}")]
    InvalidNumber { value: String, expected: String },

    #[error("{value} is out of range for {expected}")]
    OutOfRange { value: String, expected: String },

    #[error("'{value}' is not a boolean (expected true/false, yes/no, on/off or 1/0)")]
    InvalidBool { value: String },

    #[error("'{value}' is not a single character")]
    InvalidChar { value: String },

    #[error("'{value}' is not one of [{}]", .variants.join(", "))]
    UnknownVariant { value: String, variants: Vec<String> },

    #[error("list element {index}: {source}")]
    InvalidElement {
        index: usize,
        source: Box<CoercionError>,
    },
}

pub type Result<T> = std::result::Result<T, PropertyError>;
