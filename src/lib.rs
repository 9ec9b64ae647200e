pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::toml_config::PropertyFile;
pub use crate::core::{binder::PropertyBinder, registry::ConversionRegistry};
pub use crate::domain::model::{ConvertedValue, FieldDefinition, FieldDescriptor, Period, RawValue, TargetType, ValueShape};
pub use crate::utils::error::{CoercionError, PropertyError, Result};
