pub mod binder;
pub mod coercion;
pub mod registry;
pub mod temporal;

pub use crate::domain::model::{ConvertedValue, FieldDescriptor, RawValue, TargetType};
pub use crate::domain::ports::{Converter, PropertyConversionService, PropertySource};
pub use crate::utils::error::Result;
