use crate::domain::model::{ConvertedValue, FieldDescriptor, RawValue, TargetType};
use crate::utils::error::{CoercionError, Result};
use std::collections::HashMap;

/// Outcome of a single converter: a value, `None` for "nothing produced",
/// or the reason the raw value could not be converted.
pub type ConverterResult = std::result::Result<Option<ConvertedValue>, CoercionError>;

/// A stateless function from a raw property value to a typed value.
pub trait Converter: Send + Sync {
    fn convert(&self, raw: &RawValue) -> ConverterResult;
}

impl<F> Converter for F
where
    F: Fn(&RawValue) -> ConverterResult + Send + Sync,
{
    fn convert(&self, raw: &RawValue) -> ConverterResult {
        self(raw)
    }
}

/// Produces a converter bound to a target type that has no dedicated one.
pub trait FallbackConverter: Send + Sync {
    fn bind(&self, target: &TargetType) -> Option<Box<dyn Converter>>;
}

pub trait PropertyConversionService: Send + Sync {
    /// Converts `raw` for `field`. `Ok(None)` means no value was produced and
    /// the caller should apply its own default.
    fn convert_property_for_field(
        &self,
        field: &FieldDescriptor,
        raw: &RawValue,
    ) -> Result<Option<ConvertedValue>>;
}

/// Where raw property values come from.
pub trait PropertySource {
    fn get_property(&self, key: &str) -> Option<RawValue>;
}

impl PropertySource for HashMap<String, String> {
    fn get_property(&self, key: &str) -> Option<RawValue> {
        self.get(key).map(|v| RawValue::Text(v.clone()))
    }
}

impl PropertySource for HashMap<String, RawValue> {
    fn get_property(&self, key: &str) -> Option<RawValue> {
        self.get(key).cloned()
    }
}
