use crate::core::coercion::GenericFallback;
use crate::core::temporal;
use crate::domain::model::{ConvertedValue, FieldDescriptor, RawValue, TargetType};
use crate::domain::ports::{Converter, FallbackConverter, PropertyConversionService};
use crate::utils::error::{PropertyError, Result};
use std::collections::HashMap;
use std::fmt;

/// Immutable table of converters keyed by target type, with an optional
/// fallback for types that have no dedicated converter.
///
/// Build it once with [`ConversionRegistry::builder`] (or use
/// [`Default`] for the standard set) and share it by reference.
pub struct ConversionRegistry {
    converters: HashMap<TargetType, Box<dyn Converter>>,
    fallback: Option<Box<dyn FallbackConverter>>,
}

impl ConversionRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Period, date-time, date and time parsers plus generic coercion for
    /// everything else.
    pub fn with_defaults() -> Self {
        Self::builder()
            .register(TargetType::Period, temporal::convert_period)
            .register(TargetType::DateTime, temporal::convert_date_time)
            .register(TargetType::Date, temporal::convert_date)
            .register(TargetType::Time, temporal::convert_time)
            .fallback(GenericFallback)
            .build()
    }

    /// 是否有專用轉換器 (不含通用轉換)
    pub fn has_converter(&self, target: &TargetType) -> bool {
        self.converters.contains_key(target)
    }

    /// Converts `raw` for `field`.
    ///
    /// Returns `Ok(None)` when the converter produced no value, or when
    /// neither a dedicated converter nor the fallback applies to the target.
    /// Any converter error becomes [`PropertyError::ConversionFailure`].
    pub fn convert(&self, field: &FieldDescriptor, raw: &RawValue) -> Result<Option<ConvertedValue>> {
        let outcome = match self.converters.get(&field.target) {
            Some(converter) => converter.convert(raw),
            // 找不到專用轉換器時使用通用轉換
            None => match self.fallback.as_ref().and_then(|f| f.bind(&field.target)) {
                Some(converter) => converter.convert(raw),
                None => return Ok(None),
            },
        };

        outcome.map_err(|source| PropertyError::ConversionFailure {
            field: field.name.clone(),
            value: raw.clone(),
            target: field.target.clone(),
            source,
        })
    }

    /// Like [`convert`](Self::convert) for callers without a field name.
    pub fn convert_value(&self, target: &TargetType, raw: &RawValue) -> Result<Option<ConvertedValue>> {
        self.convert(&FieldDescriptor::new(target.to_string(), target.clone()), raw)
    }
}

impl Default for ConversionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for ConversionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut targets: Vec<String> = self.converters.keys().map(|t| t.to_string()).collect();
        targets.sort();
        f.debug_struct("ConversionRegistry")
            .field("converters", &targets)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl PropertyConversionService for ConversionRegistry {
    fn convert_property_for_field(
        &self,
        field: &FieldDescriptor,
        raw: &RawValue,
    ) -> Result<Option<ConvertedValue>> {
        self.convert(field, raw)
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    converters: HashMap<TargetType, Box<dyn Converter>>,
    fallback: Option<Box<dyn FallbackConverter>>,
}

impl RegistryBuilder {
    /// Registers `converter` for `target`, replacing any earlier one.
    pub fn register<C: Converter + 'static>(mut self, target: TargetType, converter: C) -> Self {
        self.converters.insert(target, Box::new(converter));
        self
    }

    pub fn fallback<F: FallbackConverter + 'static>(mut self, fallback: F) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    pub fn build(self) -> ConversionRegistry {
        tracing::debug!(
            "Built conversion registry with {} converters (fallback: {})",
            self.converters.len(),
            self.fallback.is_some()
        );
        ConversionRegistry {
            converters: self.converters,
            fallback: self.fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Period, ValueShape};
    use crate::domain::ports::ConverterResult;
    use crate::utils::error::CoercionError;
    use chrono::{NaiveDate, NaiveTime};

    fn field(name: &str, target: TargetType) -> FieldDescriptor {
        FieldDescriptor::new(name, target)
    }

    #[test]
    fn test_default_registry_has_temporal_converters() {
        let registry = ConversionRegistry::default();
        for target in [TargetType::Period, TargetType::DateTime, TargetType::Date, TargetType::Time] {
            assert!(registry.has_converter(&target), "missing {}", target);
        }
        assert!(!registry.has_converter(&TargetType::Other(ValueShape::I32)));
    }

    #[test]
    fn test_convert_temporal_values() {
        let registry = ConversionRegistry::default();
        let period = registry
            .convert(&field("timeout", TargetType::Period), &RawValue::from("PT1H"))
            .unwrap();
        assert_eq!(period, Some(ConvertedValue::Period(Period::hours(1))));

        let date = registry
            .convert(&field("start", TargetType::Date), &RawValue::from("2024-01-15"))
            .unwrap();
        assert_eq!(date.and_then(|v| v.as_date()), NaiveDate::from_ymd_opt(2024, 1, 15));

        let time = registry
            .convert(&field("at", TargetType::Time), &RawValue::from("08:15"))
            .unwrap();
        assert_eq!(time.and_then(|v| v.as_time()), NaiveTime::from_hms_opt(8, 15, 0));
    }

    #[test]
    fn test_malformed_temporal_value_is_absent() {
        let registry = ConversionRegistry::default();
        let result = registry.convert(
            &field("timeout", TargetType::Period),
            &RawValue::from("not-a-duration"),
        );
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_generic_failure_carries_context() {
        let registry = ConversionRegistry::default();
        let target = TargetType::Other(ValueShape::I32);
        let err = registry
            .convert(&field("retries", target.clone()), &RawValue::from("abc"))
            .unwrap_err();

        match err {
            PropertyError::ConversionFailure {
                field,
                value,
                target: failed_target,
                source,
            } => {
                assert_eq!(field, "retries");
                assert_eq!(value, RawValue::from("abc"));
                assert_eq!(failed_target, target);
                assert!(matches!(source, CoercionError::InvalidNumber { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_typed_input_to_temporal_converter_fails() {
        let registry = ConversionRegistry::default();
        let err = registry
            .convert(
                &field("start", TargetType::Date),
                &RawValue::Typed(ConvertedValue::Bool(true)),
            )
            .unwrap_err();
        assert!(err.is_conversion_failure());
        assert!(err.to_string().contains("[start]"));
    }

    #[test]
    fn test_missing_converter_yields_absent() {
        let registry = ConversionRegistry::builder().build();
        let result = registry.convert_value(&TargetType::Other(ValueShape::I32), &RawValue::from("42"));
        assert!(matches!(result, Ok(None)));

        // The generic fallback has no form for temporal targets.
        let registry = ConversionRegistry::builder().fallback(GenericFallback).build();
        let result = registry.convert_value(&TargetType::Date, &RawValue::from("2024-01-15"));
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_custom_converter_overrides_fallback() {
        let registry = ConversionRegistry::builder()
            .register(TargetType::Other(ValueShape::String), |raw: &RawValue| -> ConverterResult {
                Ok(Some(ConvertedValue::String(raw.to_string().to_uppercase())))
            })
            .fallback(GenericFallback)
            .build();
        let value = registry
            .convert_value(&TargetType::Other(ValueShape::String), &RawValue::from("abc"))
            .unwrap();
        assert_eq!(value, Some(ConvertedValue::String("ABC".to_string())));
    }
}
