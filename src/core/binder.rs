use crate::domain::model::{ConvertedValue, FieldDefinition, RawValue};
use crate::domain::ports::{PropertyConversionService, PropertySource};
use crate::utils::error::Result;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// 綁定值的來源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueOrigin {
    Property,
    Default,
    Unset,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundField {
    pub name: String,
    pub value: Option<ConvertedValue>,
    pub origin: ValueOrigin,
}

/// 依欄位宣告順序保存的轉換結果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoundProperties {
    fields: Vec<BoundField>,
}

impl BoundProperties {
    pub fn fields(&self) -> &[BoundField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&BoundField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&ConvertedValue> {
        self.field(name).and_then(|f| f.value.as_ref())
    }

    pub fn get_date(&self, name: &str) -> Option<NaiveDate> {
        self.get(name).and_then(ConvertedValue::as_date)
    }

    pub fn get_time(&self, name: &str) -> Option<NaiveTime> {
        self.get(name).and_then(ConvertedValue::as_time)
    }

    pub fn get_date_time(&self, name: &str) -> Option<NaiveDateTime> {
        self.get(name).and_then(ConvertedValue::as_date_time)
    }

    pub fn get_period(&self, name: &str) -> Option<crate::domain::model::Period> {
        self.get(name).and_then(ConvertedValue::as_period)
    }

    pub fn get_integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ConvertedValue::as_i64)
    }

    pub fn get_unsigned(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(ConvertedValue::as_u64)
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ConvertedValue::as_f64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ConvertedValue::as_bool)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ConvertedValue::as_str)
    }

    pub fn get_list(&self, name: &str) -> Option<&[ConvertedValue]> {
        self.get(name).and_then(ConvertedValue::as_list)
    }

    /// `{ name: value }` object; unset fields map to `null`.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let mut map = serde_json::Map::new();
        for field in &self.fields {
            map.insert(field.name.clone(), serde_json::to_value(&field.value)?);
        }
        Ok(serde_json::Value::Object(map))
    }
}

/// Populates declared fields from a property source.
///
/// A property that converts to nothing (missing, or a temporal value that
/// does not parse) falls back to the field's default text. The first
/// conversion failure aborts binding.
pub struct PropertyBinder<S: PropertyConversionService> {
    service: S,
}

impl<S: PropertyConversionService> PropertyBinder<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn bind<P: PropertySource + ?Sized>(
        &self,
        definitions: &[FieldDefinition],
        source: &P,
    ) -> Result<BoundProperties> {
        let mut fields = Vec::with_capacity(definitions.len());

        for definition in definitions {
            let descriptor = definition.descriptor();
            let raw = source.get_property(&definition.name).unwrap_or(RawValue::Null);
            let converted = self.service.convert_property_for_field(&descriptor, &raw)?;

            if converted.is_none() && raw != RawValue::Null {
                tracing::warn!(
                    "Property '{}' value [{}] did not produce a {}",
                    definition.name,
                    raw,
                    definition.target
                );
            }

            // 無值時改用預設值
            let (value, origin) = match converted {
                Some(value) => (Some(value), ValueOrigin::Property),
                None => match &definition.default {
                    Some(default) => {
                        let raw_default = RawValue::Text(default.clone());
                        match self.service.convert_property_for_field(&descriptor, &raw_default)? {
                            Some(value) => (Some(value), ValueOrigin::Default),
                            None => (None, ValueOrigin::Unset),
                        }
                    }
                    None => (None, ValueOrigin::Unset),
                },
            };

            tracing::debug!(
                "Bound '{}' ({}) from {:?}: {}",
                definition.name,
                definition.target,
                origin,
                value.as_ref().map_or_else(|| "<unset>".to_string(), |v| v.to_string())
            );

            fields.push(BoundField {
                name: definition.name.clone(),
                value,
                origin,
            });
        }

        Ok(BoundProperties { fields })
    }
}
