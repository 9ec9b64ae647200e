use crate::domain::model::{ConvertedValue, FieldDefinition, RawValue};
use crate::domain::ports::PropertySource;
use crate::utils::error::{PropertyError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_unique_names, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

/// A property file: raw values under `[properties]` and the typed fields to
/// bind them to under `[[fields]]`.
///
/// ```toml
/// [properties]
/// timeout = "PT30S"
/// ports = [8080, 8081]
///
/// [[fields]]
/// name = "timeout"
/// type = "period"
/// default = "PT10S"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyFile {
    #[serde(default)]
    pub properties: BTreeMap<String, toml::Value>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl PropertyFile {
    /// 從 TOML 檔案載入屬性檔
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PropertyError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 解析屬性檔內容，先替換環境變數 (例如 ${VAR})
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| PropertyError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn raw_property(&self, key: &str) -> Option<RawValue> {
        self.properties.get(key).map(toml_to_raw)
    }
}

/// 純量轉為文字；陣列保留為清單，元素中的逗號不會被拆開
fn toml_to_raw(value: &toml::Value) -> RawValue {
    match value {
        toml::Value::String(s) => RawValue::Text(s.clone()),
        toml::Value::Array(_) => RawValue::Typed(toml_to_converted(value)),
        other => RawValue::Text(other.to_string()),
    }
}

fn toml_to_converted(value: &toml::Value) -> ConvertedValue {
    match value {
        toml::Value::String(s) => ConvertedValue::String(s.clone()),
        toml::Value::Array(items) => {
            ConvertedValue::List(items.iter().map(toml_to_converted).collect())
        }
        other => ConvertedValue::String(other.to_string()),
    }
}

impl PropertySource for PropertyFile {
    fn get_property(&self, key: &str) -> Option<RawValue> {
        self.raw_property(key)
    }
}

impl Validate for PropertyFile {
    fn validate(&self) -> Result<()> {
        for field in &self.fields {
            validate_non_empty_string("fields.name", &field.name)?;
        }
        validate_unique_names("fields.name", &self.field_names())?;

        // 未宣告的屬性只記錄，不視為錯誤
        for key in self.properties.keys() {
            if !self.fields.iter().any(|f| &f.name == key) {
                tracing::debug!("Property '{}' has no declared field and will be ignored", key);
            }
        }
        Ok(())
    }
}
