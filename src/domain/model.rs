use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Semantic tag describing what a raw property value should become.
///
/// The four temporal tags have dedicated parsers in the default registry;
/// everything else is described by a [`ValueShape`] and handled by generic
/// coercion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TargetType {
    Date,
    Time,
    DateTime,
    Period,
    Other(ValueShape),
}

/// Target shapes understood by generic coercion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueShape {
    String,
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Enum(Vec<String>),
    List(Box<ValueShape>),
}

impl ValueShape {
    /// Inclusive bounds for integer shapes, `None` for everything else.
    pub fn integer_bounds(&self) -> Option<(i128, i128)> {
        match self {
            ValueShape::I8 => Some((i8::MIN.into(), i8::MAX.into())),
            ValueShape::I16 => Some((i16::MIN.into(), i16::MAX.into())),
            ValueShape::I32 => Some((i32::MIN.into(), i32::MAX.into())),
            ValueShape::I64 => Some((i64::MIN.into(), i64::MAX.into())),
            ValueShape::U8 => Some((0, u8::MAX.into())),
            ValueShape::U16 => Some((0, u16::MAX.into())),
            ValueShape::U32 => Some((0, u32::MAX.into())),
            ValueShape::U64 => Some((0, u64::MAX.into())),
            _ => None,
        }
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            ValueShape::U8 | ValueShape::U16 | ValueShape::U32 | ValueShape::U64
        )
    }
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueShape::String => f.write_str("string"),
            ValueShape::Bool => f.write_str("bool"),
            ValueShape::Char => f.write_str("char"),
            ValueShape::I8 => f.write_str("i8"),
            ValueShape::I16 => f.write_str("i16"),
            ValueShape::I32 => f.write_str("i32"),
            ValueShape::I64 => f.write_str("i64"),
            ValueShape::U8 => f.write_str("u8"),
            ValueShape::U16 => f.write_str("u16"),
            ValueShape::U32 => f.write_str("u32"),
            ValueShape::U64 => f.write_str("u64"),
            ValueShape::F32 => f.write_str("f32"),
            ValueShape::F64 => f.write_str("f64"),
            ValueShape::Enum(variants) => write!(f, "enum({})", variants.join("|")),
            ValueShape::List(element) => write!(f, "list<{}>", element),
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetType::Date => f.write_str("date"),
            TargetType::Time => f.write_str("time"),
            TargetType::DateTime => f.write_str("date-time"),
            TargetType::Period => f.write_str("period"),
            TargetType::Other(shape) => write!(f, "{}", shape),
        }
    }
}

impl FromStr for TargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        match name.as_str() {
            "date" => Ok(TargetType::Date),
            "time" => Ok(TargetType::Time),
            "date-time" | "datetime" => Ok(TargetType::DateTime),
            "period" | "duration" => Ok(TargetType::Period),
            _ => parse_shape(s.trim()).map(TargetType::Other),
        }
    }
}

fn parse_shape(s: &str) -> Result<ValueShape, String> {
    let lower = s.to_ascii_lowercase();
    let shape = match lower.as_str() {
        "string" | "str" => ValueShape::String,
        "bool" | "boolean" => ValueShape::Bool,
        "char" => ValueShape::Char,
        "i8" => ValueShape::I8,
        "i16" => ValueShape::I16,
        "i32" | "int" | "integer" => ValueShape::I32,
        "i64" | "long" => ValueShape::I64,
        "u8" => ValueShape::U8,
        "u16" => ValueShape::U16,
        "u32" => ValueShape::U32,
        "u64" => ValueShape::U64,
        "f32" | "float" => ValueShape::F32,
        "f64" | "double" => ValueShape::F64,
        _ if lower.starts_with("list<") && lower.ends_with('>') => {
            let inner = &s["list<".len()..s.len() - 1];
            ValueShape::List(Box::new(parse_shape(inner.trim())?))
        }
        _ if lower.starts_with("enum(") && lower.ends_with(')') => {
            // Variant names keep their declared case.
            let inner = &s["enum(".len()..s.len() - 1];
            let variants: Vec<String> = inner
                .split('|')
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
            if variants.is_empty() {
                return Err(format!("enum type '{}' declares no variants", s));
            }
            ValueShape::Enum(variants)
        }
        _ => return Err(format!("unknown target type '{}'", s)),
    };
    Ok(shape)
}

impl TryFrom<String> for TargetType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetType> for String {
    fn from(value: TargetType) -> Self {
        value.to_string()
    }
}

/// A field-wise time interval, kept exactly as written.
///
/// Fields are not normalised: `PT90M` stays ninety minutes. Calendar fields
/// (years, months) have no fixed length, so only periods without them can be
/// turned into a [`std::time::Duration`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Period {
    pub years: i32,
    pub months: i32,
    pub weeks: i32,
    pub days: i32,
    pub hours: i32,
    pub minutes: i32,
    pub seconds: i32,
    pub millis: i32,
}

impl Period {
    pub fn days(days: i32) -> Self {
        Self { days, ..Self::default() }
    }

    pub fn hours(hours: i32) -> Self {
        Self { hours, ..Self::default() }
    }

    pub fn minutes(minutes: i32) -> Self {
        Self { minutes, ..Self::default() }
    }

    pub fn seconds(seconds: i32) -> Self {
        Self { seconds, ..Self::default() }
    }

    pub fn millis(millis: i32) -> Self {
        Self { millis, ..Self::default() }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    /// Total length in milliseconds, or `None` when a calendar field is set
    /// or the sum overflows.
    pub fn total_millis(&self) -> Option<i64> {
        if self.years != 0 || self.months != 0 {
            return None;
        }
        let parts = [
            (self.weeks, 7 * 24 * 3_600_000_i64),
            (self.days, 24 * 3_600_000),
            (self.hours, 3_600_000),
            (self.minutes, 60_000),
            (self.seconds, 1_000),
            (self.millis, 1),
        ];
        parts.iter().try_fold(0_i64, |acc, (count, unit)| {
            i64::from(*count)
                .checked_mul(*unit)
                .and_then(|ms| acc.checked_add(ms))
        })
    }

    /// Fixed-length duration; `None` for calendar or negative periods.
    pub fn to_std_duration(&self) -> Option<std::time::Duration> {
        let millis = u64::try_from(self.total_millis()?).ok()?;
        Some(std::time::Duration::from_millis(millis))
    }
}

impl fmt::Display for Period {
    /// ISO-8601 rendering, e.g. `P1DT2H` or `PT1.5S`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("PT0S");
        }
        f.write_str("P")?;
        for (value, unit) in [
            (self.years, 'Y'),
            (self.months, 'M'),
            (self.weeks, 'W'),
            (self.days, 'D'),
        ] {
            if value != 0 {
                write!(f, "{}{}", value, unit)?;
            }
        }
        if self.hours == 0 && self.minutes == 0 && self.seconds == 0 && self.millis == 0 {
            return Ok(());
        }
        f.write_str("T")?;
        if self.hours != 0 {
            write!(f, "{}H", self.hours)?;
        }
        if self.minutes != 0 {
            write!(f, "{}M", self.minutes)?;
        }
        let total = i64::from(self.seconds) * 1_000 + i64::from(self.millis);
        if total != 0 {
            let sign = if total < 0 { "-" } else { "" };
            let (secs, ms) = (total.abs() / 1_000, total.abs() % 1_000);
            if ms == 0 {
                write!(f, "{}{}S", sign, secs)?;
            } else {
                let fraction = format!("{:03}", ms);
                write!(f, "{}{}.{}S", sign, secs, fraction.trim_end_matches('0'))?;
            }
        }
        Ok(())
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The result of a successful conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConvertedValue {
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Period(Period),
    String(String),
    Bool(bool),
    Char(char),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Enum(String),
    List(Vec<ConvertedValue>),
}

impl ConvertedValue {
    /// Short name of the value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ConvertedValue::Date(_) => "date",
            ConvertedValue::Time(_) => "time",
            ConvertedValue::DateTime(_) => "date-time",
            ConvertedValue::Period(_) => "period",
            ConvertedValue::String(_) => "string",
            ConvertedValue::Bool(_) => "bool",
            ConvertedValue::Char(_) => "char",
            ConvertedValue::Integer(_) => "integer",
            ConvertedValue::Unsigned(_) => "unsigned",
            ConvertedValue::Float(_) => "float",
            ConvertedValue::Enum(_) => "enum",
            ConvertedValue::List(_) => "list",
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            ConvertedValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<NaiveTime> {
        match self {
            ConvertedValue::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<NaiveDateTime> {
        match self {
            ConvertedValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_period(&self) -> Option<Period> {
        match self {
            ConvertedValue::Period(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConvertedValue::Integer(i) => Some(*i),
            ConvertedValue::Unsigned(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ConvertedValue::Unsigned(u) => Some(*u),
            ConvertedValue::Integer(i) => u64::try_from(*i).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConvertedValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConvertedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConvertedValue::String(s) | ConvertedValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConvertedValue]> {
        match self {
            ConvertedValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for ConvertedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertedValue::Date(d) => write!(f, "{}", d),
            ConvertedValue::Time(t) => write!(f, "{}", t),
            ConvertedValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            ConvertedValue::Period(p) => write!(f, "{}", p),
            ConvertedValue::String(s) | ConvertedValue::Enum(s) => f.write_str(s),
            ConvertedValue::Bool(b) => write!(f, "{}", b),
            ConvertedValue::Char(c) => write!(f, "{}", c),
            ConvertedValue::Integer(i) => write!(f, "{}", i),
            ConvertedValue::Unsigned(u) => write!(f, "{}", u),
            ConvertedValue::Float(v) => write!(f, "{}", v),
            ConvertedValue::List(items) => {
                let rendered: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                f.write_str(&rendered.join(","))
            }
        }
    }
}

/// An unconverted property value as handed over by a property source.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Text(String),
    Typed(ConvertedValue),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => f.write_str("null"),
            RawValue::Text(s) => f.write_str(s),
            RawValue::Typed(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<Option<String>> for RawValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(RawValue::Null, RawValue::Text)
    }
}

impl From<ConvertedValue> for RawValue {
    fn from(value: ConvertedValue) -> Self {
        RawValue::Typed(value)
    }
}

/// The field being populated; the name is only used for error context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub target: TargetType,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, target: TargetType) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }
}

/// A field declared in a property file: name, type and an optional default
/// used when the property is missing or converts to nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub target: TargetType,
    pub default: Option<String>,
}

impl FieldDefinition {
    pub fn descriptor(&self) -> FieldDescriptor {
        FieldDescriptor::new(self.name.clone(), self.target.clone())
    }
}
