//! Generic coercion of raw property values into the shapes listed in
//! [`ValueShape`]. Unlike the temporal parsers, every failure here is an
//! error: a value that does not fit a plain type is a configuration mistake.

use crate::domain::model::{ConvertedValue, RawValue, TargetType, ValueShape};
use crate::domain::ports::{Converter, ConverterResult, FallbackConverter};
use crate::utils::error::CoercionError;
use std::num::IntErrorKind;

const TRUE_WORDS: &[&str] = &["true", "yes", "on", "1"];
const FALSE_WORDS: &[&str] = &["false", "no", "off", "0"];

/// Coerces `raw` into `shape`. `Null` yields `None`. Typed values pass
/// through when they fit, typed strings are parsed like text, integers widen
/// to floats and scalars render into string shapes.
pub fn coerce(shape: &ValueShape, raw: &RawValue) -> ConverterResult {
    match raw {
        RawValue::Null => Ok(None),
        RawValue::Text(s) => coerce_text(shape, s).map(Some),
        RawValue::Typed(value) => coerce_typed(shape, value).map(Some),
    }
}

fn coerce_text(shape: &ValueShape, s: &str) -> Result<ConvertedValue, CoercionError> {
    match shape {
        ValueShape::String => Ok(ConvertedValue::String(s.to_string())),
        ValueShape::Bool => parse_bool(s),
        ValueShape::Char => parse_char(s),
        ValueShape::F32 | ValueShape::F64 => parse_float(shape, s),
        ValueShape::Enum(variants) => {
            let wanted = s.trim();
            variants
                .iter()
                .find(|v| v.eq_ignore_ascii_case(wanted))
                .map(|v| ConvertedValue::Enum(v.clone()))
                .ok_or_else(|| CoercionError::UnknownVariant {
                    value: wanted.to_string(),
                    variants: variants.clone(),
                })
        }
        ValueShape::List(element) => s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .enumerate()
            .map(|(index, part)| {
                coerce_text(element, part).map_err(|e| CoercionError::InvalidElement {
                    index,
                    source: Box::new(e),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(ConvertedValue::List),
        _ => {
            let value = parse_integer(shape, s)?;
            check_integer(shape, value, s)
        }
    }
}

fn coerce_typed(shape: &ValueShape, value: &ConvertedValue) -> Result<ConvertedValue, CoercionError> {
    let unsupported = || CoercionError::UnsupportedSource {
        expected: shape.to_string(),
        found: value.kind(),
    };
    match (shape, value) {
        (ValueShape::String, ConvertedValue::List(_)) => Err(unsupported()),
        (ValueShape::String, _) => Ok(ConvertedValue::String(value.to_string())),
        // 已型別化的字串仍視為文字解析
        (_, ConvertedValue::String(s)) => coerce_text(shape, s),
        (ValueShape::Bool, ConvertedValue::Bool(_))
        | (ValueShape::Char, ConvertedValue::Char(_))
        | (ValueShape::F64, ConvertedValue::Float(_)) => Ok(value.clone()),
        (ValueShape::F32, ConvertedValue::Float(v)) => narrow_f32(*v, &v.to_string()),
        (ValueShape::F64, ConvertedValue::Integer(i)) => Ok(ConvertedValue::Float(*i as f64)),
        (ValueShape::F64, ConvertedValue::Unsigned(u)) => Ok(ConvertedValue::Float(*u as f64)),
        (ValueShape::F32, ConvertedValue::Integer(i)) => narrow_f32(*i as f64, &i.to_string()),
        (ValueShape::F32, ConvertedValue::Unsigned(u)) => narrow_f32(*u as f64, &u.to_string()),
        (ValueShape::Enum(variants), ConvertedValue::Enum(v)) if variants.contains(v) => {
            Ok(value.clone())
        }
        (ValueShape::List(element), ConvertedValue::List(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                coerce_typed(element, item).map_err(|e| CoercionError::InvalidElement {
                    index,
                    source: Box::new(e),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(ConvertedValue::List),
        (_, ConvertedValue::Integer(i)) if shape.integer_bounds().is_some() => {
            check_integer(shape, i128::from(*i), &i.to_string())
        }
        (_, ConvertedValue::Unsigned(u)) if shape.integer_bounds().is_some() => {
            check_integer(shape, i128::from(*u), &u.to_string())
        }
        _ => Err(unsupported()),
    }
}

fn parse_bool(s: &str) -> Result<ConvertedValue, CoercionError> {
    let word = s.trim().to_ascii_lowercase();
    if TRUE_WORDS.contains(&word.as_str()) {
        Ok(ConvertedValue::Bool(true))
    } else if FALSE_WORDS.contains(&word.as_str()) {
        Ok(ConvertedValue::Bool(false))
    } else {
        Err(CoercionError::InvalidBool {
            value: s.to_string(),
        })
    }
}

/// Accepts exactly one character or a `\uXXXX` escape.
fn parse_char(s: &str) -> Result<ConvertedValue, CoercionError> {
    let invalid = || CoercionError::InvalidChar {
        value: s.to_string(),
    };
    if let Some(hex) = s.strip_prefix("\\u") {
        return u32::from_str_radix(hex, 16)
            .ok()
            .filter(|_| hex.len() == 4)
            .and_then(char::from_u32)
            .map(ConvertedValue::Char)
            .ok_or_else(invalid);
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(ConvertedValue::Char(c)),
        _ => Err(invalid()),
    }
}

/// Decimal with optional sign, or `0x` hexadecimal.
fn parse_integer(shape: &ValueShape, s: &str) -> Result<i128, CoercionError> {
    let trimmed = s.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let parsed = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) if !hex.starts_with(['+', '-']) => i128::from_str_radix(hex, 16),
        Some(_) => digits.parse::<i128>(),
        None => digits.parse::<i128>(),
    };
    match parsed {
        // A second sign after the first one is not a number.
        Ok(v) if !digits.starts_with(['+', '-']) => Ok(if negative { -v } else { v }),
        Err(e)
            if !digits.starts_with(['+', '-'])
                && matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) =>
        {
            Err(CoercionError::OutOfRange {
                value: trimmed.to_string(),
                expected: shape.to_string(),
            })
        }
        _ => Err(CoercionError::InvalidNumber {
            value: s.to_string(),
            expected: shape.to_string(),
        }),
    }
}

fn check_integer(shape: &ValueShape, value: i128, text: &str) -> Result<ConvertedValue, CoercionError> {
    let out_of_range = || CoercionError::OutOfRange {
        value: text.trim().to_string(),
        expected: shape.to_string(),
    };
    let (min, max) = shape.integer_bounds().ok_or_else(out_of_range)?;
    if value < min || value > max {
        return Err(out_of_range());
    }
    if shape.is_unsigned() {
        u64::try_from(value)
            .map(ConvertedValue::Unsigned)
            .map_err(|_| out_of_range())
    } else {
        i64::try_from(value)
            .map(ConvertedValue::Integer)
            .map_err(|_| out_of_range())
    }
}

fn parse_float(shape: &ValueShape, s: &str) -> Result<ConvertedValue, CoercionError> {
    let value = s
        .trim()
        .parse::<f64>()
        .map_err(|_| CoercionError::InvalidNumber {
            value: s.to_string(),
            expected: shape.to_string(),
        })?;
    match shape {
        ValueShape::F32 => narrow_f32(value, s.trim()),
        _ => Ok(ConvertedValue::Float(value)),
    }
}

fn narrow_f32(value: f64, text: &str) -> Result<ConvertedValue, CoercionError> {
    if value.is_finite() && value.abs() > f64::from(f32::MAX) {
        return Err(CoercionError::OutOfRange {
            value: text.to_string(),
            expected: ValueShape::F32.to_string(),
        });
    }
    Ok(ConvertedValue::Float(f64::from(value as f32)))
}

/// Converter for a single shape, handed out by [`GenericFallback`].
#[derive(Debug, Clone)]
pub struct ShapeConverter {
    shape: ValueShape,
}

impl ShapeConverter {
    pub fn new(shape: ValueShape) -> Self {
        Self { shape }
    }
}

impl Converter for ShapeConverter {
    fn convert(&self, raw: &RawValue) -> ConverterResult {
        coerce(&self.shape, raw)
    }
}

/// Fallback that binds generic coercion to any non-temporal target type.
/// Temporal targets have no generic form, so it declines them.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericFallback;

impl FallbackConverter for GenericFallback {
    fn bind(&self, target: &TargetType) -> Option<Box<dyn Converter>> {
        match target {
            TargetType::Other(shape) => Some(Box::new(ShapeConverter::new(shape.clone()))),
            _ => None,
        }
    }
}
