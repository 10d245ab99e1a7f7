//! Type inference for legacy effect-variable values.
//!
//! Built on `winnow` 0.7. A value is a color when it is a hex literal or a
//! functional color, a number when it is numeric (optionally `px`-suffixed),
//! and a string otherwise.

use crate::model::{VariableType, VariableValue};
use serde_json::Value;
use winnow::ascii::{Caseless, float, multispace0};
use winnow::combinator::{alt, delimited, opt};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

/// Infer the variable type of a raw legacy value.
pub fn infer_type(value: &Value) -> VariableType {
    match value {
        Value::Number(_) => VariableType::Number,
        Value::String(s) if is_color_literal(s) => VariableType::Color,
        Value::String(s) if parse_numeric(s).is_some() => VariableType::Number,
        _ => VariableType::String,
    }
}

/// Convert a raw legacy value into a typed variable value.
pub fn to_variable_value(value: &Value, kind: VariableType) -> VariableValue {
    match (kind, value) {
        (VariableType::Number, Value::Number(n)) => VariableValue::Number(n.as_f64().unwrap_or(0.0)),
        (VariableType::Number, Value::String(s)) => {
            VariableValue::Number(parse_numeric(s).unwrap_or(0.0))
        }
        (_, Value::String(s)) => VariableValue::Text(s.trim().to_string()),
        (_, other) => VariableValue::Text(other.to_string()),
    }
}

/// `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`, `rgb(..)`, `rgba(..)`, `hsl(..)`, `hsla(..)`.
pub fn is_color_literal(s: &str) -> bool {
    alt((hex_color, functional_color)).parse(s.trim()).is_ok()
}

/// A finite float, optionally followed by `px`.
pub fn parse_numeric(s: &str) -> Option<f64> {
    numeric.parse(s.trim()).ok().filter(|v| v.is_finite())
}

fn hex_color(input: &mut &str) -> ModalResult<()> {
    '#'.parse_next(input)?;
    take_while(3..=8, |c: char| c.is_ascii_hexdigit())
        .verify(|digits: &str| matches!(digits.len(), 3 | 4 | 6 | 8))
        .void()
        .parse_next(input)
}

fn functional_color(input: &mut &str) -> ModalResult<()> {
    alt((
        Caseless("rgba"),
        Caseless("rgb"),
        Caseless("hsla"),
        Caseless("hsl"),
    ))
    .parse_next(input)?;
    multispace0.parse_next(input)?;
    delimited('(', take_till(1.., ')'), ')')
        .void()
        .parse_next(input)
}

fn numeric(input: &mut &str) -> ModalResult<f64> {
    let value: f64 = float.parse_next(input)?;
    opt(Caseless("px")).void().parse_next(input)?;
    Ok(value)
}
