//! Request-body validation and numeric coercion.
//!
//! Presence and length problems are validation errors. An empty or zero
//! `sequence` (`""`, `0`, `false`, `{}`, `null`) counts as missing; `[]` is
//! a wrong length. Strings and objects are measured by characters and keys,
//! so they reach the length check before failing coercion. Anything that
//! cannot be turned into rows of floats (a scalar where a row should be, a
//! nested array where a number should be, a non-numeric string) is a
//! processing error. Row width is checked only after coercion succeeds.

use serde_json::Value;

use flow_core::{InputSequence, LOOK_BACK, WindowError};

use crate::error::{PredictError, PredictResult, ProcessingError, ValidationError};

/// Field carrying the input window.
pub const SEQUENCE_FIELD: &str = "sequence";

/// Validate a request body and build the shape-checked input window.
pub fn parse_sequence(body: &Value) -> PredictResult<InputSequence> {
    let obj = body.as_object().ok_or(ValidationError::NotAnObject)?;

    let sequence = match obj.get(SEQUENCE_FIELD) {
        Some(v) if !is_empty_value(v) => v,
        _ => return Err(ValidationError::MissingSequence.into()),
    };

    let found = match sequence {
        Value::Array(a) => a.len(),
        Value::String(s) => s.chars().count(),
        Value::Object(m) => m.len(),
        other => {
            return Err(ProcessingError::Coercion(format!(
                "sequence is {}, which has no length",
                kind(other)
            ))
            .into());
        }
    };
    if found != LOOK_BACK {
        return Err(ValidationError::Length { found }.into());
    }

    let timesteps = sequence.as_array().ok_or_else(|| {
        ProcessingError::Coercion(format!("sequence is {}, not an array", kind(sequence)))
    })?;

    let rows = timesteps
        .iter()
        .enumerate()
        .map(|(i, step)| coerce_row(i, step))
        .collect::<Result<Vec<_>, _>>()?;

    InputSequence::from_rows(&rows).map_err(|e| {
        PredictError::Validation(match e {
            WindowError::Length { found } => ValidationError::Length { found },
            WindowError::Width { row, found } => ValidationError::Width { row, found },
        })
    })
}

fn coerce_row(row: usize, step: &Value) -> Result<Vec<f64>, ProcessingError> {
    let values = step.as_array().ok_or_else(|| {
        ProcessingError::Coercion(format!("timestep {row} is {}, not an array", kind(step)))
    })?;

    values
        .iter()
        .enumerate()
        .map(|(col, v)| {
            coerce_f64(v).ok_or_else(|| {
                ProcessingError::Coercion(format!(
                    "timestep {row} feature {col} is {}, not a number",
                    kind(v)
                ))
            })
        })
        .collect()
}

/// `null`, `false`, zero and empty strings or containers. An empty array is
/// not included: it is a sequence of the wrong length.
fn is_empty_value(v: &Value) -> bool {
    match v {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Object(m) => m.is_empty(),
        Value::Bool(true) | Value::Array(_) => false,
    }
}

/// Numbers pass through, booleans become 1.0 or 0.0, and numeric strings are
/// parsed the way a float constructor would accept them.
fn coerce_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
