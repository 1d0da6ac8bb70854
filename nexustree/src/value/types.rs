use super::{Elements, Value};
use crate::error::{NexusError, Result};
use crate::schema::FieldType;
use chrono::{DateTime, FixedOffset};

/// An NXDL primitive type: the Rust type it reads as and the storage it accepts.
pub trait NxType {
    type Native;

    const FIELD_TYPE: FieldType;

    /// Coerce a single-element value to the native type.
    fn extract(value: &Value) -> Result<Self::Native>;

    /// Build a scalar value from the native type.
    fn into_value(native: Self::Native) -> Value;

    /// Whether the stored elements conform to this type without coercion.
    fn accepts(value: &Value) -> bool;
}

/// `NX_CHAR`
pub struct NxChar;

/// `NX_FLOAT`
pub struct NxFloat;

/// `NX_INT`
pub struct NxInt;

/// `NX_POSINT`
pub struct NxPosint;

/// `NX_NUMBER`: any integer or float
pub struct NxNumber;

/// `NX_BOOLEAN`
pub struct NxBoolean;

/// `NX_DATE_TIME`: ISO 8601, stored as a string
pub struct NxDateTime;

impl NxType for NxChar {
    type Native = String;
    const FIELD_TYPE: FieldType = FieldType::NxChar;

    fn extract(value: &Value) -> Result<String> {
        value.as_string()
    }

    fn into_value(native: String) -> Value {
        Value::from(native)
    }

    fn accepts(value: &Value) -> bool {
        matches!(value.elements(), Elements::String(_))
    }
}

impl NxType for NxFloat {
    type Native = f64;
    const FIELD_TYPE: FieldType = FieldType::NxFloat;

    fn extract(value: &Value) -> Result<f64> {
        value.as_f64()
    }

    fn into_value(native: f64) -> Value {
        Value::from(native)
    }

    fn accepts(value: &Value) -> bool {
        matches!(value.elements(), Elements::Float(_) | Elements::Int(_))
    }
}

impl NxType for NxInt {
    type Native = i64;
    const FIELD_TYPE: FieldType = FieldType::NxInt;

    fn extract(value: &Value) -> Result<i64> {
        value.as_i64()
    }

    fn into_value(native: i64) -> Value {
        Value::from(native)
    }

    fn accepts(value: &Value) -> bool {
        matches!(value.elements(), Elements::Int(_))
    }
}

impl NxType for NxPosint {
    type Native = i64;
    const FIELD_TYPE: FieldType = FieldType::NxPosint;

    fn extract(value: &Value) -> Result<i64> {
        let n = value.as_i64()?;
        if n <= 0 {
            return Err(NexusError::mismatch("positive integer", n.to_string()));
        }
        Ok(n)
    }

    fn into_value(native: i64) -> Value {
        Value::from(native)
    }

    fn accepts(value: &Value) -> bool {
        match value.elements() {
            Elements::Int(v) => v.iter().all(|n| *n > 0),
            _ => false,
        }
    }
}

impl NxType for NxNumber {
    type Native = f64;
    const FIELD_TYPE: FieldType = FieldType::NxNumber;

    fn extract(value: &Value) -> Result<f64> {
        value.as_f64()
    }

    fn into_value(native: f64) -> Value {
        Value::from(native)
    }

    fn accepts(value: &Value) -> bool {
        matches!(value.elements(), Elements::Float(_) | Elements::Int(_))
    }
}

impl NxType for NxBoolean {
    type Native = bool;
    const FIELD_TYPE: FieldType = FieldType::NxBoolean;

    fn extract(value: &Value) -> Result<bool> {
        value.as_bool()
    }

    fn into_value(native: bool) -> Value {
        Value::from(native)
    }

    fn accepts(value: &Value) -> bool {
        matches!(value.elements(), Elements::Bool(_))
    }
}

impl NxType for NxDateTime {
    type Native = DateTime<FixedOffset>;
    const FIELD_TYPE: FieldType = FieldType::NxDateTime;

    fn extract(value: &Value) -> Result<DateTime<FixedOffset>> {
        value.as_datetime()
    }

    fn into_value(native: DateTime<FixedOffset>) -> Value {
        Value::from(native)
    }

    fn accepts(value: &Value) -> bool {
        matches!(value.elements(), Elements::String(_))
            && value.elements().iter().all(|e| e.to_datetime().is_ok())
    }
}

impl FieldType {
    /// Storage check for this NXDL type, see [`NxType::accepts`].
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::NxChar => NxChar::accepts(value),
            FieldType::NxFloat => NxFloat::accepts(value),
            FieldType::NxInt => NxInt::accepts(value),
            FieldType::NxPosint => NxPosint::accepts(value),
            FieldType::NxNumber => NxNumber::accepts(value),
            FieldType::NxBoolean => NxBoolean::accepts(value),
            FieldType::NxDateTime => NxDateTime::accepts(value),
        }
    }
}
