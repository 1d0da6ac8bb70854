// Typed dataset and attribute values: n-dimensional arrays of one element type

mod types;

pub use types::{NxBoolean, NxChar, NxDateTime, NxFloat, NxInt, NxNumber, NxPosint, NxType};

use crate::error::{NexusError, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element storage of a [`Value`], one variant per primitive kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Elements {
    Bool(Vec<bool>),
    Int(Vec<i64>),
    Float(Vec<f64>),
    String(Vec<String>),
}

impl Elements {
    pub fn len(&self) -> usize {
        match self {
            Elements::Bool(v) => v.len(),
            Elements::Int(v) => v.len(),
            Elements::Float(v) => v.len(),
            Elements::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Elements::Bool(_) => "bool",
            Elements::Int(_) => "int",
            Elements::Float(_) => "float",
            Elements::String(_) => "string",
        }
    }

    /// Borrow the element at `index`.
    pub fn get(&self, index: usize) -> Option<Element<'_>> {
        match self {
            Elements::Bool(v) => v.get(index).map(|b| Element::Bool(*b)),
            Elements::Int(v) => v.get(index).map(|i| Element::Int(*i)),
            Elements::Float(v) => v.get(index).map(|f| Element::Float(*f)),
            Elements::String(v) => v.get(index).map(|s| Element::String(s.as_str())),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = Element<'_>> + '_> {
        match self {
            Elements::Bool(v) => Box::new(v.iter().map(|b| Element::Bool(*b))),
            Elements::Int(v) => Box::new(v.iter().map(|i| Element::Int(*i))),
            Elements::Float(v) => Box::new(v.iter().map(|f| Element::Float(*f))),
            Elements::String(v) => Box::new(v.iter().map(|s| Element::String(s.as_str()))),
        }
    }
}

/// A single borrowed element and the coercions between element kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Element<'a> {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(&'a str),
}

impl<'a> Element<'a> {
    pub fn type_name(&self) -> &'static str {
        match self {
            Element::Bool(_) => "bool",
            Element::Int(_) => "int",
            Element::Float(_) => "float",
            Element::String(_) => "string",
        }
    }

    pub fn to_bool(self) -> Result<bool> {
        match self {
            Element::Bool(b) => Ok(b),
            Element::Int(i) => Ok(i != 0),
            Element::Float(f) => Ok(f != 0.0),
            Element::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(NexusError::mismatch("boolean", format!("string '{s}'"))),
            },
        }
    }

    pub fn to_i64(self) -> Result<i64> {
        match self {
            Element::Bool(b) => Ok(i64::from(b)),
            Element::Int(i) => Ok(i),
            Element::Float(f) => {
                // i64::MAX is not exactly representable; the upper bound is exclusive
                if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                    Ok(f as i64)
                } else {
                    Err(NexusError::mismatch("integer", format!("float {f}")))
                }
            }
            Element::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| NexusError::mismatch("integer", format!("string '{s}'"))),
        }
    }

    pub fn to_f64(self) -> Result<f64> {
        match self {
            Element::Bool(b) => Ok(if b { 1.0 } else { 0.0 }),
            Element::Int(i) => Ok(i as f64),
            Element::Float(f) => Ok(f),
            Element::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| NexusError::mismatch("float", format!("string '{s}'"))),
        }
    }

    pub fn to_datetime(self) -> Result<DateTime<FixedOffset>> {
        match self {
            Element::String(s) => parse_datetime(s),
            other => Err(NexusError::mismatch("ISO 8601 date-time", other.type_name())),
        }
    }
}

impl fmt::Display for Element<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Bool(b) => write!(f, "{b}"),
            Element::Int(i) => write!(f, "{i}"),
            Element::Float(x) => write!(f, "{x}"),
            Element::String(s) => f.write_str(s),
        }
    }
}

/// Parse an ISO 8601 timestamp. Values without an offset are taken as UTC.
pub fn parse_datetime(input: &str) -> Result<DateTime<FixedOffset>> {
    let s = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&naive).into());
        }
    }
    Err(NexusError::mismatch(
        "ISO 8601 date-time",
        format!("string '{input}'"),
    ))
}

/// An n-dimensional array of a single element type. An empty shape is a scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ValueRepr", into = "ValueRepr")]
pub struct Value {
    shape: Vec<usize>,
    elements: Elements,
}

/// On-disk form. `shape` may be omitted for scalars and one-dimensional arrays.
#[derive(Serialize, Deserialize)]
struct ValueRepr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shape: Option<Vec<usize>>,
    #[serde(flatten)]
    elements: Elements,
}

impl TryFrom<ValueRepr> for Value {
    type Error = NexusError;

    fn try_from(repr: ValueRepr) -> Result<Self> {
        let shape = match repr.shape {
            Some(shape) => shape,
            None if repr.elements.len() == 1 => Vec::new(),
            None => vec![repr.elements.len()],
        };
        Value::new(shape, repr.elements)
    }
}

impl From<Value> for ValueRepr {
    fn from(value: Value) -> Self {
        let implicit = value.shape.is_empty()
            || (value.shape.len() == 1 && value.elements.len() != 1);
        ValueRepr {
            shape: if implicit { None } else { Some(value.shape) },
            elements: value.elements,
        }
    }
}

fn element_count(shape: &[usize]) -> Result<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, d| acc.checked_mul(*d))
        .ok_or_else(|| NexusError::Shape(format!("shape {shape:?} overflows the element count")))
}

impl Value {
    /// Build a value, checking that `shape` matches the number of elements.
    pub fn new(shape: Vec<usize>, elements: Elements) -> Result<Self> {
        let expected = element_count(&shape)?;
        if expected != elements.len() {
            return Err(NexusError::Shape(format!(
                "shape {:?} needs {} elements, got {}",
                shape,
                expected,
                elements.len()
            )));
        }
        Ok(Value { shape, elements })
    }

    /// A one-dimensional array over `elements`.
    pub fn array(elements: Elements) -> Self {
        Value {
            shape: vec![elements.len()],
            elements,
        }
    }

    fn scalar_of(elements: Elements) -> Self {
        Value {
            shape: Vec::new(),
            elements,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    pub fn elements(&self) -> &Elements {
        &self.elements
    }

    pub fn into_elements(self) -> Elements {
        self.elements
    }

    pub fn type_name(&self) -> &'static str {
        self.elements.type_name()
    }

    /// Change the shape without touching the elements.
    pub fn reshape(&mut self, shape: Vec<usize>) -> Result<()> {
        let expected = element_count(&shape)?;
        if expected != self.elements.len() {
            return Err(NexusError::Shape(format!(
                "cannot reshape {} elements to {:?}",
                self.elements.len(),
                shape
            )));
        }
        self.shape = shape;
        Ok(())
    }

    fn single(&self, expected: &str) -> Result<Element<'_>> {
        match (self.elements.len(), self.elements.get(0)) {
            (1, Some(element)) => Ok(element),
            (n, _) => Err(NexusError::mismatch(
                format!("single {expected}"),
                format!("{} array of {n} elements", self.type_name()),
            )),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        self.single("boolean")?.to_bool()
    }

    pub fn as_i64(&self) -> Result<i64> {
        self.single("integer")?.to_i64()
    }

    pub fn as_f64(&self) -> Result<f64> {
        self.single("float")?.to_f64()
    }

    pub fn as_string(&self) -> Result<String> {
        Ok(self.single("string")?.to_string())
    }

    pub fn as_datetime(&self) -> Result<DateTime<FixedOffset>> {
        self.single("date-time")?.to_datetime()
    }

    pub fn to_bool_vec(&self) -> Result<Vec<bool>> {
        self.elements.iter().map(Element::to_bool).collect()
    }

    pub fn to_i64_vec(&self) -> Result<Vec<i64>> {
        self.elements.iter().map(Element::to_i64).collect()
    }

    pub fn to_f64_vec(&self) -> Result<Vec<f64>> {
        self.elements.iter().map(Element::to_f64).collect()
    }

    pub fn to_string_vec(&self) -> Vec<String> {
        self.elements.iter().map(|e| e.to_string()).collect()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 8;

        if self.is_scalar() {
            if let Some(element) = self.elements.get(0) {
                return write!(f, "{element}");
            }
        }
        f.write_str("[")?;
        for (i, element) in self.elements.iter().take(PREVIEW).enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{element}")?;
        }
        if self.elements.len() > PREVIEW {
            f.write_str(", ...")?;
        }
        f.write_str("]")
    }
}

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident($conv:expr)),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::scalar_of(Elements::$variant(vec![$conv(v)]))
                }
            }

            impl From<Vec<$ty>> for Value {
                fn from(v: Vec<$ty>) -> Self {
                    Value::array(Elements::$variant(v.into_iter().map($conv).collect()))
                }
            }
        )*
    };
}

scalar_from! {
    bool => Bool(|v: bool| v),
    i64 => Int(|v: i64| v),
    i32 => Int(i64::from),
    u32 => Int(i64::from),
    f64 => Float(|v: f64| v),
    f32 => Float(f64::from),
    String => String(|v: String| v),
    &str => String(|v: &str| v.to_string()),
}

impl From<&[f64]> for Value {
    fn from(v: &[f64]) -> Self {
        Value::array(Elements::Float(v.to_vec()))
    }
}

impl From<&[i64]> for Value {
    fn from(v: &[i64]) -> Self {
        Value::array(Elements::Int(v.to_vec()))
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value
where
    Tz::Offset: fmt::Display,
{
    fn from(v: DateTime<Tz>) -> Self {
        Value::scalar_of(Elements::String(vec![v.to_rfc3339()]))
    }
}
