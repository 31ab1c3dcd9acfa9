//! Scalar values and conversions.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;
use tabula_core::ast::{DataType, Literal, NumOp};
use tracing::warn;

use crate::error::{EngineError, Result};

/// A scalar value held by a column.
///
/// `Value` keys the doubly-keyed column index, so equality and hashing are
/// strict per variant (floats by bit pattern). Predicates and joins compare
/// through [`Value::compare`], which coerces between the numeric variants.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String.
    Str(String),
}

impl Value {
    /// Total order over values: numeric variants compare as `f64`, strings
    /// lexicographically, and every number sorts before every string.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            #[allow(clippy::cast_precision_loss)]
            (Self::Int(a), Self::Float(b)) => (*a as f64).total_cmp(b),
            #[allow(clippy::cast_precision_loss)]
            (Self::Float(a), Self::Int(b)) => a.total_cmp(&(*b as f64)),
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            (Self::Str(_), _) => Ordering::Greater,
            (_, Self::Str(_)) => Ordering::Less,
        }
    }

    /// Equality with numeric coercion, used by predicates and joins.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }

    /// Returns the numeric content as `f64`, if any.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => {
                #[allow(clippy::cast_precision_loss)]
                Some(*i as f64)
            }
            Self::Float(x) => Some(*x),
            Self::Str(_) => None,
        }
    }

    /// Converts a parsed literal to a value of the declared column type.
    ///
    /// Strings convert to numeric types by parsing; numbers convert to
    /// VARCHAR through their display form; VARCHAR values are truncated to
    /// the declared length.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TypeConversion`] when the literal cannot
    /// represent a value of the column type.
    pub fn from_literal(literal: &Literal, data_type: DataType) -> Result<Self> {
        match (literal, data_type) {
            (Literal::Int(i), DataType::Int) => Ok(Self::Int(*i)),
            #[allow(clippy::cast_precision_loss)]
            (Literal::Int(i), DataType::Float) => Ok(Self::Float(*i as f64)),
            (Literal::Float(x), DataType::Float) => Ok(Self::Float(*x)),
            (Literal::Str(s), DataType::Int | DataType::Float) => Self::parse_str(s, data_type),
            (Literal::Int(i), DataType::Varchar(n)) => Ok(Self::truncated(&i.to_string(), n)),
            (Literal::Float(x), DataType::Varchar(n)) => {
                Ok(Self::truncated(&format!("{x:?}"), n))
            }
            (Literal::Str(s), DataType::Varchar(n)) => Ok(Self::truncated(s, n)),
            (Literal::Float(x), DataType::Int) => Err(EngineError::TypeConversion {
                value: format!("{x:?}"),
                data_type,
            }),
        }
    }

    /// Converts a raw string (e.g. a CSV field) to a value of the declared
    /// column type.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TypeConversion`] when the string does not
    /// parse as the column type.
    pub fn parse_str(s: &str, data_type: DataType) -> Result<Self> {
        match data_type {
            DataType::Int => s.trim().parse::<i64>().map(Self::Int).map_err(|_| {
                EngineError::TypeConversion {
                    value: String::from(s),
                    data_type,
                }
            }),
            DataType::Float => s.trim().parse::<f64>().map(Self::Float).map_err(|_| {
                EngineError::TypeConversion {
                    value: String::from(s),
                    data_type,
                }
            }),
            DataType::Varchar(n) => Ok(Self::truncated(s, n)),
        }
    }

    /// Truncates to the first `n` characters. Silent, by contract of the
    /// VARCHAR type; a trace warning records the loss.
    fn truncated(s: &str, n: usize) -> Self {
        if s.chars().count() > n {
            warn!(value = s, limit = n, "truncating VARCHAR value");
        }
        Self::Str(s.chars().take(n).collect())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Self::Int(i) => i.hash(state),
            Self::Float(x) => x.to_bits().hash(state),
            Self::Str(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            // Debug formatting keeps the trailing `.0` on whole floats.
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// Applies a numeric operator to two values.
///
/// Integer addition, subtraction, and multiplication stay integral (spilling
/// to `f64` on overflow); division and any float operand produce a float.
///
/// # Errors
///
/// Returns [`EngineError::StringArithmetic`] when either operand is a string.
pub fn apply_num_op(op: NumOp, left: &Value, right: &Value) -> Result<Value> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        let folded = match op {
            NumOp::Add => a.checked_add(*b),
            NumOp::Sub => a.checked_sub(*b),
            NumOp::Mul => a.checked_mul(*b),
            NumOp::Div => None,
        };
        if let Some(i) = folded {
            return Ok(Value::Int(i));
        }
    }

    let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
        return Err(EngineError::StringArithmetic { op: op.as_str() });
    };
    let x = match op {
        NumOp::Add => a + b,
        NumOp::Sub => a - b,
        NumOp::Mul => a * b,
        NumOp::Div => a / b,
    };
    Ok(Value::Float(x))
}
