//! Datum type - column values handled by the access method

use std::fmt;

use crate::catalog::DataType;

/// A single value in a row
#[derive(Debug, Clone, Default)]
pub enum Datum {
    /// NULL value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (covers SmallInt, Int, BigInt)
    Int(i64),
    /// Floating point value (covers Real, Double)
    Float(f64),
    /// String value (covers Varchar, Text)
    Text(String),
    /// Binary data (Bytea)
    Bytes(Vec<u8>),
}

impl Datum {
    /// Get the data type of this datum
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Datum::Null => None,
            Datum::Bool(_) => Some(DataType::Boolean),
            Datum::Int(_) => Some(DataType::BigInt),
            Datum::Float(_) => Some(DataType::Double),
            Datum::Text(_) => Some(DataType::Text),
            Datum::Bytes(_) => Some(DataType::Bytea),
        }
    }

    /// Parse the textual form used on the command line
    ///
    /// `NULL`, `true`/`false` and numbers map to their typed datum; anything
    /// else is text.
    pub fn parse_literal(s: &str) -> Datum {
        if s == "NULL" {
            return Datum::Null;
        }
        match s {
            "true" => return Datum::Bool(true),
            "false" => return Datum::Bool(false),
            _ => {}
        }
        if let Ok(i) = s.parse::<i64>() {
            return Datum::Int(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            if f.is_finite() {
                return Datum::Float(f);
            }
        }
        Datum::Text(s.to_string())
    }
}

/// Textual external representation
impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => write!(f, "NULL"),
            Datum::Bool(b) => write!(f, "{}", b),
            Datum::Int(i) => write!(f, "{}", i),
            Datum::Float(v) => write!(f, "{}", v),
            Datum::Text(s) => write!(f, "{}", s),
            Datum::Bytes(b) => {
                write!(f, "\\x")?;
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}

impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Datum::Null, Datum::Null) => true,
            (Datum::Bool(a), Datum::Bool(b)) => a == b,
            (Datum::Int(a), Datum::Int(b)) => a == b,
            (Datum::Float(a), Datum::Float(b)) => a.to_bits() == b.to_bits(),
            (Datum::Text(a), Datum::Text(b)) => a == b,
            (Datum::Bytes(a), Datum::Bytes(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Datum {}

impl From<i64> for Datum {
    fn from(v: i64) -> Self {
        Datum::Int(v)
    }
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Datum::Text(v.to_string())
    }
}

impl From<bool> for Datum {
    fn from(v: bool) -> Self {
        Datum::Bool(v)
    }
}
