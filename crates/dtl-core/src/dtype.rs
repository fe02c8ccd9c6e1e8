//! The closed type enumeration for DTL values.
//!
//! Types come in two tiers: scalars and arrays of scalars. Columns, and
//! every expression in the IR, are array-typed; scalars exist for constants
//! and for describing array elements.

use serde::{Deserialize, Serialize};

/// A DTL value type.
///
/// `Index` values name positions within a shape; `IndexArray` is the
/// canonical reindexing vector produced by joins and sorts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    Bool,
    Int64,
    Double,
    String,
    Index,
    BoolArray,
    Int64Array,
    DoubleArray,
    StringArray,
    IndexArray,
}

impl DType {
    pub fn is_array(self) -> bool {
        matches!(
            self,
            DType::BoolArray
                | DType::Int64Array
                | DType::DoubleArray
                | DType::StringArray
                | DType::IndexArray
        )
    }

    pub fn is_scalar(self) -> bool {
        !self.is_array()
    }

    /// The array type with this type's elements. Identity for array types.
    pub fn as_array(self) -> DType {
        match self {
            DType::Bool | DType::BoolArray => DType::BoolArray,
            DType::Int64 | DType::Int64Array => DType::Int64Array,
            DType::Double | DType::DoubleArray => DType::DoubleArray,
            DType::String | DType::StringArray => DType::StringArray,
            DType::Index | DType::IndexArray => DType::IndexArray,
        }
    }

    /// The element type of an array type. Identity for scalar types.
    pub fn element(self) -> DType {
        match self {
            DType::Bool | DType::BoolArray => DType::Bool,
            DType::Int64 | DType::Int64Array => DType::Int64,
            DType::Double | DType::DoubleArray => DType::Double,
            DType::String | DType::StringArray => DType::String,
            DType::Index | DType::IndexArray => DType::Index,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::Int64 => "int64",
            DType::Double => "double",
            DType::String => "string",
            DType::Index => "index",
            DType::BoolArray => "bool_array",
            DType::Int64Array => "int64_array",
            DType::DoubleArray => "double_array",
            DType::StringArray => "string_array",
            DType::IndexArray => "index_array",
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for DType {
    type Err = UnknownDType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "bool" => DType::Bool,
            "int64" => DType::Int64,
            "double" => DType::Double,
            "string" => DType::String,
            "index" => DType::Index,
            "bool_array" => DType::BoolArray,
            "int64_array" => DType::Int64Array,
            "double_array" => DType::DoubleArray,
            "string_array" => DType::StringArray,
            "index_array" => DType::IndexArray,
            _ => return Err(UnknownDType(s.to_owned())),
        })
    }
}

/// Error returned when parsing an unrecognized dtype name.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown dtype '{0}'")]
pub struct UnknownDType(pub String);
