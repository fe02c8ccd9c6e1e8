//! Table schemas.
//!
//! A schema is the ordered list of `(column name, dtype)` pairs describing a
//! table. Importers surface one per input; the compiler assembles them for
//! trace snapshots and exports.

use serde::{Deserialize, Serialize};

use crate::DType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub name: String,
    pub dtype: DType,
}

/// Ordered column list. Insertion order is preserved and significant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<SchemaColumn>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_column(&mut self, name: impl Into<String>, dtype: DType) {
        self.columns.push(SchemaColumn {
            name: name.into(),
            dtype,
        });
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[SchemaColumn] {
        &self.columns
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, DType)> {
        self.columns.iter().map(|c| (c.name.as_str(), c.dtype))
    }

    /// First column with the given name, if any.
    pub fn column(&self, name: &str) -> Option<(usize, DType)> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .map(|i| (i, self.columns[i].dtype))
    }
}

impl FromIterator<(String, DType)> for Schema {
    fn from_iter<T: IntoIterator<Item = (String, DType)>>(iter: T) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(name, dtype)| SchemaColumn { name, dtype })
                .collect(),
        }
    }
}
