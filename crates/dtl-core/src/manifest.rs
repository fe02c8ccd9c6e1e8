//! The trace manifest model.
//!
//! A manifest ties a run's recorded arrays back to the script that produced
//! them: the source text, one trace entry per snapshot column, and the
//! mappings connecting arrays whose rows correspond. Backends serialize it
//! as JSON.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DType, Location};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestSource {
    pub filename: String,
    pub text: String,
}

/// A named input or output table and the arrays its columns were
/// recorded under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestTable {
    pub name: String,
    pub columns: Vec<ManifestColumn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestColumn {
    pub name: String,
    pub dtype: DType,
    pub array: Uuid,
}

/// One traced column: a source span and the identifier of the array that
/// held the column's value when the span was evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestTrace {
    pub filename: String,
    pub start: Location,
    pub end: Location,
    pub column: String,
    pub array: Uuid,
}

/// A row correspondence between two recorded arrays.
///
/// When the index pair is absent the mapping is positional: row i of the
/// source array produced row i of the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestMapping {
    pub src_array: Uuid,
    pub tgt_array: Uuid,
    pub src_index_array: Option<Uuid>,
    pub tgt_index_array: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub sources: Vec<ManifestSource>,
    pub inputs: Vec<ManifestTable>,
    pub outputs: Vec<ManifestTable>,
    pub traces: Vec<ManifestTrace>,
    pub mappings: Vec<ManifestMapping>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&mut self, filename: impl Into<String>, text: impl Into<String>) {
        self.sources.push(ManifestSource {
            filename: filename.into(),
            text: text.into(),
        });
    }

    pub fn add_input(&mut self, table: ManifestTable) {
        self.inputs.push(table);
    }

    pub fn add_output(&mut self, table: ManifestTable) {
        self.outputs.push(table);
    }

    pub fn add_trace(
        &mut self,
        filename: impl Into<String>,
        start: Location,
        end: Location,
        column: impl Into<String>,
        array: Uuid,
    ) {
        self.traces.push(ManifestTrace {
            filename: filename.into(),
            start,
            end,
            column: column.into(),
            array,
        });
    }

    pub fn add_mapping(&mut self, mapping: ManifestMapping) {
        self.mappings.push(mapping);
    }
}
