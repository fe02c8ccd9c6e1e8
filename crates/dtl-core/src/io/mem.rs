//! In-memory I/O backends.
//!
//! Used by the test suites and useful for embedding: tables live in maps,
//! exports and trace records are captured for inspection.

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{Array, Location, ManifestMapping, Schema};

use super::{Exporter, Importer, IoError, Table, Tracer};

/// A fully materialized table.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    schema: Schema,
    columns: Vec<Array>,
    num_rows: usize,
}

impl MemoryTable {
    /// Builds a table from named columns.
    ///
    /// # Panics
    /// Panics if the columns have differing lengths.
    pub fn new(columns: Vec<(&str, Array)>) -> Self {
        let num_rows = columns.first().map_or(0, |(_, array)| array.len());
        let mut schema = Schema::new();
        let mut data = Vec::with_capacity(columns.len());

        for (name, array) in columns {
            assert_eq!(array.len(), num_rows, "column '{name}' length mismatch");
            schema.add_column(name, array.dtype());
            data.push(array);
        }

        Self {
            schema,
            columns: data,
            num_rows,
        }
    }
}

impl Table for MemoryTable {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn column(&self, name: &str) -> Result<Array, IoError> {
        let (index, _) = self
            .schema
            .column(name)
            .ok_or_else(|| IoError::MissingColumn {
                column: name.to_owned(),
            })?;
        Ok(self.columns[index].clone())
    }
}

/// Importer over a fixed set of in-memory tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryImporter {
    tables: IndexMap<String, MemoryTable>,
}

impl MemoryImporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, location: impl Into<String>, table: MemoryTable) {
        self.tables.insert(location.into(), table);
    }
}

impl Importer for MemoryImporter {
    fn schema(&mut self, location: &str) -> Result<Schema, IoError> {
        self.tables
            .get(location)
            .map(|table| table.schema.clone())
            .ok_or_else(|| IoError::NotFound {
                location: location.to_owned(),
            })
    }

    fn open(&mut self, location: &str) -> Result<Box<dyn Table>, IoError> {
        self.tables
            .get(location)
            .map(|table| Box::new(table.clone()) as Box<dyn Table>)
            .ok_or_else(|| IoError::NotFound {
                location: location.to_owned(),
            })
    }
}

/// Exporter that captures exported tables for inspection.
#[derive(Debug, Clone, Default)]
pub struct MemoryExporter {
    exported: IndexMap<String, (Schema, Vec<Array>)>,
}

impl MemoryExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, location: &str) -> Option<&(Schema, Vec<Array>)> {
        self.exported.get(location)
    }

    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.exported.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.exported.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exported.is_empty()
    }
}

impl Exporter for MemoryExporter {
    fn export(
        &mut self,
        location: &str,
        schema: &Schema,
        columns: Vec<Array>,
    ) -> Result<(), IoError> {
        self.exported
            .insert(location.to_owned(), (schema.clone(), columns));
        Ok(())
    }
}

/// One captured `record_trace` call.
#[derive(Debug, Clone)]
pub struct TraceRecord {
    pub start: Location,
    pub end: Location,
    pub schema: Schema,
    pub arrays: Vec<Uuid>,
}

/// Tracer that captures every record for inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingTracer {
    pub sources: Vec<(String, String)>,
    pub inputs: Vec<(String, Schema, Vec<Uuid>)>,
    pub outputs: Vec<(String, Schema, Vec<Uuid>)>,
    pub traces: Vec<TraceRecord>,
    pub mappings: Vec<ManifestMapping>,
    pub arrays: IndexMap<Uuid, Array>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tracer for RecordingTracer {
    fn record_source(&mut self, filename: &str, text: &str) -> Result<(), IoError> {
        self.sources.push((filename.to_owned(), text.to_owned()));
        Ok(())
    }

    fn record_input(
        &mut self,
        name: &str,
        schema: &Schema,
        arrays: &[Uuid],
    ) -> Result<(), IoError> {
        self.inputs
            .push((name.to_owned(), schema.clone(), arrays.to_vec()));
        Ok(())
    }

    fn record_output(
        &mut self,
        name: &str,
        schema: &Schema,
        arrays: &[Uuid],
    ) -> Result<(), IoError> {
        self.outputs
            .push((name.to_owned(), schema.clone(), arrays.to_vec()));
        Ok(())
    }

    fn record_trace(
        &mut self,
        start: Location,
        end: Location,
        schema: &Schema,
        arrays: &[Uuid],
    ) -> Result<(), IoError> {
        self.traces.push(TraceRecord {
            start,
            end,
            schema: schema.clone(),
            arrays: arrays.to_vec(),
        });
        Ok(())
    }

    fn record_mapping(&mut self, mapping: &ManifestMapping) -> Result<(), IoError> {
        self.mappings.push(mapping.clone());
        Ok(())
    }

    fn write_array(&mut self, array: Uuid, data: &Array) -> Result<(), IoError> {
        self.arrays.insert(array, data.clone());
        Ok(())
    }
}
