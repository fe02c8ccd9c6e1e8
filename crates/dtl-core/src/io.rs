//! The I/O collaborator traits.
//!
//! The compiler and evaluator never touch storage directly. An [`Importer`]
//! surfaces schemas at compile time and column data at evaluation time, an
//! [`Exporter`] receives finished tables, and a [`Tracer`] persists the
//! trace manifest and the intermediate arrays it refers to. All three are
//! borrowed for the duration of a run; ownership stays with the caller.

use uuid::Uuid;

use crate::{Array, Location, ManifestMapping, Schema};

pub mod mem;

/// Errors surfaced by I/O backends.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("table '{location}' not found")]
    NotFound { location: String },

    #[error("table has no column '{column}'")]
    MissingColumn { column: String },

    #[error("table '{location}' is malformed: {message}")]
    Malformed { location: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// An open input table, producing column data on demand.
pub trait Table {
    fn schema(&self) -> &Schema;

    fn num_rows(&self) -> usize;

    /// The named column's values. The returned array has `num_rows`
    /// elements.
    fn column(&self, name: &str) -> Result<Array, IoError>;
}

/// Source of named input tables.
pub trait Importer {
    /// The schema of the named table, without materializing data.
    fn schema(&mut self, location: &str) -> Result<Schema, IoError>;

    /// Opens the named table for reading.
    fn open(&mut self, location: &str) -> Result<Box<dyn Table>, IoError>;
}

/// Sink for named output tables.
pub trait Exporter {
    fn export(
        &mut self,
        location: &str,
        schema: &Schema,
        columns: Vec<Array>,
    ) -> Result<(), IoError>;
}

/// Sink for the trace manifest and recorded arrays.
pub trait Tracer {
    fn record_source(&mut self, filename: &str, text: &str) -> Result<(), IoError>;

    fn record_input(&mut self, name: &str, schema: &Schema, arrays: &[Uuid])
    -> Result<(), IoError>;

    fn record_output(
        &mut self,
        name: &str,
        schema: &Schema,
        arrays: &[Uuid],
    ) -> Result<(), IoError>;

    /// Records one trace snapshot: the span it covers and the identifier of
    /// each column's array, parallel to the schema.
    fn record_trace(
        &mut self,
        start: Location,
        end: Location,
        schema: &Schema,
        arrays: &[Uuid],
    ) -> Result<(), IoError>;

    fn record_mapping(&mut self, mapping: &ManifestMapping) -> Result<(), IoError>;

    /// Persists the current value of a traced array.
    fn write_array(&mut self, array: Uuid, data: &Array) -> Result<(), IoError>;
}

/// Tracer that discards everything. For runs without tracing enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn record_source(&mut self, _filename: &str, _text: &str) -> Result<(), IoError> {
        Ok(())
    }

    fn record_input(
        &mut self,
        _name: &str,
        _schema: &Schema,
        _arrays: &[Uuid],
    ) -> Result<(), IoError> {
        Ok(())
    }

    fn record_output(
        &mut self,
        _name: &str,
        _schema: &Schema,
        _arrays: &[Uuid],
    ) -> Result<(), IoError> {
        Ok(())
    }

    fn record_trace(
        &mut self,
        _start: Location,
        _end: Location,
        _schema: &Schema,
        _arrays: &[Uuid],
    ) -> Result<(), IoError> {
        Ok(())
    }

    fn record_mapping(&mut self, _mapping: &ManifestMapping) -> Result<(), IoError> {
        Ok(())
    }

    fn write_array(&mut self, _array: Uuid, _data: &Array) -> Result<(), IoError> {
        Ok(())
    }
}
