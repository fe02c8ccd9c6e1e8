//! Core data structures shared by the DTL compiler and evaluator.
//!
//! This crate holds the leaf types every other crate builds on:
//! - `dtype` - the closed scalar/array type enumeration
//! - `value` - owned columnar array values
//! - `schema` - ordered `(name, dtype)` column lists
//! - `location` - byte spans and line/column resolution
//! - `interner` - string interning with cheap `Symbol` handles
//! - `io` - the `Importer`/`Exporter`/`Tracer` collaborator traits
//! - `manifest` - the serializable trace manifest model

pub mod dtype;
pub mod interner;
pub mod io;
pub mod location;
pub mod manifest;
pub mod schema;
pub mod value;

#[cfg(test)]
mod dtype_tests;
#[cfg(test)]
mod location_tests;
#[cfg(test)]
mod manifest_tests;

pub use dtype::DType;
pub use interner::{Interner, Symbol};
pub use io::{Exporter, Importer, IoError, NoopTracer, Table, Tracer};
pub use location::{LineIndex, Location, Span};
pub use manifest::{
    Manifest, ManifestColumn, ManifestMapping, ManifestSource, ManifestTable, ManifestTrace,
};
pub use schema::Schema;
pub use value::Array;
