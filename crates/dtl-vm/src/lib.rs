//! The DTL evaluator.
//!
//! Executes a lowered command list against the expression graph, driving
//! the `Importer`/`Exporter`/`Tracer` collaborators. Strictly synchronous:
//! commands run in order, and ordering guarantees come from lowering, not
//! from the evaluator.

pub mod engine;

pub use engine::error::RuntimeError;
pub use engine::interpreter::Evaluator;
pub use engine::trace::write_manifest;
