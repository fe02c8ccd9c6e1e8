//! The DTL intermediate representation.
//!
//! A script compiles to a shared, acyclic expression graph: shape
//! expressions denote row counts, array expressions denote typed columns.
//! The graph is an append-only arena with value numbering and a
//! mark/compact garbage collector; external holders use stable integer
//! references that survive compaction through a remap table.
//!
//! - `graph` - the arena, expression constructors, and GC
//! - `program` - export tables and trace snapshots referencing the graph
//! - `cmd` - the linear command list executed by an evaluator
//! - `lower` - dependency-ordered lowering from graph to commands
//! - `dump` - textual rendering for debugging and tests

pub mod cmd;
pub mod dump;
pub mod graph;
pub mod lower;
pub mod program;


pub use cmd::Command;
pub use dump::dump;
pub use graph::{BinaryOp, ExprKind, ExprRef, Graph, GraphError};
pub use lower::{Lowered, lower};
pub use program::{Column, ExportTable, Program, TraceLevel, TraceSnapshot};
