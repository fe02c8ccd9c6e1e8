//! The linear command program.
//!
//! Lowering flattens the reachable expression graph into a command list an
//! evaluator executes strictly in order. The commands describe *what* to
//! compute; the kernels live with the evaluator.

use dtl_core::{Schema, Symbol};
use uuid::Uuid;

use crate::graph::ExprRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Binds the length of a shape expression.
    EvaluateShape { expression: ExprRef },

    /// Binds the value of an array expression (or opens a table handle).
    /// Issued strictly after the expression's shape and operands.
    EvaluateArray { expression: ExprRef },

    /// Hands the current value of `expression` to the tracer under `array`.
    TraceArray { array: Uuid, expression: ExprRef },

    /// Releases the binding of an intermediate array after its last use.
    CollectArray { expression: ExprRef },

    /// Assembles the named columns and hands them to the exporter.
    ExportTable {
        name: Symbol,
        schema: Schema,
        columns: Vec<ExprRef>,
    },
}
