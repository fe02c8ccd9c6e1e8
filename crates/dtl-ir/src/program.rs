//! The compiled program: what translation produces.
//!
//! A program is a list of export tables and trace snapshots, each holding
//! named references into the expression graph. It is the root set for
//! garbage collection and the input to command lowering.

use dtl_core::{Schema, Span, Symbol};

use crate::graph::{ExprRef, Graph};

/// A named column reference into the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: Symbol,
    pub expression: ExprRef,
}

/// Granularity of a trace snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceLevel {
    /// Individual column expressions. Declared for the manifest format;
    /// the translator does not currently emit snapshots at this level.
    ColumnExpression,
    /// Table expressions: `IMPORT`, table references, `SELECT`.
    TableExpression,
    /// Whole statements: assignments and exports.
    Statement,
}

/// A recorded mapping from a source span to the table it evaluated to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceSnapshot {
    pub level: TraceLevel,
    pub span: Span,
    pub columns: Vec<Column>,
}

/// One `EXPORT` statement's output table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    /// The export path, interned.
    pub name: Symbol,
    pub columns: Vec<Column>,
}

fn columns_schema(columns: &[Column], graph: &Graph) -> Schema {
    columns
        .iter()
        .map(|column| {
            (
                graph.resolve(column.name).to_owned(),
                graph.dtype_of(column.expression),
            )
        })
        .collect()
}

impl TraceSnapshot {
    pub fn schema(&self, graph: &Graph) -> Schema {
        columns_schema(&self.columns, graph)
    }
}

impl ExportTable {
    pub fn schema(&self, graph: &Graph) -> Schema {
        columns_schema(&self.columns, graph)
    }
}

/// The translated script: exports in source order, snapshots in the order
/// they were recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub exports: Vec<ExportTable>,
    pub traces: Vec<TraceSnapshot>,
}

impl Program {
    /// Every expression the program keeps alive: export columns first,
    /// then trace columns.
    pub fn roots(&self) -> impl Iterator<Item = ExprRef> + '_ {
        let exports = self
            .exports
            .iter()
            .flat_map(|table| table.columns.iter().map(|c| c.expression));
        let traces = self
            .traces
            .iter()
            .flat_map(|snapshot| snapshot.columns.iter().map(|c| c.expression));
        exports.chain(traces)
    }

    /// Rewrites every expression reference through the graph's remap table
    /// after a collection.
    ///
    /// # Panics
    /// Panics if a referenced expression was collected; callers must mark
    /// every root before collecting.
    pub fn remap(&mut self, graph: &Graph) {
        let remap = |column: &mut Column| {
            column.expression = graph
                .remap(column.expression)
                .expect("program root collected; roots must be marked before collect");
        };

        for table in &mut self.exports {
            table.columns.iter_mut().for_each(remap);
        }
        for snapshot in &mut self.traces {
            snapshot.columns.iter_mut().for_each(remap);
        }
    }
}
