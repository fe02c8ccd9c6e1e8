//! Textual rendering of the expression graph.
//!
//! One line per expression in index order. Arrays show their dtype and
//! shape after the operands:
//!
//! ```text
//! %0 = import_shape 'in'
//! %1 = open_table 'in'
//! %2 = read_column %1 'x' : int64_array @ %0
//! ```

use std::fmt::Write;

use crate::graph::{ExprKind, Graph};

/// Renders the whole graph, one expression per line.
pub fn dump(graph: &Graph) -> String {
    let mut out = String::new();
    render(graph, &mut out).expect("String write never fails");
    out
}

fn render(graph: &Graph, out: &mut String) -> std::fmt::Result {
    for expression in graph.iter() {
        let kind = graph.kind(expression);
        write!(out, "{} = {}", expression, kind.name())?;

        match kind {
            ExprKind::ImportShape | ExprKind::OpenTable => {
                let location = graph.resolve(graph.location_of(expression));
                write!(out, " '{location}'")?;
            }
            ExprKind::ReadColumn => {
                let table = graph.operands(expression)[0];
                let column = graph.resolve(graph.column_name_of(expression));
                write!(out, " {table} '{column}'")?;
            }
            ExprKind::Int64Constant => {
                write!(out, " {}", graph.int64_value_of(expression))?;
            }
            ExprKind::DoubleConstant => {
                write!(out, " {}", graph.double_value_of(expression))?;
            }
            _ => {
                for &operand in graph.operands(expression) {
                    write!(out, " {operand}")?;
                }
            }
        }

        if graph.is_array(expression) {
            write!(
                out,
                " : {} @ {}",
                graph.dtype_of(expression),
                graph.shape_of(expression)
            )?;
        }

        out.push('\n');
    }

    Ok(())
}
