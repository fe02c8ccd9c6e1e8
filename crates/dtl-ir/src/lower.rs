//! Graph-to-command lowering.
//!
//! Orders the subgraph reachable from the program's roots into a command
//! list: shapes and arrays evaluate in dependency order, trace commands
//! follow the expressions they observe, collection points release
//! intermediates after their last consumer, and exports run last in source
//! order.

use std::collections::HashMap;

use uuid::Uuid;

use crate::cmd::Command;
use crate::graph::{ExprKind, ExprRef, Graph};
use crate::program::Program;

/// The lowered program.
#[derive(Debug, Clone)]
pub struct Lowered {
    pub commands: Vec<Command>,
    /// One uuid per trace snapshot column, parallel to `Program::traces`.
    /// Each identifies the array recorded for that column.
    pub trace_arrays: Vec<Vec<Uuid>>,
}

/// Lowers a program over its graph.
///
/// Value numbering guarantees each reachable expression appears exactly
/// once; ascending index order is a valid dependency order because every
/// dependency has a smaller index than its dependents.
pub fn lower(graph: &Graph, program: &Program) -> Lowered {
    let mut reachable = vec![false; graph.len()];
    for root in program.roots() {
        reachable[root.index()] = true;
    }
    for i in (0..graph.len()).rev() {
        if !reachable[i] {
            continue;
        }
        for &dep in graph.dependencies(ExprRef::from_index(i)) {
            reachable[dep.index()] = true;
        }
    }

    let mut is_root = vec![false; graph.len()];
    for root in program.roots() {
        is_root[root.index()] = true;
    }

    // A fresh identifier per (snapshot, column) pair. The same expression
    // traced from two snapshots is recorded twice, under distinct names.
    let mut trace_arrays: Vec<Vec<Uuid>> = Vec::with_capacity(program.traces.len());
    let mut trace_requests: HashMap<ExprRef, Vec<Uuid>> = HashMap::new();
    for snapshot in &program.traces {
        let mut uuids = Vec::with_capacity(snapshot.columns.len());
        for column in &snapshot.columns {
            let id = Uuid::new_v4();
            uuids.push(id);
            trace_requests.entry(column.expression).or_default().push(id);
        }
        trace_arrays.push(uuids);
    }

    // Last reachable consumer of each collectible intermediate. Shapes are
    // never collected (lengths are cheap); table handles stay open for the
    // run; roots outlive the command list.
    let mut last_consumer: HashMap<ExprRef, ExprRef> = HashMap::new();
    for i in 0..graph.len() {
        if !reachable[i] {
            continue;
        }
        let consumer = ExprRef::from_index(i);
        for &dep in graph.dependencies(consumer) {
            if is_root[dep.index()] || !collectible(graph, dep) {
                continue;
            }
            last_consumer.insert(dep, consumer);
        }
    }
    let mut collect_after: HashMap<ExprRef, Vec<ExprRef>> = HashMap::new();
    for (&dep, &consumer) in &last_consumer {
        collect_after.entry(consumer).or_default().push(dep);
    }

    let mut commands = Vec::new();
    for i in 0..graph.len() {
        if !reachable[i] {
            continue;
        }
        let expression = ExprRef::from_index(i);

        if graph.is_shape(expression) {
            commands.push(Command::EvaluateShape { expression });
        } else {
            commands.push(Command::EvaluateArray { expression });
        }

        if let Some(uuids) = trace_requests.get(&expression) {
            for &array in uuids {
                commands.push(Command::TraceArray { array, expression });
            }
        }

        if let Some(collected) = collect_after.get_mut(&expression) {
            // Deterministic order within a single collection point.
            collected.sort();
            for &expression in collected.iter() {
                commands.push(Command::CollectArray { expression });
            }
        }
    }

    for export in &program.exports {
        commands.push(Command::ExportTable {
            name: export.name,
            schema: export.schema(graph),
            columns: export.columns.iter().map(|c| c.expression).collect(),
        });
    }

    Lowered {
        commands,
        trace_arrays,
    }
}

fn collectible(graph: &Graph, expression: ExprRef) -> bool {
    !graph.is_shape(expression) && graph.kind(expression) != ExprKind::OpenTable
}
