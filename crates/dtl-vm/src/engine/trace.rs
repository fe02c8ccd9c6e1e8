//! Trace manifest driver.
//!
//! Hands the source text and every trace snapshot to the tracer, with
//! spans resolved to line/column locations. The arrays themselves are
//! written by the evaluator as `TraceArray` commands execute.

use dtl_core::{IoError, LineIndex, Tracer};
use dtl_ir::{Graph, Lowered, Program};

/// Records the manifest for a lowered program.
pub fn write_manifest(
    tracer: &mut dyn Tracer,
    source: &str,
    filename: &str,
    graph: &Graph,
    program: &Program,
    lowered: &Lowered,
) -> Result<(), IoError> {
    tracer.record_source(filename, source)?;

    let line_index = LineIndex::new(source);
    for (snapshot, arrays) in program.traces.iter().zip(&lowered.trace_arrays) {
        let schema = snapshot.schema(graph);
        let start = line_index.location(snapshot.span.start);
        let end = line_index.location(snapshot.span.end);
        tracer.record_trace(start, end, &schema, arrays)?;
    }

    Ok(())
}
