use dtl_core::io::mem::{MemoryImporter, MemoryTable};
use dtl_core::{Array, DType};
use dtl_ir::{ExprKind, TraceLevel, dump};
use indoc::indoc;

use crate::{ErrorKind, compile};

fn importer_with(tables: Vec<(&str, Vec<(&str, Array)>)>) -> MemoryImporter {
    let mut importer = MemoryImporter::new();
    for (location, columns) in tables {
        importer.add_table(location, MemoryTable::new(columns));
    }
    importer
}

fn int_column(values: &[i64]) -> Array {
    Array::Int64(values.to_vec())
}

#[test]
fn identity_export() {
    let source = indoc! {"
        input = IMPORT 'in';
        EXPORT input TO 'out';
    "};
    let mut importer = importer_with(vec![("in", vec![("x", int_column(&[1, 2, 3]))])]);
    let mut graph = dtl_ir::Graph::new();

    let program = compile(source, &mut graph, &mut importer).unwrap();

    assert_eq!(program.exports.len(), 1);
    let export = &program.exports[0];
    assert_eq!(graph.resolve(export.name), "out");

    let schema = export.schema(&graph);
    assert_eq!(schema.column("x"), Some((0, DType::Int64Array)));

    // The exported column is ReadColumn(OpenTable('in'), 'x', ImportShape).
    let column = export.columns[0].expression;
    assert_eq!(graph.kind(column), ExprKind::ReadColumn);
    assert_eq!(graph.resolve(graph.column_name_of(column)), "x");
    let table = graph.operands(column)[0];
    assert_eq!(graph.kind(table), ExprKind::OpenTable);
    assert_eq!(graph.resolve(graph.location_of(table)), "in");
    let shape = graph.shape_of(column);
    assert_eq!(graph.kind(shape), ExprKind::ImportShape);

    insta::assert_snapshot!(dump(&graph), @r"
    %0 = import_shape 'in'
    %1 = open_table 'in'
    %2 = read_column %1 'x' : int64_array @ %0
    ");
}

#[test]
fn column_rename_reuses_the_read() {
    let source = indoc! {"
        input = IMPORT 'in';
        renamed = SELECT x AS y FROM input;
        EXPORT renamed TO 'out';
    "};
    let mut importer = importer_with(vec![("in", vec![("x", int_column(&[1, 2, 3]))])]);
    let mut graph = dtl_ir::Graph::new();

    let program = compile(source, &mut graph, &mut importer).unwrap();

    let export = &program.exports[0];
    let schema = export.schema(&graph);
    assert_eq!(schema.column("y"), Some((0, DType::Int64Array)));

    // Renaming introduces no new expression: the graph still holds the
    // single value-numbered ReadColumn.
    assert_eq!(graph.len(), 3);
    assert_eq!(
        graph.kind(export.columns[0].expression),
        ExprKind::ReadColumn
    );
}

#[test]
fn filter_pipeline_structure() {
    let source = indoc! {"
        t = IMPORT 'in';
        EXPORT SELECT a FROM t WHERE a < b TO 'out';
    "};
    let mut importer = importer_with(vec![(
        "in",
        vec![("a", int_column(&[1, 5, 9])), ("b", int_column(&[2, 4, 8]))],
    )]);
    let mut graph = dtl_ir::Graph::new();

    let program = compile(source, &mut graph, &mut importer).unwrap();
    assert_eq!(program.exports[0].columns.len(), 1);

    // Garbage collection keeps the filtered `b` out of the final graph:
    // nothing roots it.
    insta::assert_snapshot!(dump(&graph), @r"
    %0 = import_shape 'in'
    %1 = open_table 'in'
    %2 = read_column %1 'a' : int64_array @ %0
    %3 = read_column %1 'b' : int64_array @ %0
    %4 = less_than %2 %3 : bool_array @ %0
    %5 = where_shape %4
    %6 = where %2 %4 : int64_array @ %5
    ");
}

#[test]
fn literal_in_predicate_is_not_implemented() {
    let source = "EXPORT SELECT a FROM IMPORT 'in' WHERE a < 10 TO 'out';";
    let mut importer = importer_with(vec![("in", vec![("a", int_column(&[1]))])]);
    let mut graph = dtl_ir::Graph::new();

    let error = compile(source, &mut graph, &mut importer).unwrap_err();
    assert_eq!(error.kind, ErrorKind::NotImplemented);
    // The span is exactly the literal.
    assert_eq!(&source[error.span.range()], "10");
}

#[test]
fn unresolved_column_spans_the_identifier() {
    let source = "EXPORT SELECT missing FROM IMPORT 'in' TO 'out';";
    let mut importer = importer_with(vec![("in", vec![("present", int_column(&[1]))])]);
    let mut graph = dtl_ir::Graph::new();

    let error = compile(source, &mut graph, &mut importer).unwrap_err();
    assert_eq!(error.kind, ErrorKind::UnresolvedColumn);
    assert_eq!(&source[error.span.range()], "missing");
}

#[test]
fn join_on_builds_staged_cartesian_then_filters() {
    let source = indoc! {"
        l = IMPORT 'l';
        r = IMPORT 'r';
        EXPORT SELECT a, b FROM l JOIN r ON l.k = r.k TO 'out';
    "};
    let mut importer = importer_with(vec![
        (
            "l",
            vec![("k", int_column(&[1, 2])), ("a", int_column(&[10, 20]))],
        ),
        (
            "r",
            vec![("k", int_column(&[2, 3])), ("b", int_column(&[200, 300]))],
        ),
    ]);
    let mut graph = dtl_ir::Graph::new();

    let program = compile(source, &mut graph, &mut importer).unwrap();

    let export = &program.exports[0];
    let schema = export.schema(&graph);
    assert_eq!(schema.column("a"), Some((0, DType::Int64Array)));
    assert_eq!(schema.column("b"), Some((1, DType::Int64Array)));

    // Both exported columns live in the WhereShape of the ON mask.
    let a = export.columns[0].expression;
    let b = export.columns[1].expression;
    let shape = graph.shape_of(a);
    assert_eq!(shape, graph.shape_of(b));
    assert_eq!(graph.kind(shape), ExprKind::WhereShape);

    // The mask is EqualTo over the cartesian staging shape.
    let mask = graph.dependencies(shape)[0];
    assert_eq!(graph.kind(mask), ExprKind::EqualTo);
    let staging = graph.shape_of(mask);
    assert_eq!(graph.kind(staging), ExprKind::JoinShape);

    // Each comparison operand picks a key column through a join selector.
    let operands = graph.operands(mask);
    for &operand in operands {
        assert_eq!(graph.kind(operand), ExprKind::Pick);
    }
    let selectors: Vec<_> = operands
        .iter()
        .map(|&pick| graph.kind(graph.operands(pick)[1]))
        .collect();
    assert_eq!(selectors, [ExprKind::JoinLeft, ExprKind::JoinRight]);

    // The exported columns are picks through the filtered selectors.
    assert_eq!(graph.kind(a), ExprKind::Pick);
    let filtered_selector = graph.operands(a)[1];
    assert_eq!(graph.kind(filtered_selector), ExprKind::Where);
}

#[test]
fn using_desugars_to_equality_refinement() {
    let source = indoc! {"
        l = IMPORT 'l';
        r = IMPORT 'r';
        EXPORT SELECT a, b FROM l JOIN r USING (k) TO 'out';
    "};
    let mut importer = importer_with(vec![
        (
            "l",
            vec![("k", int_column(&[1])), ("a", int_column(&[10]))],
        ),
        (
            "r",
            vec![("k", int_column(&[1])), ("b", int_column(&[100]))],
        ),
    ]);
    let mut graph = dtl_ir::Graph::new();

    let program = compile(source, &mut graph, &mut importer).unwrap();

    // Structurally the ON translation: export columns pick through
    // Where-filtered selectors whose mask is an EqualTo.
    let a = program.exports[0].columns[0].expression;
    assert_eq!(graph.kind(a), ExprKind::Pick);
    let selector = graph.operands(a)[1];
    assert_eq!(graph.kind(selector), ExprKind::Where);
    let mask = graph.operands(selector)[1];
    assert_eq!(graph.kind(mask), ExprKind::EqualTo);
}

#[test]
fn using_with_unknown_column_fails() {
    let source = indoc! {"
        l = IMPORT 'l';
        r = IMPORT 'r';
        EXPORT SELECT a, b FROM l JOIN r USING (nope) TO 'out';
    "};
    let mut importer = importer_with(vec![
        (
            "l",
            vec![("k", int_column(&[1])), ("a", int_column(&[10]))],
        ),
        (
            "r",
            vec![("k", int_column(&[1])), ("b", int_column(&[100]))],
        ),
    ]);
    let mut graph = dtl_ir::Graph::new();

    let error = compile(source, &mut graph, &mut importer).unwrap_err();
    assert_eq!(error.kind, ErrorKind::UnresolvedColumn);
    assert_eq!(&source[error.span.range()], "nope");
}

#[test]
fn unconstrained_join_is_the_cartesian_product() {
    let source = indoc! {"
        l = IMPORT 'l';
        r = IMPORT 'r';
        EXPORT SELECT a, b FROM l JOIN r TO 'out';
    "};
    let mut importer = importer_with(vec![
        ("l", vec![("a", int_column(&[1, 2]))]),
        ("r", vec![("b", int_column(&[3]))]),
    ]);
    let mut graph = dtl_ir::Graph::new();

    let program = compile(source, &mut graph, &mut importer).unwrap();

    let a = program.exports[0].columns[0].expression;
    let shape = graph.shape_of(a);
    assert_eq!(graph.kind(shape), ExprKind::JoinShape);
}

#[test]
fn qualified_references_resolve_through_binding_aliases() {
    let source = indoc! {"
        t = IMPORT 'in';
        EXPORT SELECT s.a AS out FROM t AS s TO 'out';
    "};
    let mut importer = importer_with(vec![("in", vec![("a", int_column(&[1]))])]);
    let mut graph = dtl_ir::Graph::new();

    let program = compile(source, &mut graph, &mut importer).unwrap();
    let export = &program.exports[0];
    assert_eq!(graph.resolve(export.columns[0].name), "out");
    assert_eq!(
        graph.kind(export.columns[0].expression),
        ExprKind::ReadColumn
    );
}

#[test]
fn wildcard_copies_unambiguous_columns() {
    let source = indoc! {"
        t = IMPORT 'in';
        EXPORT SELECT * FROM t TO 'out';
    "};
    let mut importer = importer_with(vec![(
        "in",
        vec![("a", int_column(&[1])), ("b", int_column(&[2]))],
    )]);
    let mut graph = dtl_ir::Graph::new();

    let program = compile(source, &mut graph, &mut importer).unwrap();
    let schema = program.exports[0].schema(&graph);
    let names: Vec<_> = schema.iter().map(|(name, _)| name.to_owned()).collect();
    assert_eq!(names, ["a", "b"]);
}

#[test]
fn wildcard_over_colliding_join_columns_fails() {
    let source = indoc! {"
        l = IMPORT 'l';
        r = IMPORT 'r';
        EXPORT SELECT * FROM l JOIN r ON l.k = r.k TO 'out';
    "};
    let mut importer = importer_with(vec![
        ("l", vec![("k", int_column(&[1]))]),
        ("r", vec![("k", int_column(&[1]))]),
    ]);
    let mut graph = dtl_ir::Graph::new();

    let error = compile(source, &mut graph, &mut importer).unwrap_err();
    assert_eq!(error.kind, ErrorKind::NotImplemented);
}

#[test]
fn implicit_binding_of_a_computed_column_has_no_name() {
    let source = indoc! {"
        t = IMPORT 'in';
        EXPORT SELECT a + b FROM t TO 'out';
    "};
    let mut importer = importer_with(vec![(
        "in",
        vec![("a", int_column(&[1])), ("b", int_column(&[2]))],
    )]);
    let mut graph = dtl_ir::Graph::new();

    let error = compile(source, &mut graph, &mut importer).unwrap_err();
    assert_eq!(error.kind, ErrorKind::AmbiguousName);
    assert_eq!(&source[error.span.range()], "a + b");
}

#[test]
fn comparing_mismatched_dtypes_fails() {
    let source = indoc! {"
        t = IMPORT 'in';
        EXPORT SELECT a FROM t WHERE a = s TO 'out';
    "};
    let mut importer = importer_with(vec![(
        "in",
        vec![
            ("a", int_column(&[1])),
            ("s", Array::String(vec!["x".to_owned()])),
        ],
    )]);
    let mut graph = dtl_ir::Graph::new();

    let error = compile(source, &mut graph, &mut importer).unwrap_err();
    assert_eq!(error.kind, ErrorKind::TypeMismatch);
    assert_eq!(&source[error.span.range()], "a = s");
}

#[test]
fn non_boolean_where_predicate_fails() {
    let source = indoc! {"
        t = IMPORT 'in';
        EXPORT SELECT a FROM t WHERE a + b TO 'out';
    "};
    let mut importer = importer_with(vec![(
        "in",
        vec![("a", int_column(&[1])), ("b", int_column(&[2]))],
    )]);
    let mut graph = dtl_ir::Graph::new();

    let error = compile(source, &mut graph, &mut importer).unwrap_err();
    assert_eq!(error.kind, ErrorKind::TypeMismatch);
    assert_eq!(&source[error.span.range()], "a + b");
}

#[test]
fn missing_import_fails_at_the_path_literal() {
    let source = "input = IMPORT 'nowhere';";
    let mut importer = MemoryImporter::new();
    let mut graph = dtl_ir::Graph::new();

    let error = compile(source, &mut graph, &mut importer).unwrap_err();
    assert_eq!(error.kind, ErrorKind::Import);
    assert_eq!(&source[error.span.range()], "'nowhere'");
}

#[test]
fn unresolved_table_reference_fails() {
    let source = "EXPORT nothing TO 'out';";
    let mut importer = MemoryImporter::new();
    let mut graph = dtl_ir::Graph::new();

    let error = compile(source, &mut graph, &mut importer).unwrap_err();
    assert_eq!(error.kind, ErrorKind::UnresolvedTable);
    assert_eq!(&source[error.span.range()], "nothing");
}

#[test]
fn reassignment_replaces_the_global_table() {
    let source = indoc! {"
        t = IMPORT 'first';
        t = IMPORT 'second';
        EXPORT t TO 'out';
    "};
    let mut importer = importer_with(vec![
        ("first", vec![("a", int_column(&[1]))]),
        ("second", vec![("b", int_column(&[2]))]),
    ]);
    let mut graph = dtl_ir::Graph::new();

    let program = compile(source, &mut graph, &mut importer).unwrap();
    let schema = program.exports[0].schema(&graph);
    assert_eq!(schema.column("b"), Some((0, DType::Int64Array)));
    assert_eq!(schema.column("a"), None);
}

#[test]
fn later_export_to_the_same_path_wins() {
    let source = indoc! {"
        a = IMPORT 'a';
        b = IMPORT 'b';
        EXPORT a TO 'out';
        EXPORT b TO 'out';
    "};
    let mut importer = importer_with(vec![
        ("a", vec![("x", int_column(&[1]))]),
        ("b", vec![("y", int_column(&[2]))]),
    ]);
    let mut graph = dtl_ir::Graph::new();

    let program = compile(source, &mut graph, &mut importer).unwrap();
    assert_eq!(program.exports.len(), 1);
    let schema = program.exports[0].schema(&graph);
    assert_eq!(schema.column("y"), Some((0, DType::Int64Array)));
}

#[test]
fn distinct_and_group_by_are_not_implemented() {
    let mut importer = importer_with(vec![("in", vec![("a", int_column(&[1]))])]);

    let mut graph = dtl_ir::Graph::new();
    let error = compile(
        "EXPORT SELECT DISTINCT a FROM IMPORT 'in' TO 'out';",
        &mut graph,
        &mut importer,
    )
    .unwrap_err();
    assert_eq!(error.kind, ErrorKind::NotImplemented);

    let mut graph = dtl_ir::Graph::new();
    let error = compile(
        "EXPORT SELECT a FROM IMPORT 'in' GROUP BY a TO 'out';",
        &mut graph,
        &mut importer,
    )
    .unwrap_err();
    assert_eq!(error.kind, ErrorKind::NotImplemented);
}

#[test]
fn update_statement_is_not_implemented() {
    let mut importer = MemoryImporter::new();
    let mut graph = dtl_ir::Graph::new();

    let error = compile("UPDATE t;", &mut graph, &mut importer).unwrap_err();
    assert_eq!(error.kind, ErrorKind::NotImplemented);
}

#[test]
fn function_calls_are_not_implemented() {
    let source = indoc! {"
        t = IMPORT 'in';
        EXPORT SELECT f(a) AS x FROM t TO 'out';
    "};
    let mut importer = importer_with(vec![("in", vec![("a", int_column(&[1]))])]);
    let mut graph = dtl_ir::Graph::new();

    let error = compile(source, &mut graph, &mut importer).unwrap_err();
    assert_eq!(error.kind, ErrorKind::NotImplemented);
    assert_eq!(&source[error.span.range()], "f(a)");
}

#[test]
fn every_statement_and_table_expression_is_traced() {
    let source = indoc! {"
        input = IMPORT 'in';
        EXPORT input TO 'out';
    "};
    let mut importer = importer_with(vec![("in", vec![("x", int_column(&[1, 2, 3]))])]);
    let mut graph = dtl_ir::Graph::new();

    let program = compile(source, &mut graph, &mut importer).unwrap();

    // IMPORT expression, assignment statement, reference expression,
    // export statement.
    let levels: Vec<_> = program.traces.iter().map(|t| t.level).collect();
    assert_eq!(levels, [
        TraceLevel::TableExpression,
        TraceLevel::Statement,
        TraceLevel::TableExpression,
        TraceLevel::Statement,
    ]);

    // The export statement's snapshot lists exactly the exported columns.
    let last = program.traces.last().unwrap();
    assert_eq!(last.columns, program.exports[0].columns);

    // Spans point into the script.
    assert_eq!(&source[program.traces[0].span.range()], "IMPORT 'in'");
    assert_eq!(&source[last.span.range()], "EXPORT input TO 'out';");
}
