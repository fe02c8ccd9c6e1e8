use std::fs;

use dtl_core::{Array, DType, Importer, IoError, Location, Schema, Tracer};
use uuid::Uuid;

use crate::fsio::{FsExporter, FsImporter, FsTracer};

fn write_table(dir: &std::path::Path, name: &str, json: &str) {
    fs::write(dir.join(format!("{name}.json")), json).unwrap();
}

#[test]
fn importer_reads_schema_and_data() {
    let dir = tempfile::tempdir().unwrap();
    write_table(
        dir.path(),
        "in",
        r#"{"columns": [
            {"name": "x", "dtype": "int64_array", "values": [1, 2, 3]},
            {"name": "s", "dtype": "string_array", "values": ["a", "b", "c"]}
        ]}"#,
    );

    let mut importer = FsImporter::new(dir.path());

    let schema = importer.schema("in").unwrap();
    assert_eq!(schema.column("x"), Some((0, DType::Int64Array)));
    assert_eq!(schema.column("s"), Some((1, DType::StringArray)));

    let table = importer.open("in").unwrap();
    assert_eq!(table.num_rows(), 3);
    assert_eq!(table.column("x").unwrap(), Array::Int64(vec![1, 2, 3]));
}

#[test]
fn missing_table_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let mut importer = FsImporter::new(dir.path());

    assert!(matches!(
        importer.schema("absent"),
        Err(IoError::NotFound { .. })
    ));
}

#[test]
fn mistyped_values_are_malformed() {
    let dir = tempfile::tempdir().unwrap();
    write_table(
        dir.path(),
        "bad",
        r#"{"columns": [{"name": "x", "dtype": "int64_array", "values": ["nope"]}]}"#,
    );

    let mut importer = FsImporter::new(dir.path());
    assert!(matches!(
        importer.schema("bad"),
        Err(IoError::Malformed { .. })
    ));
}

#[test]
fn ragged_columns_are_malformed() {
    let dir = tempfile::tempdir().unwrap();
    write_table(
        dir.path(),
        "ragged",
        r#"{"columns": [
            {"name": "a", "dtype": "int64_array", "values": [1, 2]},
            {"name": "b", "dtype": "int64_array", "values": [1]}
        ]}"#,
    );

    let mut importer = FsImporter::new(dir.path());
    assert!(matches!(
        importer.schema("ragged"),
        Err(IoError::Malformed { .. })
    ));
}

#[test]
fn export_then_import_roundtrips() {
    let dir = tempfile::tempdir().unwrap();

    let mut schema = Schema::new();
    schema.add_column("x", DType::Int64Array);
    schema.add_column("f", DType::DoubleArray);

    let mut exporter = FsExporter::new(dir.path());
    dtl_core::Exporter::export(
        &mut exporter,
        "out",
        &schema,
        vec![
            Array::Int64(vec![1, 2]),
            Array::Double(vec![0.5, 1.5]),
        ],
    )
    .unwrap();

    let mut importer = FsImporter::new(dir.path());
    let table = importer.open("out").unwrap();
    assert_eq!(table.column("x").unwrap(), Array::Int64(vec![1, 2]));
    assert_eq!(table.column("f").unwrap(), Array::Double(vec![0.5, 1.5]));
}

#[test]
fn tracer_writes_arrays_and_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let mut tracer = FsTracer::new(dir.path()).unwrap();

    tracer.record_source("script.dtl", "x = IMPORT 'in';").unwrap();

    let mut schema = Schema::new();
    schema.add_column("x", DType::Int64Array);
    let id = Uuid::new_v4();

    let start = Location {
        offset: 0,
        line: 1,
        column: 1,
    };
    let end = Location {
        offset: 16,
        line: 1,
        column: 17,
    };
    tracer.record_trace(start, end, &schema, &[id]).unwrap();
    tracer.write_array(id, &Array::Int64(vec![7, 8])).unwrap();

    let manifest_path = tracer.finish().unwrap();

    let manifest: dtl_core::Manifest =
        serde_json::from_str(&fs::read_to_string(manifest_path).unwrap()).unwrap();
    assert_eq!(manifest.sources.len(), 1);
    assert_eq!(manifest.traces.len(), 1);
    assert_eq!(manifest.traces[0].column, "x");
    assert_eq!(manifest.traces[0].array, id);
    assert_eq!(manifest.traces[0].filename, "script.dtl");

    let array_file = crate::fsio::trace_array_path(dir.path(), id);
    let array_json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(array_file).unwrap()).unwrap();
    assert_eq!(array_json["dtype"], "int64_array");
    assert_eq!(array_json["length"], 2);
    assert_eq!(array_json["values"], serde_json::json!([7, 8]));
}
