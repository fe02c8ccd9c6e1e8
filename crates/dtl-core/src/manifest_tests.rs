use uuid::Uuid;

use crate::{Location, Manifest};

fn loc(offset: u32, line: u32, column: u32) -> Location {
    Location {
        offset,
        line,
        column,
    }
}

#[test]
fn manifest_roundtrips_through_json() {
    let mut manifest = Manifest::new();
    manifest.add_source("script.dtl", "x = IMPORT 'in';\n");
    manifest.add_trace("script.dtl", loc(0, 1, 1), loc(16, 1, 17), "x", Uuid::nil());

    let json = serde_json::to_string(&manifest).unwrap();
    let back: Manifest = serde_json::from_str(&json).unwrap();

    assert_eq!(back, manifest);
}

#[test]
fn positional_mappings_omit_index_arrays() {
    let mut manifest = Manifest::new();
    manifest.add_mapping(crate::ManifestMapping {
        src_array: Uuid::nil(),
        tgt_array: Uuid::nil(),
        src_index_array: None,
        tgt_index_array: None,
    });

    let json = serde_json::to_value(&manifest).unwrap();
    assert!(json["mappings"][0]["src_index_array"].is_null());
}
