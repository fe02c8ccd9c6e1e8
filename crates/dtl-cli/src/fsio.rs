//! Filesystem I/O backends.
//!
//! Tables are JSON files, one per location:
//!
//! ```json
//! {"columns": [{"name": "x", "dtype": "int64_array", "values": [1, 2, 3]}]}
//! ```
//!
//! The tracer writes `arrays/<uuid>.json` per recorded array plus a
//! `manifest.json` tying them back to the script.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dtl_core::{
    Array, DType, Exporter, Importer, IoError, Location, Manifest, ManifestColumn,
    ManifestMapping, ManifestTable, Schema, Table, Tracer,
};

#[derive(Debug, Serialize, Deserialize)]
struct TableFile {
    columns: Vec<ColumnFile>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ColumnFile {
    name: String,
    dtype: DType,
    values: serde_json::Value,
}

fn malformed(location: &str, message: impl Into<String>) -> IoError {
    IoError::Malformed {
        location: location.to_owned(),
        message: message.into(),
    }
}

fn array_to_values(array: &Array) -> serde_json::Value {
    match array {
        Array::Bool(values) => serde_json::json!(values),
        Array::Int64(values) => serde_json::json!(values),
        Array::Double(values) => serde_json::json!(values),
        Array::String(values) => serde_json::json!(values),
        Array::Index(values) => serde_json::json!(values),
    }
}

fn values_to_array(
    location: &str,
    name: &str,
    dtype: DType,
    values: &serde_json::Value,
) -> Result<Array, IoError> {
    let items = values
        .as_array()
        .ok_or_else(|| malformed(location, format!("column '{name}' values must be a list")))?;

    let bad_value =
        || malformed(location, format!("column '{name}' has a value outside {dtype}"));

    match dtype {
        DType::BoolArray => items
            .iter()
            .map(|v| v.as_bool().ok_or_else(&bad_value))
            .collect::<Result<_, _>>()
            .map(Array::Bool),
        DType::Int64Array => items
            .iter()
            .map(|v| v.as_i64().ok_or_else(&bad_value))
            .collect::<Result<_, _>>()
            .map(Array::Int64),
        DType::DoubleArray => items
            .iter()
            .map(|v| v.as_f64().ok_or_else(&bad_value))
            .collect::<Result<_, _>>()
            .map(Array::Double),
        DType::StringArray => items
            .iter()
            .map(|v| v.as_str().map(str::to_owned).ok_or_else(&bad_value))
            .collect::<Result<_, _>>()
            .map(Array::String),
        DType::IndexArray => items
            .iter()
            .map(|v| {
                v.as_u64()
                    .map(|value| value as usize)
                    .ok_or_else(&bad_value)
            })
            .collect::<Result<_, _>>()
            .map(Array::Index),
        _ => Err(malformed(
            location,
            format!("column '{name}' has scalar dtype {dtype}"),
        )),
    }
}

/* === Importer ================================================================================= */

/// A fully loaded table file.
pub struct FsTable {
    schema: Schema,
    columns: Vec<Array>,
    num_rows: usize,
}

impl Table for FsTable {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn column(&self, name: &str) -> Result<Array, IoError> {
        let (index, _) = self
            .schema
            .column(name)
            .ok_or_else(|| IoError::MissingColumn {
                column: name.to_owned(),
            })?;
        Ok(self.columns[index].clone())
    }
}

/// Imports `<root>/<location>.json` table files.
pub struct FsImporter {
    root: PathBuf,
}

impl FsImporter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn load(&self, location: &str) -> Result<FsTable, IoError> {
        let path = self.root.join(format!("{location}.json"));
        let text = fs::read_to_string(&path).map_err(|error| {
            if error.kind() == std::io::ErrorKind::NotFound {
                IoError::NotFound {
                    location: location.to_owned(),
                }
            } else {
                IoError::Io(error)
            }
        })?;

        let file: TableFile = serde_json::from_str(&text)
            .map_err(|error| malformed(location, error.to_string()))?;

        let mut schema = Schema::new();
        let mut columns = Vec::with_capacity(file.columns.len());
        for column in &file.columns {
            let array = values_to_array(location, &column.name, column.dtype, &column.values)?;
            schema.add_column(&column.name, column.dtype);
            columns.push(array);
        }

        let num_rows = columns.first().map_or(0, Array::len);
        if columns.iter().any(|column| column.len() != num_rows) {
            return Err(malformed(location, "columns have differing lengths"));
        }

        Ok(FsTable {
            schema,
            columns,
            num_rows,
        })
    }
}

impl Importer for FsImporter {
    fn schema(&mut self, location: &str) -> Result<Schema, IoError> {
        Ok(self.load(location)?.schema)
    }

    fn open(&mut self, location: &str) -> Result<Box<dyn Table>, IoError> {
        Ok(Box::new(self.load(location)?))
    }
}

/* === Exporter ================================================================================= */

/// Writes `<root>/<location>.json` table files.
pub struct FsExporter {
    root: PathBuf,
}

impl FsExporter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Exporter for FsExporter {
    fn export(
        &mut self,
        location: &str,
        schema: &Schema,
        columns: Vec<Array>,
    ) -> Result<(), IoError> {
        let file = TableFile {
            columns: schema
                .iter()
                .zip(&columns)
                .map(|((name, dtype), array)| ColumnFile {
                    name: name.to_owned(),
                    dtype,
                    values: array_to_values(array),
                })
                .collect(),
        };

        fs::create_dir_all(&self.root)?;
        let path = self.root.join(format!("{location}.json"));
        fs::write(path, serde_json::to_string_pretty(&file).expect("tables serialize"))?;
        Ok(())
    }
}

/* === Tracer =================================================================================== */

#[derive(Debug, Serialize, Deserialize)]
struct ArrayFile {
    dtype: DType,
    length: usize,
    values: serde_json::Value,
}

/// Accumulates the manifest in memory, writing arrays eagerly; `finish`
/// persists `manifest.json`.
pub struct FsTracer {
    root: PathBuf,
    manifest: Manifest,
    /// Filename of the most recently recorded source; trace entries are
    /// attributed to it.
    current_filename: Option<String>,
}

impl FsTracer {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, IoError> {
        let root = root.into();
        fs::create_dir_all(root.join("arrays"))?;
        Ok(Self {
            root,
            manifest: Manifest::new(),
            current_filename: None,
        })
    }

    fn table(name: &str, schema: &Schema, arrays: &[Uuid]) -> ManifestTable {
        ManifestTable {
            name: name.to_owned(),
            columns: schema
                .iter()
                .zip(arrays)
                .map(|((column, dtype), &array)| ManifestColumn {
                    name: column.to_owned(),
                    dtype,
                    array,
                })
                .collect(),
        }
    }

    /// Writes `manifest.json`.
    pub fn finish(self) -> Result<PathBuf, IoError> {
        let path = self.root.join("manifest.json");
        fs::write(
            &path,
            serde_json::to_string_pretty(&self.manifest).expect("manifest serializes"),
        )?;
        Ok(path)
    }
}

impl Tracer for FsTracer {
    fn record_source(&mut self, filename: &str, text: &str) -> Result<(), IoError> {
        self.current_filename = Some(filename.to_owned());
        self.manifest.add_source(filename, text);
        Ok(())
    }

    fn record_input(
        &mut self,
        name: &str,
        schema: &Schema,
        arrays: &[Uuid],
    ) -> Result<(), IoError> {
        self.manifest.add_input(Self::table(name, schema, arrays));
        Ok(())
    }

    fn record_output(
        &mut self,
        name: &str,
        schema: &Schema,
        arrays: &[Uuid],
    ) -> Result<(), IoError> {
        self.manifest.add_output(Self::table(name, schema, arrays));
        Ok(())
    }

    fn record_trace(
        &mut self,
        start: Location,
        end: Location,
        schema: &Schema,
        arrays: &[Uuid],
    ) -> Result<(), IoError> {
        let filename = self.current_filename.clone().unwrap_or_default();
        for ((column, _), &array) in schema.iter().zip(arrays) {
            self.manifest
                .add_trace(filename.clone(), start, end, column, array);
        }
        Ok(())
    }

    fn record_mapping(&mut self, mapping: &ManifestMapping) -> Result<(), IoError> {
        self.manifest.add_mapping(mapping.clone());
        Ok(())
    }

    fn write_array(&mut self, array: Uuid, data: &Array) -> Result<(), IoError> {
        let file = ArrayFile {
            dtype: data.dtype(),
            length: data.len(),
            values: array_to_values(data),
        };
        let path = self.root.join("arrays").join(format!("{array}.json"));
        fs::write(path, serde_json::to_string(&file).expect("arrays serialize"))?;
        Ok(())
    }
}

pub fn trace_array_path(root: &Path, array: Uuid) -> PathBuf {
    root.join("arrays").join(format!("{array}.json"))
}
