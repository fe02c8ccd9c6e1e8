//! Command-line interface definition.

use std::path::PathBuf;

use clap::Parser;

/// Run a DTL script: read input tables, evaluate the transformation, and
/// write output tables, optionally recording a full provenance trace.
#[derive(Debug, Parser)]
#[command(name = "dtl", version, about)]
pub struct Cli {
    /// Script file to run.
    pub script: PathBuf,

    /// Directory containing input tables (one `<name>.json` per table).
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory to write output tables into.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Directory to write the trace manifest and recorded arrays into.
    #[arg(long)]
    pub trace: Option<PathBuf>,

    /// Print the compiled expression graph to stderr.
    #[arg(long)]
    pub dump_ir: bool,
}
