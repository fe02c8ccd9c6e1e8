//! The `dtl` binary: compile and evaluate a script against filesystem
//! tables.

use std::fs;
use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;

use dtl_compiler::render::render_error;
use dtl_core::{IoError, NoopTracer};
use dtl_ir::{Graph, dump, lower};
use dtl_vm::{Evaluator, RuntimeError, write_manifest};

mod cli;
mod fsio;

#[cfg(test)]
mod fsio_tests;

use cli::Cli;
use fsio::{FsExporter, FsImporter, FsTracer};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("could not read script '{path}': {error}")]
    ReadScript {
        path: String,
        error: std::io::Error,
    },

    /// Already rendered with source context.
    #[error("{0}")]
    Compile(String),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Io(#[from] IoError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Compile(rendered)) => {
            eprintln!("{rendered}");
            ExitCode::FAILURE
        }
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let script_path = cli.script.display().to_string();
    let source = fs::read_to_string(&cli.script).map_err(|error| CliError::ReadScript {
        path: script_path.clone(),
        error,
    })?;

    let mut importer = FsImporter::new(&cli.input);
    let mut graph = Graph::new();

    let program = dtl_compiler::compile(&source, &mut graph, &mut importer).map_err(|error| {
        let colored = std::io::stderr().is_terminal();
        CliError::Compile(render_error(&error, &source, &script_path, colored))
    })?;

    let lowered = lower(&graph, &program);

    if cli.dump_ir {
        eprint!("{}", dump(&graph));
    }

    let mut exporter = FsExporter::new(&cli.output);

    match &cli.trace {
        Some(trace_root) => {
            let mut tracer = FsTracer::new(trace_root)?;
            Evaluator::new(&graph, &mut importer, &mut exporter, &mut tracer)
                .run(&lowered.commands)?;
            write_manifest(
                &mut tracer,
                &source,
                &script_path,
                &graph,
                &program,
                &lowered,
            )?;
            tracer.finish()?;
        }
        None => {
            let mut tracer = NoopTracer;
            Evaluator::new(&graph, &mut importer, &mut exporter, &mut tracer)
                .run(&lowered.commands)?;
        }
    }

    Ok(())
}
