//! The command-list interpreter.
//!
//! Maintains two bindings - shape lengths and array values - plus a cache
//! of open tables, and dispatches each command to a kernel. `Collect` is
//! the sole release point for array memory.

use std::collections::HashMap;

use indexmap::IndexMap;

use dtl_core::{Array, Exporter, Importer, Symbol, Table, Tracer};
use dtl_ir::{BinaryOp, Command, ExprKind, ExprRef, Graph};

use super::error::RuntimeError;
use super::kernels;

pub struct Evaluator<'a> {
    graph: &'a Graph,
    importer: &'a mut dyn Importer,
    exporter: &'a mut dyn Exporter,
    tracer: &'a mut dyn Tracer,

    shapes: HashMap<ExprRef, usize>,
    arrays: HashMap<ExprRef, Array>,
    /// Open input tables, keyed by interned location. Opened once per run.
    tables: IndexMap<Symbol, Box<dyn Table>>,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        graph: &'a Graph,
        importer: &'a mut dyn Importer,
        exporter: &'a mut dyn Exporter,
        tracer: &'a mut dyn Tracer,
    ) -> Self {
        Self {
            graph,
            importer,
            exporter,
            tracer,
            shapes: HashMap::new(),
            arrays: HashMap::new(),
            tables: IndexMap::new(),
        }
    }

    /// Executes the command list in order.
    pub fn run(&mut self, commands: &[Command]) -> Result<(), RuntimeError> {
        for command in commands {
            match command {
                Command::EvaluateShape { expression } => self.eval_shape(*expression)?,
                Command::EvaluateArray { expression } => self.eval_array(*expression)?,
                Command::TraceArray { array, expression } => {
                    let value = self.array(*expression).clone();
                    self.tracer.write_array(*array, &value)?;
                }
                Command::CollectArray { expression } => {
                    self.arrays.remove(expression);
                }
                Command::ExportTable {
                    name,
                    schema,
                    columns,
                } => {
                    let data: Vec<Array> = columns
                        .iter()
                        .map(|&column| self.array(column).clone())
                        .collect();
                    self.exporter
                        .export(self.graph.resolve(*name), schema, data)?;
                }
            }
        }
        Ok(())
    }

    fn eval_shape(&mut self, expression: ExprRef) -> Result<(), RuntimeError> {
        let length = match self.graph.kind(expression) {
            ExprKind::ImportShape => {
                let location = self.graph.location_of(expression);
                self.open(location)?.num_rows()
            }
            ExprKind::WhereShape => {
                let mask = self.graph.dependencies(expression)[0];
                let mask = self.array(mask).as_bool().expect("mask must be bool");
                kernels::count_true(mask)
            }
            ExprKind::JoinShape => {
                let deps = self.graph.dependencies(expression);
                self.shape_len(deps[0]) * self.shape_len(deps[1])
            }
            kind => panic!("{} is not a shape expression", kind.name()),
        };

        self.shapes.insert(expression, length);
        Ok(())
    }

    fn eval_array(&mut self, expression: ExprRef) -> Result<(), RuntimeError> {
        let kind = self.graph.kind(expression);

        // Table handles bind into the table cache, not the value map.
        if kind == ExprKind::OpenTable {
            let location = self.graph.location_of(expression);
            self.open(location)?;
            return Ok(());
        }

        let value = match kind {
            ExprKind::Int64Constant => {
                let length = self.shape_len(self.graph.shape_of(expression));
                kernels::broadcast_int64(self.graph.int64_value_of(expression), length)
            }
            ExprKind::DoubleConstant => {
                let length = self.shape_len(self.graph.shape_of(expression));
                kernels::broadcast_double(self.graph.double_value_of(expression), length)
            }
            ExprKind::ReadColumn => {
                let table = self.graph.operands(expression)[0];
                let location = self.graph.location_of(table);
                let name = self.graph.resolve(self.graph.column_name_of(expression));

                let expected_rows = self.shape_len(self.graph.shape_of(expression));
                let expected_dtype = self.graph.dtype_of(expression);

                let handle = self
                    .tables
                    .get(&location)
                    .expect("table opened before its columns are read");
                let array = handle.column(name)?;
                kernels::check_column(name, &array, expected_dtype, expected_rows)?;
                array
            }
            ExprKind::Where => {
                let operands = self.graph.operands(expression);
                let mask = self.array(operands[1]).as_bool().expect("mask must be bool");
                kernels::filter(self.array(operands[0]), mask)
            }
            ExprKind::Pick => {
                let operands = self.graph.operands(expression);
                let indexes = self
                    .array(operands[1])
                    .as_index()
                    .expect("pick indexes must be an index array");
                kernels::pick(self.array(operands[0]), indexes)?
            }
            ExprKind::Index => {
                let source = self.graph.operands(expression)[0];
                Array::Index(kernels::sort_index(self.array(source)))
            }
            ExprKind::JoinLeft => {
                let operands = self.graph.operands(expression);
                Array::Index(kernels::join_left_index(
                    self.shape_len(operands[0]),
                    self.shape_len(operands[1]),
                ))
            }
            ExprKind::JoinRight => {
                let operands = self.graph.operands(expression);
                Array::Index(kernels::join_right_index(
                    self.shape_len(operands[0]),
                    self.shape_len(operands[1]),
                ))
            }
            ExprKind::EqualTo
            | ExprKind::LessThan
            | ExprKind::LessEq
            | ExprKind::GreaterThan
            | ExprKind::GreaterEq => {
                let operands = self.graph.operands(expression);
                Array::Bool(kernels::compare(
                    binary_op(kind),
                    self.array(operands[0]),
                    self.array(operands[1]),
                ))
            }
            ExprKind::Add | ExprKind::Subtract | ExprKind::Multiply | ExprKind::Divide => {
                let operands = self.graph.operands(expression);
                kernels::arithmetic(
                    binary_op(kind),
                    self.array(operands[0]),
                    self.array(operands[1]),
                )?
            }
            ExprKind::OpenTable
            | ExprKind::ImportShape
            | ExprKind::WhereShape
            | ExprKind::JoinShape => {
                unreachable!("{} handled above", kind.name())
            }
        };

        self.arrays.insert(expression, value);
        Ok(())
    }

    /// Opens a table, reusing the handle when the location repeats.
    fn open(&mut self, location: Symbol) -> Result<&dyn Table, RuntimeError> {
        if !self.tables.contains_key(&location) {
            let handle = self.importer.open(self.graph.resolve(location))?;
            self.tables.insert(location, handle);
        }
        Ok(self.tables[&location].as_ref())
    }

    /// The evaluated length of a shape.
    ///
    /// # Panics
    /// Panics if the shape has not been evaluated; lowering orders shapes
    /// before their users.
    fn shape_len(&self, shape: ExprRef) -> usize {
        *self
            .shapes
            .get(&shape)
            .expect("shape evaluated before its users")
    }

    /// The evaluated value of an array expression.
    ///
    /// # Panics
    /// Panics if the value is unbound (not yet evaluated, or already
    /// collected); lowering rules both out.
    fn array(&self, expression: ExprRef) -> &Array {
        self.arrays
            .get(&expression)
            .expect("array evaluated before its users and live until collected")
    }
}

fn binary_op(kind: ExprKind) -> BinaryOp {
    match kind {
        ExprKind::EqualTo => BinaryOp::EqualTo,
        ExprKind::LessThan => BinaryOp::LessThan,
        ExprKind::LessEq => BinaryOp::LessEq,
        ExprKind::GreaterThan => BinaryOp::GreaterThan,
        ExprKind::GreaterEq => BinaryOp::GreaterEq,
        ExprKind::Add => BinaryOp::Add,
        ExprKind::Subtract => BinaryOp::Subtract,
        ExprKind::Multiply => BinaryOp::Multiply,
        ExprKind::Divide => BinaryOp::Divide,
        _ => unreachable!(),
    }
}
