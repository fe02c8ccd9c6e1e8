//! AST-to-IR translation.
//!
//! Walks the parsed script, building scopes and emitting IR expressions.
//! The translation context carries the graph, the importer (for schema
//! lookups), a globals scope holding every assigned table's columns tagged
//! with the table name as namespace, and the accumulating exports and
//! trace snapshots.
//!
//! The translator returns the first error it hits; every error is
//! positioned at the tightest enclosing AST node.

pub mod scope;

#[cfg(test)]
mod translate_tests;

use dtl_core::{Importer, Span};
use dtl_ir::{Column, ExportTable, ExprRef, Graph, GraphError, Program, TraceLevel, TraceSnapshot};

use crate::ast::{
    BinaryOp, ColumnBinding, Expr, JoinClause, JoinConstraint, Script, SelectExpr, Statement,
    TableBinding, TableExpr,
};
use crate::{CompileError, ErrorKind, Result};

pub use scope::{Scope, ScopeColumn};

/// Translates a parsed script into a program over `graph`.
pub fn translate(
    script: &Script,
    graph: &mut Graph,
    importer: &mut dyn Importer,
) -> Result<Program> {
    let translator = Translator {
        graph,
        importer,
        globals: Scope::empty(),
        exports: Vec::new(),
        traces: Vec::new(),
    };
    translator.run(script)
}

struct Translator<'a> {
    graph: &'a mut Graph,
    importer: &'a mut dyn Importer,
    /// Every column of every assigned table, namespaced by table name.
    globals: Scope,
    exports: Vec<ExportTable>,
    traces: Vec<TraceSnapshot>,
}

/// Wraps arena exhaustion into a positioned compile error.
fn resource(span: Span) -> impl FnOnce(GraphError) -> CompileError {
    move |error| CompileError::new(ErrorKind::Resource, span, error.to_string())
}

impl Translator<'_> {
    fn run(mut self, script: &Script) -> Result<Program> {
        for statement in &script.statements {
            self.compile_statement(statement)?;
        }

        Ok(Program {
            exports: self.exports,
            traces: self.traces,
        })
    }

    fn trace(&mut self, level: TraceLevel, span: Span, scope: &Scope) {
        let columns = scope
            .columns()
            .iter()
            .map(|column| Column {
                name: column.name,
                expression: column.expression,
            })
            .collect();

        self.traces.push(TraceSnapshot {
            level,
            span,
            columns,
        });
    }

    /* === Statements ====================================================== */

    fn compile_statement(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::Assignment {
                target,
                expression,
                span,
            } => self.compile_assignment(target, expression, *span),
            Statement::Export {
                expression,
                path,
                span,
            } => self.compile_export(expression, path, *span),
            Statement::Update { span } => Err(CompileError::new(
                ErrorKind::NotImplemented,
                *span,
                "UPDATE statements are not implemented",
            )),
            Statement::Delete { span } => Err(CompileError::new(
                ErrorKind::NotImplemented,
                *span,
                "DELETE statements are not implemented",
            )),
            Statement::Insert { span } => Err(CompileError::new(
                ErrorKind::NotImplemented,
                *span,
                "INSERT statements are not implemented",
            )),
            Statement::Begin { span } => Err(CompileError::new(
                ErrorKind::NotImplemented,
                *span,
                "BEGIN statements are not implemented",
            )),
        }
    }

    fn compile_assignment(
        &mut self,
        target: &crate::ast::Ident,
        expression: &TableExpr,
        span: Span,
    ) -> Result<()> {
        let mut scope = self.compile_table_expr(expression)?;
        scope.pick_namespace(None);

        self.trace(TraceLevel::Statement, span, &scope);

        let table_name = self.graph.intern(&target.name);
        self.globals.filter_by_namespace(Some(table_name));
        for column in scope.columns() {
            self.globals
                .add_unchecked(column.name, Some(table_name), column.expression);
        }

        Ok(())
    }

    fn compile_export(
        &mut self,
        expression: &TableExpr,
        path: &crate::ast::StringLit,
        span: Span,
    ) -> Result<()> {
        let mut scope = self.compile_table_expr(expression)?;
        scope.pick_namespace(None);

        self.trace(TraceLevel::Statement, span, &scope);

        let name = self.graph.intern(&path.value);
        let columns: Vec<Column> = scope
            .columns()
            .iter()
            .map(|column| Column {
                name: column.name,
                expression: column.expression,
            })
            .collect();
        let table = ExportTable { name, columns };

        // A later export to the same path replaces the earlier record.
        match self.exports.iter_mut().find(|export| export.name == name) {
            Some(existing) => *existing = table,
            None => self.exports.push(table),
        }

        Ok(())
    }

    /* === Table expressions =============================================== */

    fn compile_table_expr(&mut self, expression: &TableExpr) -> Result<Scope> {
        match expression {
            TableExpr::Select(select) => self.compile_select(select),
            TableExpr::Import { path, span } => self.compile_import(path, *span),
            TableExpr::Reference { name, span } => self.compile_reference(name, *span),
        }
    }

    fn compile_import(&mut self, path: &crate::ast::StringLit, span: Span) -> Result<Scope> {
        let location = self.graph.intern(&path.value);

        let schema = self
            .importer
            .schema(&path.value)
            .map_err(|error| CompileError::new(ErrorKind::Import, path.span, error.to_string()))?;

        if schema.is_empty() {
            return Err(CompileError::new(
                ErrorKind::Import,
                path.span,
                "imported table has no columns",
            ));
        }

        let shape = self.graph.import_shape(location).map_err(resource(span))?;
        let table = self.graph.open_table(location).map_err(resource(span))?;

        let mut scope = Scope::empty();
        for (name, dtype) in schema.iter() {
            if !dtype.is_array() {
                return Err(CompileError::new(
                    ErrorKind::Import,
                    path.span,
                    format!("column '{name}' has non-array dtype {dtype}"),
                ));
            }

            let name = self.graph.intern(name);
            let column = self
                .graph
                .read_column(dtype, shape, table, name)
                .map_err(resource(span))?;
            scope.add_or_replace(name, None, column);
        }

        self.trace(TraceLevel::TableExpression, span, &scope);
        Ok(scope)
    }

    fn compile_reference(&mut self, name: &crate::ast::Ident, span: Span) -> Result<Scope> {
        let table_name = self.graph.intern(&name.name);

        let mut scope = self.globals.clone();
        scope.pick_namespace(Some(table_name));
        if scope.is_empty() {
            return Err(CompileError::new(
                ErrorKind::UnresolvedTable,
                span,
                format!("could not resolve table '{}'", name.name),
            ));
        }
        scope.clear_namespaces();

        self.trace(TraceLevel::TableExpression, span, &scope);
        Ok(scope)
    }

    fn compile_select(&mut self, select: &SelectExpr) -> Result<Scope> {
        if let Some(distinct) = &select.distinct {
            return Err(CompileError::new(
                ErrorKind::NotImplemented,
                distinct.span,
                "DISTINCT is not implemented",
            ));
        }

        let mut source_scope = self.compile_table_binding(&select.source)?;

        for join in &select.joins {
            source_scope = self.compile_join_clause(join, source_scope)?;
        }

        if let Some(where_clause) = &select.where_clause {
            let predicate_span = where_clause.predicate.span();
            let mask = self.compile_expr(&source_scope, &where_clause.predicate)?;
            self.check_mask(mask, source_scope.shape(self.graph), predicate_span)?;

            let filtered_shape = self.graph.where_shape(mask).map_err(resource(predicate_span))?;
            for index in 0..source_scope.len() {
                let column = source_scope.columns()[index].expression;
                let filtered = self
                    .graph
                    .where_(filtered_shape, column, mask)
                    .map_err(resource(predicate_span))?;
                source_scope.set_expression(index, filtered);
            }
        }

        if let Some(group_by) = &select.group_by {
            return Err(CompileError::new(
                ErrorKind::NotImplemented,
                group_by.span,
                "GROUP BY is not implemented",
            ));
        }

        let mut output_scope = Scope::empty();
        for binding in &select.columns {
            match binding {
                ColumnBinding::Wildcard { span } => {
                    self.expand_wildcard(&source_scope, &mut output_scope, *span)?;
                }
                ColumnBinding::Implicit { expression } => {
                    let compiled = self.compile_expr(&source_scope, expression)?;
                    let name = match expression {
                        Expr::ColumnReference { name, .. } => self.graph.intern(&name.name),
                        _ => {
                            return Err(CompileError::new(
                                ErrorKind::AmbiguousName,
                                expression.span(),
                                "column has no obvious name",
                            ));
                        }
                    };
                    output_scope.add_or_replace(name, None, compiled);
                }
                ColumnBinding::Aliased {
                    expression, alias, ..
                } => {
                    let compiled = self.compile_expr(&source_scope, expression)?;
                    let name = self.graph.intern(&alias.name);
                    output_scope.add_or_replace(name, None, compiled);
                }
            }
        }

        self.trace(TraceLevel::TableExpression, select.span, &output_scope);
        Ok(output_scope)
    }

    /// `SELECT *`: copy the source's distinct names with namespaces
    /// cleared. Two entries sharing a name but not an expression have no
    /// disambiguation rule yet.
    fn expand_wildcard(
        &mut self,
        source_scope: &Scope,
        output_scope: &mut Scope,
        span: Span,
    ) -> Result<()> {
        for column in source_scope.columns() {
            match output_scope.lookup(column.name, None) {
                None => output_scope.add_unchecked(column.name, None, column.expression),
                Some(existing) if existing == column.expression => {}
                Some(_) => {
                    return Err(CompileError::new(
                        ErrorKind::NotImplemented,
                        span,
                        format!(
                            "wildcard cannot disambiguate column '{}'",
                            self.graph.resolve(column.name)
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Compiles a `FROM`/`JOIN` table binding. A binding name - the alias,
    /// or the table's own name for a bare reference - adds a namespaced
    /// duplicate of every column, which is what qualified references
    /// resolve against.
    fn compile_table_binding(&mut self, binding: &TableBinding) -> Result<Scope> {
        let mut scope = self.compile_table_expr(&binding.expression)?;

        let binding_name = match (&binding.alias, &binding.expression) {
            (Some(alias), _) => Some(alias.name.as_str()),
            (None, TableExpr::Reference { name, .. }) => Some(name.name.as_str()),
            (None, _) => None,
        };

        if let Some(binding_name) = binding_name {
            let namespace = self.graph.intern(binding_name);
            for column in scope.columns().to_vec() {
                scope.add_unchecked(column.name, Some(namespace), column.expression);
            }
        }

        Ok(scope)
    }

    /* === Joins =========================================================== */

    fn compile_join_clause(&mut self, join: &JoinClause, left_scope: Scope) -> Result<Scope> {
        let right_scope = self.compile_table_binding(&join.binding)?;

        let left_shape = left_scope.shape(self.graph);
        let right_shape = right_scope.shape(self.graph);

        let join_shape = self
            .graph
            .join_shape(left_shape, right_shape)
            .map_err(resource(join.span))?;
        let left_index = self
            .graph
            .join_left(join_shape, left_shape, right_shape)
            .map_err(resource(join.span))?;
        let right_index = self
            .graph
            .join_right(join_shape, left_shape, right_shape)
            .map_err(resource(join.span))?;

        // The full cartesian scope the predicate runs against. Never
        // traced: an optimizer must stay free to collapse it away.
        let full_scope = self.picked_scope(
            &left_scope,
            &right_scope,
            join_shape,
            left_index,
            right_index,
            join.span,
        )?;

        match &join.constraint {
            None => Ok(full_scope),
            Some(JoinConstraint::On { predicate, .. }) => {
                let predicate_span = predicate.span();
                let mask = self.compile_expr(&full_scope, predicate)?;
                self.check_mask(mask, join_shape, predicate_span)?;

                let filtered_shape =
                    self.graph.where_shape(mask).map_err(resource(predicate_span))?;
                let filtered_left = self
                    .graph
                    .where_(filtered_shape, left_index, mask)
                    .map_err(resource(predicate_span))?;
                let filtered_right = self
                    .graph
                    .where_(filtered_shape, right_index, mask)
                    .map_err(resource(predicate_span))?;

                self.picked_scope(
                    &left_scope,
                    &right_scope,
                    filtered_shape,
                    filtered_left,
                    filtered_right,
                    join.span,
                )
            }
            Some(JoinConstraint::Using { columns, .. }) => {
                // Surface sugar for an equality predicate on the shared
                // columns: refine the selector pair one equality at a time.
                let mut current_left = left_index;
                let mut current_right = right_index;

                for ident in columns {
                    let name = self.graph.intern(&ident.name);
                    let left_column = left_scope.lookup(name, None).ok_or_else(|| {
                        CompileError::new(
                            ErrorKind::UnresolvedColumn,
                            ident.span,
                            format!("could not resolve column '{}' on the left of USING", ident.name),
                        )
                    })?;
                    let right_column = right_scope.lookup(name, None).ok_or_else(|| {
                        CompileError::new(
                            ErrorKind::UnresolvedColumn,
                            ident.span,
                            format!(
                                "could not resolve column '{}' on the right of USING",
                                ident.name
                            ),
                        )
                    })?;

                    if self.graph.dtype_of(left_column) != self.graph.dtype_of(right_column) {
                        return Err(CompileError::new(
                            ErrorKind::TypeMismatch,
                            ident.span,
                            format!(
                                "mismatched dtypes for USING column '{}': {} vs {}",
                                ident.name,
                                self.graph.dtype_of(left_column),
                                self.graph.dtype_of(right_column)
                            ),
                        ));
                    }

                    let stage_shape = self.graph.shape_of(current_left);
                    let left_values = self
                        .graph
                        .pick(stage_shape, left_column, current_left)
                        .map_err(resource(ident.span))?;
                    let right_values = self
                        .graph
                        .pick(stage_shape, right_column, current_right)
                        .map_err(resource(ident.span))?;

                    let mask = self
                        .graph
                        .binary(dtl_ir::BinaryOp::EqualTo, left_values, right_values)
                        .map_err(resource(ident.span))?;
                    let refined_shape =
                        self.graph.where_shape(mask).map_err(resource(ident.span))?;
                    current_left = self
                        .graph
                        .where_(refined_shape, current_left, mask)
                        .map_err(resource(ident.span))?;
                    current_right = self
                        .graph
                        .where_(refined_shape, current_right, mask)
                        .map_err(resource(ident.span))?;
                }

                let final_shape = self.graph.shape_of(current_left);
                self.picked_scope(
                    &left_scope,
                    &right_scope,
                    final_shape,
                    current_left,
                    current_right,
                    join.span,
                )
            }
        }
    }

    /// Rebuilds both sides' columns through a selector pair, preserving
    /// names and namespaces.
    fn picked_scope(
        &mut self,
        left_scope: &Scope,
        right_scope: &Scope,
        shape: ExprRef,
        left_index: ExprRef,
        right_index: ExprRef,
        span: Span,
    ) -> Result<Scope> {
        let mut scope = Scope::empty();

        for column in left_scope.columns() {
            let picked = self
                .graph
                .pick(shape, column.expression, left_index)
                .map_err(resource(span))?;
            scope.add_or_replace(column.name, column.namespace, picked);
        }
        for column in right_scope.columns() {
            let picked = self
                .graph
                .pick(shape, column.expression, right_index)
                .map_err(resource(span))?;
            scope.add_or_replace(column.name, column.namespace, picked);
        }

        Ok(scope)
    }

    /* === Expressions ===================================================== */

    /// A predicate must be a boolean mask over the scope it filters.
    fn check_mask(&self, mask: ExprRef, shape: ExprRef, span: Span) -> Result<()> {
        if self.graph.dtype_of(mask) != dtl_core::DType::BoolArray {
            return Err(CompileError::new(
                ErrorKind::TypeMismatch,
                span,
                format!(
                    "predicate must be bool_array, found {}",
                    self.graph.dtype_of(mask)
                ),
            ));
        }
        if self.graph.shape_of(mask) != shape {
            return Err(CompileError::new(
                ErrorKind::ShapeMismatch,
                span,
                "predicate shape does not match the table it filters",
            ));
        }
        Ok(())
    }

    fn compile_expr(&mut self, scope: &Scope, expression: &Expr) -> Result<ExprRef> {
        match expression {
            Expr::ColumnReference {
                namespace,
                name,
                span,
            } => {
                let name_symbol = self.graph.intern(&name.name);
                let namespace_symbol = namespace
                    .as_ref()
                    .map(|namespace| self.graph.intern(&namespace.name));

                scope.lookup(name_symbol, namespace_symbol).ok_or_else(|| {
                    let shown = match namespace {
                        Some(namespace) => format!("{}.{}", namespace.name, name.name),
                        None => name.name.clone(),
                    };
                    CompileError::new(
                        ErrorKind::UnresolvedColumn,
                        *span,
                        format!("could not resolve column '{shown}'"),
                    )
                })
            }

            Expr::Literal(literal) => Err(CompileError::new(
                ErrorKind::NotImplemented,
                literal.span(),
                "literal expressions are not implemented",
            )),

            Expr::FunctionCall { span, .. } => Err(CompileError::new(
                ErrorKind::NotImplemented,
                *span,
                "function calls are not implemented",
            )),

            Expr::Binary {
                op,
                left,
                right,
                span,
            } => {
                let left = self.compile_expr(scope, left)?;
                let right = self.compile_expr(scope, right)?;

                let left_dtype = self.graph.dtype_of(left);
                let right_dtype = self.graph.dtype_of(right);
                if left_dtype != right_dtype {
                    return Err(CompileError::new(
                        ErrorKind::TypeMismatch,
                        *span,
                        format!("mismatched operand types: {left_dtype} vs {right_dtype}"),
                    ));
                }
                if self.graph.shape_of(left) != self.graph.shape_of(right) {
                    return Err(CompileError::new(
                        ErrorKind::ShapeMismatch,
                        *span,
                        "mismatched operand shapes",
                    ));
                }

                self.graph
                    .binary(ir_binary_op(*op), left, right)
                    .map_err(resource(*span))
            }
        }
    }
}

fn ir_binary_op(op: BinaryOp) -> dtl_ir::BinaryOp {
    match op {
        BinaryOp::EqualTo => dtl_ir::BinaryOp::EqualTo,
        BinaryOp::LessThan => dtl_ir::BinaryOp::LessThan,
        BinaryOp::LessThanOrEqual => dtl_ir::BinaryOp::LessEq,
        BinaryOp::GreaterThan => dtl_ir::BinaryOp::GreaterThan,
        BinaryOp::GreaterThanOrEqual => dtl_ir::BinaryOp::GreaterEq,
        BinaryOp::Add => dtl_ir::BinaryOp::Add,
        BinaryOp::Subtract => dtl_ir::BinaryOp::Subtract,
        BinaryOp::Multiply => dtl_ir::BinaryOp::Multiply,
        BinaryOp::Divide => dtl_ir::BinaryOp::Divide,
    }
}
