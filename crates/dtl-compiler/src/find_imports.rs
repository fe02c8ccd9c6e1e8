//! Import discovery.
//!
//! Walks a script in source order and returns every `IMPORT` path literal,
//! first occurrence per path. Drivers use this to surface the input set
//! before translation runs.

use crate::ast::{
    ColumnBinding, Expr, JoinConstraint, Script, Statement, StringLit, TableBinding, TableExpr,
};

/// Import paths in a stable source-order walk, deduplicated by value.
pub fn find_imports<'a>(script: &'a Script) -> Vec<&'a StringLit> {
    let mut found: Vec<&'a StringLit> = Vec::new();

    for statement in &script.statements {
        match statement {
            Statement::Assignment { expression, .. } | Statement::Export { expression, .. } => {
                walk_table_expr(expression, &mut found);
            }
            Statement::Update { .. }
            | Statement::Delete { .. }
            | Statement::Insert { .. }
            | Statement::Begin { .. } => {}
        }
    }

    found
}

fn walk_table_expr<'a>(expression: &'a TableExpr, found: &mut Vec<&'a StringLit>) {
    match expression {
        TableExpr::Import { path, .. } => {
            if !found.iter().any(|lit| lit.value == path.value) {
                found.push(path);
            }
        }
        TableExpr::Reference { .. } => {}
        TableExpr::Select(select) => {
            for binding in &select.columns {
                match binding {
                    ColumnBinding::Wildcard { .. } => {}
                    ColumnBinding::Implicit { expression } => walk_expr(expression, found),
                    ColumnBinding::Aliased { expression, .. } => walk_expr(expression, found),
                }
            }

            walk_table_binding(&select.source, found);

            for join in &select.joins {
                walk_table_binding(&join.binding, found);
                if let Some(JoinConstraint::On { predicate, .. }) = &join.constraint {
                    walk_expr(predicate, found);
                }
            }

            if let Some(where_clause) = &select.where_clause {
                walk_expr(&where_clause.predicate, found);
            }

            if let Some(group_by) = &select.group_by {
                for expression in &group_by.expressions {
                    walk_expr(expression, found);
                }
            }
        }
    }
}

fn walk_table_binding<'a>(binding: &'a TableBinding, found: &mut Vec<&'a StringLit>) {
    walk_table_expr(&binding.expression, found);
}

fn walk_expr<'a>(expression: &'a Expr, found: &mut Vec<&'a StringLit>) {
    match expression {
        Expr::ColumnReference { .. } | Expr::Literal(_) => {}
        Expr::FunctionCall { arguments, .. } => {
            for argument in arguments {
                walk_expr(argument, found);
            }
        }
        Expr::Binary { left, right, .. } => {
            walk_expr(left, found);
            walk_expr(right, found);
        }
    }
}
