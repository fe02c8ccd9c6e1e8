//! Column scopes.
//!
//! A scope is the ordered mapping from `(name, namespace?)` to an array
//! expression - the unit of state threaded through translation. Table
//! expressions produce scopes; column references consume them. Scopes are
//! small, short-lived values passed up the recursion; insertion order is
//! preserved so traces come out deterministic.

use dtl_core::Symbol;
use dtl_ir::{ExprRef, Graph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeColumn {
    pub name: Symbol,
    /// Table qualifier for `t.col` references. Unqualified entries use
    /// `None`.
    pub namespace: Option<Symbol>,
    pub expression: ExprRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    columns: Vec<ScopeColumn>,
}

impl Scope {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[ScopeColumn] {
        &self.columns
    }

    /// Overwrites the entry for `(name, namespace)` or appends a new one.
    pub fn add_or_replace(
        &mut self,
        name: Symbol,
        namespace: Option<Symbol>,
        expression: ExprRef,
    ) {
        for column in &mut self.columns {
            if column.name == name && column.namespace == namespace {
                column.expression = expression;
                return;
            }
        }
        self.columns.push(ScopeColumn {
            name,
            namespace,
            expression,
        });
    }

    /// Appends without deduplication. Only for callers that already know
    /// the key is absent (namespaced aggregates built from fresh scopes).
    pub fn add_unchecked(&mut self, name: Symbol, namespace: Option<Symbol>, expression: ExprRef) {
        self.columns.push(ScopeColumn {
            name,
            namespace,
            expression,
        });
    }

    /// The last-written entry for `(name, namespace)`.
    pub fn lookup(&self, name: Symbol, namespace: Option<Symbol>) -> Option<ExprRef> {
        self.columns
            .iter()
            .rev()
            .find(|column| column.name == name && column.namespace == namespace)
            .map(|column| column.expression)
    }

    /// Removes every entry whose namespace equals `namespace`.
    pub fn filter_by_namespace(&mut self, namespace: Option<Symbol>) {
        self.columns.retain(|column| column.namespace != namespace);
    }

    /// Keeps only entries whose namespace equals `namespace`.
    pub fn pick_namespace(&mut self, namespace: Option<Symbol>) {
        self.columns.retain(|column| column.namespace == namespace);
    }

    /// Clears every entry's namespace, keeping names and order.
    pub fn clear_namespaces(&mut self) {
        for column in &mut self.columns {
            column.namespace = None;
        }
    }

    pub fn set_expression(&mut self, index: usize, expression: ExprRef) {
        self.columns[index].expression = expression;
    }

    /// The shape shared by every column.
    ///
    /// # Panics
    /// Panics on an empty scope. Scopes built from tables always have at
    /// least one column.
    pub fn shape(&self, graph: &Graph) -> ExprRef {
        let first = self
            .columns
            .first()
            .expect("scope has no columns to take a shape from");
        graph.shape_of(first.expression)
    }
}
