//! The expression graph arena.
//!
//! Nodes live in a struct-of-arrays arena: a flat node vector plus one
//! shared dependency pool, indexed by cumulative offsets. References are
//! plain `u32` indexes ([`ExprRef`]), never pointers, so the mark/compact
//! collector is free to move nodes.
//!
//! Construction value-numbers: building a structurally identical expression
//! twice returns the same reference. Dependencies always point at smaller
//! indexes, so index order is a valid evaluation order.
//!
//! Structural preconditions (operand dtypes and shapes) are enforced with
//! assertions: violating them is a compiler bug, not a user error. The only
//! runtime failures are capacity exhaustion.

use std::collections::HashMap;

use dtl_core::{DType, Interner, Symbol};

/// A stable reference to an expression in a [`Graph`].
///
/// Only valid for the graph that produced it. After a [`Graph::collect`],
/// pre-collection references must be translated with [`Graph::remap`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct ExprRef(u32);

impl ExprRef {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ExprRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Expression variants. Shapes first, then arrays.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ExprKind {
    /// Row count of an imported table, known only at evaluation.
    ImportShape,
    /// Population count of a boolean mask.
    WhereShape,
    /// Cartesian product of two shapes.
    JoinShape,

    /// A scalar broadcast over a shape.
    Int64Constant,
    DoubleConstant,
    /// Opaque handle to an imported table.
    OpenTable,
    /// Column extraction from an open table.
    ReadColumn,
    /// Elements of `source` where `mask` is true.
    Where,
    /// `out[i] = source[indexes[i]]`.
    Pick,
    /// Stable sort permutation of `source`.
    Index,
    /// Left selector of a cartesian join.
    JoinLeft,
    /// Right selector of a cartesian join.
    JoinRight,

    EqualTo,
    LessThan,
    LessEq,
    GreaterThan,
    GreaterEq,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ExprKind {
    pub fn is_shape(self) -> bool {
        matches!(
            self,
            ExprKind::ImportShape | ExprKind::WhereShape | ExprKind::JoinShape
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ExprKind::ImportShape => "import_shape",
            ExprKind::WhereShape => "where_shape",
            ExprKind::JoinShape => "join_shape",
            ExprKind::Int64Constant => "int64_constant",
            ExprKind::DoubleConstant => "double_constant",
            ExprKind::OpenTable => "open_table",
            ExprKind::ReadColumn => "read_column",
            ExprKind::Where => "where",
            ExprKind::Pick => "pick",
            ExprKind::Index => "index",
            ExprKind::JoinLeft => "join_left",
            ExprKind::JoinRight => "join_right",
            ExprKind::EqualTo => "equal_to",
            ExprKind::LessThan => "less_than",
            ExprKind::LessEq => "less_eq",
            ExprKind::GreaterThan => "greater_than",
            ExprKind::GreaterEq => "greater_eq",
            ExprKind::Add => "add",
            ExprKind::Subtract => "subtract",
            ExprKind::Multiply => "multiply",
            ExprKind::Divide => "divide",
        }
    }
}

/// Pointwise binary operators over two arrays of identical dtype and shape.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BinaryOp {
    EqualTo,
    LessThan,
    LessEq,
    GreaterThan,
    GreaterEq,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::EqualTo
                | BinaryOp::LessThan
                | BinaryOp::LessEq
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterEq
        )
    }

    pub fn kind(self) -> ExprKind {
        match self {
            BinaryOp::EqualTo => ExprKind::EqualTo,
            BinaryOp::LessThan => ExprKind::LessThan,
            BinaryOp::LessEq => ExprKind::LessEq,
            BinaryOp::GreaterThan => ExprKind::GreaterThan,
            BinaryOp::GreaterEq => ExprKind::GreaterEq,
            BinaryOp::Add => ExprKind::Add,
            BinaryOp::Subtract => ExprKind::Subtract,
            BinaryOp::Multiply => ExprKind::Multiply,
            BinaryOp::Divide => ExprKind::Divide,
        }
    }
}

/// Errors surfaced when the arena runs out of room.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GraphError {
    #[error("expression graph is full ({capacity} nodes)")]
    GraphFull { capacity: usize },

    #[error("expression dependency arena is full ({capacity} entries)")]
    DependenciesFull { capacity: usize },
}

/// Immediate payload of a node.
#[derive(Clone, Copy, PartialEq, Debug)]
enum Immediate {
    None,
    Int(i64),
    Double(f64),
    Name(Symbol),
}

impl Immediate {
    /// Hashable form. Doubles hash by bit pattern.
    fn key(self) -> ImmediateKey {
        match self {
            Immediate::None => ImmediateKey::None,
            Immediate::Int(value) => ImmediateKey::Int(value),
            Immediate::Double(value) => ImmediateKey::Bits(value.to_bits()),
            Immediate::Name(name) => ImmediateKey::Name(name),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum ImmediateKey {
    None,
    Int(i64),
    Bits(u64),
    Name(Symbol),
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
struct NodeKey {
    kind: ExprKind,
    dtype: Option<DType>,
    imm: ImmediateKey,
    deps: Vec<ExprRef>,
}

#[derive(Clone, Copy, Debug)]
struct Node {
    kind: ExprKind,
    /// Array dtype. `None` for shapes and table handles.
    dtype: Option<DType>,
    imm: Immediate,
    /// End of this node's slice in the dependency pool. The start is the
    /// previous node's end, so operand slices need no per-node allocation.
    deps_end: u32,
}

const DEFAULT_NODE_CAPACITY: usize = 1 << 20;
const DEFAULT_DEPS_CAPACITY: usize = 1 << 22;

/// The arena owning every IR expression and the interned-string pool.
pub struct Graph {
    nodes: Vec<Node>,
    deps: Vec<ExprRef>,
    interner: Interner,
    dedup: HashMap<NodeKey, ExprRef>,
    roots: Vec<ExprRef>,
    /// Old-index to new-index table from the last `collect`. Cleared by any
    /// mutation.
    relocations: Option<Vec<Option<ExprRef>>>,
    node_capacity: usize,
    deps_capacity: usize,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_NODE_CAPACITY, DEFAULT_DEPS_CAPACITY)
    }

    pub fn with_capacity(node_capacity: usize, deps_capacity: usize) -> Self {
        assert!(node_capacity <= u32::MAX as usize);
        assert!(deps_capacity <= u32::MAX as usize);

        Self {
            nodes: Vec::new(),
            deps: Vec::new(),
            interner: Interner::new(),
            dedup: HashMap::new(),
            roots: Vec::new(),
            relocations: None,
            node_capacity,
            deps_capacity,
        }
    }

    /// Number of live expressions.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walks every expression in insertion order. Dependencies always
    /// precede their dependents.
    pub fn iter(&self) -> impl Iterator<Item = ExprRef> + use<> {
        (0..self.nodes.len() as u32).map(ExprRef)
    }

    /* === Interning ======================================================= */

    pub fn intern(&mut self, s: &str) -> Symbol {
        self.interner.intern(s)
    }

    pub fn intern_owned(&mut self, s: String) -> Symbol {
        self.interner.intern_owned(s)
    }

    pub fn resolve(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    /* === Construction ==================================================== */

    fn push(
        &mut self,
        kind: ExprKind,
        dtype: Option<DType>,
        imm: Immediate,
        deps: &[ExprRef],
    ) -> Result<ExprRef, GraphError> {
        for &dep in deps {
            debug_assert!(dep.index() < self.nodes.len());
        }

        let key = NodeKey {
            kind,
            dtype,
            imm: imm.key(),
            deps: deps.to_vec(),
        };
        if let Some(&existing) = self.dedup.get(&key) {
            return Ok(existing);
        }

        if self.nodes.len() >= self.node_capacity {
            return Err(GraphError::GraphFull {
                capacity: self.node_capacity,
            });
        }
        if self.deps.len() + deps.len() > self.deps_capacity {
            return Err(GraphError::DependenciesFull {
                capacity: self.deps_capacity,
            });
        }

        // Any mutation invalidates the previous collection's remap table.
        self.relocations = None;

        let reference = ExprRef(self.nodes.len() as u32);
        self.deps.extend_from_slice(deps);
        self.nodes.push(Node {
            kind,
            dtype,
            imm,
            deps_end: self.deps.len() as u32,
        });
        self.dedup.insert(key, reference);

        Ok(reference)
    }

    pub fn import_shape(&mut self, location: Symbol) -> Result<ExprRef, GraphError> {
        self.push(ExprKind::ImportShape, None, Immediate::Name(location), &[])
    }

    pub fn where_shape(&mut self, mask: ExprRef) -> Result<ExprRef, GraphError> {
        assert_eq!(self.dtype_of(mask), DType::BoolArray);
        self.push(ExprKind::WhereShape, None, Immediate::None, &[mask])
    }

    pub fn join_shape(&mut self, left: ExprRef, right: ExprRef) -> Result<ExprRef, GraphError> {
        assert!(self.is_shape(left));
        assert!(self.is_shape(right));
        self.push(ExprKind::JoinShape, None, Immediate::None, &[left, right])
    }

    pub fn int64_constant(&mut self, shape: ExprRef, value: i64) -> Result<ExprRef, GraphError> {
        assert!(self.is_shape(shape));
        self.push(
            ExprKind::Int64Constant,
            Some(DType::Int64Array),
            Immediate::Int(value),
            &[shape],
        )
    }

    pub fn double_constant(&mut self, shape: ExprRef, value: f64) -> Result<ExprRef, GraphError> {
        assert!(self.is_shape(shape));
        self.push(
            ExprKind::DoubleConstant,
            Some(DType::DoubleArray),
            Immediate::Double(value),
            &[shape],
        )
    }

    pub fn open_table(&mut self, location: Symbol) -> Result<ExprRef, GraphError> {
        self.push(ExprKind::OpenTable, None, Immediate::Name(location), &[])
    }

    /// Column extraction. `shape` must be the `ImportShape` of `table`.
    pub fn read_column(
        &mut self,
        dtype: DType,
        shape: ExprRef,
        table: ExprRef,
        name: Symbol,
    ) -> Result<ExprRef, GraphError> {
        assert!(dtype.is_array());
        assert!(self.is_shape(shape));
        assert_eq!(self.kind(table), ExprKind::OpenTable);
        self.push(
            ExprKind::ReadColumn,
            Some(dtype),
            Immediate::Name(name),
            &[shape, table],
        )
    }

    /// Mask selection. The result lives in `shape`, which must be the
    /// `WhereShape` of `mask`.
    pub fn where_(
        &mut self,
        shape: ExprRef,
        source: ExprRef,
        mask: ExprRef,
    ) -> Result<ExprRef, GraphError> {
        assert_eq!(self.kind(shape), ExprKind::WhereShape);
        assert_eq!(self.dtype_of(mask), DType::BoolArray);
        assert_eq!(self.shape_of(source), self.shape_of(mask));
        let dtype = self.dtype_of(source);
        self.push(ExprKind::Where, Some(dtype), Immediate::None, &[
            shape, source, mask,
        ])
    }

    /// The universal reindex: `out[i] = source[indexes[i]]`.
    pub fn pick(
        &mut self,
        shape: ExprRef,
        source: ExprRef,
        indexes: ExprRef,
    ) -> Result<ExprRef, GraphError> {
        assert!(self.is_shape(shape));
        assert_eq!(self.dtype_of(indexes), DType::IndexArray);
        assert_eq!(self.shape_of(indexes), shape);
        let dtype = self.dtype_of(source);
        self.push(ExprKind::Pick, Some(dtype), Immediate::None, &[
            shape, source, indexes,
        ])
    }

    /// Stable sort permutation: indexes that order `source` ascending.
    pub fn index(&mut self, source: ExprRef) -> Result<ExprRef, GraphError> {
        let shape = self.shape_of(source);
        self.push(ExprKind::Index, Some(DType::IndexArray), Immediate::None, &[
            shape, source,
        ])
    }

    /// Left selector of the cartesian product of `left` and `right`:
    /// every left position, repeated once per right position.
    pub fn join_left(
        &mut self,
        shape: ExprRef,
        left: ExprRef,
        right: ExprRef,
    ) -> Result<ExprRef, GraphError> {
        assert_eq!(self.kind(shape), ExprKind::JoinShape);
        assert!(self.is_shape(left));
        assert!(self.is_shape(right));
        self.push(
            ExprKind::JoinLeft,
            Some(DType::IndexArray),
            Immediate::None,
            &[shape, left, right],
        )
    }

    /// Right selector of the cartesian product of `left` and `right`.
    pub fn join_right(
        &mut self,
        shape: ExprRef,
        left: ExprRef,
        right: ExprRef,
    ) -> Result<ExprRef, GraphError> {
        assert_eq!(self.kind(shape), ExprKind::JoinShape);
        assert!(self.is_shape(left));
        assert!(self.is_shape(right));
        self.push(
            ExprKind::JoinRight,
            Some(DType::IndexArray),
            Immediate::None,
            &[shape, left, right],
        )
    }

    /// Pointwise binary operation. Operands must agree on dtype and shape;
    /// comparisons produce `BoolArray`, arithmetic preserves the dtype.
    pub fn binary(
        &mut self,
        op: BinaryOp,
        left: ExprRef,
        right: ExprRef,
    ) -> Result<ExprRef, GraphError> {
        assert_eq!(self.dtype_of(left), self.dtype_of(right));
        let shape = self.shape_of(left);
        assert_eq!(shape, self.shape_of(right));

        let dtype = if op.is_comparison() {
            DType::BoolArray
        } else {
            self.dtype_of(left)
        };

        self.push(op.kind(), Some(dtype), Immediate::None, &[
            shape, left, right,
        ])
    }

    /* === Accessors ======================================================= */

    fn node(&self, reference: ExprRef) -> &Node {
        &self.nodes[reference.index()]
    }

    pub fn kind(&self, reference: ExprRef) -> ExprKind {
        self.node(reference).kind
    }

    pub fn is_shape(&self, reference: ExprRef) -> bool {
        self.node(reference).kind.is_shape()
    }

    /// Whether the expression evaluates to an array of values. Table
    /// handles are neither shapes nor value arrays.
    pub fn is_array(&self, reference: ExprRef) -> bool {
        self.node(reference).dtype.is_some()
    }

    /// Dtype of an array expression.
    ///
    /// # Panics
    /// Panics on shape expressions and table handles.
    pub fn dtype_of(&self, reference: ExprRef) -> DType {
        self.node(reference)
            .dtype
            .unwrap_or_else(|| panic!("{} is not an array expression", reference))
    }

    /// Shape of an array expression, stored as its first dependency.
    ///
    /// # Panics
    /// Panics on shape expressions and table handles.
    pub fn shape_of(&self, reference: ExprRef) -> ExprRef {
        assert!(
            self.is_array(reference),
            "{reference} is not an array expression"
        );
        self.dependencies(reference)[0]
    }

    /// All stored dependencies in canonical order. For array expressions
    /// the shape comes first, then the operands.
    pub fn dependencies(&self, reference: ExprRef) -> &[ExprRef] {
        let start = match reference.index() {
            0 => 0,
            i => self.nodes[i - 1].deps_end as usize,
        };
        let end = self.node(reference).deps_end as usize;
        &self.deps[start..end]
    }

    /// Value operands: dependencies without the leading shape entry of
    /// array expressions.
    pub fn operands(&self, reference: ExprRef) -> &[ExprRef] {
        let deps = self.dependencies(reference);
        if self.is_array(reference) { &deps[1..] } else { deps }
    }

    /// Import location of an `ImportShape` or `OpenTable`.
    pub fn location_of(&self, reference: ExprRef) -> Symbol {
        assert!(matches!(
            self.kind(reference),
            ExprKind::ImportShape | ExprKind::OpenTable
        ));
        match self.node(reference).imm {
            Immediate::Name(name) => name,
            _ => unreachable!(),
        }
    }

    /// Column name of a `ReadColumn`.
    pub fn column_name_of(&self, reference: ExprRef) -> Symbol {
        assert_eq!(self.kind(reference), ExprKind::ReadColumn);
        match self.node(reference).imm {
            Immediate::Name(name) => name,
            _ => unreachable!(),
        }
    }

    /// Value of an `Int64Constant`.
    pub fn int64_value_of(&self, reference: ExprRef) -> i64 {
        assert_eq!(self.kind(reference), ExprKind::Int64Constant);
        match self.node(reference).imm {
            Immediate::Int(value) => value,
            _ => unreachable!(),
        }
    }

    /// Value of a `DoubleConstant`.
    pub fn double_value_of(&self, reference: ExprRef) -> f64 {
        assert_eq!(self.kind(reference), ExprKind::DoubleConstant);
        match self.node(reference).imm {
            Immediate::Double(value) => value,
            _ => unreachable!(),
        }
    }

    /* === Garbage collection ============================================== */

    /// Marks an expression, and transitively its dependencies, to be
    /// retained by the next [`Graph::collect`].
    pub fn mark_root(&mut self, reference: ExprRef) {
        assert!(reference.index() < self.nodes.len());
        self.roots.push(reference);
    }

    /// Compacts the arena, dropping every expression not reachable from a
    /// marked root. Clears the marked roots. Until the next insertion,
    /// [`Graph::remap`] translates pre-collection references.
    pub fn collect(&mut self) {
        let mut marks = vec![false; self.nodes.len()];
        for &root in &self.roots {
            marks[root.index()] = true;
        }

        // Dependencies have strictly smaller indexes, so one reverse pass
        // propagates every mark.
        for i in (0..self.nodes.len()).rev() {
            if !marks[i] {
                continue;
            }
            let start = if i == 0 {
                0
            } else {
                self.nodes[i - 1].deps_end as usize
            };
            let end = self.nodes[i].deps_end as usize;
            for &dep in &self.deps[start..end] {
                marks[dep.index()] = true;
            }
        }

        let mut relocations: Vec<Option<ExprRef>> = vec![None; self.nodes.len()];
        let mut new_nodes: Vec<Node> = Vec::new();
        let mut new_deps: Vec<ExprRef> = Vec::new();

        for i in 0..self.nodes.len() {
            if !marks[i] {
                continue;
            }

            let start = if i == 0 {
                0
            } else {
                self.nodes[i - 1].deps_end as usize
            };
            let end = self.nodes[i].deps_end as usize;

            relocations[i] = Some(ExprRef(new_nodes.len() as u32));
            for &dep in &self.deps[start..end] {
                let relocated = relocations[dep.index()]
                    .unwrap_or_else(|| panic!("dependency {dep} dropped before its dependent"));
                new_deps.push(relocated);
            }

            let node = self.nodes[i];
            new_nodes.push(Node {
                deps_end: new_deps.len() as u32,
                ..node
            });
        }

        self.nodes = new_nodes;
        self.deps = new_deps;
        self.roots.clear();

        self.dedup.clear();
        for reference in (0..self.nodes.len() as u32).map(ExprRef) {
            let node = *self.node(reference);
            let key = NodeKey {
                kind: node.kind,
                dtype: node.dtype,
                imm: node.imm.key(),
                deps: self.dependencies(reference).to_vec(),
            };
            self.dedup.insert(key, reference);
        }

        self.relocations = Some(relocations);
    }

    /// Translates a pre-collection reference into the compacted graph.
    /// Returns `None` for collected expressions.
    ///
    /// # Panics
    /// Panics if the graph has been mutated since the last `collect`.
    pub fn remap(&self, reference: ExprRef) -> Option<ExprRef> {
        let relocations = self
            .relocations
            .as_ref()
            .expect("remap is only valid immediately after collect");
        relocations[reference.index()]
    }
}
