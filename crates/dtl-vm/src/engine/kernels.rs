//! Array kernels.
//!
//! Pure functions over owned arrays. Dtype and length agreement between
//! operands is the lowering's contract; violations panic. Data-dependent
//! faults (bad pick indexes, division by zero) surface as `RuntimeError`.

use dtl_core::{Array, DType};
use dtl_ir::BinaryOp;

use super::error::RuntimeError;

/// Elements of `source` where `mask` is true.
pub fn filter(source: &Array, mask: &[bool]) -> Array {
    assert_eq!(source.len(), mask.len(), "mask length mismatch");

    fn keep<T: Clone>(values: &[T], mask: &[bool]) -> Vec<T> {
        values
            .iter()
            .zip(mask)
            .filter(|&(_, &keep)| keep)
            .map(|(value, _)| value.clone())
            .collect()
    }

    match source {
        Array::Bool(values) => Array::Bool(keep(values, mask)),
        Array::Int64(values) => Array::Int64(keep(values, mask)),
        Array::Double(values) => Array::Double(keep(values, mask)),
        Array::String(values) => Array::String(keep(values, mask)),
        Array::Index(values) => Array::Index(keep(values, mask)),
    }
}

/// `out[i] = source[indexes[i]]`.
pub fn pick(source: &Array, indexes: &[usize]) -> Result<Array, RuntimeError> {
    let length = source.len();
    if let Some(&index) = indexes.iter().find(|&&index| index >= length) {
        return Err(RuntimeError::IndexOutOfBounds { index, length });
    }

    fn gather<T: Clone>(values: &[T], indexes: &[usize]) -> Vec<T> {
        indexes.iter().map(|&index| values[index].clone()).collect()
    }

    Ok(match source {
        Array::Bool(values) => Array::Bool(gather(values, indexes)),
        Array::Int64(values) => Array::Int64(gather(values, indexes)),
        Array::Double(values) => Array::Double(gather(values, indexes)),
        Array::String(values) => Array::String(gather(values, indexes)),
        Array::Index(values) => Array::Index(gather(values, indexes)),
    })
}

/// Indexes that order `source` ascending. Stable: equal elements keep
/// their original order.
pub fn sort_index(source: &Array) -> Vec<usize> {
    fn argsort<T, F: Fn(&T, &T) -> std::cmp::Ordering>(values: &[T], cmp: F) -> Vec<usize> {
        let mut indexes: Vec<usize> = (0..values.len()).collect();
        indexes.sort_by(|&a, &b| cmp(&values[a], &values[b]));
        indexes
    }

    match source {
        Array::Bool(values) => argsort(values, Ord::cmp),
        Array::Int64(values) => argsort(values, Ord::cmp),
        Array::Double(values) => argsort(values, f64::total_cmp),
        Array::String(values) => argsort(values, Ord::cmp),
        Array::Index(values) => argsort(values, Ord::cmp),
    }
}

/// Left selector of a cartesian product: each left position repeated once
/// per right position.
pub fn join_left_index(left_len: usize, right_len: usize) -> Vec<usize> {
    (0..left_len * right_len).map(|i| i / right_len).collect()
}

/// Right selector of a cartesian product.
pub fn join_right_index(left_len: usize, right_len: usize) -> Vec<usize> {
    (0..left_len * right_len).map(|i| i % right_len).collect()
}

/// Pointwise comparison of two arrays of identical dtype and length.
pub fn compare(op: BinaryOp, left: &Array, right: &Array) -> Vec<bool> {
    assert!(op.is_comparison());
    assert_eq!(left.dtype(), right.dtype(), "operand dtype mismatch");
    assert_eq!(left.len(), right.len(), "operand length mismatch");

    fn pointwise<T: PartialOrd>(op: BinaryOp, left: &[T], right: &[T]) -> Vec<bool> {
        left.iter()
            .zip(right)
            .map(|(l, r)| match op {
                BinaryOp::EqualTo => l == r,
                BinaryOp::LessThan => l < r,
                BinaryOp::LessEq => l <= r,
                BinaryOp::GreaterThan => l > r,
                BinaryOp::GreaterEq => l >= r,
                _ => unreachable!(),
            })
            .collect()
    }

    match (left, right) {
        (Array::Bool(l), Array::Bool(r)) => pointwise(op, l, r),
        (Array::Int64(l), Array::Int64(r)) => pointwise(op, l, r),
        (Array::Double(l), Array::Double(r)) => pointwise(op, l, r),
        (Array::String(l), Array::String(r)) => pointwise(op, l, r),
        (Array::Index(l), Array::Index(r)) => pointwise(op, l, r),
        _ => unreachable!("operand dtype mismatch"),
    }
}

/// Pointwise arithmetic over two arrays of identical dtype and length.
///
/// Integer faults (overflow, division by zero) are data errors, not
/// panics. Doubles follow IEEE semantics.
pub fn arithmetic(op: BinaryOp, left: &Array, right: &Array) -> Result<Array, RuntimeError> {
    assert!(!op.is_comparison());
    assert_eq!(left.dtype(), right.dtype(), "operand dtype mismatch");
    assert_eq!(left.len(), right.len(), "operand length mismatch");

    match (left, right) {
        (Array::Int64(l), Array::Int64(r)) => {
            let mut values = Vec::with_capacity(l.len());
            for (&a, &b) in l.iter().zip(r) {
                let value = match op {
                    BinaryOp::Add => a.checked_add(b).ok_or(RuntimeError::IntegerOverflow)?,
                    BinaryOp::Subtract => a.checked_sub(b).ok_or(RuntimeError::IntegerOverflow)?,
                    BinaryOp::Multiply => a.checked_mul(b).ok_or(RuntimeError::IntegerOverflow)?,
                    BinaryOp::Divide => {
                        if b == 0 {
                            return Err(RuntimeError::DivisionByZero);
                        }
                        a.checked_div(b).ok_or(RuntimeError::IntegerOverflow)?
                    }
                    _ => unreachable!(),
                };
                values.push(value);
            }
            Ok(Array::Int64(values))
        }
        (Array::Double(l), Array::Double(r)) => {
            let values = l
                .iter()
                .zip(r)
                .map(|(&a, &b)| match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Subtract => a - b,
                    BinaryOp::Multiply => a * b,
                    BinaryOp::Divide => a / b,
                    _ => unreachable!(),
                })
                .collect();
            Ok(Array::Double(values))
        }
        _ => Err(RuntimeError::UnsupportedDtype {
            op: arithmetic_name(op),
            dtype: left.dtype(),
        }),
    }
}

fn arithmetic_name(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "addition",
        BinaryOp::Subtract => "subtraction",
        BinaryOp::Multiply => "multiplication",
        BinaryOp::Divide => "division",
        _ => unreachable!(),
    }
}

/// Population count of a boolean mask.
pub fn count_true(mask: &[bool]) -> usize {
    mask.iter().filter(|&&value| value).count()
}

/// A scalar broadcast over a length.
pub fn broadcast_int64(value: i64, length: usize) -> Array {
    Array::Int64(vec![value; length])
}

pub fn broadcast_double(value: f64, length: usize) -> Array {
    Array::Double(vec![value; length])
}

/// Guard used by `ReadColumn`: imported data must match the compiled
/// expectations.
pub fn check_column(
    name: &str,
    array: &Array,
    expected_dtype: DType,
    expected_rows: usize,
) -> Result<(), RuntimeError> {
    if array.dtype() != expected_dtype {
        return Err(RuntimeError::ColumnDtypeMismatch {
            column: name.to_owned(),
            expected: expected_dtype,
            actual: array.dtype(),
        });
    }
    if array.len() != expected_rows {
        return Err(RuntimeError::RowCountMismatch {
            column: name.to_owned(),
            expected: expected_rows,
            actual: array.len(),
        });
    }
    Ok(())
}
