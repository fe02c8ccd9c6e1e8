use dtl_core::Array;
use dtl_ir::BinaryOp;

use super::error::RuntimeError;
use super::kernels::{
    arithmetic, compare, count_true, filter, join_left_index, join_right_index, pick, sort_index,
};

#[test]
fn filter_keeps_masked_elements() {
    let source = Array::Int64(vec![1, 2, 3, 4]);
    let mask = [true, false, false, true];
    assert_eq!(filter(&source, &mask), Array::Int64(vec![1, 4]));
}

#[test]
fn filter_strings() {
    let source = Array::String(vec!["a".into(), "b".into(), "c".into()]);
    let mask = [false, true, false];
    assert_eq!(filter(&source, &mask), Array::String(vec!["b".into()]));
}

#[test]
fn pick_gathers_by_index() {
    let source = Array::Int64(vec![10, 20, 30]);
    assert_eq!(
        pick(&source, &[2, 0, 0, 1]).unwrap(),
        Array::Int64(vec![30, 10, 10, 20])
    );
}

#[test]
fn pick_rejects_out_of_bounds() {
    let source = Array::Int64(vec![10, 20]);
    assert!(matches!(
        pick(&source, &[0, 2]),
        Err(RuntimeError::IndexOutOfBounds {
            index: 2,
            length: 2
        })
    ));
}

#[test]
fn sort_index_orders_ascending() {
    let source = Array::Int64(vec![30, 10, 20]);
    assert_eq!(sort_index(&source), [1, 2, 0]);
}

#[test]
fn sort_index_is_stable() {
    let source = Array::Int64(vec![2, 1, 2, 1]);
    assert_eq!(sort_index(&source), [1, 3, 0, 2]);
}

#[test]
fn join_selectors_enumerate_the_cartesian_product() {
    assert_eq!(join_left_index(2, 3), [0, 0, 0, 1, 1, 1]);
    assert_eq!(join_right_index(2, 3), [0, 1, 2, 0, 1, 2]);

    assert_eq!(join_left_index(2, 0), [0usize; 0]);
    assert_eq!(join_right_index(0, 3), [0usize; 0]);
}

#[test]
fn comparisons_are_pointwise() {
    let left = Array::Int64(vec![1, 2, 3]);
    let right = Array::Int64(vec![2, 2, 2]);

    assert_eq!(compare(BinaryOp::LessThan, &left, &right), [
        true, false, false
    ]);
    assert_eq!(compare(BinaryOp::EqualTo, &left, &right), [
        false, true, false
    ]);
    assert_eq!(compare(BinaryOp::GreaterEq, &left, &right), [
        false, true, true
    ]);
}

#[test]
fn string_comparison_is_lexicographic() {
    let left = Array::String(vec!["apple".into(), "pear".into()]);
    let right = Array::String(vec!["banana".into(), "pear".into()]);
    assert_eq!(compare(BinaryOp::LessThan, &left, &right), [true, false]);
}

#[test]
fn integer_arithmetic() {
    let left = Array::Int64(vec![6, 7]);
    let right = Array::Int64(vec![2, 3]);

    assert_eq!(
        arithmetic(BinaryOp::Add, &left, &right).unwrap(),
        Array::Int64(vec![8, 10])
    );
    assert_eq!(
        arithmetic(BinaryOp::Divide, &left, &right).unwrap(),
        Array::Int64(vec![3, 2])
    );
}

#[test]
fn integer_division_by_zero_is_an_error() {
    let left = Array::Int64(vec![1]);
    let right = Array::Int64(vec![0]);
    assert!(matches!(
        arithmetic(BinaryOp::Divide, &left, &right),
        Err(RuntimeError::DivisionByZero)
    ));
}

#[test]
fn integer_overflow_is_an_error() {
    let left = Array::Int64(vec![i64::MAX]);
    let right = Array::Int64(vec![1]);
    assert!(matches!(
        arithmetic(BinaryOp::Add, &left, &right),
        Err(RuntimeError::IntegerOverflow)
    ));
}

#[test]
fn double_division_follows_ieee() {
    let left = Array::Double(vec![1.0]);
    let right = Array::Double(vec![0.0]);
    let Array::Double(values) = arithmetic(BinaryOp::Divide, &left, &right).unwrap() else {
        panic!("expected doubles");
    };
    assert!(values[0].is_infinite());
}

#[test]
fn arithmetic_on_strings_is_unsupported() {
    let left = Array::String(vec!["a".into()]);
    let right = Array::String(vec!["b".into()]);
    assert!(matches!(
        arithmetic(BinaryOp::Add, &left, &right),
        Err(RuntimeError::UnsupportedDtype { .. })
    ));
}

#[test]
fn count_true_counts() {
    assert_eq!(count_true(&[true, false, true, true]), 3);
    assert_eq!(count_true(&[]), 0);
}
