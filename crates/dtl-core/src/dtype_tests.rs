use crate::DType;

#[test]
fn scalar_and_array_tiers_partition() {
    let all = [
        DType::Bool,
        DType::Int64,
        DType::Double,
        DType::String,
        DType::Index,
        DType::BoolArray,
        DType::Int64Array,
        DType::DoubleArray,
        DType::StringArray,
        DType::IndexArray,
    ];

    for dtype in all {
        assert_ne!(dtype.is_array(), dtype.is_scalar());
    }
}

#[test]
fn as_array_is_idempotent() {
    assert_eq!(DType::Int64.as_array(), DType::Int64Array);
    assert_eq!(DType::Int64Array.as_array(), DType::Int64Array);
    assert_eq!(DType::Bool.as_array(), DType::BoolArray);
}

#[test]
fn element_inverts_as_array() {
    for scalar in [
        DType::Bool,
        DType::Int64,
        DType::Double,
        DType::String,
        DType::Index,
    ] {
        assert_eq!(scalar.as_array().element(), scalar);
    }
}

#[test]
fn name_roundtrips_through_from_str() {
    for dtype in [DType::Int64Array, DType::Bool, DType::StringArray] {
        let parsed: DType = dtype.name().parse().unwrap();
        assert_eq!(parsed, dtype);
    }
}

#[test]
fn unknown_name_is_rejected() {
    assert!("int32".parse::<DType>().is_err());
}
