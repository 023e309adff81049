// Integration tests for type descriptors and struct layout

use weld_marshal::memory::layout::align_up;
use weld_marshal::types::parse::parse;
use weld_marshal::{struct_of, vec_of, MarshalError, PrimitiveKind, StructType, TypeDesc, VecType};

fn prim(kind: PrimitiveKind) -> TypeDesc {
    TypeDesc::from(kind)
}

#[test]
fn test_primitive_sizes() {
    let expected = [
        (PrimitiveKind::Bool, 1),
        (PrimitiveKind::I8, 1),
        (PrimitiveKind::I32, 4),
        (PrimitiveKind::I64, 8),
        (PrimitiveKind::F32, 4),
        (PrimitiveKind::F64, 8),
        (PrimitiveKind::Pointer, 8),
    ];
    for (kind, size) in expected {
        assert_eq!(kind.size(), size, "size of {}", kind);
        assert_eq!(kind.alignment(), size, "alignment of {}", kind);
    }
}

#[test]
fn test_vector_header() {
    let ty = vec_of(vec_of(PrimitiveKind::Bool));
    assert_eq!(ty.size(), 16);
    assert_eq!(ty.alignment(), 8);
    assert_eq!(ty.name(), "vec[vec[bool]]");
    assert_eq!(ty.element_type(), &TypeDesc::from(vec_of(PrimitiveKind::Bool)));
}

#[test]
fn test_struct_offsets() {
    let ty = struct_of([
        prim(PrimitiveKind::I8),
        prim(PrimitiveKind::I64),
        prim(PrimitiveKind::I32),
        vec_of(PrimitiveKind::F32).into(),
        prim(PrimitiveKind::Bool),
    ]);

    let offsets: Vec<usize> = (0..ty.num_fields()).map(|i| ty.field_offset(i)).collect();
    assert_eq!(offsets, vec![0, 8, 16, 24, 40]);
    assert_eq!(ty.size(), 48);
    assert_eq!(ty.alignment(), 8);
    assert_eq!(ty.name(), "{i8, i64, i32, vec[f32], bool}");
}

#[test]
fn test_layout_is_deterministic() {
    let text = "{bool, {i32, f64}, vec[{i8, i8}], pointer}";
    let a: TypeDesc = text.parse().expect("valid type");
    let b = parse(text).expect("valid type");

    assert_eq!(a, b);
    let (a, b) = (a.as_struct().unwrap(), b.as_struct().unwrap());
    assert_eq!(a.layout(), b.layout());
    // Memoized: the second call returns the same layout
    assert!(std::ptr::eq(a.layout(), a.layout()));
}

#[test]
fn test_offsets_respect_alignment() {
    let types = [
        "{i8, i32, i8, i64, i8, f32, bool, f64}",
        "{bool, vec[i8], i8, {i8}, i32}",
        "{{i64}, i8, {i32, i8}, pointer}",
        "{}",
    ];
    for text in types {
        let ty = weld_marshal::types::parse::parse_struct(text).expect("valid type");
        let mut end = 0;
        for (i, field) in ty.fields().iter().enumerate() {
            let offset = ty.field_offset(i);
            assert_eq!(offset % field.alignment(), 0, "field {} of {}", i, text);
            assert!(offset >= end, "field {} of {} overlaps", i, text);
            end = offset + field.size();
        }
        assert_eq!(ty.size(), align_up(end, 8), "size of {}", text);
        assert_eq!(ty.size() % 8, 0);
    }
}

#[test]
fn test_structural_equality() {
    let a = struct_of([prim(PrimitiveKind::I32), vec_of(PrimitiveKind::I64).into()]);
    let b = struct_of([prim(PrimitiveKind::I32), vec_of(PrimitiveKind::I64).into()]);
    let c = struct_of([prim(PrimitiveKind::I64), prim(PrimitiveKind::I32)]);

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(TypeDesc::from(a.clone()), TypeDesc::from(b));
    assert_ne!(TypeDesc::from(a), prim(PrimitiveKind::I32));
}

#[test]
fn test_missing_field_type() {
    match StructType::try_from_fields([Some(prim(PrimitiveKind::I32)), None]) {
        Err(MarshalError::InvalidType { message }) => {
            assert_eq!(message, "field type at index [1] is missing");
        }
        other => panic!("expected an invalid type, got {:?}", other),
    }
    assert!(matches!(
        VecType::try_new(None),
        Err(MarshalError::InvalidType { .. })
    ));
    assert_eq!(
        VecType::try_new(Some(prim(PrimitiveKind::F32))).map(|v| v.name()),
        Ok("vec[f32]".to_string())
    );
}

#[test]
#[should_panic(expected = "field index 3 out of range")]
fn test_field_offset_out_of_range() {
    let ty = struct_of([prim(PrimitiveKind::I32)]);
    ty.field_offset(3);
}
