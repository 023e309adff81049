//! Struct layout computation
//!
//! Fields are placed in declaration order, each at the next offset that is a
//! multiple of its own alignment. The total size is then rounded up to the
//! struct alignment (8). Fields are never reordered for density: declaration
//! order fixes both memory order and the accessor index.
//!
//! ```text
//! {i32, vec[i64]}
//!   offset 0   i32        (4 bytes)
//!   offset 4   padding    (4 bytes)
//!   offset 8   vec[i64]   (16 bytes: data pointer + element count)
//!   size 24
//! ```

use crate::constants::STRUCT_ALIGNMENT;
use crate::types::TypeDesc;

/// Round `offset` up to the nearest multiple of `alignment`
#[inline]
pub fn align_up(offset: usize, alignment: usize) -> usize {
    assert!(alignment > 0, "alignment must be > 0");
    let next = offset + alignment - 1;
    next - (next % alignment)
}

/// Byte layout of a struct: total size and per-field offsets
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructLayout {
    size: usize,
    offsets: Box<[usize]>,
}

impl StructLayout {
    /// Total size in bytes, including trailing padding
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Offset of field `index`
    pub fn offset(&self, index: usize) -> usize {
        self.offsets[index]
    }

    pub fn num_fields(&self) -> usize {
        self.offsets.len()
    }
}

/// Compute the layout of a struct with the given ordered fields
pub fn compute<'a, I>(fields: I) -> StructLayout
where
    I: IntoIterator<Item = &'a TypeDesc>,
{
    let mut cursor = 0;
    let mut offsets = Vec::new();
    for field in fields {
        cursor = align_up(cursor, field.alignment());
        offsets.push(cursor);
        cursor += field.size();
    }
    StructLayout {
        size: align_up(cursor, STRUCT_ALIGNMENT),
        offsets: offsets.into_boxed_slice(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{struct_of, vec_of, PrimitiveKind};

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(8, 8), 8);
        assert_eq!(align_up(5, 4), 8);
        assert_eq!(align_up(3, 1), 3);
    }

    #[test]
    fn test_empty_struct() {
        let layout = compute(&[] as &[TypeDesc]);
        assert_eq!(layout.size(), 0);
        assert_eq!(layout.num_fields(), 0);
    }

    #[test]
    fn test_int_then_vector() {
        let fields = [
            TypeDesc::from(PrimitiveKind::I32),
            vec_of(PrimitiveKind::I64).into(),
        ];
        let layout = compute(&fields);
        assert_eq!(layout.offsets(), &[0, 8]);
        assert_eq!(layout.size(), 24);
    }

    #[test]
    fn test_bytes_are_packed_in_order() {
        let fields = [
            TypeDesc::from(PrimitiveKind::Bool),
            PrimitiveKind::I8.into(),
            PrimitiveKind::I32.into(),
            PrimitiveKind::Bool.into(),
            PrimitiveKind::F64.into(),
        ];
        let layout = compute(&fields);
        assert_eq!(layout.offsets(), &[0, 1, 4, 8, 16]);
        assert_eq!(layout.size(), 24);
    }

    #[test]
    fn test_nested_struct_is_eight_aligned() {
        let inner = struct_of([TypeDesc::from(PrimitiveKind::I8)]);
        assert_eq!(inner.size(), 8);

        let fields = [TypeDesc::from(PrimitiveKind::I8), inner.into()];
        let layout = compute(&fields);
        assert_eq!(layout.offsets(), &[0, 8]);
        assert_eq!(layout.size(), 16);
    }
}
