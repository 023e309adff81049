//! Two-pass struct builder
//!
//! Pass 1 infers the field types and sizes the trailing region. Pass 2
//! allocates `header + trailing` once and writes every value:
//!
//! ```text
//! (i32 = 4, vec[i64] = [1, 3, 4])
//!
//! 0      4        8                16      24                48
//! ┌──────┬────────┬────────────────┬───────┬─────────────────┐
//! │ 4    │ pad    │ ptr ──────┐    │ len 3 │ 1 │ 3 │ 4       │
//! └──────┴────────┴───────────┼────┴───────┴─────────────────┘
//!         header (24 bytes)   └──────────▶ trailing region (24 bytes)
//! ```
//!
//! Each pending vector's payload is rounded up to 8 bytes in the trailing
//! region, so every payload starts 8-aligned.

use super::Value;
use crate::constants::{TRAILING_ALIGNMENT, VEC_LEN_OFFSET};
use crate::errors::Result;
use crate::memory::block::MemoryBlock;
use crate::memory::layout::align_up;
use crate::memory::raw;
use crate::memory::Address;
use crate::object::WeldStruct;
use crate::types::StructType;
use tracing::trace;

/// Serialize `values` into one newly allocated block
pub fn build<'a>(values: &[Value<'a>]) -> Result<WeldStruct<'a>> {
    // Pass 1: types and sizes
    let mut fields = Vec::with_capacity(values.len());
    let mut trailing = 0;
    for (index, value) in values.iter().enumerate() {
        fields.push(value.type_desc(index)?);
        if let Value::Pending(pending) = value {
            trailing += align_up(pending.byte_size(), TRAILING_ALIGNMENT);
        }
    }
    let ty = StructType::new(fields);
    let header_size = ty.size();

    // Pass 2: write
    let block = MemoryBlock::allocate(header_size + trailing)?;
    let base = block.address();
    let mut cursor = header_size;
    for (index, value) in values.iter().enumerate() {
        let at = base.offset(ty.field_offset(index));
        unsafe {
            match value {
                Value::Bool(v) => raw::put(at, *v),
                Value::Byte(v) => raw::put(at, *v),
                Value::I32(v) => raw::put(at, *v),
                Value::I64(v) => raw::put(at, *v),
                Value::F32(v) => raw::put(at, *v),
                Value::F64(v) => raw::put(at, *v),
                Value::Pointer(v) => raw::put(at, *v),
                Value::Struct(s) => raw::copy(s.address(), at, s.size()),
                Value::Vec(v) => put_vec_header(at, v.address(), v.num_elements()),
                Value::Pending(pending) => {
                    let data = base.offset(cursor);
                    pending.write_to(data);
                    put_vec_header(at, data, pending.num_elements());
                    cursor += align_up(pending.byte_size(), TRAILING_ALIGNMENT);
                }
            }
        }
    }

    trace!(
        ty = %ty,
        header_size,
        trailing,
        address = %base,
        "built struct block"
    );
    Ok(WeldStruct::from_block(block, ty))
}

/// Write a `(data, len)` vector header at `at`
///
/// # Safety
///
/// `at` must be valid for writing 16 bytes.
pub(crate) unsafe fn put_vec_header(at: Address, data: Address, len: usize) {
    raw::put(at, data);
    raw::put(at.offset(VEC_LEN_OFFSET), len as u64);
}
