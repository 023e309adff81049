//! Typed and untyped read access to native memory
//!
//! All bounds, alignment and kind checks of the crate live here; no other
//! module computes a read address on its own.
//!
//! - [`RawView`]: untyped mode. Reads at byte offsets, checked against an
//!   explicit size and, for vector payloads, a fixed element width.
//! - [`StructView`]: typed mode. Reads by field index; each accessor checks the
//!   field's declared kind before reading.
//! - [`VecView`]: a vector payload, read by element index.
//!
//! Views never copy and never free. They borrow their owner for `'a`, so a
//! view cannot outlive the handle it came from. Views over memory this crate
//! did not create are built with the `unsafe` constructors.
//!
//! # Nesting
//!
//! Struct-typed struct fields are embedded: the nested struct's bytes sit at
//! the field offset. Vector-of-struct elements are embedded too, back to back
//! with a stride of the element struct's size. The value builder writes the
//! same shapes.
//!
//! # Panics
//!
//! Every accessor panics on misuse (field index out of range, accessor kind
//! different from the declared kind, read past the end of the view). These are
//! programming errors.

use crate::constants::{VEC_HEADER_SIZE, VEC_LEN_OFFSET};
use crate::errors::{MarshalError, Result};
use crate::memory::raw::{self, Scalar};
use crate::memory::Address;
use crate::types::{PrimitiveKind, StructType, TypeDesc};
use std::marker::PhantomData;

/// Untyped view: `size` bytes at `address`
#[derive(Copy, Clone, Debug)]
pub struct RawView<'a> {
    address: Address,
    size: usize,
    element_width: Option<usize>,
    _owner: PhantomData<&'a ()>,
}

impl<'a> RawView<'a> {
    /// # Safety
    ///
    /// `address` must be valid for reading `size` bytes for `'a`.
    pub unsafe fn new(address: Address, size: usize) -> Self {
        RawView {
            address,
            size,
            element_width: None,
            _owner: PhantomData,
        }
    }

    /// View whose reads must all be exactly `element_width` wide and aligned to it
    ///
    /// Fails if the width is zero or `size` is not a multiple of it.
    ///
    /// # Safety
    ///
    /// `address` must be valid for reading `size` bytes for `'a`.
    pub unsafe fn with_element_width(
        address: Address,
        size: usize,
        element_width: usize,
    ) -> Result<Self> {
        if element_width == 0 {
            return Err(MarshalError::InvalidSize {
                what: "element width",
                size: element_width,
            });
        }
        if size % element_width != 0 {
            return Err(MarshalError::InvalidSize {
                what: "vector byte length (not a multiple of the element width)",
                size,
            });
        }
        Ok(RawView {
            address,
            size,
            element_width: Some(element_width),
            _owner: PhantomData,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn element_width(&self) -> Option<usize> {
        self.element_width
    }

    /// Translate an offset to an address, checking `width` bytes fit in the view
    #[track_caller]
    fn checked(&self, offset: usize, width: usize) -> Address {
        assert!(
            offset.checked_add(width).is_some_and(|end| end <= self.size),
            "offset({}) + width({}) should be <= size({}) at {}",
            offset,
            width,
            self.size,
            self.address
        );
        if let Some(element_width) = self.element_width {
            assert!(
                width == element_width,
                "read width({}) must match element size({})",
                width,
                element_width
            );
            assert!(
                offset % element_width == 0,
                "offset({}) must be aligned to the element size({})",
                offset,
                element_width
            );
        }
        self.address.offset(offset)
    }

    #[track_caller]
    fn read<T: Scalar>(&self, offset: usize) -> T {
        let address = self.checked(offset, T::WIDTH);
        unsafe { raw::get(address) }
    }

    #[track_caller]
    pub fn get_bool(&self, offset: usize) -> bool {
        self.read(offset)
    }

    #[track_caller]
    pub fn get_byte(&self, offset: usize) -> i8 {
        self.read(offset)
    }

    #[track_caller]
    pub fn get_i32(&self, offset: usize) -> i32 {
        self.read(offset)
    }

    #[track_caller]
    pub fn get_i64(&self, offset: usize) -> i64 {
        self.read(offset)
    }

    #[track_caller]
    pub fn get_f32(&self, offset: usize) -> f32 {
        self.read(offset)
    }

    #[track_caller]
    pub fn get_f64(&self, offset: usize) -> f64 {
        self.read(offset)
    }

    #[track_caller]
    pub fn get_pointer(&self, offset: usize) -> Address {
        self.read(offset)
    }

    /// Read a `(data pointer, element count)` vector header
    #[track_caller]
    pub fn get_vec_header(&self, offset: usize) -> (Address, usize) {
        let address = self.checked(offset, VEC_HEADER_SIZE);
        unsafe {
            let data: Address = raw::get(address);
            let len: u64 = raw::get(address.offset(VEC_LEN_OFFSET));
            (data, len as usize)
        }
    }

    /// Untyped vector at `offset` whose elements are `element_size` bytes wide
    #[track_caller]
    pub fn get_vec(&self, offset: usize, element_size: usize) -> Result<RawView<'a>> {
        let (data, len) = self.get_vec_header(offset);
        let size = payload_size(len, element_size);
        unsafe { RawView::with_element_width(data, size, element_size) }
    }

    /// Untyped sub-view of `size` bytes at `offset`
    #[track_caller]
    pub fn slice(&self, offset: usize, size: usize) -> RawView<'a> {
        let address = self.checked(offset, size);
        unsafe { RawView::new(address, size) }
    }
}

/// Bytes covered by `len` elements of `width` bytes
///
/// # Panics
///
/// If the product overflows `usize`.
#[track_caller]
pub(crate) fn payload_size(len: usize, width: usize) -> usize {
    len.checked_mul(width).unwrap_or_else(|| {
        panic!(
            "vector of {} element(s) of size {} overflows usize",
            len, width
        )
    })
}

/// Typed view of a struct value
#[derive(Clone, Debug)]
pub struct StructView<'a> {
    raw: RawView<'a>,
    ty: StructType,
}

impl<'a> StructView<'a> {
    /// # Safety
    ///
    /// `address` must point to a value laid out as `ty`, valid for `'a`.
    pub unsafe fn new(address: Address, ty: StructType) -> Self {
        StructView {
            raw: RawView::new(address, ty.size()),
            ty,
        }
    }

    pub fn address(&self) -> Address {
        self.raw.address()
    }

    pub fn size(&self) -> usize {
        self.raw.size()
    }

    pub fn struct_type(&self) -> &StructType {
        &self.ty
    }

    pub fn num_fields(&self) -> usize {
        self.ty.num_fields()
    }

    pub fn raw(&self) -> RawView<'a> {
        self.raw
    }

    /// Offset of field `index`, asserting it is declared as `expected`
    #[track_caller]
    fn primitive_field(&self, index: usize, expected: PrimitiveKind) -> usize {
        let field = self.ty.field_type(index);
        assert!(
            field.as_primitive() == Some(expected),
            "field {} of {} is {}, not {}",
            index,
            self.ty,
            field,
            expected
        );
        self.ty.field_offset(index)
    }

    #[track_caller]
    pub fn get_bool(&self, index: usize) -> bool {
        self.raw
            .get_bool(self.primitive_field(index, PrimitiveKind::Bool))
    }

    #[track_caller]
    pub fn get_byte(&self, index: usize) -> i8 {
        self.raw.get_byte(self.primitive_field(index, PrimitiveKind::I8))
    }

    #[track_caller]
    pub fn get_i32(&self, index: usize) -> i32 {
        self.raw.get_i32(self.primitive_field(index, PrimitiveKind::I32))
    }

    #[track_caller]
    pub fn get_i64(&self, index: usize) -> i64 {
        self.raw.get_i64(self.primitive_field(index, PrimitiveKind::I64))
    }

    #[track_caller]
    pub fn get_f32(&self, index: usize) -> f32 {
        self.raw.get_f32(self.primitive_field(index, PrimitiveKind::F32))
    }

    #[track_caller]
    pub fn get_f64(&self, index: usize) -> f64 {
        self.raw.get_f64(self.primitive_field(index, PrimitiveKind::F64))
    }

    #[track_caller]
    pub fn get_pointer(&self, index: usize) -> Address {
        self.raw
            .get_pointer(self.primitive_field(index, PrimitiveKind::Pointer))
    }

    /// Vector stored in field `index`; the payload is not copied
    #[track_caller]
    pub fn get_vec(&self, index: usize) -> VecView<'a> {
        let field = self.ty.field_type(index);
        let Some(vec_type) = field.as_vector() else {
            panic!("field {} of {} is {}, not a vector", index, self.ty, field);
        };
        let (data, len) = self.raw.get_vec_header(self.ty.field_offset(index));
        unsafe { VecView::new(data, len, vec_type.element_type().clone()) }
    }

    /// Struct embedded in field `index`
    #[track_caller]
    pub fn get_struct(&self, index: usize) -> StructView<'a> {
        let field = self.ty.field_type(index);
        let Some(nested) = field.as_struct() else {
            panic!("field {} of {} is {}, not a struct", index, self.ty, field);
        };
        let raw = self.raw.slice(self.ty.field_offset(index), nested.size());
        StructView {
            raw,
            ty: nested.clone(),
        }
    }
}

/// Typed view of a vector payload
#[derive(Clone, Debug)]
pub struct VecView<'a> {
    raw: RawView<'a>,
    element: TypeDesc,
    len: usize,
}

impl<'a> VecView<'a> {
    /// # Safety
    ///
    /// `address` must point to `len` elements laid out as `element`, valid for `'a`.
    pub unsafe fn new(address: Address, len: usize, element: TypeDesc) -> Self {
        let width = element.size();
        let raw = RawView {
            address,
            size: payload_size(len, width),
            element_width: (width > 0).then_some(width),
            _owner: PhantomData,
        };
        VecView { raw, element, len }
    }

    pub fn address(&self) -> Address {
        self.raw.address()
    }

    pub fn num_elements(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn element_type(&self) -> &TypeDesc {
        &self.element
    }

    pub fn element_size(&self) -> usize {
        self.element.size()
    }

    /// Payload length in bytes
    pub fn len_bytes(&self) -> usize {
        self.raw.size()
    }

    pub fn raw(&self) -> RawView<'a> {
        self.raw
    }

    /// Byte offset of element `index`, asserting the element kind is `expected`
    #[track_caller]
    fn primitive_element(&self, index: usize, expected: PrimitiveKind) -> usize {
        assert!(
            self.element.as_primitive() == Some(expected),
            "vector elements are {}, not {}",
            self.element,
            expected
        );
        self.element_offset(index)
    }

    #[track_caller]
    fn element_offset(&self, index: usize) -> usize {
        assert!(
            index < self.len,
            "element index {} out of range for vector of {} element(s)",
            index,
            self.len
        );
        index * self.element.size()
    }

    #[track_caller]
    pub fn get_bool(&self, index: usize) -> bool {
        self.raw
            .get_bool(self.primitive_element(index, PrimitiveKind::Bool))
    }

    #[track_caller]
    pub fn get_byte(&self, index: usize) -> i8 {
        self.raw
            .get_byte(self.primitive_element(index, PrimitiveKind::I8))
    }

    #[track_caller]
    pub fn get_i32(&self, index: usize) -> i32 {
        self.raw
            .get_i32(self.primitive_element(index, PrimitiveKind::I32))
    }

    #[track_caller]
    pub fn get_i64(&self, index: usize) -> i64 {
        self.raw
            .get_i64(self.primitive_element(index, PrimitiveKind::I64))
    }

    #[track_caller]
    pub fn get_f32(&self, index: usize) -> f32 {
        self.raw
            .get_f32(self.primitive_element(index, PrimitiveKind::F32))
    }

    #[track_caller]
    pub fn get_f64(&self, index: usize) -> f64 {
        self.raw
            .get_f64(self.primitive_element(index, PrimitiveKind::F64))
    }

    #[track_caller]
    pub fn get_pointer(&self, index: usize) -> Address {
        self.raw
            .get_pointer(self.primitive_element(index, PrimitiveKind::Pointer))
    }

    /// Nested vector at element `index`
    #[track_caller]
    pub fn get_vec(&self, index: usize) -> VecView<'a> {
        let Some(vec_type) = self.element.as_vector() else {
            panic!("vector elements are {}, not vectors", self.element);
        };
        let (data, len) = self.raw.get_vec_header(self.element_offset(index));
        unsafe { VecView::new(data, len, vec_type.element_type().clone()) }
    }

    /// Struct embedded at element `index`
    #[track_caller]
    pub fn get_struct(&self, index: usize) -> StructView<'a> {
        let Some(st) = self.element.as_struct() else {
            panic!("vector elements are {}, not structs", self.element);
        };
        let offset = self.element_offset(index);
        let address = self.raw.address().offset(offset);
        unsafe { StructView::new(address, st.clone()) }
    }

    #[track_caller]
    fn collect<T: Scalar>(&self, expected: PrimitiveKind) -> Vec<T> {
        (0..self.len)
            .map(|i| self.raw.read(self.primitive_element(i, expected)))
            .collect()
    }

    pub fn to_bool_vec(&self) -> Vec<bool> {
        self.collect(PrimitiveKind::Bool)
    }

    pub fn to_byte_vec(&self) -> Vec<i8> {
        self.collect(PrimitiveKind::I8)
    }

    pub fn to_i32_vec(&self) -> Vec<i32> {
        self.collect(PrimitiveKind::I32)
    }

    pub fn to_i64_vec(&self) -> Vec<i64> {
        self.collect(PrimitiveKind::I64)
    }

    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.collect(PrimitiveKind::F32)
    }

    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.collect(PrimitiveKind::F64)
    }

    /// Byte payload of a `vec[i8]`
    #[track_caller]
    pub fn as_byte_slice(&self) -> &'a [u8] {
        assert!(
            self.element.as_primitive() == Some(PrimitiveKind::I8),
            "vector elements are {}, not i8",
            self.element
        );
        if self.len == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.raw.address().as_ptr(), self.len) }
    }

    /// UTF-8 text held in a `vec[i8]`
    pub fn as_str(&self) -> Result<&'a str> {
        std::str::from_utf8(self.as_byte_slice()).map_err(|e| MarshalError::InvalidString {
            message: e.to_string(),
        })
    }
}
