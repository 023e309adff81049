//! Host values accepted by the struct builder
//!
//! A [`Value`] is one field of a struct being built. Scalars are copied into
//! the header; built structs are embedded; built vectors are referenced by
//! their `(pointer, count)` header; a pending [`VecBuilder`] is serialized into
//! the trailing region of the same allocation.

pub mod builder;

use crate::errors::{MarshalError, Result};
use crate::managed::Managed;
use crate::memory::raw;
use crate::memory::Address;
use crate::object::{WeldStruct, WeldVec};
use crate::types::{PrimitiveKind, StructType, TypeDesc, VecType};
use std::borrow::Cow;

/// One field value passed to [`WeldStruct::build`]
#[derive(Debug)]
pub enum Value<'a> {
    Bool(bool),
    Byte(i8),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Pointer(Address),
    /// Embedded by copying its header bytes
    Struct(&'a WeldStruct<'a>),
    /// Referenced by its data pointer and element count
    Vec(&'a WeldVec<'a>),
    /// Serialized into the trailing region of the built block
    Pending(VecBuilder<'a>),
}

impl Value<'_> {
    /// Descriptor this value occupies in the built struct
    ///
    /// `index` is the position of the value, reported when a source handle is closed.
    pub fn type_desc(&self, index: usize) -> Result<TypeDesc> {
        Ok(match self {
            Value::Bool(_) => PrimitiveKind::Bool.into(),
            Value::Byte(_) => PrimitiveKind::I8.into(),
            Value::I32(_) => PrimitiveKind::I32.into(),
            Value::I64(_) => PrimitiveKind::I64.into(),
            Value::F32(_) => PrimitiveKind::F32.into(),
            Value::F64(_) => PrimitiveKind::F64.into(),
            Value::Pointer(_) => PrimitiveKind::Pointer.into(),
            Value::Struct(s) => {
                if s.is_closed() {
                    return Err(closed(index, "struct"));
                }
                s.struct_type().clone().into()
            }
            Value::Vec(v) => {
                if v.is_closed() {
                    return Err(closed(index, "vec"));
                }
                v.vec_type().into()
            }
            Value::Pending(pending) => VecType::new(pending.element_type().clone()).into(),
        })
    }
}

fn closed(index: usize, kind: &str) -> MarshalError {
    MarshalError::UnsupportedValue {
        index,
        kind: format!("closed {}", kind),
    }
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),*) => {
        $(
            impl From<$ty> for Value<'_> {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_value!(
    bool => Bool,
    i8 => Byte,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    Address => Pointer
);

impl<'a> From<&'a WeldStruct<'a>> for Value<'a> {
    fn from(s: &'a WeldStruct<'a>) -> Self {
        Value::Struct(s)
    }
}

impl<'a> From<&'a WeldVec<'a>> for Value<'a> {
    fn from(v: &'a WeldVec<'a>) -> Self {
        Value::Vec(v)
    }
}

impl<'a> From<VecBuilder<'a>> for Value<'a> {
    fn from(v: VecBuilder<'a>) -> Self {
        Value::Pending(v)
    }
}

#[derive(Debug, Clone)]
enum Payload<'a> {
    Bools(Cow<'a, [bool]>),
    Bytes(Cow<'a, [i8]>),
    Octets(Cow<'a, [u8]>),
    I32s(Cow<'a, [i32]>),
    I64s(Cow<'a, [i64]>),
    F32s(Cow<'a, [f32]>),
    F64s(Cow<'a, [f64]>),
    Structs(Vec<&'a WeldStruct<'a>>),
    Vecs(Vec<&'a WeldVec<'a>>),
}

/// Elements of a vector not yet written to native memory
#[derive(Debug, Clone)]
pub struct VecBuilder<'a> {
    element: TypeDesc,
    payload: Payload<'a>,
}

impl<'a> VecBuilder<'a> {
    fn primitive(kind: PrimitiveKind, payload: Payload<'a>) -> Self {
        VecBuilder {
            element: kind.into(),
            payload,
        }
    }

    pub fn bools(values: impl Into<Cow<'a, [bool]>>) -> Self {
        Self::primitive(PrimitiveKind::Bool, Payload::Bools(values.into()))
    }

    pub fn i8s(values: impl Into<Cow<'a, [i8]>>) -> Self {
        Self::primitive(PrimitiveKind::I8, Payload::Bytes(values.into()))
    }

    /// Unsigned bytes, stored as `vec[i8]`
    pub fn bytes(values: impl Into<Cow<'a, [u8]>>) -> Self {
        Self::primitive(PrimitiveKind::I8, Payload::Octets(values.into()))
    }

    /// UTF-8 bytes of `text`, without a terminator
    pub fn text(text: &'a str) -> Self {
        Self::bytes(text.as_bytes())
    }

    pub fn i32s(values: impl Into<Cow<'a, [i32]>>) -> Self {
        Self::primitive(PrimitiveKind::I32, Payload::I32s(values.into()))
    }

    pub fn i64s(values: impl Into<Cow<'a, [i64]>>) -> Self {
        Self::primitive(PrimitiveKind::I64, Payload::I64s(values.into()))
    }

    pub fn f32s(values: impl Into<Cow<'a, [f32]>>) -> Self {
        Self::primitive(PrimitiveKind::F32, Payload::F32s(values.into()))
    }

    pub fn f64s(values: impl Into<Cow<'a, [f64]>>) -> Self {
        Self::primitive(PrimitiveKind::F64, Payload::F64s(values.into()))
    }

    /// Vector of structs, each copied into the payload
    ///
    /// The element type is taken from the first struct, so the list must not be empty.
    pub fn structs<I>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a WeldStruct<'a>>,
    {
        let items: Vec<_> = items.into_iter().collect();
        let first = items
            .first()
            .ok_or_else(|| {
                MarshalError::invalid_type("cannot infer the element type of an empty struct vector")
            })?;
        if first.is_closed() {
            return Err(closed(0, "struct"));
        }
        let element = first.struct_type().clone();
        Self::structs_of(element, items)
    }

    /// Vector of structs of type `element`; may be empty
    pub fn structs_of<I>(element: StructType, items: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a WeldStruct<'a>>,
    {
        let items: Vec<_> = items.into_iter().collect();
        for (index, item) in items.iter().enumerate() {
            if item.is_closed() {
                return Err(closed(index, "struct"));
            }
            if *item.struct_type() != element {
                return Err(MarshalError::TypeMismatch {
                    index,
                    expected: element.name().to_string(),
                    got: item.struct_type().name().to_string(),
                });
            }
        }
        Ok(VecBuilder {
            element: element.into(),
            payload: Payload::Structs(items),
        })
    }

    /// Vector of vectors, each stored as its `(pointer, count)` header
    ///
    /// The element type is taken from the first vector, so the list must not be empty.
    pub fn vecs<I>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a WeldVec<'a>>,
    {
        let items: Vec<_> = items.into_iter().collect();
        let first = items
            .first()
            .ok_or_else(|| {
                MarshalError::invalid_type("cannot infer the element type of an empty vector of vectors")
            })?;
        if first.is_closed() {
            return Err(closed(0, "vec"));
        }
        let element = first.vec_type();
        Self::vecs_of(element, items)
    }

    /// Vector of vectors of type `element`; may be empty
    pub fn vecs_of<I>(element: VecType, items: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a WeldVec<'a>>,
    {
        let items: Vec<_> = items.into_iter().collect();
        for (index, item) in items.iter().enumerate() {
            if item.is_closed() {
                return Err(closed(index, "vec"));
            }
            if item.element_type() != element.element_type() {
                return Err(MarshalError::TypeMismatch {
                    index,
                    expected: element.name(),
                    got: item.vec_type().name(),
                });
            }
        }
        Ok(VecBuilder {
            element: element.into(),
            payload: Payload::Vecs(items),
        })
    }

    pub fn element_type(&self) -> &TypeDesc {
        &self.element
    }

    pub fn num_elements(&self) -> usize {
        match &self.payload {
            Payload::Bools(v) => v.len(),
            Payload::Bytes(v) => v.len(),
            Payload::Octets(v) => v.len(),
            Payload::I32s(v) => v.len(),
            Payload::I64s(v) => v.len(),
            Payload::F32s(v) => v.len(),
            Payload::F64s(v) => v.len(),
            Payload::Structs(v) => v.len(),
            Payload::Vecs(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.num_elements() == 0
    }

    /// Bytes occupied by the serialized elements, before trailing alignment
    pub fn byte_size(&self) -> usize {
        self.num_elements() * self.element.size()
    }

    /// Serialize the elements back to back starting at `address`
    ///
    /// # Safety
    ///
    /// `address` must be valid for writing [`byte_size`](Self::byte_size) bytes.
    pub unsafe fn write_to(&self, address: Address) {
        match &self.payload {
            Payload::Bools(v) => raw::put_slice(address, v),
            Payload::Bytes(v) => raw::put_slice(address, v),
            Payload::Octets(v) => raw::put_slice(address, v),
            Payload::I32s(v) => raw::put_slice(address, v),
            Payload::I64s(v) => raw::put_slice(address, v),
            Payload::F32s(v) => raw::put_slice(address, v),
            Payload::F64s(v) => raw::put_slice(address, v),
            Payload::Structs(items) => {
                let stride = self.element.size();
                for (i, item) in items.iter().enumerate() {
                    raw::copy(item.address(), address.offset(i * stride), stride);
                }
            }
            Payload::Vecs(items) => {
                let stride = self.element.size();
                for (i, item) in items.iter().enumerate() {
                    builder::put_vec_header(
                        address.offset(i * stride),
                        item.address(),
                        item.num_elements(),
                    );
                }
            }
        }
    }
}
