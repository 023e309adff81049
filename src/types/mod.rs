//! Type descriptors
//!
//! A [`TypeDesc`] describes the memory shape of a value exchanged with the
//! engine. It is a closed set of variants:
//!
//! - [`TypeDesc::Primitive`]: a fixed-width scalar ([`PrimitiveKind`])
//! - [`TypeDesc::Vector`]: a 16-byte `(data pointer, element count)` header
//! - [`TypeDesc::Struct`]: an ordered sequence of field types
//!
//! Descriptors are immutable once built and share their children through
//! `Arc`, so cloning one is cheap. A struct's layout and name are computed on
//! first use and memoized. Equality and hashing are structural: two structs
//! are equal iff their field sequences are equal.
//!
//! Descriptors can also be parsed from the names they print, see [`parse`].

pub mod parse;

use crate::constants::{POINTER_SIZE, STRUCT_ALIGNMENT, VEC_HEADER_SIZE};
use crate::errors::{MarshalError, Result};
use crate::memory::layout::{self, StructLayout};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

/// Primitive scalar kinds; size and alignment equal the natural width
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    I8,
    I32,
    I64,
    F32,
    F64,
    /// Opaque pointer, used to pass engine structures between programs
    Pointer,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 7] = [
        PrimitiveKind::Bool,
        PrimitiveKind::I8,
        PrimitiveKind::I32,
        PrimitiveKind::I64,
        PrimitiveKind::F32,
        PrimitiveKind::F64,
        PrimitiveKind::Pointer,
    ];

    pub const fn size(self) -> usize {
        match self {
            PrimitiveKind::Bool | PrimitiveKind::I8 => 1,
            PrimitiveKind::I32 | PrimitiveKind::F32 => 4,
            PrimitiveKind::I64 | PrimitiveKind::F64 => 8,
            PrimitiveKind::Pointer => POINTER_SIZE,
        }
    }

    pub const fn alignment(self) -> usize {
        self.size()
    }

    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
            PrimitiveKind::Pointer => "pointer",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Description of a value's memory shape
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    Primitive(PrimitiveKind),
    Vector(VecType),
    Struct(StructType),
}

impl TypeDesc {
    /// Size of the value as stored inside a struct
    pub fn size(&self) -> usize {
        match self {
            TypeDesc::Primitive(kind) => kind.size(),
            TypeDesc::Vector(vec) => vec.size(),
            TypeDesc::Struct(st) => st.size(),
        }
    }

    pub fn alignment(&self) -> usize {
        match self {
            TypeDesc::Primitive(kind) => kind.alignment(),
            TypeDesc::Vector(vec) => vec.alignment(),
            TypeDesc::Struct(st) => st.alignment(),
        }
    }

    /// Diagnostic name, e.g. `{i32, vec[i64]}`
    pub fn name(&self) -> String {
        self.to_string()
    }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            TypeDesc::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&VecType> {
        match self {
            TypeDesc::Vector(vec) => Some(vec),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructType> {
        match self {
            TypeDesc::Struct(st) => Some(st),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Primitive(kind) => fmt::Display::fmt(kind, f),
            TypeDesc::Vector(vec) => fmt::Display::fmt(vec, f),
            TypeDesc::Struct(st) => fmt::Display::fmt(st, f),
        }
    }
}

impl FromStr for TypeDesc {
    type Err = MarshalError;

    fn from_str(s: &str) -> Result<Self> {
        parse::parse(s)
    }
}

impl From<PrimitiveKind> for TypeDesc {
    fn from(kind: PrimitiveKind) -> Self {
        TypeDesc::Primitive(kind)
    }
}

impl From<VecType> for TypeDesc {
    fn from(vec: VecType) -> Self {
        TypeDesc::Vector(vec)
    }
}

impl From<StructType> for TypeDesc {
    fn from(st: StructType) -> Self {
        TypeDesc::Struct(st)
    }
}

/// Vector of `T`: stored as a data pointer plus an element count
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VecType {
    element: Arc<TypeDesc>,
}

impl VecType {
    pub fn new(element: impl Into<TypeDesc>) -> Self {
        VecType {
            element: Arc::new(element.into()),
        }
    }

    /// Build a vector type from a possibly absent element type
    pub fn try_new(element: Option<TypeDesc>) -> Result<Self> {
        element
            .map(VecType::new)
            .ok_or_else(|| MarshalError::invalid_type("vector element type is missing"))
    }

    pub fn element_type(&self) -> &TypeDesc {
        &self.element
    }

    pub const fn size(&self) -> usize {
        VEC_HEADER_SIZE
    }

    pub const fn alignment(&self) -> usize {
        8
    }

    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for VecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vec[{}]", self.element)
    }
}

/// Struct of ordered fields
#[derive(Clone)]
pub struct StructType {
    inner: Arc<StructInner>,
}

struct StructInner {
    fields: Box<[TypeDesc]>,
    layout: OnceLock<StructLayout>,
    name: OnceLock<String>,
}

impl StructType {
    pub fn new<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = TypeDesc>,
    {
        StructType {
            inner: Arc::new(StructInner {
                fields: fields.into_iter().collect(),
                layout: OnceLock::new(),
                name: OnceLock::new(),
            }),
        }
    }

    /// Build a struct type from possibly absent field types
    ///
    /// Fails with [`MarshalError::InvalidType`] naming the first missing field.
    pub fn try_from_fields<I>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = Option<TypeDesc>>,
    {
        let fields = fields
            .into_iter()
            .enumerate()
            .map(|(i, field)| {
                field.ok_or_else(|| {
                    MarshalError::invalid_type(format!("field type at index [{}] is missing", i))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(StructType::new(fields))
    }

    pub fn fields(&self) -> &[TypeDesc] {
        &self.inner.fields
    }

    pub fn num_fields(&self) -> usize {
        self.inner.fields.len()
    }

    /// Type of field `index`
    ///
    /// # Panics
    ///
    /// If `index` is out of range.
    pub fn field_type(&self, index: usize) -> &TypeDesc {
        self.check_index(index);
        &self.inner.fields[index]
    }

    /// Byte offset of field `index`
    ///
    /// # Panics
    ///
    /// If `index` is out of range.
    pub fn field_offset(&self, index: usize) -> usize {
        self.check_index(index);
        self.layout().offset(index)
    }

    /// Memoized layout of this struct
    pub fn layout(&self) -> &StructLayout {
        self.inner
            .layout
            .get_or_init(|| layout::compute(self.inner.fields.iter()))
    }

    pub fn size(&self) -> usize {
        self.layout().size()
    }

    pub const fn alignment(&self) -> usize {
        STRUCT_ALIGNMENT
    }

    /// Memoized diagnostic name, e.g. `{i32, vec[i64]}`
    pub fn name(&self) -> &str {
        self.inner.name.get_or_init(|| {
            let names: Vec<String> = self.inner.fields.iter().map(TypeDesc::name).collect();
            format!("{{{}}}", names.join(", "))
        })
    }

    fn check_index(&self, index: usize) {
        assert!(
            index < self.num_fields(),
            "field index {} out of range for struct {} with {} field(s)",
            index,
            self.name(),
            self.num_fields()
        );
    }
}

impl PartialEq for StructType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.fields == other.inner.fields
    }
}

impl Eq for StructType {}

impl Hash for StructType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.fields.hash(state);
    }
}

impl fmt::Debug for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructType")
            .field("fields", &self.inner.fields)
            .finish()
    }
}

impl fmt::Display for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shorthand for [`StructType::new`]
pub fn struct_of<I>(fields: I) -> StructType
where
    I: IntoIterator<Item = TypeDesc>,
{
    StructType::new(fields)
}

/// Shorthand for [`VecType::new`]
pub fn vec_of(element: impl Into<TypeDesc>) -> VecType {
    VecType::new(element)
}
