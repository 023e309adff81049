use crate::errors::Result;
use crate::managed::{Lifecycle, Managed};
use crate::memory::block::MemoryBlock;
use crate::memory::Address;
use crate::types::StructType;
use crate::value::{builder, Value};
use crate::view::StructView;
use std::marker::PhantomData;

/// A struct value in native memory
///
/// A built struct owns one block holding its header followed by the payloads
/// of the vectors it was built with. A struct created by
/// [`from_address`](Self::from_address) borrows memory owned elsewhere.
///
/// `'a` is the lifetime of the built structs and vectors it was built from:
/// their payloads are referenced, not copied, so they must outlive it.
///
/// ```compile_fail
/// use weld_marshal::{Value, VecBuilder, WeldStruct, WeldVec};
///
/// let s = {
///     let payload = WeldVec::build(VecBuilder::i64s(vec![1, 3, 4])).unwrap();
///     WeldStruct::build(&[Value::Vec(&payload)]).unwrap()
/// };
/// s.view().get_vec(0).to_i64_vec();
/// ```
///
/// ```compile_fail
/// use weld_marshal::{Value, VecBuilder, WeldStruct};
///
/// let outer = {
///     let inner = WeldStruct::build(&[VecBuilder::i64s(vec![10, 20]).into()]).unwrap();
///     WeldStruct::build(&[Value::Struct(&inner)]).unwrap()
/// };
/// outer.view().get_struct(0).get_vec(0).to_i64_vec();
/// ```
#[derive(Debug)]
pub struct WeldStruct<'a> {
    block: MemoryBlock,
    ty: StructType,
    lifecycle: Lifecycle,
    _sources: PhantomData<&'a ()>,
}

impl<'a> WeldStruct<'a> {
    /// Lay out and serialize `values` into a newly allocated block
    ///
    /// ```
    /// use weld_marshal::{Value, VecBuilder, WeldStruct};
    ///
    /// let s = WeldStruct::build(&[
    ///     Value::I32(4),
    ///     VecBuilder::i64s(vec![1, 3, 4]).into(),
    /// ])
    /// .unwrap();
    /// assert_eq!(s.size(), 24);
    /// assert_eq!(s.view().get_i32(0), 4);
    /// assert_eq!(s.view().get_vec(1).to_i64_vec(), vec![1, 3, 4]);
    /// ```
    pub fn build(values: &[Value<'a>]) -> Result<Self> {
        builder::build(values)
    }

    pub(crate) fn from_block(block: MemoryBlock, ty: StructType) -> Self {
        WeldStruct {
            block,
            ty,
            lifecycle: Lifecycle::new(),
            _sources: PhantomData,
        }
    }

    /// Wrap a struct owned elsewhere; closing it never frees the memory
    ///
    /// # Safety
    ///
    /// `address` must point to a value laid out as `ty`, valid for the
    /// lifetime of the returned handle.
    pub unsafe fn from_address(address: Address, ty: StructType) -> Self {
        let size = ty.size();
        Self::from_block(MemoryBlock::borrowed(address, size), ty)
    }

    /// # Panics
    ///
    /// If the struct is closed.
    #[track_caller]
    pub fn address(&self) -> Address {
        self.check_access();
        self.block.address()
    }

    /// Header size: the struct type's laid-out size
    #[track_caller]
    pub fn size(&self) -> usize {
        self.check_access();
        self.ty.size()
    }

    /// Size of the whole block, including the trailing vector payloads
    #[track_caller]
    pub fn block_size(&self) -> usize {
        self.check_access();
        self.block.size()
    }

    #[track_caller]
    pub fn struct_type(&self) -> &StructType {
        self.check_access();
        &self.ty
    }

    #[track_caller]
    pub fn is_owned(&self) -> bool {
        self.check_access();
        self.block.is_owned()
    }

    /// Typed view of the struct's fields
    #[track_caller]
    pub fn view(&self) -> StructView<'_> {
        unsafe { StructView::new(self.address(), self.ty.clone()) }
    }
}

impl Managed for WeldStruct<'_> {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn release(&self) {
        unsafe { self.block.release() }
    }

    fn kind(&self) -> &'static str {
        "struct"
    }
}

impl Drop for WeldStruct<'_> {
    fn drop(&mut self) {
        self.finalize();
    }
}
