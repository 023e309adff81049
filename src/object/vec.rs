use crate::errors::Result;
use crate::managed::{Lifecycle, Managed};
use crate::memory::block::MemoryBlock;
use crate::memory::Address;
use crate::types::{TypeDesc, VecType};
use crate::value::VecBuilder;
use crate::view::{payload_size, VecView};
use std::marker::PhantomData;
use tracing::trace;

/// A vector payload in native memory
///
/// Unlike a pending [`VecBuilder`] field, a built vector has its own
/// allocation. A struct built with it only stores its `(pointer, count)`
/// header, so the vector must stay open while that struct is in use.
///
/// `'a` is the lifetime of the structs and vectors listed as elements, for
/// the same reason:
///
/// ```compile_fail
/// use weld_marshal::{Managed, Value, VecBuilder, WeldStruct, WeldVec};
///
/// let mut payload = WeldVec::build(VecBuilder::i64s(vec![1, 3, 4])).unwrap();
/// let s = WeldStruct::build(&[Value::Vec(&payload)]).unwrap();
/// payload.close();
/// s.view().get_vec(0).to_i64_vec();
/// ```
#[derive(Debug)]
pub struct WeldVec<'a> {
    block: MemoryBlock,
    element: TypeDesc,
    len: usize,
    lifecycle: Lifecycle,
    _sources: PhantomData<&'a ()>,
}

impl<'a> WeldVec<'a> {
    /// Serialize `elements` into a newly allocated block
    pub fn build(elements: VecBuilder<'a>) -> Result<Self> {
        let size = elements.byte_size();
        let block = MemoryBlock::allocate(size)?;
        unsafe { elements.write_to(block.address()) };
        trace!(
            element = %elements.element_type(),
            len = elements.num_elements(),
            size,
            address = %block.address(),
            "built vector block"
        );
        Ok(WeldVec {
            block,
            element: elements.element_type().clone(),
            len: elements.num_elements(),
            lifecycle: Lifecycle::new(),
            _sources: PhantomData,
        })
    }

    /// Wrap a vector payload owned elsewhere; closing it never frees the memory
    ///
    /// # Safety
    ///
    /// `address` must point to `len` elements laid out as `element`, valid
    /// for the lifetime of the returned handle.
    pub unsafe fn from_address(address: Address, len: usize, element: TypeDesc) -> Self {
        let size = payload_size(len, element.size());
        WeldVec {
            block: MemoryBlock::borrowed(address, size),
            element,
            len,
            lifecycle: Lifecycle::new(),
            _sources: PhantomData,
        }
    }

    /// Address of the first element
    ///
    /// # Panics
    ///
    /// If the vector is closed.
    #[track_caller]
    pub fn address(&self) -> Address {
        self.check_access();
        self.block.address()
    }

    #[track_caller]
    pub fn num_elements(&self) -> usize {
        self.check_access();
        self.len
    }

    #[track_caller]
    pub fn is_empty(&self) -> bool {
        self.num_elements() == 0
    }

    #[track_caller]
    pub fn element_type(&self) -> &TypeDesc {
        self.check_access();
        &self.element
    }

    #[track_caller]
    pub fn element_size(&self) -> usize {
        self.element_type().size()
    }

    #[track_caller]
    pub fn vec_type(&self) -> VecType {
        VecType::new(self.element_type().clone())
    }

    #[track_caller]
    pub fn is_owned(&self) -> bool {
        self.check_access();
        self.block.is_owned()
    }

    #[track_caller]
    pub fn view(&self) -> VecView<'_> {
        unsafe { VecView::new(self.address(), self.len, self.element.clone()) }
    }
}

impl Managed for WeldVec<'_> {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn release(&self) {
        unsafe { self.block.release() }
    }

    fn kind(&self) -> &'static str {
        "vec"
    }
}

impl Drop for WeldVec<'_> {
    fn drop(&mut self) {
        self.finalize();
    }
}
