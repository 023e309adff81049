use super::{SharedEngine, ValueRef};
use crate::errors::Result;
use crate::managed::{Lifecycle, Managed};
use crate::memory::Address;
use crate::object::WeldStruct;
use crate::types::{parse, StructType};
use crate::view::StructView;
use std::marker::PhantomData;
use tracing::debug;

/// An engine value: an engine-side handle around a data address
///
/// A value built from a [`WeldStruct`] borrows it for `'a`, so the struct
/// stays open while the engine may read it. Values returned by
/// [`WeldModule::run`](super::WeldModule::run) are owned by the engine and
/// are `'static`.
pub struct WeldValue<'a> {
    engine: SharedEngine,
    handle: ValueRef,
    lifecycle: Lifecycle,
    _data: PhantomData<&'a WeldStruct<'a>>,
}

impl<'a> WeldValue<'a> {
    /// Engine value pointing at `input`'s block
    pub fn from_struct(engine: &SharedEngine, input: &'a WeldStruct<'_>) -> Self {
        let address = input.address();
        let handle = engine.value_new(address);
        debug!(handle = handle.0, %address, "created engine value");
        Self::from_engine(engine.clone(), handle)
    }

    pub(crate) fn from_engine(engine: SharedEngine, handle: ValueRef) -> Self {
        WeldValue {
            engine,
            handle,
            lifecycle: Lifecycle::new(),
            _data: PhantomData,
        }
    }

    #[track_caller]
    pub fn handle(&self) -> ValueRef {
        self.check_access();
        self.handle
    }

    /// Address of the value's data
    #[track_caller]
    pub fn data(&self) -> Address {
        self.engine.value_data(self.handle())
    }

    /// Id of the run that produced this value, or -1 for caller-created values
    #[track_caller]
    pub fn run_id(&self) -> i64 {
        self.engine.value_run_id(self.handle())
    }

    /// Decode the value's data as a struct of type `ty`
    ///
    /// # Safety
    ///
    /// The data must actually be laid out as `ty`; nothing here can check it.
    #[track_caller]
    pub unsafe fn view(&self, ty: &StructType) -> StructView<'_> {
        StructView::new(self.data(), ty.clone())
    }

    /// Like [`view`](Self::view), with the type given by name, e.g. `{i32, vec[i64]}`
    ///
    /// # Safety
    ///
    /// As for [`view`](Self::view).
    pub unsafe fn view_as(&self, ty: &str) -> Result<StructView<'_>> {
        let ty = parse::parse_struct(ty)?;
        Ok(StructView::new(self.data(), ty))
    }
}

impl WeldValue<'static> {
    /// Engine value pointing at arbitrary memory
    ///
    /// # Safety
    ///
    /// `address` must stay valid for as long as the engine may read it.
    pub unsafe fn from_address(engine: &SharedEngine, address: Address) -> Self {
        let handle = engine.value_new(address);
        debug!(handle = handle.0, %address, "created engine value");
        Self::from_engine(engine.clone(), handle)
    }
}

impl Managed for WeldValue<'_> {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn release(&self) {
        self.engine.value_free(self.handle);
    }

    fn kind(&self) -> &'static str {
        "value"
    }
}

impl Drop for WeldValue<'_> {
    fn drop(&mut self) {
        self.finalize();
    }
}
