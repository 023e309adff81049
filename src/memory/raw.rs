//! Raw memory primitive
//!
//! A thin capability over the C allocator: allocate, free, copy, and get/put
//! of fixed-width scalars at an address. There is no policy here; bounds and
//! type checks live in [`crate::view`]. Blocks come from `calloc`, so padding
//! bytes are always zero and the engine may release them with `free`.

use super::Address;
use crate::errors::{MarshalError, Result};
use std::ptr;
use tracing::trace;

/// Allocate `size` zeroed bytes
///
/// A zero-sized request still returns a unique, freeable address.
pub fn allocate(size: usize) -> Result<Address> {
    let ptr = unsafe { libc::calloc(1, size.max(1)) };
    if ptr.is_null() {
        return Err(MarshalError::OutOfMemory { requested: size });
    }
    let address = Address::from_ptr(ptr.cast_const());
    trace!(%address, size, "allocated native block");
    Ok(address)
}

/// Release a block returned by [`allocate`]
///
/// # Safety
///
/// `address` must come from [`allocate`] (or the C allocator) and must not
/// have been freed already.
pub unsafe fn free(address: Address) {
    trace!(%address, "freeing native block");
    libc::free(address.as_ptr().cast());
}

/// Copy `len` bytes from `src` to `dst`; the ranges may overlap
///
/// # Safety
///
/// Both ranges must be valid for `len` bytes.
pub unsafe fn copy(src: Address, dst: Address, len: usize) {
    if len > 0 {
        ptr::copy(src.as_ptr(), dst.as_ptr(), len);
    }
}

/// Read a scalar at `address`
///
/// # Safety
///
/// `address` must be valid for reading `T::WIDTH` bytes.
pub unsafe fn get<T: Scalar>(address: Address) -> T {
    T::read(address)
}

/// Write a scalar at `address`
///
/// # Safety
///
/// `address` must be valid for writing `T::WIDTH` bytes.
pub unsafe fn put<T: Scalar>(address: Address, value: T) {
    value.write(address)
}

/// Write `values` back to back starting at `address`
///
/// # Safety
///
/// `address` must be valid for writing `values.len() * T::WIDTH` bytes.
pub unsafe fn put_slice<T: Scalar>(address: Address, values: &[T]) {
    for (i, value) in values.iter().enumerate() {
        value.write(address.offset(i * T::WIDTH));
    }
}

mod private {
    pub trait Sealed {}
}

/// A fixed-width value that can be stored at an address in native byte order
pub trait Scalar: Copy + private::Sealed {
    /// Stored width in bytes
    const WIDTH: usize;

    #[doc(hidden)]
    unsafe fn read(address: Address) -> Self;

    #[doc(hidden)]
    unsafe fn write(self, address: Address);
}

macro_rules! impl_scalar {
    ($($ty:ty),*) => {
        $(
            impl private::Sealed for $ty {}

            impl Scalar for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                #[inline]
                unsafe fn read(address: Address) -> Self {
                    ptr::read_unaligned(address.as_ptr().cast::<$ty>())
                }

                #[inline]
                unsafe fn write(self, address: Address) {
                    ptr::write_unaligned(address.as_ptr().cast::<$ty>(), self)
                }
            }
        )*
    };
}

impl_scalar!(i8, u8, i32, i64, u64, f32, f64);

// Booleans are stored as one byte, 1 for true and 0 for false
impl private::Sealed for bool {}

impl Scalar for bool {
    const WIDTH: usize = 1;

    #[inline]
    unsafe fn read(address: Address) -> Self {
        u8::read(address) != 0
    }

    #[inline]
    unsafe fn write(self, address: Address) {
        u8::from(self).write(address)
    }
}

impl private::Sealed for Address {}

impl Scalar for Address {
    const WIDTH: usize = 8;

    #[inline]
    unsafe fn read(address: Address) -> Self {
        Address::new(u64::read(address))
    }

    #[inline]
    unsafe fn write(self, address: Address) {
        self.get().write(address)
    }
}
