//! Native memory model
//!
//! This module provides the memory abstractions the rest of the crate builds on:
//! - [`raw`]: allocate/free/copy and scalar get/put at an [`Address`]
//! - [`layout`]: struct field offsets and total size from ordered field types
//! - [`block`]: a contiguous allocation with an explicit ownership mode
//!
//! # Addresses
//!
//! Addresses are carried as the [`Address`] newtype rather than bare integers,
//! so an address can never be mixed up with an offset, a size or an element
//! count. Only [`raw`] turns an address back into a pointer.

pub mod block;
pub mod layout;
pub mod raw;

use std::fmt;

/// A native memory address (64-bit)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u64);

impl Address {
    /// The null address
    pub const NULL: Address = Address(0);

    /// Wrap a raw address value, e.g. one returned by the engine
    pub const fn new(raw: u64) -> Self {
        Address(raw)
    }

    /// The raw address value
    pub const fn get(self) -> u64 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Address `bytes` past this one
    pub fn offset(self, bytes: usize) -> Address {
        Address(self.0 + bytes as u64)
    }

    pub(crate) fn from_ptr<T>(ptr: *const T) -> Self {
        Address(ptr as usize as u64)
    }

    pub(crate) fn as_ptr(self) -> *mut u8 {
        self.0 as usize as *mut u8
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
