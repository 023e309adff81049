//! Memory blocks and their ownership mode
//!
//! A block is a contiguous native byte range owned by exactly one entity:
//! - [`Ownership::Owned`]: allocated here and freed when the owning handle is released
//! - [`Ownership::Borrowed`]: memory owned by someone else (the engine, or
//!   another handle) that is never freed through this block
//!
//! A block produced by the value builder holds its header and the trailing
//! vector payload region in one allocation, so both are freed together.

use super::{raw, Address};
use crate::errors::Result;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ownership {
    Owned,
    Borrowed,
}

#[derive(Debug)]
pub struct MemoryBlock {
    address: Address,
    size: usize,
    ownership: Ownership,
}

impl MemoryBlock {
    /// Allocate a zeroed, owned block
    pub fn allocate(size: usize) -> Result<Self> {
        Ok(MemoryBlock {
            address: raw::allocate(size)?,
            size,
            ownership: Ownership::Owned,
        })
    }

    /// Describe memory owned elsewhere
    ///
    /// # Safety
    ///
    /// `address` must be valid for `size` bytes for as long as the block is used.
    pub unsafe fn borrowed(address: Address, size: usize) -> Self {
        MemoryBlock {
            address,
            size,
            ownership: Ownership::Borrowed,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    pub fn is_owned(&self) -> bool {
        self.ownership == Ownership::Owned
    }

    /// Free the block if it is owned; borrowed blocks are left untouched
    ///
    /// # Safety
    ///
    /// Must be called at most once, and the block must not be read afterwards.
    pub(crate) unsafe fn release(&self) {
        if self.is_owned() {
            raw::free(self.address);
        }
    }
}
