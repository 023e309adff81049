//! Natively backed host objects
//!
//! [`WeldStruct`] and [`WeldVec`] own (or borrow) a memory block laid out for
//! the engine. Both are managed handles: release them with
//! [`Managed::close`](crate::managed::Managed::close); `Drop` releases a handle
//! that was never closed.

mod structs;
mod vec;

pub use structs::WeldStruct;
pub use vec::WeldVec;
