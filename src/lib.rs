//! # Introduction
//!
//! weld-marshal builds typed values in native memory, hands them to the Weld
//! computation engine as a single pointer, and decodes the engine's output
//! pointer back into typed values.
//!
//! ## Data flow
//!
//! ```text
//! Values → Builder → native block → WeldValue → engine run → output pointer → StructView
//! ```
//!
//! 1. [`types`]: type descriptors (primitive, vector, struct) and their names.
//! 2. [`memory`]: addresses, raw allocation, struct layout and memory blocks.
//! 3. [`value`]: host [`Value`]s and the two-pass builder producing a
//!    [`WeldStruct`] whose vector payloads share its allocation.
//! 4. [`view`]: bounds- and kind-checked reads over native memory.
//! 5. [`managed`]: the idempotent close lifecycle shared by every handle.
//! 6. [`engine`]: the [`engine::Engine`] trait and the module, value, error and
//!    configuration wrappers around it.
//!
//! ## Layout rules
//!
//! Primitives are naturally aligned (`bool`/`i8` 1, `i32`/`f32` 4,
//! `i64`/`f64`/`pointer` 8). A vector is a 16-byte `(pointer, count)` header.
//! Structs are 8-aligned, fields stay in declaration order, and nested structs
//! (as fields or vector elements) are embedded inline.

pub mod constants;
pub mod engine;
pub mod errors;
pub mod managed;
pub mod memory;
pub mod object;
pub mod types;
pub mod value;
pub mod view;

pub use errors::{MarshalError, Result};
pub use managed::Managed;
pub use memory::Address;
pub use object::{WeldStruct, WeldVec};
pub use types::{struct_of, vec_of, PrimitiveKind, StructType, TypeDesc, VecType};
pub use value::{Value, VecBuilder};
pub use view::{RawView, StructView, VecView};
