// Layout constants shared by the type descriptors, builder and views

/// Alignment of every struct, regardless of its fields
pub const STRUCT_ALIGNMENT: usize = 8;

/// Size of a vector header: an 8-byte data pointer followed by an 8-byte element count
pub const VEC_HEADER_SIZE: usize = 16;

/// Offset of the element count inside a vector header
pub const VEC_LEN_OFFSET: usize = 8;

/// Width of an opaque pointer
pub const POINTER_SIZE: usize = 8;

/// Each vector payload in a builder's trailing region starts on this boundary
pub const TRAILING_ALIGNMENT: usize = 8;
