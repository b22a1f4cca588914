#![deny(unsafe_op_in_unsafe_fn)]

pub mod gpu;
pub use gpu::*;

pub use ash;
