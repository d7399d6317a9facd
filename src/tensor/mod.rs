//! Implements symmetric rank-2 and rank-4 tensors in Voigt notation

mod tensor2;
mod tensor4;
pub use crate::tensor::tensor2::*;
pub use crate::tensor::tensor4::*;
