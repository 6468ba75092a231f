#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

//! Sequence concatenation for tensors carrying a Level-of-Detail (LoD) description.
//!
//! A LoD tensor groups the rows of a dense tensor into sequences, and optionally the sequences
//! into nested sequences. This crate concatenates such tensors while keeping their sequences
//! aligned, and splits the gradient of the result back to the inputs.

#[macro_use]
extern crate derive_new;

extern crate alloc;

#[macro_use]
mod parallel;

mod config;
mod error;
mod lod;
mod merge;
mod plan;
mod shape;
mod tensor;

/// Kernels computing the sequence concatenation and its gradient.
pub mod kernel;
/// Operator descriptions, schemas and the kernel registry.
pub mod ops;

pub use config::*;
pub use error::*;
pub use lod::*;
pub use merge::*;
pub use plan::*;
pub use shape::*;
pub use tensor::*;

pub use burn_tensor::{DType, Element, Shape};
