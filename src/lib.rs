// Local tangent space alignment (LTSA)

#![doc = include_str!("../README.md")]

pub mod alignment;
pub mod error;
pub mod neighbors;
pub mod spectral;
pub mod tangent;

mod ltsa;

pub use error::{LtsaError, LtsaResult};
pub use ltsa::{Embedding, LocalTangentSpaceAlignment, LtsaConfig};
