//! # localkrige core
//!
//! Core types, errors and I/O shared by the localkrige crates.
//!
//! This crate provides:
//! - `Coordinate`: a planar (x, y) location with a fixed axis order
//! - `Error` / `Result`: the error taxonomy used across the workspace
//! - Delimited-text I/O for sample tables

pub mod error;
pub mod io;
pub mod point;

pub use error::{Error, Result};
pub use point::Coordinate;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::io::{SampleLayout, SampleTable};
    pub use crate::point::Coordinate;
}
