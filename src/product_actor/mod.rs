//! Product-specific domain logic: the verification gate, stock reservation
//! and reviews.

mod actions;
pub mod dtos;
pub mod entity;
pub mod error;

pub use actions::*;
pub use dtos::*;
pub use error::*;
