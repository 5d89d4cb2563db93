//! Order documents: numbering, the status lifecycle and payment records.

mod actions;
pub mod dtos;
pub mod entity;
pub mod error;

pub use actions::*;
pub use dtos::*;
pub use error::*;
