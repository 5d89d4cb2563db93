//! User documents: credentials, counters and the notification inbox.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;
