//! System orchestration, startup, and shutdown logic.

pub mod market_system;
pub mod seed;
pub mod tracing;

pub use market_system::*;
pub use seed::*;
pub use self::tracing::*;
