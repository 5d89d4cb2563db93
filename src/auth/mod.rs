//! Credentials, bearer tokens and the password-reset flow.

mod error;
mod mailer;
mod password;
mod reset;
mod service;
mod token;

pub use error::*;
pub use mailer::*;
pub use password::*;
pub use reset::*;
pub use service::*;
pub use token::*;
