//! Credential models: redacted secrets and the access tokens held by a session.

pub mod secret;
pub mod token;

pub use secret::*;
pub use token::*;
