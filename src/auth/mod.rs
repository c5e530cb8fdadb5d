//! Authentication module
//!
//! The CRM uses session cookies: `authenticate.sjs` sets them, and every
//! later call must send them back.

mod authenticator;
mod types;

pub(crate) use authenticator::excerpt;
pub use authenticator::Authenticator;
pub use types::{AuthStatus, Session, SessionCookie};

#[cfg(test)]
mod tests;
