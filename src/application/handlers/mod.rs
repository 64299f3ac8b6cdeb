//! Command and query handlers.
//!
//! Handlers wire ports together to execute one operation each. HTTP
//! adapters construct commands from requests and translate results back
//! to responses; handlers never see HTTP types.

pub mod billing;
pub mod commerce;
pub mod devices;
pub mod oauth;

#[cfg(test)]
pub(crate) mod test_support;
