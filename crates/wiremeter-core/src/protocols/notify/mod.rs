//! Notify routing header.
//!
//! A notify frame begins with three big-endian routing keys: the service,
//! a stub instance, and the method selecting the schema for the rest of
//! the body. Only the combat service is of interest; everything else is
//! discarded upstream.

pub mod error;
pub mod layout;
pub mod parser;

pub use layout::{COMBAT_SERVICE_ID, method};
pub use parser::{Notify, parse_notify};
