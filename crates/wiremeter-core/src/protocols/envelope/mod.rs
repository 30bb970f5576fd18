//! Outer frame envelope.
//!
//! Every application frame starts with a big-endian u32 inclusive length
//! and a big-endian u16 whose high bit flags Zstandard compression and
//! whose low 15 bits select the message type. Container types wrap
//! exactly one nested frame; the pipeline bounds that recursion.

pub mod codec;
pub mod error;
pub mod layout;
pub mod parser;

pub use parser::{Envelope, MessageType, parse_envelope};
