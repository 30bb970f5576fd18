//! Attribute blob decoding.
//!
//! Schema messages carry entity attributes as `(attr_id, raw bytes)`
//! pairs; the byte encoding depends on the id. Strings are length-led
//! little-endian with reserved padding on both sides, numbers are plain
//! big-endian u32. One undecodable attribute never poisons its siblings;
//! the dispatcher counts it and moves on.

pub mod error;
pub mod layout;
pub mod parser;

pub use parser::{parse_string_attr, parse_u32_attr};
