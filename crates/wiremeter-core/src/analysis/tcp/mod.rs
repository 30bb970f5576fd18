//! TCP segment extraction.
//!
//! Slices link-layer frames down to directed TCP payloads. Only IPv4 is
//! of interest; the game never speaks anything else, and the BPF filter
//! already narrowed traffic to TCP. No sequence tracking happens here —
//! the reassembler downstream is built to survive observed byte order.

pub mod error;
pub mod parser;

pub use parser::{TcpSegment, parse_tcp_segment};
