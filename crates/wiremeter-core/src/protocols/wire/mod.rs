//! Tag/value schema encoding.
//!
//! Message bodies are sequences of `(field_number << 3) | wire_type`
//! keys followed by a varint, a fixed-width value, or a length-delimited
//! byte run. The reader is bounded and never panics on malformed input;
//! unknown fields are skippable so schema growth on the server side does
//! not break decoding. The writer is the encoding mirror used by tests
//! and the capture synthesizer.

pub mod error;
pub mod reader;
pub mod writer;

pub use error::WireError;
pub use reader::{WireReader, WireType};
pub use writer::WireWriter;
