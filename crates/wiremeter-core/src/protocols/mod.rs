//! Wire-grammar decoding modules.
//!
//! Each layer follows the same structure:
//! - `layout`: byte offsets, masks and id constants (source of truth)
//! - `reader`: safe byte access and encoding conventions
//! - `parser`: domain-level decoding (no direct byte indexing)
//! - `error`: explicit, actionable errors
//!
//! Parsers are pure and contain no I/O; sources feed them and the
//! analysis layer owns all mutable state. The grammar is layered: an
//! outer length-and-type envelope (`envelope`), a routing header inside
//! notifications (`notify`), a tag/value schema encoding (`wire`,
//! `messages`), and key/value attribute blobs nested in schema fields
//! (`attrs`).

pub mod attrs;
pub mod envelope;
pub mod messages;
pub mod notify;
pub mod wire;
