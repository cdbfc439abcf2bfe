//! Stateless parsers, one per external tool output format.
//!
//! Parsers never fail: fields the text does not contain fall back to the
//! documented placeholders ("N/A", "Unknown", 0, empty lists).

pub mod host;
pub mod interface;
pub mod ping;
pub mod port;
pub mod route;
