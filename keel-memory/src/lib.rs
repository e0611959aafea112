//! In-memory scripted backend.
//!
//! Statements are not interpreted: each round trip pops the next scripted
//! result set and records the SQL it received, which makes the connection a
//! deterministic stand-in for a real backend in tests. Both execution
//! channels are implemented over the same script.

mod connection;
mod driver;

pub use connection::*;
pub use driver::*;
