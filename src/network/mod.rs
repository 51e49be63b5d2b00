//! Network Layer: the single-threaded server core
//!
//! - `server`: listener bootstrap and the event loop
//! - `connection`: per-connection state machine (Reading -> Writing)
//! - `registry`: key -> connection context map, owned by the loop

mod connection;
mod registry;
mod server;

pub use connection::{ConnState, Connection, Transition};
pub use registry::{Registry, LISTENER};
pub use server::{Server, ServerConfig};
