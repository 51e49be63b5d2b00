//! Strand - Single-Threaded Readiness-Driven TCP Server Core
//!
//! Architecture:
//! - One Thread: all connections interleaved on a single event loop
//! - Readiness-Driven: epoll/kqueue/IOCP via mio, no async runtime
//! - One-Shot Interests: every registration fires once and is re-armed
//!   explicitly by the state machine that owns it
//! - No Locks: registry and poller are owned by the loop, never shared

pub mod network;
pub mod poller;
pub mod protocol;

pub use network::{Server, ServerConfig};
pub use protocol::RESPONSE;
