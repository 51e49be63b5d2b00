//! Protocol Layer: request metadata scan and the fixed response
//!
//! Deliberately NOT an HTTP implementation. The server only needs to know
//! when it has seen a whole request, so this layer does one best-effort,
//! line-oriented scan for a `content-length:` header and exposes a single
//! byte-exact response constant.

mod request;
mod response;

pub use request::{expected_total, request_line};
pub use response::RESPONSE;
