//! Per-connection state machine
//!
//! One accepted connection moves Reading -> Writing -> closed. The closed
//! state is implicit: the registry entry is removed and the socket drops.
//!
//! Every transition reports which one-shot interest the event loop must
//! register next; nothing here assumes an interest persists after firing.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr};

use mio::net::TcpStream;

use crate::protocol::{expected_total, RESPONSE};

/// Scratch buffer for a single non-blocking read.
const SCRATCH_SIZE: usize = 4096;

/// Socket send/receive buffer size requested on accept (unix only).
#[cfg(unix)]
const SOCK_BUF_SIZE: libc::c_int = 256 * 1024;

/// Machine state of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// Accumulating request bytes until the expected total is reached.
    Reading,
    /// Request complete; waiting for the socket to accept the response.
    Writing,
}

/// What the event loop must register after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Still Reading: re-arm the Readable one-shot interest.
    ReadMore,
    /// Request complete: arm a Writable one-shot interest.
    RespondReady,
    /// Peer closed; deregister and remove from the registry.
    Close,
}

/// Connection Context: socket, accumulated bytes, expected total, state.
///
/// Owned exclusively by the registry and mutated only through the event
/// loop's dispatch; the buffer never holds bytes that were not actually
/// read from the socket.
pub struct Connection {
    stream: TcpStream,
    addr: SocketAddr,
    buffer: Vec<u8>,
    expected: Option<usize>,
    state: ConnState,
}

impl Connection {
    /// Wrap a freshly accepted socket (mio sockets are non-blocking).
    pub fn new(stream: TcpStream, addr: SocketAddr) -> io::Result<Self> {
        // TCP_NODELAY so the single response is not held back by Nagle
        stream.set_nodelay(true)?;

        // Larger socket buffers; ignore errors, not all platforms allow it
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            let fd = stream.as_raw_fd();
            unsafe {
                libc::setsockopt(
                    fd,
                    libc::SOL_SOCKET,
                    libc::SO_SNDBUF,
                    &SOCK_BUF_SIZE as *const _ as *const libc::c_void,
                    std::mem::size_of::<libc::c_int>() as libc::socklen_t,
                );
                libc::setsockopt(
                    fd,
                    libc::SOL_SOCKET,
                    libc::SO_RCVBUF,
                    &SOCK_BUF_SIZE as *const _ as *const libc::c_void,
                    std::mem::size_of::<libc::c_int>() as libc::socklen_t,
                );
            }
        }

        Ok(Self {
            stream,
            addr,
            buffer: Vec::with_capacity(SCRATCH_SIZE),
            expected: None,
            state: ConnState::Reading,
        })
    }

    /// Read transition: one non-blocking read, then accumulate.
    ///
    /// WouldBlock means nothing was available this tick and is never an
    /// error; a zero-byte read is the peer closing before completion.
    pub fn on_readable(&mut self) -> io::Result<Transition> {
        let mut scratch = [0u8; SCRATCH_SIZE];

        match self.stream.read(&mut scratch) {
            Ok(0) => Ok(Transition::Close),
            Ok(n) => Ok(self.ingest(&scratch[..n])),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => Ok(Transition::ReadMore),
            Err(e) => Err(e),
        }
    }

    /// Accumulate `bytes` and decide the next interest.
    ///
    /// The expected total (header length + declared content length) is
    /// derived lazily, on the first tick where the scan succeeds. A
    /// partial body never triggers the write transition.
    pub fn ingest(&mut self, bytes: &[u8]) -> Transition {
        self.buffer.extend_from_slice(bytes);

        if self.expected.is_none() {
            self.expected = expected_total(&self.buffer);
        }

        match self.expected {
            Some(total) if self.buffer.len() >= total => {
                self.state = ConnState::Writing;
                Transition::RespondReady
            }
            _ => Transition::ReadMore,
        }
    }

    /// Write transition: the whole fixed response in one non-blocking
    /// write, then an orderly shutdown of both halves.
    ///
    /// Partial writes are not retried; the Writable event only fires with
    /// send-buffer room, so the small fixed payload lands whole. The
    /// connection is torn down afterwards either way.
    pub fn on_writable(&mut self) -> io::Result<()> {
        match self.stream.write(RESPONSE) {
            Ok(_) => {}
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) => return Err(e),
        }

        // Peer may already be gone; a failed shutdown changes nothing here
        self.stream.shutdown(Shutdown::Both).ok();
        Ok(())
    }

    /// Underlying socket, for interest (de)registration.
    #[inline(always)]
    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    #[inline(always)]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    #[inline(always)]
    pub fn state(&self) -> ConnState {
        self.state
    }

    /// Bytes accumulated so far.
    #[inline(always)]
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }
}
