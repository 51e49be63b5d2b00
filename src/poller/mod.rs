//! Readiness Notifier: typed wrapper over the OS event facility
//!
//! Everything OS-specific (epoll/kqueue/IOCP) stays behind this module;
//! the rest of the crate never touches `mio::Poll` or raw handles.
//!
//! Every interest registered here is ONE-SHOT by contract: once an event
//! for a key is delivered, that key is considered disarmed and must be
//! re-armed with `modify_interest` before it will fire again. On the epoll
//! backend mio registers edge-triggered; re-registering resets the edge
//! state, so an interest that is re-armed while the condition still holds
//! fires again on the next `wait`.

use std::io;
use std::time::Duration;

use mio::event::Source;
use mio::{Events, Interest, Poll, Token};

/// Which readiness a registration waits for.
///
/// Exactly one direction per registration - flipping a connection from
/// read to write is a `modify_interest`, never a combined interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Readable,
    Writable,
}

impl Direction {
    #[inline(always)]
    fn as_mio(self) -> Interest {
        match self {
            Direction::Readable => Interest::READABLE,
            Direction::Writable => Interest::WRITABLE,
        }
    }
}

/// A fired readiness event, tagged with the key it was registered under.
#[derive(Debug, Clone, Copy)]
pub struct PollEvent {
    pub key: Token,
    pub readable: bool,
    pub writable: bool,
}

/// Owns the OS notification instance. Created once at startup;
/// single-threaded by construction, so no synchronization anywhere.
pub struct Poller {
    poll: Poll,
    events: Events,
}

impl Poller {
    /// Allocate the OS notification instance.
    ///
    /// `event_capacity` bounds how many fired events a single `wait`
    /// call can return; anything beyond it is reported on a later tick.
    pub fn new(event_capacity: usize) -> io::Result<Self> {
        Ok(Self {
            poll: Poll::new()?,
            events: Events::with_capacity(event_capacity),
        })
    }

    /// Register a one-shot interest for a handle not yet tracked.
    pub fn add_interest<S>(&self, source: &mut S, key: Token, dir: Direction) -> io::Result<()>
    where
        S: Source + ?Sized,
    {
        self.poll.registry().register(source, key, dir.as_mio())
    }

    /// Replace the interest of an already-tracked handle.
    ///
    /// Used both to flip Readable -> Writable and to re-arm a one-shot
    /// interest that just fired.
    pub fn modify_interest<S>(&self, source: &mut S, key: Token, dir: Direction) -> io::Result<()>
    where
        S: Source + ?Sized,
    {
        self.poll.registry().reregister(source, key, dir.as_mio())
    }

    /// Deregister a handle entirely. Must happen before the socket is
    /// closed so the OS facility holds no dangling entry.
    pub fn remove_interest<S>(&self, source: &mut S) -> io::Result<()>
    where
        S: Source + ?Sized,
    {
        self.poll.registry().deregister(source)
    }

    /// Block until at least one interest fires, the timeout elapses, or a
    /// signal interrupts the call. Fills `out` and returns the event count.
    ///
    /// Zero events is not a failure: it means the timeout elapsed (or the
    /// call was interrupted) and the loop should simply tick again.
    pub fn wait(&mut self, out: &mut Vec<PollEvent>, timeout: Option<Duration>) -> io::Result<usize> {
        out.clear();

        match self.poll.poll(&mut self.events, timeout) {
            Ok(()) => {}
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => return Ok(0),
            Err(e) => return Err(e),
        }

        for event in self.events.iter() {
            out.push(PollEvent {
                key: event.token(),
                readable: event.is_readable(),
                writable: event.is_writable(),
            });
        }

        Ok(out.len())
    }
}
