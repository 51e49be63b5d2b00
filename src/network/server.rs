//! Event loop and listener bootstrap
//!
//! One thread, one loop: wait on the poller, dispatch each fired event to
//! the listener (accept) or to a connection's state machine (registry
//! lookup), then register whatever one-shot interest the transition asks
//! for. The only blocking point in the whole process is `Poller::wait`.
//!
//! Failure semantics are deliberately blunt: anything other than
//! WouldBlock from wait/accept/read/write/registration propagates out of
//! `run` and takes the process down. There is no graceful shutdown; the
//! loop ends only on fatal error or external kill.

use std::io;
use std::net::{SocketAddr, TcpListener};
use std::time::{Duration, Instant};

use mio::net::TcpListener as MioTcpListener;
use mio::Token;

use super::connection::{Connection, Transition};
use super::registry::{Registry, LISTENER};
use crate::poller::{Direction, PollEvent, Poller};
use crate::protocol::request_line;

const STATS_INTERVAL: Duration = Duration::from_secs(5);

/// Event loop knobs. Defaults match a small local deployment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Max fired events drained per `wait` call; excess connections are
    /// serviced on a later tick, never dropped.
    pub event_capacity: usize,
    /// Bounds CPU spin and permits periodic housekeeping; carries no
    /// business meaning.
    pub poll_timeout: Duration,
    /// Accepted sockets beyond this are dropped with a warning.
    pub max_connections: usize,
    pub verbose: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            event_capacity: 1024,
            poll_timeout: Duration::from_millis(100),
            max_connections: 1024,
            verbose: false,
        }
    }
}

/// The server: poller, listener, and registry, all owned by one thread.
pub struct Server {
    poller: Poller,
    listener: MioTcpListener,
    registry: Registry,
    fired: Vec<PollEvent>,
    config: ServerConfig,
    accepted_total: u64,
    responses_total: u64,
    last_stats: Instant,
}

impl Server {
    /// Bind a non-blocking listener and register it Readable under the
    /// reserved listener key.
    pub fn bind(addr: SocketAddr, config: ServerConfig) -> io::Result<Self> {
        let poller = Poller::new(config.event_capacity)?;

        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        let mut listener = MioTcpListener::from_std(listener);

        poller.add_interest(&mut listener, LISTENER, Direction::Readable)?;

        let max_connections = config.max_connections;
        Ok(Self {
            poller,
            listener,
            registry: Registry::new(max_connections),
            fired: Vec::new(),
            config,
            accepted_total: 0,
            responses_total: 0,
            last_stats: Instant::now(),
        })
    }

    /// Actual bound address (useful when binding port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Connections currently in flight.
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Run forever. Returns only on fatal error.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            self.tick()?;

            if self.config.verbose && self.last_stats.elapsed() > STATS_INTERVAL {
                println!(
                    "accepted: {}  responded: {}  in flight: {}",
                    self.accepted_total,
                    self.responses_total,
                    self.registry.len()
                );
                self.last_stats = Instant::now();
            }
        }
    }

    /// One loop iteration: wait, then dispatch every fired event.
    ///
    /// Exposed so tests can drive the loop and observe the registry
    /// between ticks.
    pub fn tick(&mut self) -> io::Result<()> {
        let mut fired = std::mem::take(&mut self.fired);
        self.poller.wait(&mut fired, Some(self.config.poll_timeout))?;

        for i in 0..fired.len() {
            let event = fired[i];
            match event.key {
                LISTENER => self.accept_pending()?,
                key => self.dispatch(key, event)?,
            }
        }

        self.fired = fired;
        Ok(())
    }

    /// Drain the accept queue until WouldBlock, then re-arm the
    /// listener's own Readable interest (one-shot interests do not
    /// persist, including the listener's).
    fn accept_pending(&mut self) -> io::Result<()> {
        loop {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    if self.registry.at_capacity() {
                        eprintln!("max connections reached, dropping {}", addr);
                        continue;
                    }

                    let mut conn = Connection::new(stream, addr)?;
                    let key = self.registry.reserve_key();
                    self.poller
                        .add_interest(conn.stream_mut(), key, Direction::Readable)?;
                    self.registry.insert(key, conn);
                    self.accepted_total += 1;

                    if self.config.verbose {
                        println!("[{}] connected: {}", key.0, addr);
                    }
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e),
            }
        }

        self.poller
            .modify_interest(&mut self.listener, LISTENER, Direction::Readable)
    }

    /// Advance one connection's state machine and register the one-shot
    /// interest its transition asks for.
    fn dispatch(&mut self, key: Token, event: PollEvent) -> io::Result<()> {
        let conn = match self.registry.get_mut(key) {
            Some(c) => c,
            // Stale event for an already-removed connection
            None => return Ok(()),
        };

        if event.readable {
            match conn.on_readable()? {
                Transition::ReadMore => {
                    return self
                        .poller
                        .modify_interest(conn.stream_mut(), key, Direction::Readable);
                }
                Transition::RespondReady => {
                    if self.config.verbose {
                        if let Some(line) = request_line(conn.buffered()) {
                            println!("[{}] request: {}", key.0, line);
                        }
                    }
                    return self
                        .poller
                        .modify_interest(conn.stream_mut(), key, Direction::Writable);
                }
                Transition::Close => {
                    // Peer closed before completing a request
                    if self.config.verbose {
                        println!("[{}] closed by peer: {}", key.0, conn.addr());
                    }
                    return self.teardown(key);
                }
            }
        }

        if event.writable {
            conn.on_writable()?;
            self.responses_total += 1;
            // One response per connection: lifecycle ends here
            return self.teardown(key);
        }

        Ok(())
    }

    /// Remove the registry entry (exactly once) and deregister the socket
    /// before it closes on drop.
    fn teardown(&mut self, key: Token) -> io::Result<()> {
        if let Some(mut conn) = self.registry.remove(key) {
            self.poller.remove_interest(conn.stream_mut())?;
        }
        Ok(())
    }
}
