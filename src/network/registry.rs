//! Connection Registry
//!
//! Single owned map from key to connection context. A key is present iff
//! its socket is open and not yet fully serviced; entries are inserted at
//! accept time and removed exactly once. Keys are monotonically increasing
//! and never reused within a process lifetime, so a stale event can never
//! alias a newer connection.

use std::collections::HashMap;

use mio::Token;

use super::connection::Connection;

/// Reserved key for the listening socket; never handed to a connection.
pub const LISTENER: Token = Token(0);

pub struct Registry {
    conns: HashMap<Token, Connection>,
    next_key: usize,
    max_connections: usize,
}

impl Registry {
    pub fn new(max_connections: usize) -> Self {
        Self {
            conns: HashMap::with_capacity(max_connections),
            next_key: LISTENER.0 + 1,
            max_connections,
        }
    }

    /// True when another accept would exceed the configured bound.
    #[inline(always)]
    pub fn at_capacity(&self) -> bool {
        self.conns.len() >= self.max_connections
    }

    /// Allocate a fresh key. Strictly increasing, never reused.
    #[inline]
    pub fn reserve_key(&mut self) -> Token {
        let key = Token(self.next_key);
        self.next_key += 1;
        key
    }

    #[inline]
    pub fn insert(&mut self, key: Token, conn: Connection) {
        self.conns.insert(key, conn);
    }

    #[inline(always)]
    pub fn get_mut(&mut self, key: Token) -> Option<&mut Connection> {
        self.conns.get_mut(&key)
    }

    /// Remove exactly once; a second remove of the same key is a no-op
    /// (stale events are ignored by the caller).
    #[inline]
    pub fn remove(&mut self, key: Token) -> Option<Connection> {
        self.conns.remove(&key)
    }

    /// Connections currently in flight.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.conns.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }
}
