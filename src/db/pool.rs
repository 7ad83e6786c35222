//! Connection Pool
//!
//! Fixed-size pool of backend connections created eagerly at startup.
//!
//! Connections live in exactly one of two partitions: `available` (parked in
//! the pool) or leased (owned by a `ConnectionLease`). `acquire` blocks on a
//! condition variable until a connection is parked or the pool closes.
//! Dropping a lease parks its connection again and wakes one waiter.
//!
//! The mutex only guards the partition bookkeeping. Backend I/O (connecting,
//! running commands, closing) always happens with the lock released.

use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::db::connection::{Connection, Connector};
use crate::error::{KvError, Result};

/// Pool sizing and wait policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of connections opened at startup; never changes afterwards.
    pub size: usize,
    /// How long `acquire` may wait. `None` waits until a connection frees up
    /// or the pool closes.
    pub acquire_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: 8,
            acquire_timeout: None,
        }
    }
}

/// Point-in-time view of the pool partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub size: usize,
    pub available: usize,
    pub leased: usize,
    pub closed: bool,
}

struct PoolState<C> {
    available: Vec<C>,
    leased: usize,
    closed: bool,
}

/// Bounded pool handing out exclusive connection leases.
pub struct ConnectionPool<C: Connection> {
    state: Mutex<PoolState<C>>,
    available_cv: Condvar,
    size: usize,
    acquire_timeout: Option<Duration>,
}

impl<C: Connection> ConnectionPool<C> {
    // == Init ==
    /// Opens `config.size` connections through `connector`.
    ///
    /// Fails fast: if any connection cannot be opened, the ones already opened
    /// are closed and the error is returned, so no under-provisioned pool is
    /// ever handed out.
    pub fn init<K>(connector: &K, config: PoolConfig) -> Result<Self>
    where
        K: Connector<Conn = C>,
    {
        if config.size == 0 {
            return Err(KvError::InvalidCapacity(
                "connection pool size must be at least 1".to_string(),
            ));
        }

        let mut connections = Vec::with_capacity(config.size);
        for slot in 0..config.size {
            match connector.connect() {
                Ok(conn) => connections.push(conn),
                Err(err) => {
                    error!(
                        "Connection {}/{} failed, discarding pool: {}",
                        slot + 1,
                        config.size,
                        err
                    );
                    connections.into_iter().for_each(close_connection);
                    return Err(err);
                }
            }
        }

        info!("Connection pool initialized with {} connections", config.size);

        Ok(Self {
            state: Mutex::new(PoolState {
                available: connections,
                leased: 0,
                closed: false,
            }),
            available_cv: Condvar::new(),
            size: config.size,
            acquire_timeout: config.acquire_timeout,
        })
    }

    // == Acquire ==
    /// Leases a connection, blocking until one is available.
    ///
    /// Fails with `PoolClosed` if the pool is closed before or during the
    /// wait, and with `PoolExhausted` if an acquire timeout is configured and
    /// elapses first.
    pub fn acquire(&self) -> Result<ConnectionLease<'_, C>> {
        let started = Instant::now();
        let mut state = self.state.lock();

        loop {
            if state.closed {
                return Err(KvError::PoolClosed);
            }

            if let Some(conn) = state.available.pop() {
                state.leased += 1;
                return Ok(ConnectionLease {
                    pool: self,
                    conn: Some(conn),
                });
            }

            match self.acquire_timeout {
                Some(timeout) => {
                    let deadline = started + timeout;
                    if Instant::now() >= deadline {
                        warn!("Timed out after {:?} waiting for a connection", timeout);
                        return Err(KvError::PoolExhausted(timeout));
                    }
                    self.available_cv.wait_until(&mut state, deadline);
                }
                None => self.available_cv.wait(&mut state),
            }
        }
    }

    // == Release ==
    /// Parks a leased connection and wakes one waiter.
    ///
    /// After `close` the connection is closed instead of parked.
    fn release(&self, conn: C) {
        let mut state = self.state.lock();
        state.leased -= 1;

        if state.closed {
            drop(state);
            close_connection(conn);
            return;
        }

        state.available.push(conn);
        drop(state);
        self.available_cv.notify_one();
    }

    // == Close ==
    /// Marks the pool closed, wakes every waiter and closes parked connections.
    ///
    /// Outstanding leases close their connection when they are dropped.
    /// Calling `close` more than once is a no-op.
    pub fn close(&self) {
        let parked = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            std::mem::take(&mut state.available)
        };

        self.available_cv.notify_all();
        info!("Connection pool closed, releasing {} idle connections", parked.len());

        parked.into_iter().for_each(close_connection);
    }

    pub fn status(&self) -> PoolStatus {
        let state = self.state.lock();
        PoolStatus {
            size: self.size,
            available: state.available.len(),
            leased: state.leased,
            closed: state.closed,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl<C: Connection> Drop for ConnectionPool<C> {
    fn drop(&mut self) {
        self.close();
    }
}

fn close_connection<C: Connection>(conn: C) {
    if let Err(err) = conn.close() {
        warn!("Failed to close backend connection: {}", err);
    }
}

// == Connection Lease ==
/// Exclusive borrow of one pooled connection.
///
/// The connection goes back to the pool when the lease is dropped, whichever
/// way the borrowing scope exits.
pub struct ConnectionLease<'a, C: Connection> {
    pool: &'a ConnectionPool<C>,
    conn: Option<C>,
}

impl<C: Connection> ConnectionLease<'_, C> {
    /// Returns the connection to the pool now rather than at end of scope.
    pub fn release(self) {
        drop(self);
    }
}

impl<C: Connection> Deref for ConnectionLease<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        // Only `Drop` takes the connection out
        self.conn.as_ref().expect("lease holds a connection until dropped")
    }
}

impl<C: Connection> DerefMut for ConnectionLease<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.conn.as_mut().expect("lease holds a connection until dropped")
    }
}

impl<C: Connection> Drop for ConnectionLease<'_, C> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}
