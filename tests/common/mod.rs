//! Shared test fixtures: a SQLite connector wrapped with fault injection
//! and command counting.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use kvcache::db::{
    Connection, ConnectionPool, Connector, PoolConfig, SqliteConnection, SqliteConnector,
};
use kvcache::{KvError, KvService, Result};

/// Switches shared by a connector and every connection it opened.
#[derive(Clone, Default)]
pub struct Faults {
    fail_commands: Arc<AtomicBool>,
    commands: Arc<AtomicUsize>,
    read_gate: Arc<Mutex<Option<ReadGate>>>,
}

/// Parks one backend read after it has fetched its row.
struct ReadGate {
    reached: Sender<()>,
    resume: Receiver<()>,
}

/// Test-side end of a parked read.
pub struct ParkedRead {
    reached: Receiver<()>,
    resume: Sender<()>,
}

impl ParkedRead {
    /// Blocks until the gated read has its result in hand.
    pub fn wait_until_parked(&self) {
        self.reached.recv().unwrap();
    }

    pub fn resume(self) {
        self.resume.send(()).unwrap();
    }
}

impl Faults {
    /// Makes every subsequent backend command fail.
    pub fn fail_commands(&self, on: bool) {
        self.fail_commands.store(on, Ordering::SeqCst);
    }

    /// Number of commands that reached the backend, failed or not.
    pub fn commands(&self) -> usize {
        self.commands.load(Ordering::SeqCst)
    }

    /// Parks the next `query_optional` between reading the row and
    /// returning it to the caller.
    pub fn park_next_read(&self) -> ParkedRead {
        let (reached_tx, reached_rx) = mpsc::channel();
        let (resume_tx, resume_rx) = mpsc::channel();
        *self.read_gate.lock().unwrap() = Some(ReadGate {
            reached: reached_tx,
            resume: resume_rx,
        });
        ParkedRead {
            reached: reached_rx,
            resume: resume_tx,
        }
    }

    fn after_read(&self) {
        let gate = self.read_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.reached.send(()).unwrap();
            gate.resume.recv().unwrap();
        }
    }

    fn check(&self) -> Result<()> {
        self.commands.fetch_add(1, Ordering::SeqCst);
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(KvError::Query("injected backend failure".to_string()));
        }
        Ok(())
    }
}

pub struct FlakyConnector {
    inner: SqliteConnector,
    faults: Faults,
    opened: AtomicUsize,
    fail_connect_on: Option<usize>,
}

impl FlakyConnector {
    pub fn new(dir: &tempfile::TempDir, faults: Faults) -> Self {
        Self {
            inner: SqliteConnector::new(dir.path().join("kv.db")),
            faults,
            opened: AtomicUsize::new(0),
            fail_connect_on: None,
        }
    }

    /// Refuses the `n`th connection (0-based).
    pub fn failing_connect(mut self, n: usize) -> Self {
        self.fail_connect_on = Some(n);
        self
    }
}

impl Connector for FlakyConnector {
    type Conn = FlakyConnection;

    fn connect(&self) -> Result<FlakyConnection> {
        let n = self.opened.fetch_add(1, Ordering::SeqCst);
        if Some(n) == self.fail_connect_on {
            return Err(KvError::Connection("injected connect failure".to_string()));
        }
        Ok(FlakyConnection {
            inner: self.inner.connect()?,
            faults: self.faults.clone(),
        })
    }
}

pub struct FlakyConnection {
    inner: SqliteConnection,
    faults: Faults,
}

impl Connection for FlakyConnection {
    fn quote(&self, raw: &[u8]) -> String {
        self.inner.quote(raw)
    }

    fn execute(&mut self, command: &str) -> Result<usize> {
        self.faults.check()?;
        self.inner.execute(command)
    }

    fn query_optional(&mut self, command: &str) -> Result<Option<Vec<u8>>> {
        self.faults.check()?;
        let row = self.inner.query_optional(command);
        self.faults.after_read();
        row
    }

    fn close(self) -> Result<()> {
        self.inner.close()
    }
}

pub fn pool(
    dir: &tempfile::TempDir,
    faults: &Faults,
    size: usize,
) -> Arc<ConnectionPool<FlakyConnection>> {
    let connector = FlakyConnector::new(dir, faults.clone());
    let config = PoolConfig {
        size,
        acquire_timeout: None,
    };
    Arc::new(ConnectionPool::init(&connector, config).unwrap())
}

/// Service over a fresh database with the table already created.
pub fn service(
    dir: &tempfile::TempDir,
    pool_size: usize,
    cache_capacity: usize,
) -> (KvService<FlakyConnection>, Faults) {
    let faults = Faults::default();
    let service = KvService::start(pool(dir, &faults, pool_size), cache_capacity).unwrap();
    (service, faults)
}
