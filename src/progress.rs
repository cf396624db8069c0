//! # Progress — Atomic Mining Progress Counters
//!
//! Thread-safe progress tracking shared between the worker pool and the
//! background status reporter. Atomics keep the hot-path counters
//! lock-free; a Mutex guards only the current puzzle input, which changes
//! once per retask rather than per hash.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

pub struct Progress {
    /// Candidates hashed across all workers and generations.
    pub hashed: AtomicU64,
    /// Solutions accepted for submission.
    pub solved: AtomicU64,
    /// Results discarded by the staleness check.
    pub stale: AtomicU64,
    /// Puzzle input the pool is currently tasked with.
    pub current: Mutex<String>,
    start: Instant,
    shutdown: AtomicBool,
}

impl Progress {
    pub fn new() -> Arc<Self> {
        Arc::new(Progress {
            hashed: AtomicU64::new(0),
            solved: AtomicU64::new(0),
            stale: AtomicU64::new(0),
            current: Mutex::new(String::new()),
            start: Instant::now(),
            shutdown: AtomicBool::new(false),
        })
    }

    pub fn start_reporter(self: &Arc<Self>, interval: Duration) -> thread::JoinHandle<()> {
        let progress = Arc::clone(self);
        thread::spawn(move || loop {
            thread::sleep(interval);
            if progress.shutdown.load(Ordering::Relaxed) {
                break;
            }
            progress.print_status();
        })
    }

    pub fn print_status(&self) {
        let elapsed = self.start.elapsed();
        let hashed = self.hashed.load(Ordering::Relaxed);
        let solved = self.solved.load(Ordering::Relaxed);
        let stale = self.stale.load(Ordering::Relaxed);
        let current = self.current.lock().unwrap().clone();
        let rate = if elapsed.as_secs() > 0 {
            hashed as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        let h = elapsed.as_secs() / 3600;
        let m = (elapsed.as_secs() % 3600) / 60;
        let s = elapsed.as_secs() % 60;
        info!(
            current = %current,
            hashed,
            rate = format_args!("{:.0}", rate),
            solved,
            stale,
            elapsed = format_args!("{:02}:{:02}:{:02}", h, m, s),
            "mining progress"
        );
    }

    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}
