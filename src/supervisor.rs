//! # Supervisor — Worker Pool Coordination and Retasking
//!
//! Owns the current puzzle input and the single live worker generation.
//! The loop: fetch the authoritative input and retask (a no-op when it is
//! unchanged), wait up to the poll interval for any worker to report,
//! validate whatever arrived against the input held *now*, submit winners,
//! and react to the service's verdict, including the fast path where a
//! conflict response already names the true current input, saving a fetch
//! round trip.
//!
//! ## Staleness
//!
//! Generation teardown closes the result channels, so a result from a
//! cancelled generation is normally never seen. The one race (a worker
//! emitting between the cancellation signal and its exit) is caught by
//! the validation-time prefix check, not by channel lifecycle.
//!
//! ## Speculation
//!
//! A winning digest is overwhelmingly likely to become the next puzzle
//! input, so the pool is retasked to it *before* the submission round
//! trip. If the service disagrees, its conflict body corrects the guess.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossbeam_channel::{Select, TryRecvError};
use tracing::{debug, info, warn};

use crate::config::MinerConfig;
use crate::progress::Progress;
use crate::puzzle::Puzzle;
use crate::service::CoinService;
use crate::worker::{self, WorkerHandle};

/// Literal wrapper the service puts around the authoritative input in a
/// conflict body.
const LATEST_HASH_OPEN: &str = "latest hash (";

/// One generation of workers, torn down as a unit.
struct Generation {
    workers: Vec<WorkerHandle>,
    cancel: Arc<AtomicBool>,
}

impl Generation {
    /// Signal-cancel every worker and wait for the threads to exit. The
    /// search loop observes the flag within one iteration, so this wait is
    /// bounded.
    fn teardown(self) {
        self.cancel.store(true, Ordering::Relaxed);
        for handle in self.workers {
            handle.join();
        }
    }
}

pub struct Supervisor<S: CoinService> {
    config: MinerConfig,
    service: S,
    progress: Arc<Progress>,
    current_input: Option<String>,
    generation: Option<Generation>,
    generation_seq: u64,
}

impl<S: CoinService> Supervisor<S> {
    pub fn new(config: MinerConfig, service: S, progress: Arc<Progress>) -> Self {
        Supervisor {
            config,
            service,
            progress,
            current_input: None,
            generation: None,
            generation_seq: 0,
        }
    }

    /// Puzzle input the live generation is tasked with, if any.
    pub fn current_input(&self) -> Option<&str> {
        self.current_input.as_deref()
    }

    /// Monotonic id of the live generation. Bumps once per actual respawn,
    /// so a no-op retask leaves it unchanged.
    pub fn generation_seq(&self) -> u64 {
        self.generation_seq
    }

    /// Run the mining loop forever. Nothing in normal operation (network
    /// failures, stale results, rejected submissions) terminates it.
    pub fn run(&mut self) -> Result<()> {
        let mut freshly_tasked = false;
        loop {
            if !freshly_tasked {
                match self.service.fetch_current() {
                    Ok(latest) => self.retask(&latest),
                    Err(err) => warn!(error = %err, "failed to fetch current puzzle input"),
                }
            }
            freshly_tasked = false;
            for line in self.poll_once(self.config.poll_interval) {
                if self.handle_line(&line) {
                    freshly_tasked = true;
                }
            }
        }
    }

    /// Point the pool at `new_input`. A no-op when the pool already holds
    /// it; otherwise the live generation is torn down and a fresh one is
    /// spawned, one worker per partition index.
    pub fn retask(&mut self, new_input: &str) {
        if self.current_input.as_deref() == Some(new_input) {
            debug!(input = new_input, "task unchanged");
            return;
        }
        if let Some(generation) = self.generation.take() {
            generation.teardown();
        }
        self.current_input = Some(new_input.to_string());
        *self.progress.current.lock().unwrap() = new_input.to_string();
        self.generation_seq += 1;

        let cancel = Arc::new(AtomicBool::new(false));
        let puzzle = Puzzle::new(new_input, &self.config.owner_key, &self.config.solution_prefix);
        let workers = (0..self.config.pool_size)
            .map(|index| {
                worker::spawn(
                    puzzle.clone(),
                    index,
                    self.config.pool_size,
                    Arc::clone(&cancel),
                    Arc::clone(&self.progress),
                )
            })
            .collect();
        self.generation = Some(Generation { workers, cancel });
        info!(
            generation = self.generation_seq,
            input = new_input,
            workers = self.config.pool_size,
            "new task"
        );
    }

    /// Wait up to `timeout` for any worker in the live generation to
    /// report, then drain every ready channel. Returns no lines on
    /// timeout. A worker that exited reads as disconnected and is retired
    /// from the select set rather than reported ready forever; with no
    /// live channel at all the call degrades to a plain bounded wait so
    /// the loop keeps its cadence.
    pub fn poll_once(&mut self, timeout: Duration) -> Vec<String> {
        let Some(generation) = self.generation.as_mut() else {
            thread::sleep(timeout);
            return Vec::new();
        };
        {
            let live: Vec<_> = generation
                .workers
                .iter()
                .filter(|w| !w.finished)
                .map(|w| &w.receiver)
                .collect();
            if live.is_empty() {
                thread::sleep(timeout);
                return Vec::new();
            }
            let mut select = Select::new();
            for receiver in &live {
                select.recv(receiver);
            }
            if select.ready_timeout(timeout).is_err() {
                return Vec::new();
            }
        }
        let mut lines = Vec::new();
        for handle in generation.workers.iter_mut().filter(|w| !w.finished) {
            match handle.receiver.try_recv() {
                Ok(line) => lines.push(line),
                Err(TryRecvError::Disconnected) => handle.finished = true,
                Err(TryRecvError::Empty) => {}
            }
        }
        lines
    }

    /// Handle one worker line. Returns true when the pool ended up freshly
    /// tasked by a processed result, in which case the caller skips its
    /// next authoritative fetch.
    pub fn handle_line(&mut self, line: &str) -> bool {
        let trimmed = line.trim_end();
        let Some((message, digest)) = trimmed.split_once('|') else {
            warn!(line = trimmed, "malformed worker line dropped");
            return false;
        };
        // Validity is relative to the input held *now*, not when the
        // worker was tasked.
        let fresh = self
            .current_input
            .as_deref()
            .is_some_and(|current| message.starts_with(current));
        if !fresh {
            self.progress.stale.fetch_add(1, Ordering::Relaxed);
            warn!(message, "stale solution discarded");
            return false;
        }

        info!(message, digest, "solution found");
        self.progress.solved.fetch_add(1, Ordering::Relaxed);
        // Speculative retask: resume useful work before the network round
        // trip completes.
        self.retask(digest);

        match self.service.submit(message) {
            Ok(response) if response.status == 200 => {
                info!(status = response.status, "solution accepted");
                true
            }
            Ok(response) if response.status == 400 => {
                match extract_latest_hash(&response.body) {
                    Some(latest) => {
                        info!(latest, "solution rejected, service supplied newer input");
                        self.retask(latest);
                        true
                    }
                    None => {
                        warn!(body = %response.body, "conflict without recognizable input, will refetch");
                        false
                    }
                }
            }
            Ok(response) => {
                warn!(status = response.status, body = %response.body, "unexpected submission response, will refetch");
                false
            }
            Err(err) => {
                warn!(error = %err, "submission failed, will refetch");
                false
            }
        }
    }
}

impl<S: CoinService> Drop for Supervisor<S> {
    fn drop(&mut self) {
        if let Some(generation) = self.generation.take() {
            generation.teardown();
        }
    }
}

/// Pull the authoritative puzzle input out of a conflict body. The service
/// wraps it in a fixed literal: `... latest hash (<token>) ...`. Anything
/// else (missing wrapper, unterminated, empty token) is treated by the
/// caller as a generic failed submission.
pub fn extract_latest_hash(body: &str) -> Option<&str> {
    let (_, rest) = body.split_once(LATEST_HASH_OPEN)?;
    let (token, _) = rest.split_once(')')?;
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
