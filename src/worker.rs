//! # Worker — Partitioned Search Threads
//!
//! Each worker owns one residue class of the candidate space: worker
//! `index` of `count` enumerates `index, index + count, index + 2*count, …`
//! so a generation of `count` workers covers the non-negative integers
//! disjointly and exhaustively with no coordination between them.
//!
//! A worker emits at most one result line on its dedicated channel, then
//! stops. Cancellation is cooperative: the generation's shared flag is
//! checked once per candidate, so a retask is observed within one loop
//! iteration. The line is sent as a single channel message, so the
//! supervisor can never observe a partial result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::Result;
use crossbeam_channel::{bounded, Receiver, Select, Sender};
use tracing::debug;

use crate::config::MinerConfig;
use crate::progress::Progress;
use crate::puzzle::{Puzzle, Solution};

/// Hot-loop granularity for flushing the shared hash counter.
const FLUSH_EVERY: u64 = 4096;

/// Supervisor-side record of one running worker.
pub struct WorkerHandle {
    pub index: usize,
    pub receiver: Receiver<String>,
    /// Set by the supervisor once the channel reads as disconnected.
    pub finished: bool,
    thread: thread::JoinHandle<()>,
}

impl WorkerHandle {
    /// Wait for the worker thread to exit. Callers set the generation's
    /// cancellation flag first; the search loop observes it within one
    /// iteration, so this wait is bounded.
    pub fn join(self) {
        let _ = self.thread.join();
    }
}

/// Candidate sequence for partition `index` of `count`: an arithmetic
/// progression starting at `index` with stride `count`.
pub fn candidates(index: usize, count: usize) -> impl Iterator<Item = u64> {
    (index as u64..).step_by(count)
}

/// Spawn one worker for partition `index` of `count`, reporting on a
/// dedicated single-slot channel.
pub fn spawn(
    puzzle: Puzzle,
    index: usize,
    count: usize,
    cancel: Arc<AtomicBool>,
    progress: Arc<Progress>,
) -> WorkerHandle {
    debug_assert!(index < count);
    let (sender, receiver) = bounded(1);
    let thread = thread::spawn(move || run(puzzle, index, count, cancel, sender, progress));
    WorkerHandle {
        index,
        receiver,
        finished: false,
        thread,
    }
}

/// Worker loop: enumerate this partition's candidates until one solves the
/// puzzle or cancellation is observed.
fn run(
    puzzle: Puzzle,
    index: usize,
    count: usize,
    cancel: Arc<AtomicBool>,
    sender: Sender<String>,
    progress: Arc<Progress>,
) {
    debug!(worker = index, input = puzzle.input(), "worker started");
    let mut pending = 0u64;
    for candidate in candidates(index, count) {
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        if let Some(solution) = puzzle.check(candidate) {
            progress.hashed.fetch_add(pending + 1, Ordering::Relaxed);
            // A closed channel means the generation was torn down while we
            // were hashing; the result is no longer wanted.
            let _ = sender.send(format!("{}|{}\n", solution.message, solution.digest));
            debug!(worker = index, candidate, "solution emitted");
            return;
        }
        pending += 1;
        if pending == FLUSH_EVERY {
            progress.hashed.fetch_add(pending, Ordering::Relaxed);
            pending = 0;
        }
    }
    progress.hashed.fetch_add(pending, Ordering::Relaxed);
    debug!(worker = index, "worker cancelled");
}

/// Solve one puzzle input with a local pool and block until the first
/// worker reports. Used by the `solve` subcommand; nothing is submitted.
pub fn solve_blocking(
    config: &MinerConfig,
    input: &str,
    progress: &Arc<Progress>,
) -> Result<Solution> {
    let cancel = Arc::new(AtomicBool::new(false));
    let puzzle = Puzzle::new(input, &config.owner_key, &config.solution_prefix);
    let handles: Vec<WorkerHandle> = (0..config.pool_size)
        .map(|index| {
            spawn(
                puzzle.clone(),
                index,
                config.pool_size,
                Arc::clone(&cancel),
                Arc::clone(progress),
            )
        })
        .collect();

    let line = {
        let mut select = Select::new();
        for handle in &handles {
            select.recv(&handle.receiver);
        }
        let op = select.select();
        let index = op.index();
        op.recv(&handles[index].receiver)?
    };
    cancel.store(true, Ordering::Relaxed);
    for handle in handles {
        handle.join();
    }

    let trimmed = line.trim_end();
    let (message, digest) = trimmed
        .split_once('|')
        .ok_or_else(|| anyhow::anyhow!("malformed worker line: {trimmed}"))?;
    Ok(Solution {
        message: message.to_string(),
        digest: digest.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::digest_message;
    use crossbeam_channel::{RecvTimeoutError, TryRecvError};
    use std::time::Duration;

    /// A digest prefix no candidate will hit within a test's lifetime.
    const UNREACHABLE_PREFIX: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn partition_sequences_interleave() {
        let first: Vec<u64> = candidates(1, 5).take(3).collect();
        assert_eq!(first, vec![1, 6, 11]);
        let solo: Vec<u64> = candidates(0, 1).take(4).collect();
        assert_eq!(solo, vec![0, 1, 2, 3]);
    }

    /// With an empty prefix every candidate matches, so worker `index`
    /// deterministically finds candidate `index` first, and emits exactly
    /// one line before stopping.
    #[test]
    fn worker_emits_exactly_one_line() {
        let puzzle = Puzzle::new("seed", "steve", "");
        let cancel = Arc::new(AtomicBool::new(false));
        let handle = spawn(puzzle, 0, 1, cancel, Progress::new());

        let line = handle
            .receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("worker should report immediately");
        assert!(line.ends_with('\n'));
        let (message, digest) = line.trim_end().split_once('|').unwrap();
        assert_eq!(message, "seed,steve,0");
        assert_eq!(digest, digest_message(message));

        // The worker stops after its single emission; the channel drains
        // to disconnected, never to a second line.
        assert_eq!(
            handle.receiver.recv_timeout(Duration::from_secs(5)),
            Err(RecvTimeoutError::Disconnected)
        );
    }

    #[test]
    fn cancelled_worker_emits_nothing() {
        let puzzle = Puzzle::new("seed", "steve", UNREACHABLE_PREFIX);
        let cancel = Arc::new(AtomicBool::new(false));
        let handle = spawn(puzzle, 0, 2, Arc::clone(&cancel), Progress::new());
        let receiver = handle.receiver.clone();

        cancel.store(true, Ordering::Relaxed);
        handle.join();
        assert_eq!(receiver.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[test]
    fn worker_counts_hashes() {
        let progress = Progress::new();
        let puzzle = Puzzle::new("seed", "steve", "");
        let cancel = Arc::new(AtomicBool::new(false));
        let handle = spawn(puzzle, 0, 1, cancel, Arc::clone(&progress));
        handle
            .receiver
            .recv_timeout(Duration::from_secs(5))
            .unwrap();
        handle.join();
        assert!(progress.hashed.load(Ordering::Relaxed) >= 1);
    }

    #[test]
    fn solve_blocking_finds_a_solution() {
        let config = MinerConfig {
            solution_prefix: String::new(),
            pool_size: 3,
            ..MinerConfig::default()
        };
        let progress = Progress::new();
        let solution = solve_blocking(&config, "abc123", &progress).unwrap();
        assert!(solution.message.starts_with("abc123,steve,"));
        assert_eq!(solution.digest, digest_message(&solution.message));
    }

    /// Re-running a worker over the same partition finds the same first
    /// candidate: the search is deterministic.
    #[test]
    fn worker_result_is_reproducible() {
        for _ in 0..2 {
            let puzzle = Puzzle::new("seed", "steve", "");
            let cancel = Arc::new(AtomicBool::new(false));
            let handle = spawn(puzzle, 2, 3, cancel, Progress::new());
            let line = handle
                .receiver
                .recv_timeout(Duration::from_secs(5))
                .unwrap();
            assert_eq!(line.trim_end().split_once('|').unwrap().0, "seed,steve,2");
            handle.join();
        }
    }
}
