//! # fleecehunt — Proof-of-Work Racing Miner
//!
//! Races to extend the coin service's current chain hash into a message
//! whose SHA-256 digest starts with the required solution prefix, and to
//! submit the winner before a competitor does. The puzzle input rotates
//! every time someone solves it, so the miner continuously re-checks
//! freshness and re-targets its worker pool without idling.
//!
//! ## Architecture
//!
//! ```text
//! Supervisor (single-threaded)          Coin service
//! ┌───────────────────────────┐        ┌──────────────────┐
//! │ fetch_current ────────────┼──GET──>│ /current          │
//! │ retask(input)             │        │                   │
//! │   ├─ worker 0 ──channel──┐│        │                   │
//! │   ├─ worker 1 ──channel──┤│        │                   │
//! │   └─ worker N ──channel──┘│        │                   │
//! │ poll_once(timeout)        │        │                   │
//! │ validate + submit ────────┼──POST─>│ /coins            │
//! │ conflict? retask(token) <─┼──400───│  "latest hash (…)"│
//! └───────────────────────────┘        └──────────────────┘
//! ```
//!
//! Workers partition the candidate space by residue class (worker `i` of
//! `n` tries `i, i+n, i+2n, …`), so pool throughput scales linearly with
//! worker count without any coordination between workers.

pub mod config;
pub mod progress;
pub mod puzzle;
pub mod service;
pub mod supervisor;
pub mod worker;

pub use config::MinerConfig;
pub use puzzle::{Puzzle, Solution};
pub use service::{CoinService, HttpCoinService, ServiceResponse};
pub use supervisor::Supervisor;
