//! # Puzzle — Preamble Hashing and Candidate Checking
//!
//! A `Puzzle` fixes the message preamble `input,owner_key,` for one puzzle
//! input and checks integer candidates against the required digest prefix.
//! The preamble is hashed once at construction; each check clones the
//! seeded SHA-256 state and appends only the candidate's decimal encoding.
//! The preamble is far longer than the encoding, so skipping its re-hash on
//! every attempt is the dominant throughput lever in the search loop.
//!
//! [`digest_message`] is the one-shot equivalent over a full message. The
//! two paths must agree for every candidate; the property test suite holds
//! them to that.

use sha2::{Digest, Sha256};

/// Field separator inside a candidate message.
pub const SEPARATOR: char = ',';

/// A candidate message together with its qualifying digest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Solution {
    pub message: String,
    pub digest: String,
}

/// One puzzle input plus everything needed to check candidates against it.
#[derive(Clone)]
pub struct Puzzle {
    input: String,
    preamble: String,
    seeded: Sha256,
    prefix: String,
}

impl Puzzle {
    pub fn new(input: &str, owner_key: &str, prefix: &str) -> Self {
        let preamble = format!("{input}{SEPARATOR}{owner_key}{SEPARATOR}");
        let mut seeded = Sha256::new();
        seeded.update(preamble.as_bytes());
        Puzzle {
            input: input.to_string(),
            preamble,
            seeded,
            prefix: prefix.to_string(),
        }
    }

    /// The puzzle input this instance extends.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Check one candidate. Returns the full solution when the digest of
    /// `preamble + candidate` starts with the required prefix.
    pub fn check(&self, candidate: u64) -> Option<Solution> {
        let encoded = candidate.to_string();
        let mut hasher = self.seeded.clone();
        hasher.update(encoded.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        if digest.starts_with(&self.prefix) {
            Some(Solution {
                message: format!("{}{}", self.preamble, encoded),
                digest,
            })
        } else {
            None
        }
    }
}

/// One-shot digest of a full message. Correctness-equivalent to the
/// cloned-state path in [`Puzzle::check`], just slower per attempt.
pub fn digest_message(message: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(message.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Published SHA-256 vectors pin down the digest encoding: 64 lowercase
    /// hex characters, no truncation.
    #[test]
    fn digest_message_matches_known_vectors() {
        assert_eq!(
            digest_message(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            digest_message("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    /// The cloned-state path and the one-shot path must produce identical
    /// digests; they are two implementations of the same function.
    #[test]
    fn check_agrees_with_one_shot_digest() {
        let puzzle = Puzzle::new("abc123", "steve", "");
        for candidate in [0u64, 1, 42, 1_000_000, u64::MAX] {
            let solution = puzzle.check(candidate).expect("empty prefix matches all");
            assert_eq!(solution.digest, digest_message(&solution.message));
        }
    }

    #[test]
    fn message_layout_is_input_owner_candidate() {
        let puzzle = Puzzle::new("abc123", "steve", "");
        let solution = puzzle.check(42).unwrap();
        assert_eq!(solution.message, "abc123,steve,42");
        assert_eq!(solution.digest.len(), 64);
    }

    /// A prefix outside the hex alphabet can never match, so `check` is
    /// deterministic `None` for every candidate.
    #[test]
    fn non_hex_prefix_never_matches() {
        let puzzle = Puzzle::new("abc123", "steve", "zz");
        for candidate in 0..64 {
            assert_eq!(puzzle.check(candidate), None);
        }
    }

    #[test]
    fn input_accessor_returns_the_input() {
        let puzzle = Puzzle::new("abc123", "steve", "f1eece");
        assert_eq!(puzzle.input(), "abc123");
    }

    /// Re-checking the same candidate is reproducible; the seeded state is
    /// cloned, never consumed.
    #[test]
    fn check_is_repeatable() {
        let puzzle = Puzzle::new("abc123", "steve", "");
        assert_eq!(puzzle.check(7), puzzle.check(7));
    }
}
