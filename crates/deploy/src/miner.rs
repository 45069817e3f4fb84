//! Vanity salt mining.
//!
//! A salt is 20 zero bytes followed by 12 random bytes, which is what the immutable
//! CREATE2 factory accepts from any caller. Mining draws salts until the derived address
//! starts with the requested hex prefix.

use std::{
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use alloy_core::primitives::{Address, B256};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{DeployError, create2};

/// Length of the random tail of a salt.
pub const SALT_SUFFIX_LEN: usize = 12;

/// Attempts a worker reserves from the shared counter at a time.
const BATCH_SIZE: u64 = 4096;

/// Attempts between two progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1 << 22;

/// Required leading hex digits of a mined address, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VanityPrefix {
    nibbles: Vec<u8>,
}

impl VanityPrefix {
    /// Parse a prefix such as `8888` or `0xABC`.
    pub fn parse(prefix: &str) -> Result<Self, DeployError> {
        let digits = prefix.trim();
        let digits = digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
            .unwrap_or(digits);

        if digits.len() > 40 {
            return Err(DeployError::InvalidPrefix(prefix.to_string()));
        }

        let nibbles = digits
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| DeployError::InvalidPrefix(prefix.to_string()))?;

        Ok(Self { nibbles })
    }

    pub fn is_empty(&self) -> bool {
        self.nibbles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nibbles.len()
    }

    /// Expected number of attempts to find a match.
    pub fn difficulty(&self) -> f64 {
        16f64.powi(self.nibbles.len() as i32)
    }

    pub fn matches(&self, address: &Address) -> bool {
        self.nibbles.iter().enumerate().all(|(i, nibble)| {
            let byte = address[i / 2];
            let actual = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            actual == *nibble
        })
    }
}

impl FromStr for VanityPrefix {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for VanityPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for nibble in &self.nibbles {
            write!(f, "{nibble:x}")?;
        }
        Ok(())
    }
}

/// Build a factory-compatible salt from its random tail.
pub fn salt_from_suffix(suffix: [u8; SALT_SUFFIX_LEN]) -> B256 {
    let mut salt = B256::ZERO;
    salt[32 - SALT_SUFFIX_LEN..].copy_from_slice(&suffix);
    salt
}

/// Endless stream of candidate salts drawn from an injected random source.
#[derive(Debug, Clone)]
pub struct SaltCandidates<R> {
    rng: R,
}

impl<R: Rng> SaltCandidates<R> {
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl SaltCandidates<StdRng> {
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> Iterator for SaltCandidates<R> {
    type Item = B256;

    fn next(&mut self) -> Option<Self::Item> {
        let mut suffix = [0u8; SALT_SUFFIX_LEN];
        self.rng.fill(&mut suffix[..]);
        Some(salt_from_suffix(suffix))
    }
}

/// Shared flag that stops a running miner.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiningStats {
    pub attempts: u64,
    pub elapsed: Duration,
}

impl MiningStats {
    /// Attempts per second.
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return self.attempts as f64;
        }
        self.attempts as f64 / secs
    }
}

/// A salt whose CREATE2 address matches the requested prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinedSalt {
    pub salt: B256,
    pub address: Address,
    pub stats: MiningStats,
}

/// State shared by the workers of one search.
struct Search<'a> {
    init_code_hash: B256,
    prefix: &'a VanityPrefix,
    started: Instant,
    /// Attempts handed out to workers, in batches.
    reserved: AtomicU64,
    /// Attempts actually made.
    performed: AtomicU64,
    found: AtomicBool,
}

impl<'a> Search<'a> {
    fn new(init_code_hash: B256, prefix: &'a VanityPrefix) -> Self {
        Self {
            init_code_hash,
            prefix,
            started: Instant::now(),
            reserved: AtomicU64::new(0),
            performed: AtomicU64::new(0),
            found: AtomicBool::new(false),
        }
    }
}

/// Searches salts for a given factory across worker threads.
#[derive(Debug, Clone)]
pub struct SaltMiner {
    factory: Address,
    workers: usize,
    max_attempts: Option<u64>,
    progress_interval: u64,
    cancel: CancelToken,
}

impl SaltMiner {
    pub fn new(factory: Address) -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            factory,
            workers,
            max_attempts: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u64>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_progress_interval(mut self, attempts: u64) -> Self {
        self.progress_interval = attempts.max(BATCH_SIZE);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    /// Mine on all workers, each with its own OS-seeded generator.
    pub fn mine(&self, init_code_hash: B256, prefix: &VanityPrefix) -> Result<MinedSalt, DeployError> {
        let search = Search::new(init_code_hash, prefix);

        tracing::debug!(
            prefix = %prefix,
            workers = self.workers,
            expected_attempts = prefix.difficulty(),
            "Mining salt"
        );

        let hit = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..self.workers)
                .map(|worker| {
                    let search = &search;
                    scope.spawn(move || self.work(worker, SaltCandidates::from_os_rng(), search))
                })
                .collect();

            let mut hit = None;
            for handle in handles {
                match handle.join() {
                    Ok(found) => hit = hit.or(found),
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
            hit
        });

        self.finish(hit, search)
    }

    /// Mine sequentially from `candidates`, for reproducible runs.
    pub fn mine_with<I>(
        &self,
        candidates: I,
        init_code_hash: B256,
        prefix: &VanityPrefix,
    ) -> Result<MinedSalt, DeployError>
    where
        I: Iterator<Item = B256>,
    {
        let search = Search::new(init_code_hash, prefix);
        let hit = self.work(0, candidates, &search);
        self.finish(hit, search)
    }

    fn work<I>(&self, worker: usize, mut candidates: I, search: &Search<'_>) -> Option<(B256, Address)>
    where
        I: Iterator<Item = B256>,
    {
        loop {
            if search.found.load(Ordering::Relaxed) || self.cancel.is_cancelled() {
                return None;
            }

            let start = search.reserved.fetch_add(BATCH_SIZE, Ordering::Relaxed);
            let batch = match self.max_attempts {
                Some(max) if start >= max => return None,
                Some(max) => BATCH_SIZE.min(max - start),
                None => BATCH_SIZE,
            };

            let mut done = 0;
            let mut hit = None;
            for salt in candidates.by_ref().take(batch as usize) {
                done += 1;
                let address =
                    create2::compute_address_from_hash(self.factory, salt, search.init_code_hash);
                if search.prefix.matches(&address) {
                    search.found.store(true, Ordering::Relaxed);
                    hit = Some((salt, address));
                    break;
                }
            }

            let total = search.performed.fetch_add(done, Ordering::Relaxed) + done;
            if hit.is_some() || done < batch {
                return hit;
            }

            if worker == 0 && total % self.progress_interval < BATCH_SIZE {
                tracing::debug!(
                    attempts = total,
                    elapsed = ?search.started.elapsed(),
                    prefix = %search.prefix,
                    "Still mining"
                );
            }
        }
    }

    fn finish(&self, hit: Option<(B256, Address)>, search: Search<'_>) -> Result<MinedSalt, DeployError> {
        let stats = MiningStats {
            attempts: search.performed.into_inner(),
            elapsed: search.started.elapsed(),
        };

        match hit {
            Some((salt, address)) => {
                tracing::debug!(
                    address = %address,
                    attempts = stats.attempts,
                    elapsed = ?stats.elapsed,
                    rate = stats.rate(),
                    "Salt mined"
                );
                Ok(MinedSalt {
                    salt,
                    address,
                    stats,
                })
            }
            None if self.cancel.is_cancelled() => Err(DeployError::MiningCancelled {
                attempts: stats.attempts,
            }),
            None => Err(DeployError::MiningExhausted {
                attempts: stats.attempts,
            }),
        }
    }
}
