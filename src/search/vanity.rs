//! Vanity address grinding
//!
//! Repeatedly generates random keypairs and tests the Base58 encoding of
//! the public key against a prefix/suffix pattern. Work runs on dedicated
//! OS threads; progress flows through a bounded channel and cancellation
//! through a [`StopFlag`], so the owning task never blocks on the search.

use crossbeam::channel::Sender;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

use super::errors::SearchError;
use super::pattern::PatternMatcher;
use super::progress::{emit_progress, StopFlag};
use crate::types::SearchProgress;

/// Wall-clock interval between progress snapshots
const PROGRESS_TICK: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Default)]
pub struct VanityOptions {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub case_insensitive: bool,
    /// Give up after this many attempts (None = unbounded)
    pub max_attempts: Option<u64>,
    /// Worker threads (0 = all available cores)
    pub threads: usize,
}

/// Terminal output of a successful search
pub struct VanityResult {
    pub keypair: Keypair,
    /// Base58 address, guaranteed to match the requested pattern
    pub address: String,
    /// Pattern summary that was matched, e.g. `"abc*"`
    pub matched: String,
    /// Attempt number that produced the match
    pub attempts: u64,
    pub elapsed: Duration,
}

impl VanityResult {
    /// 64-byte secret key in the Base58 form wallets import
    pub fn secret_base58(&self) -> String {
        bs58::encode(self.keypair.to_bytes()).into_string()
    }
}

/// One-shot vanity search. Construct, optionally hand out clones of the
/// stop flag, then call [`run`](Self::run) once.
#[derive(Debug)]
pub struct VanityGenerator {
    matcher: PatternMatcher,
    options: VanityOptions,
    stop: StopFlag,
    attempts: AtomicU64,
}

impl VanityGenerator {
    /// Validate the pattern and its expected difficulty before any work
    /// starts. Rejection here is what keeps an impossible pattern from
    /// hanging the caller.
    pub fn new(options: VanityOptions) -> Result<Self, SearchError> {
        let matcher = PatternMatcher::new(
            options.prefix.clone(),
            options.suffix.clone(),
            options.case_insensitive,
        )?;
        matcher.check_difficulty()?;
        Ok(Self {
            matcher,
            options,
            stop: StopFlag::new(),
            attempts: AtomicU64::new(0),
        })
    }

    /// Expected attempts for one match under the configured pattern
    pub fn expected_attempts(&self) -> f64 {
        self.matcher.expected_attempts()
    }

    /// Request cancellation; workers observe it on their next iteration.
    /// A no-op once the search has already stopped.
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Attempts performed so far (final once `run` returns).
    /// Clamped to `max_attempts`: workers that lose the budget race undo
    /// their increment, and the clamp hides that transient overshoot.
    pub fn attempts(&self) -> u64 {
        let n = self.attempts.load(Ordering::Relaxed);
        match self.options.max_attempts {
            Some(max) => n.min(max),
            None => n,
        }
    }

    /// Run the search to completion: first match wins, or `None` once
    /// `max_attempts` is exhausted or `stop()` was called. Blocks the
    /// calling thread; progress is reported on `progress` while workers
    /// run.
    pub fn run(&self, progress: Option<Sender<SearchProgress>>) -> Option<VanityResult> {
        let started = Instant::now();
        let threads = match self.options.threads {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        };
        let found: parking_lot::Mutex<Option<VanityResult>> = parking_lot::Mutex::new(None);
        let active = AtomicUsize::new(threads);

        std::thread::scope(|scope| {
            for _ in 0..threads {
                scope.spawn(|| {
                    loop {
                        if self.stop.is_stopped() {
                            break;
                        }
                        let n = self.attempts.fetch_add(1, Ordering::Relaxed);
                        if let Some(max) = self.options.max_attempts {
                            if n >= max {
                                // undo the overshoot so the counter lands on max
                                self.attempts.fetch_sub(1, Ordering::Relaxed);
                                break;
                            }
                        }
                        let keypair = Keypair::new();
                        let address = keypair.pubkey().to_string();
                        if self.matcher.matches(&address) {
                            let mut slot = found.lock();
                            if slot.is_none() {
                                *slot = Some(VanityResult {
                                    address,
                                    matched: self.matcher.describe(),
                                    attempts: n + 1,
                                    elapsed: started.elapsed(),
                                    keypair,
                                });
                            }
                            self.stop.stop();
                            break;
                        }
                    }
                    active.fetch_sub(1, Ordering::Release);
                });
            }

            if let Some(sender) = &progress {
                while active.load(Ordering::Acquire) > 0 {
                    std::thread::sleep(PROGRESS_TICK);
                    emit_progress(sender, self.attempts(), started);
                }
            }
        });

        let result = found.into_inner();
        if let Some(result) = &result {
            info!(
                address = %result.address,
                attempts = result.attempts,
                elapsed_ms = result.elapsed.as_millis() as u64,
                "vanity match found"
            );
        }
        result
    }
}
