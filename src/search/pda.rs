//! Program Derived Address brute forcing
//!
//! Enumerates the cartesian product of seed templates (fixed strings and
//! inclusive numeric ranges), deriving a PDA for each candidate under a
//! fixed program ID and testing it against an address constraint. Unlike
//! the vanity search the candidate space is finite and enumerated in
//! order, so the search runs single-threaded and its attempt count is
//! exact.

use crossbeam::channel::Sender;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

use super::errors::SearchError;
use super::pattern::PatternMatcher;
use super::progress::{emit_progress, StopFlag};
use crate::types::SearchProgress;

/// Hard cap on the enumerable candidate space
pub const MAX_CANDIDATES: u128 = 10_000_000;

/// On-chain seed constraints: 32 bytes per seed, 16 seeds including the bump
const MAX_SEED_LEN: usize = 32;
const MAX_SEEDS: usize = 15;

const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;

/// One slot of the seed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seed {
    /// Literal seed bytes (UTF-8 string as typed)
    Fixed(String),
    /// Inclusive numeric range; each value becomes its decimal ASCII bytes
    Range { min: u64, max: u64 },
}

impl Seed {
    /// Number of candidate values this slot contributes
    fn arity(&self) -> u128 {
        match self {
            Self::Fixed(_) => 1,
            Self::Range { min, max } => u128::from(max - min) + 1,
        }
    }
}

impl FromStr for Seed {
    type Err = SearchError;

    /// `str:<text>` or `range:<min>:<max>`; a bare string is a fixed seed
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix("range:") {
            let (min, max) = rest
                .split_once(':')
                .ok_or_else(|| SearchError::BadSeedSpec(s.to_string()))?;
            let min: u64 = min
                .parse()
                .map_err(|_| SearchError::BadSeedSpec(s.to_string()))?;
            let max: u64 = max
                .parse()
                .map_err(|_| SearchError::BadSeedSpec(s.to_string()))?;
            return Ok(Self::Range { min, max });
        }
        let text = s.strip_prefix("str:").unwrap_or(s);
        Ok(Self::Fixed(text.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct PdaOptions {
    pub program_id: Pubkey,
    pub seeds: Vec<Seed>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub case_insensitive: bool,
    /// Attempts between progress reports
    pub progress_interval: u64,
}

impl PdaOptions {
    pub fn new(program_id: Pubkey, seeds: Vec<Seed>) -> Self {
        Self {
            program_id,
            seeds,
            prefix: None,
            suffix: None,
            case_insensitive: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Terminal output of a successful PDA search
#[derive(Debug, Clone)]
pub struct PdaResult {
    pub address: Pubkey,
    pub bump: u8,
    /// Rendered seed values of the matching candidate, in template order
    pub seeds: Vec<String>,
    /// Candidate number that produced the match
    pub attempts: u64,
    pub elapsed: Duration,
}

/// One-shot exhaustive PDA search over a seed template
pub struct PdaBruteForcer {
    options: PdaOptions,
    matcher: Option<PatternMatcher>,
    progress_interval: u64,
    stop: StopFlag,
    attempts: AtomicU64,
}

impl PdaBruteForcer {
    pub fn new(options: PdaOptions) -> Result<Self, SearchError> {
        if options.seeds.is_empty() {
            return Err(SearchError::NoSeeds);
        }
        if options.seeds.len() > MAX_SEEDS {
            return Err(SearchError::TooManySeeds(options.seeds.len()));
        }
        for seed in &options.seeds {
            match seed {
                Seed::Fixed(s) => {
                    if s.len() > MAX_SEED_LEN {
                        return Err(SearchError::SeedTooLong(s.clone()));
                    }
                }
                Seed::Range { min, max } => {
                    if min > max {
                        return Err(SearchError::InvalidRange {
                            min: *min,
                            max: *max,
                        });
                    }
                }
            }
        }
        let count = Self::candidate_count_of(&options.seeds);
        if count > MAX_CANDIDATES {
            return Err(SearchError::TooManyCandidates {
                count,
                ceiling: MAX_CANDIDATES,
            });
        }
        let matcher = if options.prefix.is_some() || options.suffix.is_some() {
            Some(PatternMatcher::new(
                options.prefix.clone(),
                options.suffix.clone(),
                options.case_insensitive,
            )?)
        } else {
            None
        };
        let progress_interval = options.progress_interval.max(1);
        Ok(Self {
            options,
            matcher,
            progress_interval,
            stop: StopFlag::new(),
            attempts: AtomicU64::new(0),
        })
    }

    fn candidate_count_of(seeds: &[Seed]) -> u128 {
        seeds
            .iter()
            .map(Seed::arity)
            .fold(1u128, |acc, n| acc.saturating_mul(n))
    }

    /// Size of the cartesian product this search will enumerate
    pub fn candidate_count(&self) -> u128 {
        Self::candidate_count_of(&self.options.seeds)
    }

    /// Request cancellation; observed on the next candidate. Idempotent.
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Candidates derived so far (final once `run` returns)
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Enumerate candidates in order until the first match, exhaustion,
    /// or cancellation. Blocks the calling thread.
    pub fn run(&self, progress: Option<Sender<SearchProgress>>) -> Option<PdaResult> {
        let started = Instant::now();
        let seeds = &self.options.seeds;

        // (seed index, min, max) per variable slot, odometer order
        let ranges: Vec<(usize, u64, u64)> = seeds
            .iter()
            .enumerate()
            .filter_map(|(i, seed)| match seed {
                Seed::Range { min, max } => Some((i, *min, *max)),
                Seed::Fixed(_) => None,
            })
            .collect();
        let mut values: Vec<u64> = ranges.iter().map(|&(_, min, _)| min).collect();

        loop {
            if self.stop.is_stopped() {
                return None;
            }

            let mut rendered: Vec<Vec<u8>> = Vec::with_capacity(seeds.len());
            let mut slot = 0;
            for seed in seeds {
                match seed {
                    Seed::Fixed(s) => rendered.push(s.as_bytes().to_vec()),
                    Seed::Range { .. } => {
                        rendered.push(values[slot].to_string().into_bytes());
                        slot += 1;
                    }
                }
            }
            let seed_refs: Vec<&[u8]> = rendered.iter().map(|v| v.as_slice()).collect();
            let (address, bump) =
                Pubkey::find_program_address(&seed_refs, &self.options.program_id);
            let n = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;

            let matched = match &self.matcher {
                Some(matcher) => matcher.matches(&address.to_string()),
                None => true,
            };
            if matched {
                let result = PdaResult {
                    address,
                    bump,
                    seeds: rendered
                        .iter()
                        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                        .collect(),
                    attempts: n,
                    elapsed: started.elapsed(),
                };
                info!(
                    address = %result.address,
                    bump = result.bump,
                    attempts = result.attempts,
                    "pda match found"
                );
                return Some(result);
            }

            if let Some(sender) = &progress {
                if n % self.progress_interval == 0 {
                    emit_progress(sender, n, started);
                }
            }

            // odometer increment over the variable slots, last slot fastest
            let mut advanced = false;
            let mut pos = ranges.len();
            while pos > 0 {
                pos -= 1;
                if values[pos] < ranges[pos].2 {
                    values[pos] += 1;
                    for reset in pos + 1..values.len() {
                        values[reset] = ranges[reset].1;
                    }
                    advanced = true;
                    break;
                }
            }
            if !advanced {
                return None;
            }
        }
    }
}
