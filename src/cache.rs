//! Token metadata cache
//!
//! An injected cache service keyed by mint address with TTL eviction, a
//! bounded entry count, and in-flight fetch deduplication: concurrent
//! lookups of the same mint share one fetch instead of racing. Callers
//! construct it once and pass it where needed; there is no ambient global
//! state.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Metadata for a token mint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    pub mint: Pubkey,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub logo_uri: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedEntry {
    info: TokenInfo,
    fetched_at: Instant,
}

/// Get-or-fetch cache for [`TokenInfo`]
pub struct TokenInfoCache {
    entries: DashMap<Pubkey, CachedEntry>,
    inflight: DashMap<Pubkey, Arc<Mutex<()>>>,
    ttl: Duration,
    max_entries: usize,
}

impl TokenInfoCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            inflight: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Fresh cached value, if any
    pub fn get(&self, mint: &Pubkey) -> Option<TokenInfo> {
        let entry = self.entries.get(mint)?;
        if entry.fetched_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.info.clone())
    }

    /// Return the cached value or run `fetch` to produce it.
    ///
    /// Concurrent callers for the same mint serialize on a per-key lock;
    /// whoever gets the lock first fetches, the rest observe the cached
    /// result. A failed fetch caches nothing, so the next caller retries.
    pub async fn get_or_fetch<F, Fut>(&self, mint: Pubkey, fetch: F) -> anyhow::Result<TokenInfo>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<TokenInfo>>,
    {
        if let Some(hit) = self.get(&mint) {
            return Ok(hit);
        }

        let lock = self
            .inflight
            .entry(mint)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // A concurrent fetch may have landed while we waited for the lock
        if let Some(hit) = self.get(&mint) {
            return Ok(hit);
        }

        debug!(%mint, "token info cache miss; fetching");
        let result = fetch().await;
        self.inflight.remove(&mint);
        match result {
            Ok(info) => {
                self.insert(info.clone());
                Ok(info)
            }
            Err(err) => Err(err),
        }
    }

    /// Insert directly, evicting the oldest entry when full
    pub fn insert(&self, info: TokenInfo) {
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&info.mint) {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|e| e.value().fetched_at)
                .map(|e| *e.key());
            if let Some(key) = oldest {
                self.entries.remove(&key);
            }
        }
        self.entries.insert(
            info.mint,
            CachedEntry {
                info,
                fetched_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, mint: &Pubkey) {
        self.entries.remove(mint);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
