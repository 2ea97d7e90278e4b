//! Priority fee estimation
//!
//! Derives a base fee from the cluster's recent prioritization fee history
//! and scales it into per-speed recommendations. The cluster query is
//! best-effort: on failure or an empty sample set the calculator falls back
//! to a static preset table and tags the result [`FeeSource::Fallback`].

use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::rpc::ClusterRpc;
use crate::types::{FeeRecommendation, FeeSource, FeeSpeed, PriorityFeeEstimate};

/// Base fee used when the cluster gives us nothing usable (micro-lamports per CU)
pub const DEFAULT_BASE_FEE: u64 = 1000;

/// Percentile of non-zero recent fees used as the base
const BASE_FEE_PERCENTILE: f64 = 0.75;

impl FeeSpeed {
    /// Multiplier applied to the base fee for this tier
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Slow => 0.5,
            Self::Normal => 1.0,
            Self::Fast => 2.0,
            Self::Turbo => 5.0,
        }
    }

    pub fn estimated_time(&self) -> &'static str {
        match self {
            Self::Slow => "~30-60s",
            Self::Normal => "~15-30s",
            Self::Fast => "~5-15s",
            Self::Turbo => "~1-5s",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Slow => "Cheapest; may wait several blocks for inclusion",
            Self::Normal => "Market-rate fee for typical inclusion",
            Self::Fast => "Above market; usually lands within a few blocks",
            Self::Turbo => "Aggressive fee targeting next-block inclusion",
        }
    }
}

static FALLBACK_RECOMMENDATIONS: Lazy<Vec<FeeRecommendation>> =
    Lazy::new(|| build_recommendations(DEFAULT_BASE_FEE));

fn build_recommendations(base: u64) -> Vec<FeeRecommendation> {
    FeeSpeed::ALL
        .iter()
        .map(|&speed| FeeRecommendation {
            speed,
            micro_lamports: ((base as f64 * speed.multiplier()).round() as u64).max(1),
            estimated_time: speed.estimated_time(),
            description: speed.description(),
        })
        .collect()
}

/// Value at percentile `p` (0.0..=1.0) of an ascending-sorted slice
fn percentile(sorted: &[u64], p: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = (p * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

/// Computes priority fee estimates from recent cluster fee history
pub struct PriorityFeeCalculator {
    rpc: Arc<dyn ClusterRpc>,
    fallback_micro_lamports: u64,
}

impl PriorityFeeCalculator {
    pub fn new(rpc: Arc<dyn ClusterRpc>) -> Self {
        Self {
            rpc,
            fallback_micro_lamports: DEFAULT_BASE_FEE,
        }
    }

    pub fn with_fallback(mut self, micro_lamports: u64) -> Self {
        self.fallback_micro_lamports = micro_lamports.max(1);
        self
    }

    /// Derive the base fee from recent prioritization fees.
    ///
    /// Never fails: cluster errors and empty histories degrade to the
    /// configured fallback, tagged so callers can tell.
    pub async fn estimate_fee(&self) -> PriorityFeeEstimate {
        match self.rpc.recent_prioritization_fees(&[]).await {
            Ok(samples) => {
                let mut nonzero: Vec<u64> = samples
                    .iter()
                    .map(|s| s.micro_lamports)
                    .filter(|&f| f > 0)
                    .collect();
                if nonzero.is_empty() {
                    debug!("no non-zero fee samples; using fallback base fee");
                    return self.fallback_estimate();
                }
                nonzero.sort_unstable();
                let base = percentile(&nonzero, BASE_FEE_PERCENTILE)
                    .max(self.fallback_micro_lamports);
                PriorityFeeEstimate {
                    base_micro_lamports: base,
                    source: FeeSource::Cluster,
                }
            }
            Err(err) => {
                warn!(error = %err, "prioritization fee query failed; using fallback");
                self.fallback_estimate()
            }
        }
    }

    /// Per-speed recommendation table, ordered slow to turbo
    pub async fn recommendations(&self) -> Vec<FeeRecommendation> {
        let estimate = self.estimate_fee().await;
        if estimate.source == FeeSource::Fallback
            && estimate.base_micro_lamports == DEFAULT_BASE_FEE
        {
            return FALLBACK_RECOMMENDATIONS.clone();
        }
        build_recommendations(estimate.base_micro_lamports)
    }

    /// Resolved fee for a single speed tier
    pub async fn fee_for_speed(&self, speed: FeeSpeed) -> u64 {
        let estimate = self.estimate_fee().await;
        ((estimate.base_micro_lamports as f64 * speed.multiplier()).round() as u64).max(1)
    }

    fn fallback_estimate(&self) -> PriorityFeeEstimate {
        PriorityFeeEstimate {
            base_micro_lamports: self.fallback_micro_lamports,
            source: FeeSource::Fallback,
        }
    }
}
