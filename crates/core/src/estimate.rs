//! Cost estimation constants, types, and pure logic.
//!
//! Computes a monetary/resource cost for a job from the usage metrics the
//! compute backend reports, optionally scaled by user-specific billing
//! rates. Pure functions only: the caller decides when metrics are ready
//! and where the result is stored.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Rate constants
// ---------------------------------------------------------------------------

/// Cost per CPU-second of backend compute.
pub const RATE_CPU_SECOND: f64 = 0.002;

/// Cost per megabyte-second of memory held.
pub const RATE_MB_SECOND: f64 = 0.000_001;

/// Cost per gigabyte of input data processed.
pub const RATE_GB_PROCESSED: f64 = 0.01;

/// Cost per wall-clock hour a job occupied the backend.
pub const RATE_WALL_HOUR: f64 = 0.05;

/// Unit tag attached to estimates when the deployment does not configure
/// its own.
pub const DEFAULT_COST_UNIT: &str = "credits";

/// Megabytes per gigabyte (1024.0).
pub const MB_PER_GB: f64 = 1024.0;

/// Seconds per hour (3600.0).
pub const SECS_PER_HOUR: f64 = 3600.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Resource usage reported by the compute backend for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageMetrics {
    /// Total CPU time consumed, in seconds.
    pub cpu_seconds: f64,
    /// Memory held over time, in megabyte-seconds.
    pub memory_mb_seconds: f64,
    /// Wall-clock duration of the execution, in seconds.
    pub duration_seconds: f64,
    /// Volume of input data processed, in megabytes.
    pub input_megabytes: f64,
}

/// Per-user billing adjustments, read from the external identity/billing
/// provider. Passed in explicitly; never read from ambient state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingRates {
    /// Multiplier applied to the base cost (e.g. 1.5 for premium SLA).
    pub rate_multiplier: f64,
    /// Fractional discount in `0.0..=1.0` (e.g. 0.2 for 20% off).
    pub discount: f64,
}

impl Default for BillingRates {
    fn default() -> Self {
        Self {
            rate_multiplier: 1.0,
            discount: 0.0,
        }
    }
}

/// A computed cost, tagged with its unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub amount: f64,
    pub unit: String,
}

// ---------------------------------------------------------------------------
// Estimation logic
// ---------------------------------------------------------------------------

/// Estimate the cost of a job from backend-reported usage metrics.
///
/// Deterministic and non-negative for identical inputs. Fails with
/// [`CoreError::Unavailable`] when `usage` is `None`, i.e. the backend has
/// not reported metrics yet.
pub fn estimate(
    usage: Option<&UsageMetrics>,
    rates: Option<&BillingRates>,
    unit: &str,
) -> Result<CostEstimate, CoreError> {
    let usage = usage.ok_or_else(|| {
        CoreError::Unavailable("backend has not reported usage metrics yet".to_string())
    })?;

    let base = usage.cpu_seconds.max(0.0) * RATE_CPU_SECOND
        + usage.memory_mb_seconds.max(0.0) * RATE_MB_SECOND
        + (usage.input_megabytes.max(0.0) / MB_PER_GB) * RATE_GB_PROCESSED
        + (usage.duration_seconds.max(0.0) / SECS_PER_HOUR) * RATE_WALL_HOUR;

    let amount = match rates {
        Some(r) => base * r.rate_multiplier.max(0.0) * (1.0 - r.discount.clamp(0.0, 1.0)),
        None => base,
    };

    Ok(CostEstimate {
        amount,
        unit: unit.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn usage() -> UsageMetrics {
        UsageMetrics {
            cpu_seconds: 120.0,
            memory_mb_seconds: 50_000.0,
            duration_seconds: 3600.0,
            input_megabytes: 2048.0,
        }
    }

    #[test]
    fn estimate_without_metrics_is_unavailable() {
        let err = estimate(None, None, DEFAULT_COST_UNIT).unwrap_err();
        assert_matches!(err, CoreError::Unavailable(_));
    }

    #[test]
    fn estimate_is_deterministic_and_non_negative() {
        let u = usage();
        let a = estimate(Some(&u), None, DEFAULT_COST_UNIT).unwrap();
        let b = estimate(Some(&u), None, DEFAULT_COST_UNIT).unwrap();
        assert_eq!(a, b);
        assert!(a.amount >= 0.0);
        assert_eq!(a.unit, "credits");
    }

    #[test]
    fn estimate_applies_multiplier_and_discount() {
        let u = usage();
        let base = estimate(Some(&u), None, DEFAULT_COST_UNIT).unwrap();
        let rates = BillingRates {
            rate_multiplier: 2.0,
            discount: 0.25,
        };
        let adjusted = estimate(Some(&u), Some(&rates), DEFAULT_COST_UNIT).unwrap();
        assert!((adjusted.amount - base.amount * 2.0 * 0.75).abs() < 1e-12);
    }

    #[test]
    fn negative_usage_inputs_never_produce_negative_cost() {
        let u = UsageMetrics {
            cpu_seconds: -5.0,
            memory_mb_seconds: -1.0,
            duration_seconds: -10.0,
            input_megabytes: -3.0,
        };
        let cost = estimate(Some(&u), None, DEFAULT_COST_UNIT).unwrap();
        assert_eq!(cost.amount, 0.0);
    }

    #[test]
    fn discount_is_clamped_to_unit_range() {
        let u = usage();
        let rates = BillingRates {
            rate_multiplier: 1.0,
            discount: 5.0,
        };
        let cost = estimate(Some(&u), Some(&rates), DEFAULT_COST_UNIT).unwrap();
        assert_eq!(cost.amount, 0.0);
    }
}
