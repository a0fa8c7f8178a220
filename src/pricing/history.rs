//! Bounded price/utilization history.
//!
//! The two series are appended in lock-step, one entry per state update,
//! and evicted oldest-first once the cap is exceeded. Entry `i` of each
//! series always belongs to the same update.

use serde::Serialize;
use std::collections::VecDeque;

/// One paired history entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistorySample {
    pub price: f64,
    pub utilization: f64,
}

#[derive(Debug, Clone)]
pub struct PriceHistory {
    prices: VecDeque<f64>,
    utilization: VecDeque<f64>,
    capacity: usize,
}

impl PriceHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            prices: VecDeque::with_capacity(capacity + 1),
            utilization: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append one entry to both series, evicting the oldest if over the cap.
    pub fn push(&mut self, price: f64, utilization: f64) {
        self.prices.push_back(price);
        self.utilization.push_back(utilization);

        while self.prices.len() > self.capacity {
            self.prices.pop_front();
            self.utilization.pop_front();
        }

        debug_assert_eq!(
            self.prices.len(),
            self.utilization.len(),
            "price and utilization history diverged"
        );
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of utilization samples (equal to `len` by construction).
    pub fn utilization_len(&self) -> usize {
        self.utilization.len()
    }

    /// The last `n` prices (or all of them), oldest first.
    pub fn recent_prices(&self, n: usize) -> impl Iterator<Item = f64> + '_ {
        let skip = self.prices.len().saturating_sub(n);
        self.prices.iter().skip(skip).copied()
    }

    /// The last `n` utilization samples (or all of them), oldest first.
    pub fn recent_utilization(&self, n: usize) -> impl Iterator<Item = f64> + '_ {
        let skip = self.utilization.len().saturating_sub(n);
        self.utilization.iter().skip(skip).copied()
    }

    /// The last `n` paired samples, oldest first.
    pub fn recent_samples(&self, n: usize) -> Vec<HistorySample> {
        self.recent_prices(n)
            .zip(self.recent_utilization(n))
            .map(|(price, utilization)| HistorySample { price, utilization })
            .collect()
    }

    pub fn latest_price(&self) -> Option<f64> {
        self.prices.back().copied()
    }
}
