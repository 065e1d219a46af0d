//! Token and image cost accounting.

use crate::config::PricingConfig;
use crate::graph::Usage;
use crate::providers::Generated;

/// Running token and image count for one unit of work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Input tokens.
    pub input_tokens: u64,
    /// Output tokens.
    pub output_tokens: u64,
    /// Images actually returned.
    pub images: u64,
}

impl Tally {
    /// Add the tokens of a provider result.
    pub fn record<T>(&mut self, generated: &Generated<T>) {
        self.input_tokens += generated.input_tokens;
        self.output_tokens += generated.output_tokens;
    }

    /// Add tokens of an image call, counting the image when one came back.
    pub fn record_image(&mut self, generated: &Generated<Option<String>>) {
        self.record(generated);
        if generated.value.is_some() {
            self.images += 1;
        }
    }

    /// Fold another tally into this one.
    pub fn merge(&mut self, other: Tally) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.images += other.images;
    }
}

/// Prices token counts and images into [`Usage`] records.
#[derive(Debug, Clone)]
pub struct CostMeter {
    pricing: PricingConfig,
}

impl CostMeter {
    /// Meter with the given prices.
    pub fn new(pricing: PricingConfig) -> Self {
        Self { pricing }
    }

    /// `input/1M * rate_in + output/1M * rate_out + images * per_image`.
    pub fn estimate(&self, tally: Tally) -> f64 {
        (tally.input_tokens as f64 / 1_000_000.0) * self.pricing.input_per_million
            + (tally.output_tokens as f64 / 1_000_000.0) * self.pricing.output_per_million
            + tally.images as f64 * self.pricing.per_image
    }

    /// Priced usage for a tally.
    pub fn usage(&self, tally: Tally) -> Usage {
        Usage::new(tally.input_tokens, tally.output_tokens, self.estimate(tally))
    }

    /// Split one call's usage evenly across `count` children.
    ///
    /// Token remainders go to the first children so the parts sum to the
    /// total; cost is divided evenly.
    pub fn split(&self, tally: Tally, count: usize) -> Vec<Usage> {
        if count == 0 {
            return Vec::new();
        }
        let n = count as u64;
        let cost = self.estimate(tally) / count as f64;

        (0..n)
            .map(|i| {
                let share = |total: u64| total / n + u64::from(i < total % n);
                Usage::new(share(tally.input_tokens), share(tally.output_tokens), cost)
            })
            .collect()
    }
}

impl Default for CostMeter {
    fn default() -> Self {
        Self::new(PricingConfig::default())
    }
}
