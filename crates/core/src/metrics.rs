//! Metrics definitions for the middleware.
//!
//! Metrics are collected using the `metrics` crate and can be exported to
//! Prometheus via `metrics-exporter-prometheus`.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!(
        "blocks_transformed_total",
        "Total number of blocks transformed into canonical form"
    );
    describe_counter!(
        "transform_errors_total",
        "Total number of failed block transformations"
    );
    describe_counter!(
        "operations_emitted_total",
        "Total number of canonical operations emitted"
    );
    describe_counter!(
        "transactions_submitted_total",
        "Total number of transactions forwarded to the observer"
    );
    describe_histogram!(
        "block_transform_duration_seconds",
        "Time taken to transform one block in seconds"
    );
}

/// Record a successfully transformed block.
pub fn record_block_transformed() {
    counter!("blocks_transformed_total").increment(1);
}

/// Record a failed transformation.
///
/// # Arguments
/// * `stage` - The pipeline stage that failed ("fetch", "reconcile", "synthesize")
pub fn record_transform_error(stage: &str) {
    counter!("transform_errors_total", "stage" => stage.to_string()).increment(1);
}

/// Record emitted operations.
pub fn record_operations_emitted(count: u64) {
    counter!("operations_emitted_total").increment(count);
}

/// Record a forwarded transaction submission.
pub fn record_transaction_submitted() {
    counter!("transactions_submitted_total").increment(1);
}

/// RAII timer recording the block transformation duration on drop.
pub struct TransformTimer {
    start: Instant,
}

impl TransformTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for TransformTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TransformTimer {
    fn drop(&mut self) {
        histogram!("block_transform_duration_seconds").record(self.start.elapsed().as_secs_f64());
    }
}
