//! Tracing setup and per-operation request counters

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::imaging::Operation;

const DEFAULT_FILTER: &str = "imagebox=info,tower_http=info";

/// Install the global fmt subscriber, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[derive(Debug, Default)]
struct OperationCounters {
    succeeded: AtomicU64,
    failed: AtomicU64,
    bytes_in: AtomicU64,
    bytes_out: AtomicU64,
}

/// Metrics handle shared by all request handlers
#[derive(Debug, Default)]
pub struct Metrics {
    resize: OperationCounters,
    compress: OperationCounters,
    convert: OperationCounters,
    flip: OperationCounters,
    rotate: OperationCounters,
    crop: OperationCounters,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self, operation: Operation) -> &OperationCounters {
        match operation {
            Operation::Resize => &self.resize,
            Operation::Compress => &self.compress,
            Operation::Convert => &self.convert,
            Operation::Flip => &self.flip,
            Operation::Rotate => &self.rotate,
            Operation::Crop => &self.crop,
        }
    }

    pub fn transform_succeeded(&self, operation: Operation, bytes_in: usize, bytes_out: usize) {
        let counters = self.counters(operation);
        counters.succeeded.fetch_add(1, Ordering::Relaxed);
        counters.bytes_in.fetch_add(bytes_in as u64, Ordering::Relaxed);
        counters.bytes_out.fetch_add(bytes_out as u64, Ordering::Relaxed);
        tracing::debug!(counter = "succeeded", %operation, "Metric incremented");
    }

    pub fn transform_failed(&self, operation: Operation) {
        self.counters(operation).failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "failed", %operation, "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let operations = Operation::ALL
            .iter()
            .map(|op| {
                let c = self.counters(*op);
                let snapshot = OperationSnapshot {
                    succeeded: c.succeeded.load(Ordering::Relaxed),
                    failed: c.failed.load(Ordering::Relaxed),
                    bytes_in: c.bytes_in.load(Ordering::Relaxed),
                    bytes_out: c.bytes_out.load(Ordering::Relaxed),
                };
                (op.name(), snapshot)
            })
            .collect();

        MetricsSnapshot { operations }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub operations: BTreeMap<&'static str, OperationSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OperationSnapshot {
    pub succeeded: u64,
    pub failed: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}
