use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts, Registry};
use std::collections::HashSet;

pub struct Metrics {
    request_counter: IntCounterVec,
    classification_counter: IntCounterVec,
    classification_duration: Histogram,
    pub registry: Registry,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let request_counter = IntCounterVec::new(
            Opts::new("requests_total", "Total number of requests"),
            &["route"],
        )?;

        let classification_counter = IntCounterVec::new(
            Opts::new(
                "classifications_total",
                "Classification attempts by model and outcome",
            ),
            &["model", "outcome"],
        )?;

        // remote calls: sub-second on a warm service, up to the 30s budget on a cold one
        let boundaries =
            generate_boundaries(&[(250, 1000, 250), (1000, 5000, 1000), (5000, 30000, 5000)]);

        let classification_duration = Histogram::with_opts(
            HistogramOpts::new(
                "classification_duration_ms",
                "Duration of classification requests in milliseconds",
            )
            .buckets(boundaries),
        )?;

        registry.register(Box::new(request_counter.clone()))?;
        registry.register(Box::new(classification_counter.clone()))?;
        registry.register(Box::new(classification_duration.clone()))?;

        Ok(Metrics {
            request_counter,
            classification_counter,
            classification_duration,
            registry,
        })
    }

    pub fn record_request(&self, route: &str) {
        self.request_counter.with_label_values(&[route]).inc();
    }

    pub fn record_classification(&self, model: &str, outcome: &str, duration_ms: u64) {
        self.classification_counter
            .with_label_values(&[model, outcome])
            .inc();
        self.classification_duration.observe(duration_ms as f64);
    }
}

/// Concatenates `(start, end, step)` ranges into sorted, de-duplicated bucket bounds.
fn generate_boundaries(segments: &[(u64, u64, usize)]) -> Vec<f64> {
    let mut seen = HashSet::new();
    segments
        .iter()
        .flat_map(|&(start, end, step)| (start..=end).step_by(step))
        .filter(|&x| seen.insert(x))
        .map(|x| x as f64)
        .collect()
}
