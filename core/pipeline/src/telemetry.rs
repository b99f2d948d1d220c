//! Telemetry related to the request pipeline.
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::CounterVec;
use prometheus::Opts;

/// Number of unexpected errors returned by interceptors.
pub static INTERCEPTOR_ERRORS_COUNT: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "portcullis_interceptor_errors_count",
            "Number of unexpected errors returned by interceptors",
        ),
        &["interceptor"],
    )
    .expect("failed to initialise INTERCEPTOR_ERRORS_COUNT counter")
});

/// Number of requests processed by the pipeline by outcome.
pub static PIPELINE_OUTCOME_COUNT: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "portcullis_pipeline_outcome_count",
            "Number of requests processed by the pipeline by outcome",
        ),
        &["outcome"],
    )
    .expect("failed to initialise PIPELINE_OUTCOME_COUNT counter")
});

/// Ensure metrics are registered only once.
static METRICS_REGISTERED: AtomicBool = AtomicBool::new(false);

/// The first time this method is called it will register the pipeline metrics.
pub fn register_metrics(reg: &prometheus::Registry) -> Result<()> {
    // Skip registration if already done before.
    if METRICS_REGISTERED.swap(true, Ordering::AcqRel) {
        return Ok(());
    }

    let collectors: [Box<dyn prometheus::core::Collector>; 2] = [
        Box::new(INTERCEPTOR_ERRORS_COUNT.clone()),
        Box::new(PIPELINE_OUTCOME_COUNT.clone()),
    ];
    for collector in collectors {
        reg.register(collector)?;
    }
    Ok(())
}
