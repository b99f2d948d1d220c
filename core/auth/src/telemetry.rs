//! Telemetry related to authentication attempts and access decisions.
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::CounterVec;
use prometheus::Opts;

/// Number of access decisions by granularity and decision.
pub static ACCESS_DECISION_COUNT: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "portcullis_access_decision_count",
            "Number of access decisions by granularity and decision",
        ),
        &["granularity", "decision"],
    )
    .expect("failed to initialise ACCESS_DECISION_COUNT counter")
});

/// Number of authentication attempts by scheme and outcome.
pub static AUTHENTICATION_COUNT: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "portcullis_authentication_count",
            "Number of authentication attempts by scheme and outcome",
        ),
        &["scheme", "outcome"],
    )
    .expect("failed to initialise AUTHENTICATION_COUNT counter")
});

/// Ensure metrics are registered only once.
static METRICS_REGISTERED: AtomicBool = AtomicBool::new(false);

/// The first time this method is called it will register the auth metrics.
pub fn register_metrics(reg: &prometheus::Registry) -> Result<()> {
    // Skip registration if already done before.
    if METRICS_REGISTERED.swap(true, Ordering::AcqRel) {
        return Ok(());
    }

    let collectors: [Box<dyn prometheus::core::Collector>; 2] = [
        Box::new(ACCESS_DECISION_COUNT.clone()),
        Box::new(AUTHENTICATION_COUNT.clone()),
    ];
    for collector in collectors {
        reg.register(collector)?;
    }
    Ok(())
}
