//! Process-wide resolution counters, exposed on `/metrics`

use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

lazy_static! {
    pub static ref RESOLUTIONS_TOTAL: IntCounter = register_int_counter!(
        "animeonline_resolutions_total",
        "Episode resolutions started"
    )
    .unwrap();
    pub static ref SOURCES_EMITTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "animeonline_sources_emitted_total",
        "Video sources returned, by provider",
        &["provider"]
    )
    .unwrap();
    pub static ref EXTRACTOR_MISSES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "animeonline_extractor_misses_total",
        "Candidates an extractor could not decode, by provider",
        &["provider"]
    )
    .unwrap();
}

pub fn record_source(provider: &str) {
    SOURCES_EMITTED_TOTAL.with_label_values(&[provider]).inc();
}

pub fn record_miss(provider: &str) {
    EXTRACTOR_MISSES_TOTAL.with_label_values(&[provider]).inc();
}
