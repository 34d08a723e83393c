//! Fixtures shared by the integration suites.
#![allow(dead_code)]

use std::time::Duration;

use adjudicator::resilience::{CircuitBreakerConfig, RateLimitConfig, RetryConfig};
use nameres::{AdjudicatorConfig, JobConfig, NameRecord};
use serde_json::{Value, json};

/// Six facilities. With fewer candidates than the global block threshold they
/// all share one block.
pub fn roster() -> Vec<NameRecord> {
    vec![
        NameRecord::new("npi-100", "Saint Marys Medical Center"),
        NameRecord::new("duns-200", "ABC Corporation"),
        NameRecord::new("duns-300", "Zebra LLC"),
        NameRecord::new("npi-400", "Mercy General Hospital"),
        NameRecord::new("npi-500", "Northside Family Clinic"),
        NameRecord::new("npi-600", "Lakeview Dental Group"),
    ]
}

/// Queries whose best composite lands between 50 and 90 against [`roster`],
/// paired with the expected best candidate.
pub const AMBIGUOUS: [(&str, &str); 6] = [
    ("St. Mary's Hospital", "npi-100"),
    ("Mercy Gen Hosp", "npi-400"),
    ("Northside Clinic", "npi-500"),
    ("Lakeview Dental", "npi-600"),
    ("Mercy General", "npi-400"),
    ("Zebra Holdings", "duns-300"),
];

/// `count` ambiguous queries with distinct ids, cycling through [`AMBIGUOUS`].
pub fn ambiguous_queries(count: usize) -> Vec<NameRecord> {
    (0..count)
        .map(|i| NameRecord::new(format!("q{i}"), AMBIGUOUS[i % AMBIGUOUS.len()].0))
        .collect()
}

/// Tier settings that never throttle or trip during a test.
pub fn tier(max_calls: u32) -> AdjudicatorConfig {
    let mut cfg = AdjudicatorConfig::default()
        .with_max_calls(max_calls)
        .with_call_timeout(Duration::from_secs(2))
        .with_retry(
            RetryConfig::default()
                .with_max_retries(0)
                .with_base_delay(Duration::from_millis(1))
                .with_max_delay(Duration::from_millis(1))
                .with_jitter(false),
        );
    cfg.rate_limit = RateLimitConfig::default()
        .with_burst_size(100_000)
        .with_requests_per_second(100_000.0);
    cfg.circuit_breaker = CircuitBreakerConfig::default().with_failure_threshold(100_000);
    cfg
}

pub fn job_config(tier2_calls: u32, tier3_calls: u32) -> JobConfig {
    let mut cfg = JobConfig::default();
    cfg.escalation.tier2 = tier(tier2_calls);
    cfg.escalation.tier3 = tier(tier3_calls);
    cfg.workers.chunk_size = 4;
    cfg.workers.cpu_pool_size = 2;
    cfg
}

pub fn verdict(confidence: u8, same_entity: bool) -> Value {
    json!({
        "confidence": confidence,
        "sameEntity": same_entity,
        "rationale": "names refer to the same registered facility",
    })
}
