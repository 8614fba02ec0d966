// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::SocialResult;

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

static OPERATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "social_feed_operations_total",
            "Service operations by name and outcome",
        ),
        &["operation", "outcome"],
    )
    .expect("operation counter definition is valid");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("operation counter registers once");
    counter
});

/// Count one finished operation. The outcome is `ok` or the error kind.
pub fn record<T>(operation: &str, result: &SocialResult<T>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    OPERATIONS.with_label_values(&[operation, outcome]).inc();
}

pub fn operation_count(operation: &str, outcome: &str) -> u64 {
    OPERATIONS.with_label_values(&[operation, outcome]).get()
}

/// Prometheus text exposition of every registered metric
pub fn gather() -> Result<String, prometheus::Error> {
    Lazy::force(&OPERATIONS);
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
