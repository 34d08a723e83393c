//! In-process adjudicators for tests, benchmarks and dry runs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::contract::Adjudicator;
use crate::error::AdjudicatorError;
use crate::types::AdjudicationRequest;

/// Answers every request with a closure, optionally after a delay, and
/// counts calls and peak concurrency.
pub struct FnAdjudicator<F> {
    name: String,
    respond: F,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl<F> FnAdjudicator<F>
where
    F: Fn(&AdjudicationRequest) -> Result<Value, AdjudicatorError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, respond: F) -> Self {
        Self {
            name: name.into(),
            respond,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<F> Adjudicator for FnAdjudicator<F>
where
    F: Fn(&AdjudicationRequest) -> Result<Value, AdjudicatorError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn adjudicate(&self, request: &AdjudicationRequest) -> Result<Value, AdjudicatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let result = (self.respond)(request);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Replays a fixed sequence of results, then repeats the last one.
pub struct ScriptedAdjudicator {
    name: String,
    script: Mutex<VecDeque<Result<Value, AdjudicatorError>>>,
    last: Mutex<Option<Result<Value, AdjudicatorError>>>,
    calls: AtomicUsize,
}

impl ScriptedAdjudicator {
    pub fn new(name: impl Into<String>, script: Vec<Result<Value, AdjudicatorError>>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Adjudicator for ScriptedAdjudicator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn adjudicate(&self, _request: &AdjudicationRequest) -> Result<Value, AdjudicatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front();
        let mut last = self
            .last
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match next {
            Some(result) => {
                *last = Some(result.clone());
                result
            }
            None => last.clone().unwrap_or_else(|| {
                Err(AdjudicatorError::transport("script exhausted"))
            }),
        }
    }
}
