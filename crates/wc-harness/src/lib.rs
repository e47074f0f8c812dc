//! Runs candidate JavaScript against a challenge's test cases.
//!
//! Every run gets a fresh QuickJS runtime with no host bindings beyond a
//! `console.log` sink, a memory ceiling, a stack ceiling and a wall-clock
//! deadline enforced through the interrupt handler.

pub mod executor;

use std::sync::Arc;
use wc_core::ChallengeCatalog;
use wc_core::config::HarnessConfig;
use wc_core::types::HarnessResult;

pub use executor::execute;

#[derive(Clone)]
pub struct Harness {
    catalog: Arc<ChallengeCatalog>,
    limits: HarnessConfig,
}

impl Harness {
    pub fn new(catalog: Arc<ChallengeCatalog>, limits: HarnessConfig) -> Self {
        Self { catalog, limits }
    }

    pub fn catalog(&self) -> &Arc<ChallengeCatalog> {
        &self.catalog
    }

    /// Blocks the calling thread for at most the configured timeout plus the
    /// cost of tearing down the runtime.
    pub fn run(&self, challenge_name: &str, code: &str) -> HarnessResult {
        let Some(challenge) = self.catalog.by_name(challenge_name) else {
            return HarnessResult::challenge_not_found();
        };
        execute(&challenge, code, &self.limits)
    }
}
