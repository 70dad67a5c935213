//! Loading-aware verification.
//!
//! A negative judgment is only final once the page is no longer reported as
//! loading, or the retry budget is spent. A positive judgment is final at once.

use crate::config::{BudgetScope, LoadingConfig, VerificationConfig};
use crate::driver::Driver;
use crate::judge::{Judge, JudgmentRequest};
use crate::loading::{LoadingClassifier, LoadingDetector};
use async_trait::async_trait;
use lucent_common::{JudgmentResult, VerifyError};
use std::time::Duration;
use tracing::info;

/// Suspends the verification flow between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Number of retries left. Counts attempts, not elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget(u32);

impl RetryBudget {
    pub fn new(retries: u32) -> Self {
        Self(retries)
    }

    pub fn from_config(config: &LoadingConfig) -> Self {
        Self(config.retry_budget())
    }

    pub fn remaining(&self) -> u32 {
        self.0
    }

    pub fn is_spent(&self) -> bool {
        self.0 == 0
    }

    /// Take one retry. Returns false, leaving the budget at zero, when none is left.
    pub fn consume(&mut self) -> bool {
        match self.0.checked_sub(1) {
            Some(left) => {
                self.0 = left;
                true
            }
            None => false,
        }
    }
}

pub struct Verifier<J, C> {
    judge: J,
    detector: LoadingDetector<C>,
    scope: BudgetScope,
    session_budget: RetryBudget,
    sleeper: Box<dyn Sleeper>,
}

impl<J: Judge, C: LoadingClassifier> Verifier<J, C> {
    pub fn new(judge: J, detector: LoadingDetector<C>, config: VerificationConfig) -> Self {
        let session_budget = RetryBudget::from_config(detector.config());
        Self {
            judge,
            detector,
            scope: config.budget_scope,
            session_budget,
            sleeper: Box::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn detector(&self) -> &LoadingDetector<C> {
        &self.detector
    }

    /// Budget the next `verify` call starts with.
    pub fn budget(&self) -> RetryBudget {
        match self.scope {
            BudgetScope::PerCall => RetryBudget::from_config(self.detector.config()),
            BudgetScope::PerSession => self.session_budget,
        }
    }

    /// Verify `statement` against the current page.
    ///
    /// Returns the last judgment. A negative result after the budget ran out while
    /// the page still looked busy is a normal outcome, not an error. Driver and
    /// judge failures propagate unchanged.
    pub async fn verify<D: Driver + ?Sized>(
        &mut self,
        driver: &D,
        statement: &str,
        vision: bool,
    ) -> Result<JudgmentResult, VerifyError> {
        info!("Starting verification:");
        info!("  -> Statement: {}", statement);

        let mut budget = self.budget();
        let outcome = self.run(driver, statement, vision, &mut budget).await;
        if self.scope == BudgetScope::PerSession {
            self.session_budget = budget;
        }
        outcome
    }

    async fn run<D: Driver + ?Sized>(
        &self,
        driver: &D,
        statement: &str,
        vision: bool,
        budget: &mut RetryBudget,
    ) -> Result<JudgmentResult, VerifyError> {
        loop {
            let snapshot = driver.snapshot().await?;
            let screenshot = if vision {
                Some(driver.screenshot().await?)
            } else {
                None
            };

            let verdict = self
                .judge
                .judge(JudgmentRequest {
                    statement,
                    snapshot: &snapshot,
                    screenshot: screenshot.as_ref(),
                })
                .await?;
            info!("  <- Result: {}", verdict.result);
            info!("  <- Reason: {}", verdict.explanation);

            if verdict.result {
                return Ok(verdict);
            }

            let loading = self
                .detector
                .is_loading(&snapshot, screenshot.as_ref())
                .await?;
            if !loading || budget.is_spent() {
                return Ok(verdict);
            }

            self.sleeper.sleep(self.detector.delay()).await;
            budget.consume();
            info!("Page still loading, retrying ({} left)", budget.remaining());
        }
    }
}
