use crate::config::WaiterConfig;
use crate::driver::ScriptRuntime;
use lucent_common::DriverError;
use lucent_scripts::{WAIT_FOR_JS, WAITER_JS};
use serde_json::{Value, json};
use tracing::{debug, info};

/// Blocks until the page reports itself settled, or the in-page settle check gives up.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageLoadWaiter {
    config: WaiterConfig,
}

impl PageLoadWaiter {
    pub fn new(config: WaiterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WaiterConfig {
        &self.config
    }

    /// Wait for the page to settle. A settle check that reports a problem, or never
    /// answers, is logged and not raised. A navigation that tears down the script
    /// context counts as progress.
    pub async fn wait<R: ScriptRuntime + ?Sized>(&self, runtime: &R) -> Result<(), DriverError> {
        info!("Waiting for page to finish loading");
        match self.settle(runtime).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_context_destroyed() => {
                info!("Failed to wait for page to load: {}", err);
                Ok(())
            }
            Err(DriverError::Timeout(after)) => {
                info!("Failed to wait for page to load: no answer after {:?}", after);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn settle<R: ScriptRuntime + ?Sized>(&self, runtime: &R) -> Result<(), DriverError> {
        runtime
            .evaluate(&format!("(function() {{\n{}\n}})()", WAITER_JS))
            .await?;

        let args = vec![json!(self.config.timeout_ms), json!(self.config.quiet_ms)];
        let bound = self.config.evaluation_bound();
        match runtime.evaluate_async(WAIT_FOR_JS, args, bound).await? {
            Value::Null => debug!("Page settled"),
            Value::String(reason) => info!("Failed to wait for page to load: {}", reason),
            other => info!("Failed to wait for page to load: {}", other),
        }
        Ok(())
    }
}
