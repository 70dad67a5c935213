use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LucentConfig {
    #[serde(default)]
    pub loading: LoadingConfig,
    #[serde(default)]
    pub waiter: WaiterConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

/// Loading detection constants, shared by the detector and the verification retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingConfig {
    /// Total time verification may spend waiting on a loading page.
    #[serde(default = "default_loading_timeout_ms")]
    pub timeout_ms: u64,
    /// Pause before each retry.
    #[serde(default = "default_loading_delay_ms")]
    pub delay_ms: u64,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_loading_timeout_ms(),
            delay_ms: default_loading_delay_ms(),
        }
    }
}

impl LoadingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Number of retries allowed: `timeout / delay`, rounded down. Zero when `delay` is zero.
    pub fn retry_budget(&self) -> u32 {
        match self.timeout_ms.checked_div(self.delay_ms) {
            Some(budget) => u32::try_from(budget).unwrap_or(u32::MAX),
            None => 0,
        }
    }
}

fn default_loading_timeout_ms() -> u64 {
    5000
}

fn default_loading_delay_ms() -> u64 {
    500
}

/// Arguments handed to the in-page settle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaiterConfig {
    #[serde(default = "default_waiter_timeout_ms")]
    pub timeout_ms: u64,
    /// How long the DOM and network must stay idle before the page counts as settled.
    #[serde(default = "default_waiter_quiet_ms")]
    pub quiet_ms: u64,
    /// Extra time the driver allows the settle check beyond `timeout_ms` before giving up on it.
    #[serde(default = "default_waiter_grace_ms")]
    pub grace_ms: u64,
}

impl Default for WaiterConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_waiter_timeout_ms(),
            quiet_ms: default_waiter_quiet_ms(),
            grace_ms: default_waiter_grace_ms(),
        }
    }
}

impl WaiterConfig {
    /// Upper bound on the settle-check evaluation as a whole.
    pub fn evaluation_bound(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.saturating_add(self.grace_ms))
    }
}

fn default_waiter_timeout_ms() -> u64 {
    10000
}

fn default_waiter_quiet_ms() -> u64 {
    500
}

fn default_waiter_grace_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Marker attribute name. Defaults to a per-process name.
    #[serde(default)]
    pub marker_attribute: Option<String>,
    /// Redirect clicks and selections aimed at an `<option>` to its owning `<select>`.
    #[serde(default = "default_redirect_option_actions")]
    pub redirect_option_actions: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            marker_attribute: None,
            redirect_option_actions: default_redirect_option_actions(),
        }
    }
}

fn default_redirect_option_actions() -> bool {
    true
}

/// Lifetime of the verification retry budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetScope {
    /// Every `verify` call starts with a full budget.
    #[default]
    PerCall,
    /// One budget, derived when the verifier is built, shared by all calls.
    PerSession,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationConfig {
    #[serde(default)]
    pub budget_scope: BudgetScope,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Launch the browser with a visible window.
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub chrome_bin: Option<PathBuf>,
    /// Profile directory. A throwaway one is created when unset.
    #[serde(default)]
    pub user_data_dir: Option<PathBuf>,
}
