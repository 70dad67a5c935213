//! Line-oriented command execution against a `Driver`.
//!
//! input → parse → dispatch (driver action or verification) → format

use crate::driver::Driver;
use crate::judge::Judge;
use crate::loading::LoadingClassifier;
use crate::verifier::Verifier;
use lucent_common::error_mapping::hint_for_code;
use lucent_common::{DriverError, VerifyError};

pub use crate::parser::{Command, ParseError, parse_command};

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Verification error: {0}")]
    Verify(#[from] VerifyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExecutorError {
    /// Recovery hint for driver failures, keyed by the driver's error code.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ExecutorError::Driver(e) | ExecutorError::Verify(VerifyError::Driver(e)) => {
                hint_for_code(e.code())
            }
            _ => None,
        }
    }
}

/// Result of executing a command.
#[derive(Debug)]
pub struct ExecutionResult {
    /// Formatted output string for display.
    pub output: String,
    /// False when a verification came back negative.
    pub success: bool,
}

impl ExecutionResult {
    fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: true,
        }
    }
}

pub struct CommandExecutor<J, C> {
    verifier: Verifier<J, C>,
}

impl<J: Judge, C: LoadingClassifier> CommandExecutor<J, C> {
    pub fn new(verifier: Verifier<J, C>) -> Self {
        Self { verifier }
    }

    pub fn verifier(&self) -> &Verifier<J, C> {
        &self.verifier
    }

    pub async fn execute_line<D: Driver + ?Sized>(
        &mut self,
        driver: &D,
        line: &str,
    ) -> Result<ExecutionResult, ExecutorError> {
        let command = parse_command(line)?;
        self.execute(driver, command).await
    }

    pub async fn execute<D: Driver + ?Sized>(
        &mut self,
        driver: &D,
        command: Command,
    ) -> Result<ExecutionResult, ExecutorError> {
        match command {
            Command::Goto(url) => {
                let res = driver.navigate(&url).await?;
                Ok(ExecutionResult::ok(format!("Navigated to {}", res.url)))
            }
            Command::Click(id) => {
                driver.click(id).await?;
                Ok(ExecutionResult::ok(format!("Clicked {}", id)))
            }
            Command::Hover(id) => {
                driver.hover(id).await?;
                Ok(ExecutionResult::ok(format!("Hovered {}", id)))
            }
            Command::Type(id, text) => {
                driver.type_text(id, &text).await?;
                Ok(ExecutionResult::ok(format!("Typed into {}", id)))
            }
            Command::Select(id, value) => {
                driver.select(id, &value).await?;
                Ok(ExecutionResult::ok(format!("Selected {:?} in {}", value, id)))
            }
            Command::Drag(from, to) => {
                driver.drag_and_drop(from, to).await?;
                Ok(ExecutionResult::ok(format!("Dragged {} to {}", from, to)))
            }
            Command::Press(key) => {
                driver.press_key(key).await?;
                Ok(ExecutionResult::ok(format!("Pressed {}", key.as_str())))
            }
            Command::Wait => {
                driver.wait_for_load().await?;
                Ok(ExecutionResult::ok("Page loaded"))
            }
            Command::Title => Ok(ExecutionResult::ok(driver.title().await?)),
            Command::Url => Ok(ExecutionResult::ok(driver.url().await?)),
            Command::Tree => {
                let tree = driver.accessible_tree().await?;
                let json = serde_json::to_string_pretty(&tree).map_err(DriverError::from)?;
                Ok(ExecutionResult::ok(json))
            }
            Command::Screenshot(path) => {
                let shot = driver.screenshot().await?;
                tokio::fs::write(&path, shot.bytes()).await?;
                Ok(ExecutionResult::ok(format!(
                    "Screenshot saved to {} ({} bytes)",
                    path,
                    shot.bytes().len()
                )))
            }
            Command::Verify { statement, vision } => {
                let verdict = self.verifier.verify(driver, &statement, vision).await?;
                let label = if verdict.result { "PASS" } else { "FAIL" };
                Ok(ExecutionResult {
                    output: format!("{}: {}", label, verdict.explanation),
                    success: verdict.result,
                })
            }
        }
    }
}
